//! Data types shared by the layout engine and its hosts.

mod geometry;
mod size;
mod span;

pub use geometry::*;
pub use size::*;
pub use span::*;
