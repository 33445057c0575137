//! Layout engine for grid windowing.
//!
//! This module handles:
//! - Resolving fixed, flexible and measured sizes per axis
//! - Pre-computing prefix positions for rows and columns
//! - Finding the cell range under the viewport as it moves
//! - Pinning sticky rows/columns and handling merged cells

mod engine;
mod grid;
mod positions;
mod search;
mod size_resolver;
mod spans;
mod sticky;

pub use engine::{CellRect, ChangeRecord, LayoutEngine, RenderCell};
pub use grid::GridModel;
pub use positions::{AxisPosition, AxisPositions};
pub use search::{visible_span, SearchStrategy, DEFAULT_MAX_SCAN};
pub use size_resolver::{resolve, AxisLayout};
pub use spans::{resolve_span, ResolvedSpan, SpanMap};
pub use sticky::{resolve_stuck, Pinned, StuckMap};
