//! xlgrid - windowing engine for very large 2D grids
//!
//! Keeps only the visible cells of a grid materialized:
//! - Fixed, flex and measured row heights / column widths
//! - Overscan, sticky rows/columns, merged cell spans
//! - Frame-coalesced, rate-limited layout updates
//! - Scrollbar thumb geometry and touch momentum
//! - Runs natively or in the browser via WebAssembly
//!
//! # Usage (JavaScript)
//!
//! ```javascript
//! import init, { GridView } from 'xlgrid';
//! await init();
//! const view = new GridView(1_000_000, 50, 24, 120);
//! view.set_change_callback((change) => draw(change, view.render_cells()));
//! view.resize(container.clientWidth, container.clientHeight);
//! container.addEventListener('wheel', (e) => view.scroll(e.deltaX, e.deltaY));
//! ```
//!
//! # Usage (Rust)
//!
//! ```
//! use xlgrid::{AxisLayout, EngineConfig, GridModel};
//!
//! let mut grid = GridModel::new(
//!     AxisLayout::fixed(1_000_000, 24.0),
//!     AxisLayout::fixed(50, 120.0),
//!     EngineConfig::default(),
//! );
//! let change = grid.set_viewport_size(800.0, 600.0);
//! assert!(change.range.is_some());
//! ```

pub mod config;
pub mod error;
pub mod layout;
pub mod momentum;
pub mod pacer;
pub mod scenario;
pub mod scrollbar;
pub mod types;
pub mod viewer;

use wasm_bindgen::prelude::*;

// Re-export the main view struct
pub use viewer::GridView;

pub use config::EngineConfig;
pub use error::{GridError, Result};
pub use layout::{
    AxisLayout, AxisPositions, CellRect, ChangeRecord, GridModel, LayoutEngine, RenderCell,
    SearchStrategy, StuckMap,
};
pub use momentum::{Momentum, MomentumConfig, TouchTracker};
pub use pacer::{Clock, ManualClock, MonotonicClock, UpdatePacer};
pub use scenario::Scenario;
pub use scrollbar::{ScrollbarModel, ThumbDrag, ThumbMetrics};
pub use types::*;

/// Replay a JSON scenario and return the per-step outcomes as JSON
///
/// # Errors
/// Returns an error if the scenario is malformed.
#[wasm_bindgen]
pub fn replay_scenario(json: &str) -> std::result::Result<String, JsValue> {
    let scenario = Scenario::from_json(json)?;
    Ok(serde_json::to_string(&scenario.run()).map_err(GridError::from)?)
}

/// Get the library version
#[must_use]
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
