//! Main `GridView` struct - the JavaScript-facing adapter over the engine.
//!
//! This module provides the WASM-exported `GridView` struct that handles:
//! - Building the grid model from row/column counts and sizes
//! - Coalescing scroll input into one layout update per animation frame
//! - Delivering change records to a JS callback
//! - Showing and hiding the scroll indicator around scroll activity
//!
//! The helpers in `scroll` and `events` are generic over the clock so the
//! same code runs under a manual clock in tests.

mod events;
mod scroll;

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::Function;
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::closure::Closure;

use crate::config::EngineConfig;
use crate::layout::{AxisLayout, ChangeRecord, GridModel, StuckMap};
use crate::momentum::{Momentum, TouchTracker};
use crate::pacer::{Clock, MonotonicClock, UpdatePacer};
use crate::scenario::SizeDef;
use crate::scrollbar::{ScrollbarModel, ThumbDrag};
use crate::types::{Axis, CellSpan, Point, Scrollability, SpanExtent};

pub(crate) use events::{key_down, touch_end, touch_move, touch_start};
pub(crate) use scroll::{begin_thumb_drag, drag_thumb, queue_scroll};

/// Pacer key for coalesced scroll deltas
pub(crate) const SCROLL_KEY: &str = "scroll";
/// Pacer key for the recompute that follows a paced-out move
pub(crate) const SETTLE_KEY: &str = "settle";
/// Pacer key for hiding the scroll indicator
pub(crate) const INDICATOR_KEY: &str = "indicator";
/// Pacer key for the momentum loop
pub(crate) const MOMENTUM_KEY: &str = "momentum";
/// Pacer key for coalesced thumb drags
pub(crate) const THUMB_KEY: &str = "thumb";

/// State shared between the exported struct and its scheduled jobs
pub(crate) struct SharedState<C: Clock = MonotonicClock> {
    pub(crate) model: GridModel<C>,
    pub(crate) pacer: UpdatePacer<C>,
    pub(crate) scrollbar: ScrollbarModel,
    pub(crate) pending_delta: Point,
    pub(crate) thumb_target: Option<Point>,
    pub(crate) thumb_drag: Option<(Axis, ThumbDrag)>,
    pub(crate) touch: TouchTracker,
    pub(crate) momentum: Option<Momentum>,
    pub(crate) indicator_visible: bool,
    pub(crate) pending_change: Option<ChangeRecord>,
    pub(crate) change_callback: Option<Function>,
    pub(crate) indicator_callback: Option<Function>,
    #[cfg(target_arch = "wasm32")]
    pub(crate) frame_handle: Option<i32>,
    #[cfg(target_arch = "wasm32")]
    pub(crate) frame_closure: Option<Closure<dyn FnMut(f64)>>,
    #[cfg(target_arch = "wasm32")]
    pub(crate) timer_handle: Option<i32>,
    #[cfg(target_arch = "wasm32")]
    pub(crate) timer_closure: Option<Closure<dyn FnMut()>>,
}

impl<C: Clock + Clone> SharedState<C> {
    pub(crate) fn new(
        rows: AxisLayout,
        cols: AxisLayout,
        config: EngineConfig,
        clock: C,
    ) -> Self {
        let scrollbar = ScrollbarModel::new(config.min_thumb_fraction);
        Self {
            model: GridModel::with_clock(rows, cols, config, clock.clone()),
            pacer: UpdatePacer::with_clock(clock),
            scrollbar,
            pending_delta: Point::default(),
            thumb_target: None,
            thumb_drag: None,
            touch: TouchTracker::new(),
            momentum: None,
            indicator_visible: false,
            pending_change: None,
            change_callback: None,
            indicator_callback: None,
            #[cfg(target_arch = "wasm32")]
            frame_handle: None,
            #[cfg(target_arch = "wasm32")]
            frame_closure: None,
            #[cfg(target_arch = "wasm32")]
            timer_handle: None,
            #[cfg(target_arch = "wasm32")]
            timer_closure: None,
        }
    }
}

/// Fold a new record into one the host has not picked up yet.
pub(crate) fn absorb(pending: &mut Option<ChangeRecord>, newer: ChangeRecord) {
    match pending {
        Some(current) => current.absorb(newer),
        None => *pending = Some(newer),
    }
}

/// Hand a change record to the host.
///
/// With a callback registered (browser only) the record is delivered
/// immediately; otherwise it waits for `take_change`.
pub(crate) fn deliver<C: Clock>(state: &Rc<RefCell<SharedState<C>>>, record: ChangeRecord) {
    let callback = {
        let mut s = state.borrow_mut();
        absorb(&mut s.pending_change, record);
        s.change_callback.clone()
    };
    #[cfg(target_arch = "wasm32")]
    if let Some(callback) = callback {
        let Some(record) = state.borrow_mut().pending_change.take() else {
            return;
        };
        match serde_wasm_bindgen::to_value(&record) {
            Ok(value) => {
                if let Err(e) = callback.call1(&JsValue::NULL, &value) {
                    tracing::warn!(?e, "change callback failed");
                }
            }
            Err(e) => tracing::warn!(%e, "change record conversion failed"),
        }
    }
    #[cfg(not(target_arch = "wasm32"))]
    let _ = callback;
}

/// Run this frame's jobs and any timed jobs that are due.
///
/// Jobs are taken out before running so they can borrow the state.
pub(crate) fn pump<C: Clock>(state: &Rc<RefCell<SharedState<C>>>) -> usize {
    let jobs = {
        let mut s = state.borrow_mut();
        let mut jobs = s.pacer.take_frame_jobs();
        jobs.extend(s.pacer.take_due_jobs());
        jobs
    };
    let count = jobs.len();
    for job in jobs {
        job();
    }
    count
}

/// The main grid view exported to JavaScript
#[wasm_bindgen]
pub struct GridView {
    state: Rc<RefCell<SharedState>>,
}

#[wasm_bindgen]
impl GridView {
    /// Create a view over a grid of fixed-size rows and columns.
    #[wasm_bindgen(constructor)]
    pub fn new(row_count: u32, col_count: u32, row_height: f64, col_width: f64) -> GridView {
        Self::build(row_count, col_count, row_height, col_width, EngineConfig::default())
    }

    /// Create a view with engine settings given as a JS object.
    ///
    /// # Errors
    /// Returns an error if `config` does not describe a valid engine config.
    pub fn with_config(
        row_count: u32,
        col_count: u32,
        row_height: f64,
        col_width: f64,
        config: JsValue,
    ) -> Result<GridView, JsValue> {
        let config: EngineConfig = if config.is_undefined() || config.is_null() {
            EngineConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config).map_err(crate::error::GridError::from)?
        };
        Ok(Self::build(row_count, col_count, row_height, col_width, config))
    }

    /// Register a JS callback receiving each change record.
    pub fn set_change_callback(&mut self, callback: Option<Function>) {
        self.state.borrow_mut().change_callback = callback;
    }

    /// Register a JS callback told when the scroll indicator shows or hides.
    pub fn set_indicator_callback(&mut self, callback: Option<Function>) {
        self.state.borrow_mut().indicator_callback = callback;
    }

    /// Resize the viewport (logical pixels)
    pub fn resize(&mut self, width: f64, height: f64) {
        let record = self.state.borrow_mut().model.set_viewport_size(width, height);
        deliver(&self.state, record);
    }

    /// Scroll by delta amounts, applied on the next animation frame
    pub fn scroll(&mut self, delta_x: f64, delta_y: f64) {
        queue_scroll(&self.state, delta_x, delta_y);
        self.schedule();
    }

    /// Current scroll offset as `[x, y]`
    pub fn scroll_position(&self) -> Vec<f64> {
        let position = self.state.borrow().model.scroll_position();
        vec![position.x, position.y]
    }

    /// Set absolute scroll position
    pub fn set_scroll_position(&mut self, x: f64, y: f64) {
        let record = self.state.borrow_mut().model.set_scroll_position(x, y);
        deliver(&self.state, record);
    }

    /// Scroll just far enough to show a cell
    pub fn scroll_to_cell(&mut self, row: u32, col: u32) {
        let record = self.state.borrow_mut().model.scroll_to_cell(row, col);
        deliver(&self.state, record);
    }

    /// Handle a key press. Returns true if the key scrolled the grid.
    pub fn on_key_down(&mut self, key: &str) -> bool {
        let handled = key_down(&self.state, key);
        self.schedule();
        handled
    }

    pub fn on_touch_start(&mut self, x: f64, y: f64, time_ms: f64) {
        touch_start(&self.state, x, y, time_ms);
        self.schedule();
    }

    pub fn on_touch_move(&mut self, x: f64, y: f64, time_ms: f64) {
        touch_move(&self.state, x, y, time_ms);
        self.schedule();
    }

    pub fn on_touch_end(&mut self, time_ms: f64) {
        touch_end(&self.state, time_ms);
        self.schedule();
    }

    /// Start dragging a scrollbar thumb. Returns false if the axis cannot scroll.
    pub fn begin_thumb_drag(&mut self, vertical: bool) -> bool {
        let axis = if vertical { Axis::Row } else { Axis::Column };
        begin_thumb_drag(&self.state, axis)
    }

    /// Pointer moved `delta` pixels along a `bar_length` track since the drag began
    pub fn drag_thumb(&mut self, delta: f64, bar_length: f64) {
        drag_thumb(&self.state, delta, bar_length);
        self.schedule();
    }

    pub fn end_thumb_drag(&mut self) {
        self.state.borrow_mut().thumb_drag = None;
    }

    /// Thumb size and position for one scrollbar, or `undefined` if it is hidden.
    ///
    /// # Errors
    /// Returns an error if the metrics cannot be converted to a JS value.
    pub fn thumb_metrics(&self, vertical: bool) -> Result<JsValue, JsValue> {
        let s = self.state.borrow();
        let engine = s.model.engine();
        let window = engine.window_rect();
        let size = engine.grid_size();
        let metrics = if vertical {
            s.scrollbar.metrics(window.y, window.height, size.height)
        } else {
            s.scrollbar.metrics(window.x, window.width, size.width)
        };
        Ok(serde_wasm_bindgen::to_value(&metrics).map_err(crate::error::GridError::from)?)
    }

    pub fn set_sticky_rows(&mut self, rows: Vec<u32>) {
        self.state.borrow_mut().model.set_sticky(Axis::Row, rows);
        self.flush();
    }

    pub fn set_sticky_cols(&mut self, cols: Vec<u32>) {
        self.state.borrow_mut().model.set_sticky(Axis::Column, cols);
        self.flush();
    }

    /// Merge a block of cells. A span of 0 fills to the window's far edge.
    pub fn add_span(&mut self, row: u32, col: u32, row_span: u32, col_span: u32) {
        let extent = |n: u32| {
            if n == 0 {
                SpanExtent::Fill
            } else {
                SpanExtent::Count(n)
            }
        };
        self.state.borrow_mut().model.add_span(CellSpan {
            row,
            col,
            row_span: extent(row_span),
            col_span: extent(col_span),
        });
    }

    pub fn clear_spans(&mut self) {
        self.state.borrow_mut().model.clear_spans();
    }

    /// Replace how rows are sized.
    ///
    /// Accepts `{ fixed: 24 }`, `{ flex: { flex, min } }`, `"natural"` or
    /// `{ list: [...] }` with one item size per row.
    ///
    /// # Errors
    /// Returns an error if `sizes` is not a valid size definition.
    pub fn set_row_sizes(&mut self, sizes: JsValue) -> Result<(), JsValue> {
        let sizes: SizeDef =
            serde_wasm_bindgen::from_value(sizes).map_err(crate::error::GridError::from)?;
        self.set_sizes(Axis::Row, sizes);
        Ok(())
    }

    /// Replace how columns are sized. Same shapes as `set_row_sizes`.
    ///
    /// # Errors
    /// Returns an error if `sizes` is not a valid size definition.
    pub fn set_col_sizes(&mut self, sizes: JsValue) -> Result<(), JsValue> {
        let sizes: SizeDef =
            serde_wasm_bindgen::from_value(sizes).map_err(crate::error::GridError::from)?;
        self.set_sizes(Axis::Column, sizes);
        Ok(())
    }

    pub fn set_row_count(&mut self, count: u32) {
        let record = self.state.borrow_mut().model.set_count(Axis::Row, count);
        if let Some(record) = record {
            deliver(&self.state, record);
        }
    }

    pub fn set_col_count(&mut self, count: u32) {
        let record = self.state.borrow_mut().model.set_count(Axis::Column, count);
        if let Some(record) = record {
            deliver(&self.state, record);
        }
    }

    /// Report the rendered height of a row
    pub fn report_row_height(&mut self, row: u32, height: f64) {
        let record = self.state.borrow_mut().model.report_size(Axis::Row, row, height);
        if let Some(record) = record {
            deliver(&self.state, record);
        }
    }

    /// Report the rendered width of a column
    pub fn report_col_width(&mut self, col: u32, width: f64) {
        let record = self
            .state
            .borrow_mut()
            .model
            .report_size(Axis::Column, col, width);
        if let Some(record) = record {
            deliver(&self.state, record);
        }
    }

    /// # Errors
    /// Returns an error if the rect cannot be converted to a JS value.
    pub fn window_rect(&self) -> Result<JsValue, JsValue> {
        let rect = self.state.borrow().model.window_rect();
        Ok(serde_wasm_bindgen::to_value(&rect).map_err(crate::error::GridError::from)?)
    }

    /// # Errors
    /// Returns an error if the range cannot be converted to a JS value.
    pub fn visible_range(&self) -> Result<JsValue, JsValue> {
        let range = self.state.borrow().model.engine().range();
        Ok(serde_wasm_bindgen::to_value(&range).map_err(crate::error::GridError::from)?)
    }

    /// Cells to draw for the current range, spans applied.
    ///
    /// # Errors
    /// Returns an error if the cells cannot be converted to a JS value.
    pub fn render_cells(&self) -> Result<JsValue, JsValue> {
        let cells = self.state.borrow().model.render_cells();
        Ok(serde_wasm_bindgen::to_value(&cells).map_err(crate::error::GridError::from)?)
    }

    /// Changes accumulated since the last call, or `undefined` if none.
    ///
    /// # Errors
    /// Returns an error if the record cannot be converted to a JS value.
    pub fn take_change(&mut self) -> Result<JsValue, JsValue> {
        let record = self.state.borrow_mut().pending_change.take();
        Ok(serde_wasm_bindgen::to_value(&record).map_err(crate::error::GridError::from)?)
    }

    /// Whether the content overflows horizontally and vertically.
    ///
    /// # Errors
    /// Returns an error if the flags cannot be converted to a JS value.
    #[wasm_bindgen(js_name = scrollability)]
    pub fn scrollability_value(&self) -> Result<JsValue, JsValue> {
        let flags = self.scrollability();
        Ok(serde_wasm_bindgen::to_value(&flags).map_err(crate::error::GridError::from)?)
    }

    /// Sticky rows pinned right now, keyed by row.
    ///
    /// # Errors
    /// Returns an error if the map cannot be converted to a JS value.
    #[wasm_bindgen(js_name = stuck_rows)]
    pub fn stuck_rows_value(&self) -> Result<JsValue, JsValue> {
        let stuck = self.stuck(Axis::Row);
        Ok(serde_wasm_bindgen::to_value(&stuck).map_err(crate::error::GridError::from)?)
    }

    /// Sticky columns pinned right now, keyed by column.
    ///
    /// # Errors
    /// Returns an error if the map cannot be converted to a JS value.
    #[wasm_bindgen(js_name = stuck_cols)]
    pub fn stuck_cols_value(&self) -> Result<JsValue, JsValue> {
        let stuck = self.stuck(Axis::Column);
        Ok(serde_wasm_bindgen::to_value(&stuck).map_err(crate::error::GridError::from)?)
    }

    pub fn content_width(&self) -> f64 {
        self.state.borrow().model.engine().grid_size().width
    }

    pub fn content_height(&self) -> f64 {
        self.state.borrow().model.engine().grid_size().height
    }

    /// Run pending frame and timer work now.
    ///
    /// Hosts driving their own render loop call this once per frame.
    pub fn tick(&mut self) {
        pump(&self.state);
        self.schedule();
    }
}

impl GridView {
    /// Changes accumulated since the last call, for Rust hosts.
    pub fn take_change_record(&mut self) -> Option<ChangeRecord> {
        self.state.borrow_mut().pending_change.take()
    }

    /// Replace an axis's size definition and rebuild it.
    pub fn set_sizes(&mut self, axis: Axis, sizes: SizeDef) {
        let record = self
            .state
            .borrow_mut()
            .model
            .set_size_spec(axis, sizes.into());
        deliver(&self.state, record);
    }

    pub fn scrollability(&self) -> Scrollability {
        self.state.borrow().model.engine().scrollability()
    }

    /// Stuck map from the latest recompute (empty before the first one).
    pub fn stuck(&self, axis: Axis) -> StuckMap {
        self.state
            .borrow()
            .model
            .engine()
            .stuck(axis)
            .cloned()
            .unwrap_or_default()
    }

    fn build(
        row_count: u32,
        col_count: u32,
        row_height: f64,
        col_width: f64,
        config: EngineConfig,
    ) -> GridView {
        #[cfg(target_arch = "wasm32")]
        console_error_panic_hook::set_once();
        let state = SharedState::new(
            AxisLayout::fixed(row_count, row_height),
            AxisLayout::fixed(col_count, col_width),
            config,
            MonotonicClock::new(),
        );
        GridView {
            state: Rc::new(RefCell::new(state)),
        }
    }

    fn flush(&mut self) {
        let record = self.state.borrow_mut().model.flush();
        deliver(&self.state, record);
    }

    #[cfg(target_arch = "wasm32")]
    fn schedule(&self) {
        schedule_pump(&self.state);
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn schedule(&self) {}
}

/// Make sure an animation frame and a timer are pending for queued work.
#[cfg(target_arch = "wasm32")]
#[allow(clippy::cast_possible_truncation)]
fn schedule_pump(state: &Rc<RefCell<SharedState>>) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let mut s = state.borrow_mut();

    if s.pacer.has_frame_pending() && s.frame_handle.is_none() {
        if s.frame_closure.is_none() {
            let weak_state = Rc::downgrade(state);
            let closure = Closure::wrap(Box::new(move |_timestamp: f64| {
                if let Some(state) = weak_state.upgrade() {
                    state.borrow_mut().frame_handle = None;
                    pump(&state);
                    schedule_pump(&state);
                }
            }) as Box<dyn FnMut(f64)>);
            s.frame_closure = Some(closure);
        }
        let handle = s
            .frame_closure
            .as_ref()
            .and_then(|c| window.request_animation_frame(c.as_ref().unchecked_ref()).ok());
        s.frame_handle = handle;
    }

    // Cancel any existing timer; the next deadline may be sooner
    if let Some(timer_id) = s.timer_handle.take() {
        window.clear_timeout_with_handle(timer_id);
    }
    let Some(deadline) = s.pacer.next_deadline() else {
        return;
    };
    if s.timer_closure.is_none() {
        let weak_state = Rc::downgrade(state);
        let closure = Closure::wrap(Box::new(move || {
            if let Some(state) = weak_state.upgrade() {
                state.borrow_mut().timer_handle = None;
                pump(&state);
                schedule_pump(&state);
            }
        }) as Box<dyn FnMut()>);
        s.timer_closure = Some(closure);
    }
    let delay = (deadline - s.pacer.clock().now_ms())
        .clamp(0.0, f64::from(i32::MAX))
        .ceil() as i32;
    let handle = s.timer_closure.as_ref().and_then(|c| {
        window
            .set_timeout_with_callback_and_timeout_and_arguments_0(c.as_ref().unchecked_ref(), delay)
            .ok()
    });
    s.timer_handle = handle;
}
