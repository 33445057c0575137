//! The windowing engine.
//!
//! Owns both axes' positions and the window rect and derives, on each
//! recompute, the materialized cell range, the translation for the
//! rendered block and the currently stuck sticky rows/columns.

use serde::Serialize;

use super::search::{cap_unmeasured, visible_span};
use super::spans::SpanMap;
use super::sticky::{normalize, resolve_stuck, StuckMap};
use super::AxisPositions;
use crate::config::EngineConfig;
use crate::pacer::{Clock, MonotonicClock};
use crate::types::{
    Axis, AxisSize, CellRange, CellSpan, GridSize, Point, Scrollability, WindowRect,
};

/// What changed in the most recent recompute
///
/// `translate` is always present; the other fields only when they differ
/// from what the previous record reported.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRecord {
    /// Shift to apply to the rendered block so its first cell lines up
    pub translate: Point,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<CellRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stuck_rows: Option<StuckMap>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stuck_cols: Option<StuckMap>,
}

impl ChangeRecord {
    /// Fold a later record into this one.
    ///
    /// Keeps this record's fields where the later one reports no change.
    pub fn absorb(&mut self, newer: ChangeRecord) {
        self.translate = newer.translate;
        if newer.range.is_some() {
            self.range = newer.range;
        }
        if newer.stuck_rows.is_some() {
            self.stuck_rows = newer.stuck_rows;
        }
        if newer.stuck_cols.is_some() {
            self.stuck_cols = newer.stuck_cols;
        }
    }
}

/// Rectangle representing a cell's bounds in content coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CellRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// True if this cell is covered by a span anchored elsewhere
    pub skip: bool,
}

/// A cell the renderer must draw
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RenderCell {
    pub row: u32,
    pub col: u32,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

pub struct LayoutEngine<C = MonotonicClock> {
    config: EngineConfig,
    clock: C,
    rows: AxisPositions,
    cols: AxisPositions,
    window: WindowRect,
    sticky_rows: Vec<u32>,
    sticky_cols: Vec<u32>,
    spans: SpanMap,
    range: Option<CellRange>,
    translate: Point,
    stuck_rows: Option<StuckMap>,
    stuck_cols: Option<StuckMap>,
    last_recompute_ms: Option<f64>,
}

impl LayoutEngine<MonotonicClock> {
    pub fn new(config: EngineConfig) -> Self {
        Self::with_clock(config, MonotonicClock::new())
    }
}

impl<C: Clock> LayoutEngine<C> {
    pub fn with_clock(config: EngineConfig, clock: C) -> Self {
        Self {
            config,
            clock,
            rows: AxisPositions::default(),
            cols: AxisPositions::default(),
            window: WindowRect::default(),
            sticky_rows: Vec::new(),
            sticky_cols: Vec::new(),
            spans: SpanMap::new(),
            range: None,
            translate: Point::default(),
            stuck_rows: None,
            stuck_cols: None,
            last_recompute_ms: None,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn positions(&self, axis: Axis) -> &AxisPositions {
        match axis {
            Axis::Row => &self.rows,
            Axis::Column => &self.cols,
        }
    }

    /// Rebuild one axis from resolved sizes and recompute.
    pub fn set_axis_sizes(&mut self, axis: Axis, sizes: &[AxisSize]) -> ChangeRecord {
        self.set_axis_positions(axis, AxisPositions::build(sizes))
    }

    /// Replace one axis's positions and recompute.
    pub fn set_axis_positions(&mut self, axis: Axis, positions: AxisPositions) -> ChangeRecord {
        tracing::debug!(
            ?axis,
            count = positions.len(),
            extent = positions.total_extent(),
            "axis rebuilt"
        );
        match axis {
            Axis::Row => {
                self.rows = positions;
                self.stuck_rows = None;
            }
            Axis::Column => {
                self.cols = positions;
                self.stuck_cols = None;
            }
        }
        // Same indices may now sit elsewhere; report the range again
        self.range = None;
        self.clamp_window();
        self.recompute_now()
    }

    /// Replace the sticky candidates for an axis. Applied on the next recompute.
    pub fn set_sticky(&mut self, axis: Axis, indices: impl IntoIterator<Item = u32>) {
        let sorted = normalize(indices);
        match axis {
            Axis::Row => {
                self.sticky_rows = sorted;
                self.stuck_rows = None;
            }
            Axis::Column => {
                self.sticky_cols = sorted;
                self.stuck_cols = None;
            }
        }
    }

    pub fn sticky(&self, axis: Axis) -> &[u32] {
        match axis {
            Axis::Row => &self.sticky_rows,
            Axis::Column => &self.sticky_cols,
        }
    }

    /// Declare a merged cell. Returns the span it replaced at the same anchor.
    pub fn add_span(&mut self, span: CellSpan) -> Option<CellSpan> {
        let replaced = self.spans.insert(span);
        if let Some(previous) = &replaced {
            tracing::debug!(row = span.row, col = span.col, ?previous, "span replaced");
        }
        replaced
    }

    pub fn clear_spans(&mut self) {
        self.spans.clear();
    }

    pub fn spans(&self) -> &SpanMap {
        &self.spans
    }

    /// Resize the viewport and recompute.
    pub fn set_viewport_size(&mut self, width: f64, height: f64) -> ChangeRecord {
        self.window.width = sanitize_extent(width);
        self.window.height = sanitize_extent(height);
        self.clamp_window();
        self.recompute_now()
    }

    /// Move the window to an absolute content position (clamped).
    pub fn move_window_absolute(&mut self, x: f64, y: f64) -> Option<ChangeRecord> {
        self.window.x = x;
        self.window.y = y;
        self.clamp_window();
        self.recompute(false)
    }

    /// Move the window by a delta (clamped).
    pub fn move_window_by(&mut self, dx: f64, dy: f64) -> Option<ChangeRecord> {
        self.move_window_absolute(self.window.x + dx, self.window.y + dy)
    }

    pub fn scroll_to_top(&mut self) -> Option<ChangeRecord> {
        self.move_window_absolute(self.window.x, 0.0)
    }

    pub fn scroll_to_bottom(&mut self) -> Option<ChangeRecord> {
        self.move_window_absolute(self.window.x, f64::INFINITY)
    }

    pub fn scroll_to_left(&mut self) -> Option<ChangeRecord> {
        self.move_window_absolute(0.0, self.window.y)
    }

    pub fn scroll_to_right(&mut self) -> Option<ChangeRecord> {
        self.move_window_absolute(f64::INFINITY, self.window.y)
    }

    pub fn page_up(&mut self) -> Option<ChangeRecord> {
        self.move_window_by(0.0, -self.window.height)
    }

    pub fn page_down(&mut self) -> Option<ChangeRecord> {
        self.move_window_by(0.0, self.window.height)
    }

    pub fn page_left(&mut self) -> Option<ChangeRecord> {
        self.move_window_by(-self.window.width, 0.0)
    }

    pub fn page_right(&mut self) -> Option<ChangeRecord> {
        self.move_window_by(self.window.width, 0.0)
    }

    /// Current scroll offset (the window's top-left corner)
    pub fn scroll_position(&self) -> Point {
        Point::new(self.window.x, self.window.y)
    }

    /// Jump to a scroll offset, e.g. one restored from a previous session.
    pub fn set_scroll_position(&mut self, x: f64, y: f64) -> ChangeRecord {
        self.window.x = x;
        self.window.y = y;
        self.clamp_window();
        self.recompute_now()
    }

    /// Scroll the minimum distance needed to bring a cell fully into view.
    ///
    /// Cells larger than the viewport are aligned to the leading edge.
    /// Indices past the end are clamped to the last row/column.
    pub fn scroll_to_cell(&mut self, row: u32, col: u32) -> ChangeRecord {
        let y = reveal(&self.rows, row, self.window.y, self.window.height);
        let x = reveal(&self.cols, col, self.window.x, self.window.width);
        self.set_scroll_position(x, y)
    }

    /// Force a recompute regardless of pacing.
    pub fn flush(&mut self) -> ChangeRecord {
        self.recompute_now()
    }

    /// Recompute derived state.
    ///
    /// Unforced calls within the minimum interval of the previous recompute
    /// are skipped and return `None`; the window keeps its new position and
    /// the next recompute picks it up.
    pub fn recompute(&mut self, force: bool) -> Option<ChangeRecord> {
        if !force {
            if let Some(last) = self.last_recompute_ms {
                let elapsed = self.clock.now_ms() - last;
                if elapsed < self.config.min_recompute_interval_ms {
                    tracing::trace!(elapsed, "recompute skipped");
                    return None;
                }
            }
        }
        Some(self.recompute_now())
    }

    fn recompute_now(&mut self) -> ChangeRecord {
        self.last_recompute_ms = Some(self.clock.now_ms());

        let previous = self.range;
        let (row, num_rows) = axis_window(
            &self.rows,
            previous.map_or(0, |r| r.row),
            self.window.y,
            self.window.height,
            self.config.overscan_rows,
            self.config.estimated_row_size,
            self.config.search,
        );
        let (col, num_cols) = axis_window(
            &self.cols,
            previous.map_or(0, |r| r.col),
            self.window.x,
            self.window.width,
            self.config.overscan_cols,
            self.config.estimated_col_size,
            self.config.search,
        );
        let range = CellRange {
            row,
            col,
            num_rows,
            num_cols,
        };

        let translate = Point::new(
            self.cols.offset(col) - self.window.x,
            self.rows.offset(row) - self.window.y,
        );

        let stuck_rows = resolve_stuck(&self.rows, &self.sticky_rows, self.window.y);
        let stuck_cols = resolve_stuck(&self.cols, &self.sticky_cols, self.window.x);

        let record = ChangeRecord {
            translate,
            range: (previous != Some(range)).then_some(range),
            stuck_rows: changed(self.stuck_rows.as_ref(), &stuck_rows)
                .then(|| stuck_rows.clone()),
            stuck_cols: changed(self.stuck_cols.as_ref(), &stuck_cols)
                .then(|| stuck_cols.clone()),
        };
        tracing::trace!(?range, ?translate, "recomputed");

        self.range = Some(range);
        self.translate = translate;
        self.stuck_rows = Some(stuck_rows);
        self.stuck_cols = Some(stuck_cols);
        record
    }

    fn clamp_window(&mut self) {
        let max = self.max_scroll();
        self.window.x = clamp_offset(self.window.x, max.x);
        self.window.y = clamp_offset(self.window.y, max.y);
    }

    /// Largest valid scroll offset per axis
    pub fn max_scroll(&self) -> Point {
        Point::new(
            (self.cols.total_extent() - self.window.width).max(0.0),
            (self.rows.total_extent() - self.window.height).max(0.0),
        )
    }

    /// Total content extent
    pub fn grid_size(&self) -> GridSize {
        GridSize {
            width: self.cols.total_extent(),
            height: self.rows.total_extent(),
        }
    }

    pub fn window_rect(&self) -> WindowRect {
        self.window
    }

    pub fn scrollability(&self) -> Scrollability {
        Scrollability {
            horizontal: self.cols.total_extent() > self.window.width,
            vertical: self.rows.total_extent() > self.window.height,
        }
    }

    /// Range from the latest recompute (empty before the first one)
    pub fn range(&self) -> CellRange {
        self.range.unwrap_or_default()
    }

    /// Translation from the latest recompute
    pub fn translate(&self) -> Point {
        self.translate
    }

    /// Stuck map from the latest recompute
    pub fn stuck(&self, axis: Axis) -> Option<&StuckMap> {
        match axis {
            Axis::Row => self.stuck_rows.as_ref(),
            Axis::Column => self.stuck_cols.as_ref(),
        }
    }

    /// Resolved size of one row or column
    pub fn axis_size(&self, axis: Axis, index: u32) -> Option<AxisSize> {
        self.positions(axis).size(index)
    }

    /// Get cell bounds in content coordinates, honoring spans.
    pub fn cell_rect(&self, row: u32, col: u32) -> CellRect {
        let x = self.cols.offset(col);
        let y = self.rows.offset(row);
        let mut width = self.cols.extent(col);
        let mut height = self.rows.extent(row);

        if let Some(span) = self
            .spans
            .covering(row, col, &self.rows, &self.cols, &self.window)
        {
            if !span.is_anchor(row, col) {
                return CellRect {
                    x,
                    y,
                    width,
                    height,
                    skip: true,
                };
            }
            width = self.cols.span_extent(col, span.cols);
            height = self.rows.span_extent(row, span.rows);
        }

        CellRect {
            x,
            y,
            width,
            height,
            skip: false,
        }
    }

    /// Cell under a content-coordinate point, redirected to a span's anchor.
    pub fn cell_at(&self, x: f64, y: f64) -> Option<(u32, u32)> {
        let row = self.rows.index_at(y)?;
        let col = self.cols.index_at(x)?;
        match self
            .spans
            .covering(row, col, &self.rows, &self.cols, &self.window)
        {
            Some(span) => Some((span.row, span.col)),
            None => Some((row, col)),
        }
    }

    /// Cells to draw for the current range.
    ///
    /// Cells covered by a span are left out; a span's anchor is included
    /// even when it lies outside the range, as long as the span reaches
    /// into it.
    pub fn render_cells(&self) -> Vec<RenderCell> {
        let range = self.range();
        if range.is_empty() {
            return Vec::new();
        }
        let mut cells: Vec<RenderCell> =
            Vec::with_capacity(range.num_rows as usize * range.num_cols as usize);

        // A span anchored above or left of the range reaches into it
        // through the range's top row or left column
        let mut outside: Vec<(u32, u32)> = Vec::new();
        let top_row = range.cols().map(|col| (range.row, col));
        let left_col = range.rows().map(|row| (row, range.col));
        for (row, col) in top_row.chain(left_col) {
            let Some(span) = self
                .spans
                .covering(row, col, &self.rows, &self.cols, &self.window)
            else {
                continue;
            };
            let anchor = (span.row, span.col);
            if !range.contains(span.row, span.col) && !outside.contains(&anchor) {
                outside.push(anchor);
            }
        }
        for (row, col) in outside {
            // Skip anchors hidden under a newer overlapping span
            let rect = self.cell_rect(row, col);
            if !rect.skip {
                cells.push(render_cell(row, col, rect));
            }
        }

        for row in range.rows() {
            for col in range.cols() {
                let rect = self.cell_rect(row, col);
                if !rect.skip {
                    cells.push(render_cell(row, col, rect));
                }
            }
        }
        cells
    }
}

fn render_cell(row: u32, col: u32, rect: CellRect) -> RenderCell {
    RenderCell {
        row,
        col,
        x: rect.x,
        y: rect.y,
        width: rect.width,
        height: rect.height,
    }
}

fn changed(previous: Option<&StuckMap>, current: &StuckMap) -> bool {
    previous.map_or(true, |p| !p.same_members(current))
}

fn sanitize_extent(v: f64) -> f64 {
    if v.is_finite() {
        v.max(0.0)
    } else {
        0.0
    }
}

fn clamp_offset(v: f64, max: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, max)
    }
}

/// First index and count to materialize on one axis, overscan included.
fn axis_window(
    axis: &AxisPositions,
    seed: u32,
    offset: f64,
    extent: f64,
    overscan: u32,
    estimate: f64,
    strategy: super::SearchStrategy,
) -> (u32, u32) {
    let end = offset + extent;
    let Some((first, last)) = visible_span(axis, seed, offset, end, strategy) else {
        return (0, 0);
    };
    let last = cap_unmeasured(axis, first, last, end, estimate);
    let last_index = axis.len().saturating_sub(1);
    let first = first.saturating_sub(overscan);
    let last = last.saturating_add(overscan).min(last_index);
    (first, last - first + 1)
}

/// Scroll offset that brings `index` into `[offset, offset + extent)`.
fn reveal(axis: &AxisPositions, index: u32, offset: f64, extent: f64) -> f64 {
    let Some(last_index) = axis.len().checked_sub(1) else {
        return offset;
    };
    let Some(position) = axis.get(index.min(last_index)) else {
        return offset;
    };
    if position.offset < offset || position.extent() > extent {
        position.offset
    } else if position.end() > offset + extent {
        position.end() - extent
    } else {
        offset
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]
mod tests {
    use super::*;
    use crate::pacer::ManualClock;

    fn engine(rows: u32, cols: u32) -> (LayoutEngine<ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        let mut engine = LayoutEngine::with_clock(EngineConfig::default(), clock.clone());
        engine.set_axis_positions(Axis::Row, AxisPositions::uniform(rows, 40.0));
        engine.set_axis_positions(Axis::Column, AxisPositions::uniform(cols, 100.0));
        engine.set_viewport_size(800.0, 500.0);
        (engine, clock)
    }

    #[test]
    fn test_initial_range() {
        let (engine, _) = engine(1000, 50);
        let range = engine.range();
        assert_eq!(range.row, 0);
        // Rows 0..=12 visible, plus 2 overscan
        assert_eq!(range.num_rows, 15);
        assert_eq!(range.col, 0);
        // Column 7 ends exactly at the right edge
        assert_eq!(range.num_cols, 10);
    }

    #[test]
    fn test_translate_includes_overscan() {
        let (mut engine, clock) = engine(1000, 50);
        clock.advance(20.0);
        let record = engine.move_window_absolute(0.0, 410.0).unwrap();
        // First visible row is 10, first rendered row is 8 at y=320
        assert_eq!(record.range.unwrap().row, 8);
        assert_eq!(record.translate, Point::new(0.0, 320.0 - 410.0));
    }

    #[test]
    fn test_unforced_recompute_is_paced() {
        let (mut engine, clock) = engine(1000, 50);
        clock.advance(5.0);
        assert!(engine.move_window_by(0.0, 400.0).is_none());
        assert_eq!(engine.window_rect().y, 400.0);
        clock.advance(15.0);
        let record = engine.move_window_by(0.0, 0.0).unwrap();
        assert_eq!(record.range.unwrap().row, 8);
    }

    #[test]
    fn test_clamping() {
        let (mut engine, clock) = engine(100, 5);
        clock.advance(20.0);
        engine.move_window_absolute(-50.0, 1e9);
        let window = engine.window_rect();
        assert_eq!(window.x, 0.0);
        assert_eq!(window.y, 4000.0 - 500.0);
        assert_eq!(engine.max_scroll(), Point::new(0.0, 3500.0));
    }

    #[test]
    fn test_nan_offset_resets_to_zero() {
        let (mut engine, _) = engine(100, 50);
        engine.set_scroll_position(f64::NAN, 250.0);
        assert_eq!(engine.scroll_position(), Point::new(0.0, 250.0));
    }

    #[test]
    fn test_empty_grid() {
        let mut engine = LayoutEngine::with_clock(EngineConfig::default(), ManualClock::new());
        let record = engine.set_viewport_size(300.0, 300.0);
        assert_eq!(record.range, Some(CellRange::default()));
        assert_eq!(engine.grid_size(), GridSize::default());
        assert_eq!(engine.scrollability(), Scrollability::default());
        assert!(engine.render_cells().is_empty());
    }

    #[test]
    fn test_scroll_to_cell_minimal_move() {
        let (mut engine, _) = engine(1000, 50);
        // Row 20 spans 800..840; bottom-align it
        engine.scroll_to_cell(20, 0);
        assert_eq!(engine.window_rect().y, 840.0 - 500.0);
        // Already visible: no move
        engine.scroll_to_cell(15, 0);
        assert_eq!(engine.window_rect().y, 340.0);
        // Above: top-align
        engine.scroll_to_cell(3, 9);
        assert_eq!(engine.window_rect().y, 120.0);
        assert_eq!(engine.window_rect().x, 1000.0 - 800.0);
    }

    #[test]
    fn test_paging() {
        let (mut engine, clock) = engine(1000, 50);
        clock.advance(20.0);
        engine.page_down();
        assert_eq!(engine.window_rect().y, 500.0);
        clock.advance(20.0);
        engine.page_up();
        clock.advance(20.0);
        engine.page_up();
        assert_eq!(engine.window_rect().y, 0.0);
        clock.advance(20.0);
        engine.scroll_to_bottom();
        assert_eq!(engine.window_rect().y, 40_000.0 - 500.0);
        clock.advance(20.0);
        engine.scroll_to_right();
        assert_eq!(engine.window_rect().x, 5000.0 - 800.0);
        clock.advance(20.0);
        engine.page_left();
        assert_eq!(engine.window_rect().x, 5000.0 - 1600.0);
    }

    #[test]
    fn test_unmeasured_axis_windows_from_the_top() {
        let clock = ManualClock::new();
        let mut engine = LayoutEngine::with_clock(EngineConfig::default(), clock);
        engine.set_axis_sizes(Axis::Row, &vec![AxisSize::Unmeasured; 1000]);
        engine.set_axis_positions(Axis::Column, AxisPositions::uniform(5, 100.0));
        engine.set_viewport_size(500.0, 500.0);
        let range = engine.range();
        assert_eq!(range.row, 0);
        // Twenty 25px estimates fill the viewport, plus 2 overscan
        assert_eq!(engine.config().estimated_row_size, 25.0);
        assert_eq!(range.num_rows, 22);
    }

    #[test]
    fn test_render_cells_include_spans_reaching_in() {
        let (mut engine, clock) = engine(1000, 50);
        engine.add_span(CellSpan::new(5, 0, 10, 2));
        clock.advance(20.0);
        // Rows 8.. rendered; the span anchored at row 5 reaches row 14
        engine.move_window_absolute(0.0, 400.0).unwrap();
        let cells = engine.render_cells();
        let anchor = cells.iter().find(|c| c.row == 5 && c.col == 0).unwrap();
        assert_eq!(anchor.height, 400.0);
        assert_eq!(anchor.width, 200.0);
        assert!(!cells.iter().any(|c| c.row == 9 && c.col == 1));
        assert_eq!(cells.iter().filter(|c| c.row == 5).count(), 1);
    }

    #[test]
    fn test_cell_at_follows_span_anchor() {
        let (mut engine, _) = engine(100, 50);
        engine.add_span(CellSpan::new(2, 2, 2, 2));
        assert_eq!(engine.cell_at(350.0, 130.0), Some((2, 2)));
        assert_eq!(engine.cell_at(50.0, 10.0), Some((0, 0)));
        assert_eq!(engine.cell_at(50.0, 1e7), None);
    }
}
