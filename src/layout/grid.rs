//! Host-facing grid model: size specs, measurements and the engine.
//!
//! Rebuilds an axis whenever its spec, item count or measured sizes
//! change, and re-resolves flexible axes when the viewport is resized.

use super::{AxisLayout, ChangeRecord, LayoutEngine, RenderCell};
use crate::config::EngineConfig;
use crate::pacer::{Clock, MonotonicClock};
use crate::types::{Axis, CellSpan, Point, SizeSpec, WindowRect};

pub struct GridModel<C = MonotonicClock> {
    engine: LayoutEngine<C>,
    rows: AxisLayout,
    cols: AxisLayout,
}

impl GridModel<MonotonicClock> {
    pub fn new(rows: AxisLayout, cols: AxisLayout, config: EngineConfig) -> Self {
        Self::with_clock(rows, cols, config, MonotonicClock::new())
    }
}

impl<C: Clock> GridModel<C> {
    pub fn with_clock(rows: AxisLayout, cols: AxisLayout, config: EngineConfig, clock: C) -> Self {
        let mut model = Self {
            engine: LayoutEngine::with_clock(config, clock),
            rows,
            cols,
        };
        model.rebuild(Axis::Row);
        model.rebuild(Axis::Column);
        model
    }

    pub fn engine(&self) -> &LayoutEngine<C> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut LayoutEngine<C> {
        &mut self.engine
    }

    pub fn axis(&self, axis: Axis) -> &AxisLayout {
        match axis {
            Axis::Row => &self.rows,
            Axis::Column => &self.cols,
        }
    }

    fn axis_mut(&mut self, axis: Axis) -> &mut AxisLayout {
        match axis {
            Axis::Row => &mut self.rows,
            Axis::Column => &mut self.cols,
        }
    }

    fn rebuild(&mut self, axis: Axis) -> ChangeRecord {
        let available = self.engine.window_rect().extent(axis);
        let sizes = self.axis(axis).resolve(available);
        self.engine.set_axis_sizes(axis, &sizes)
    }

    pub fn set_size_spec(&mut self, axis: Axis, spec: SizeSpec) -> ChangeRecord {
        self.axis_mut(axis).set_spec(spec);
        self.rebuild(axis)
    }

    /// Change the number of rows or columns. `None` if the count is unchanged.
    pub fn set_count(&mut self, axis: Axis, count: u32) -> Option<ChangeRecord> {
        self.axis_mut(axis)
            .set_count(count)
            .then(|| self.rebuild(axis))
    }

    /// Report the measured size of a rendered row or column.
    ///
    /// Returns `None` when the measurement matches what is already known.
    pub fn report_size(&mut self, axis: Axis, index: u32, px: f64) -> Option<ChangeRecord> {
        self.axis_mut(axis)
            .set_override(index, px)
            .then(|| self.rebuild(axis))
    }

    /// Report several measurements at once, rebuilding the axis at most once.
    pub fn report_sizes(
        &mut self,
        axis: Axis,
        sizes: impl IntoIterator<Item = (u32, f64)>,
    ) -> Option<ChangeRecord> {
        let layout = self.axis_mut(axis);
        let mut changed = false;
        for (index, px) in sizes {
            changed |= layout.set_override(index, px);
        }
        changed.then(|| self.rebuild(axis))
    }

    /// Drop all measurements for an axis after its data changed.
    pub fn invalidate_measurements(&mut self, axis: Axis) -> Option<ChangeRecord> {
        self.axis_mut(axis)
            .invalidate_overrides()
            .then(|| self.rebuild(axis))
    }

    /// Resize the viewport, re-resolving flexible axes whose extent changed.
    pub fn set_viewport_size(&mut self, width: f64, height: f64) -> ChangeRecord {
        let before = self.engine.window_rect();
        let mut record = self.engine.set_viewport_size(width, height);
        let after = self.engine.window_rect();
        for axis in [Axis::Row, Axis::Column] {
            let resized = (after.extent(axis) - before.extent(axis)).abs() > f64::EPSILON;
            if resized && self.axis(axis).depends_on_extent() {
                let rebuilt = self.rebuild(axis);
                record.absorb(rebuilt);
            }
        }
        record
    }

    pub fn set_sticky(&mut self, axis: Axis, indices: impl IntoIterator<Item = u32>) {
        self.engine.set_sticky(axis, indices);
    }

    pub fn add_span(&mut self, span: CellSpan) -> Option<CellSpan> {
        self.engine.add_span(span)
    }

    pub fn clear_spans(&mut self) {
        self.engine.clear_spans();
    }

    pub fn move_window_by(&mut self, dx: f64, dy: f64) -> Option<ChangeRecord> {
        self.engine.move_window_by(dx, dy)
    }

    pub fn move_window_absolute(&mut self, x: f64, y: f64) -> Option<ChangeRecord> {
        self.engine.move_window_absolute(x, y)
    }

    pub fn scroll_to_cell(&mut self, row: u32, col: u32) -> ChangeRecord {
        self.engine.scroll_to_cell(row, col)
    }

    pub fn scroll_position(&self) -> Point {
        self.engine.scroll_position()
    }

    pub fn set_scroll_position(&mut self, x: f64, y: f64) -> ChangeRecord {
        self.engine.set_scroll_position(x, y)
    }

    pub fn flush(&mut self) -> ChangeRecord {
        self.engine.flush()
    }

    pub fn window_rect(&self) -> WindowRect {
        self.engine.window_rect()
    }

    pub fn render_cells(&self) -> Vec<RenderCell> {
        self.engine.render_cells()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::pacer::ManualClock;
    use crate::types::AxisSize;

    fn model(rows: AxisLayout, cols: AxisLayout) -> GridModel<ManualClock> {
        GridModel::with_clock(rows, cols, EngineConfig::default(), ManualClock::new())
    }

    #[test]
    fn test_flex_columns_follow_viewport_width() {
        let cols = AxisLayout::new(
            SizeSpec::Flex {
                flex: 1.0,
                min: 80.0,
            },
            3,
        );
        let mut grid = model(AxisLayout::fixed(10, 20.0), cols);
        grid.set_viewport_size(300.0, 100.0);
        assert_eq!(grid.engine().grid_size().width, 300.0);
        grid.set_viewport_size(600.0, 100.0);
        assert_eq!(grid.engine().grid_size().width, 600.0);
        grid.set_viewport_size(120.0, 100.0);
        assert_eq!(grid.engine().grid_size().width, 240.0);
    }

    #[test]
    fn test_measurements_rebuild_natural_axis() {
        let mut grid = model(
            AxisLayout::new(SizeSpec::Natural, 5),
            AxisLayout::fixed(2, 50.0),
        );
        grid.set_viewport_size(100.0, 100.0);
        assert_eq!(grid.engine().grid_size().height, 0.0);
        assert_eq!(
            grid.engine().axis_size(Axis::Row, 1),
            Some(AxisSize::Unmeasured)
        );

        assert!(grid.report_size(Axis::Row, 1, 30.0).is_some());
        assert!(grid.report_size(Axis::Row, 1, 30.0).is_none());
        let record = grid
            .report_sizes(Axis::Row, [(0, 10.0), (2, 20.0)])
            .unwrap();
        assert!(record.range.is_some());
        assert_eq!(grid.engine().grid_size().height, 60.0);
        assert_eq!(grid.engine().positions(Axis::Row).offset(2), 40.0);

        assert!(grid.invalidate_measurements(Axis::Row).is_some());
        assert_eq!(grid.engine().grid_size().height, 0.0);
    }

    #[test]
    fn test_natural_rows_materialize_a_bounded_head() {
        let mut grid = model(
            AxisLayout::new(SizeSpec::Natural, 1_000_000),
            AxisLayout::fixed(4, 100.0),
        );
        grid.set_viewport_size(400.0, 500.0);
        let range = grid.engine().range();
        assert_eq!(range.row, 0);
        assert_eq!(range.num_rows, 22);

        // 150px measured, the rest of the viewport filled by 25px estimates
        let record = grid
            .report_sizes(Axis::Row, (0..5).map(|i| (i, 30.0)))
            .unwrap();
        let range = record.range.unwrap();
        assert_eq!(range.row, 0);
        assert_eq!(range.num_rows, 5 + 14 + 2);
    }

    #[test]
    fn test_count_change() {
        let mut grid = model(AxisLayout::fixed(10, 20.0), AxisLayout::fixed(2, 50.0));
        grid.set_viewport_size(100.0, 100.0);
        assert!(grid.set_count(Axis::Row, 10).is_none());
        grid.set_count(Axis::Row, 1000).unwrap();
        assert_eq!(grid.engine().grid_size().height, 20_000.0);
    }

    #[test]
    fn test_shrinking_content_reclamps_window() {
        let mut grid = model(AxisLayout::fixed(1000, 20.0), AxisLayout::fixed(2, 50.0));
        grid.set_viewport_size(100.0, 100.0);
        grid.set_scroll_position(0.0, 15_000.0);
        grid.set_count(Axis::Row, 10);
        assert_eq!(grid.scroll_position().y, 100.0);
    }
}
