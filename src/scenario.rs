//! Scripted replays of grid interaction.
//!
//! A scenario describes a grid, a viewport and a list of steps. Replaying
//! it drives a [`GridModel`] on a manual clock, one frame per step, and
//! records what the engine reported after each step.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::EngineConfig;
use crate::error::{GridError, Result};
use crate::layout::{AxisLayout, ChangeRecord, GridModel};
use crate::pacer::ManualClock;
use crate::types::{Axis, CellRange, CellSpan, ItemSize, SizeSpec, WindowRect};

/// Default time between replayed steps (one 60Hz frame)
pub const DEFAULT_FRAME_MS: f64 = 16.0;

/// Serializable form of [`SizeSpec`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SizeDef {
    Fixed(f64),
    Flex { flex: f64, min: f64 },
    Natural,
    /// One entry per index; indices past the list are `natural`
    List(Vec<ItemSize>),
}

impl From<SizeDef> for SizeSpec {
    fn from(def: SizeDef) -> Self {
        match def {
            SizeDef::Fixed(px) => Self::Fixed(px),
            SizeDef::Flex { flex, min } => Self::Flex { flex, min },
            SizeDef::Natural => Self::Natural,
            SizeDef::List(items) => {
                let items = Arc::new(items);
                Self::by_index(move |index| {
                    items
                        .get(index as usize)
                        .copied()
                        .unwrap_or(ItemSize::Natural)
                })
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AxisDef {
    pub count: u32,
    pub size: SizeDef,
    /// Sizes already measured, keyed by index
    #[serde(default)]
    pub measured: BTreeMap<u32, f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportDef {
    pub width: f64,
    pub height: f64,
}

/// One replayed interaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Step {
    ScrollBy { dx: f64, dy: f64 },
    ScrollTo { x: f64, y: f64 },
    ScrollToCell { row: u32, col: u32 },
    PageUp,
    PageDown,
    Top,
    Bottom,
    Resize { width: f64, height: f64 },
    Measure { axis: Axis, index: u32, size: f64 },
    /// Let time pass without input
    Wait { ms: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    #[serde(default)]
    pub config: EngineConfig,
    pub rows: AxisDef,
    pub cols: AxisDef,
    pub viewport: ViewportDef,
    #[serde(default)]
    pub sticky_rows: Vec<u32>,
    #[serde(default)]
    pub sticky_cols: Vec<u32>,
    #[serde(default)]
    pub spans: Vec<CellSpan>,
    #[serde(default)]
    pub steps: Vec<Step>,
    #[serde(default = "default_frame_ms")]
    pub frame_ms: f64,
}

fn default_frame_ms() -> f64 {
    DEFAULT_FRAME_MS
}

/// What the engine reported after one step
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepOutcome {
    pub step: usize,
    /// `None` when the step was paced out or changed nothing to recompute
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<ChangeRecord>,
    pub window: WindowRect,
    pub range: CellRange,
}

impl Scenario {
    /// Parse a scenario from JSON.
    ///
    /// # Errors
    /// Returns an error if the JSON is malformed or the frame time is not positive.
    pub fn from_json(json: &str) -> Result<Self> {
        let scenario: Self = serde_json::from_str(json)?;
        if !(scenario.frame_ms.is_finite() && scenario.frame_ms > 0.0) {
            return Err(GridError::Scenario(format!(
                "frameMs must be positive, got {}",
                scenario.frame_ms
            )));
        }
        tracing::debug!(
            rows = scenario.rows.count,
            cols = scenario.cols.count,
            steps = scenario.steps.len(),
            "loaded scenario"
        );
        Ok(scenario)
    }

    /// Build the grid described by the scenario, before any steps.
    pub fn build(&self, clock: ManualClock) -> GridModel<ManualClock> {
        let rows = axis_layout(&self.rows);
        let cols = axis_layout(&self.cols);
        let mut grid = GridModel::with_clock(rows, cols, self.config.clone(), clock);
        grid.set_sticky(Axis::Row, self.sticky_rows.iter().copied());
        grid.set_sticky(Axis::Column, self.sticky_cols.iter().copied());
        for span in &self.spans {
            grid.add_span(*span);
        }
        grid.set_viewport_size(self.viewport.width, self.viewport.height);
        grid
    }

    /// Replay every step, one frame apart.
    ///
    /// The first outcome (step 0) is the initial layout.
    pub fn run(&self) -> Vec<StepOutcome> {
        let clock = ManualClock::new();
        let mut grid = self.build(clock.clone());
        let mut outcomes = Vec::with_capacity(self.steps.len() + 1);
        let initial = grid.flush();
        outcomes.push(outcome(0, Some(initial), &grid));

        for (i, step) in self.steps.iter().enumerate() {
            clock.advance(self.frame_ms);
            let record = apply(&mut grid, &clock, step);
            outcomes.push(outcome(i + 1, record, &grid));
        }
        outcomes
    }
}

fn axis_layout(def: &AxisDef) -> AxisLayout {
    let mut layout = AxisLayout::new(def.size.clone().into(), def.count);
    for (&index, &px) in &def.measured {
        layout.set_override(index, px);
    }
    layout
}

fn apply(
    grid: &mut GridModel<ManualClock>,
    clock: &ManualClock,
    step: &Step,
) -> Option<ChangeRecord> {
    match *step {
        Step::ScrollBy { dx, dy } => grid.move_window_by(dx, dy),
        Step::ScrollTo { x, y } => grid.move_window_absolute(x, y),
        Step::ScrollToCell { row, col } => Some(grid.scroll_to_cell(row, col)),
        Step::PageUp => grid.engine_mut().page_up(),
        Step::PageDown => grid.engine_mut().page_down(),
        Step::Top => grid.engine_mut().scroll_to_top(),
        Step::Bottom => grid.engine_mut().scroll_to_bottom(),
        Step::Resize { width, height } => Some(grid.set_viewport_size(width, height)),
        Step::Measure { axis, index, size } => grid.report_size(axis, index, size),
        Step::Wait { ms } => {
            clock.advance(ms.max(0.0));
            grid.engine_mut().recompute(false)
        }
    }
}

fn outcome(
    step: usize,
    record: Option<ChangeRecord>,
    grid: &GridModel<ManualClock>,
) -> StepOutcome {
    StepOutcome {
        step,
        record,
        window: grid.window_rect(),
        range: grid.engine().range(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp, clippy::indexing_slicing)]
mod tests {
    use super::*;

    const SCENARIO: &str = r#"{
        "rows": { "count": 1000, "size": { "fixed": 40 } },
        "cols": { "count": 3, "size": { "flex": { "flex": 1, "min": 80 } } },
        "viewport": { "width": 300, "height": 500 },
        "stickyRows": [5, 10],
        "steps": [
            { "op": "scrollTo", "x": 0, "y": 250 },
            { "op": "scrollToCell", "row": 999, "col": 0 },
            { "op": "measure", "axis": "row", "index": 0, "size": 60 }
        ]
    }"#;

    #[test]
    fn test_replay() {
        let scenario = Scenario::from_json(SCENARIO).unwrap();
        let outcomes = scenario.run();
        assert_eq!(outcomes.len(), 4);
        assert_eq!(outcomes[0].range.num_cols, 3);

        let stuck = outcomes[1].record.as_ref().unwrap().stuck_rows.clone().unwrap();
        assert!(stuck.contains(5));
        assert!(!stuck.contains(10));

        assert_eq!(outcomes[2].window.y, 40_000.0 - 500.0);
        // Measuring row 0 taller pushes the content down by 20px
        assert!(outcomes[3].record.is_some());
    }

    #[test]
    fn test_list_sizes() {
        let spec: SizeSpec = SizeDef::List(vec![ItemSize::Fixed(10.0)]).into();
        assert_eq!(spec.item(0), ItemSize::Fixed(10.0));
        assert_eq!(spec.item(1), ItemSize::Natural);
    }

    #[test]
    fn test_rejects_zero_frame_time() {
        let json = r#"{
            "rows": { "count": 1, "size": "natural" },
            "cols": { "count": 1, "size": "natural" },
            "viewport": { "width": 1, "height": 1 },
            "frameMs": 0
        }"#;
        assert!(matches!(
            Scenario::from_json(json),
            Err(GridError::Scenario(_))
        ));
    }
}
