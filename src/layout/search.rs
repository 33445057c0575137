//! Viewport-to-index search along one axis.
//!
//! Continuous scrolling moves the window by a handful of rows per event,
//! so the default walks outward from the previous range. Large jumps fall
//! back to binary search once the walk exceeds its step budget.

use serde::{Deserialize, Serialize};

use super::AxisPositions;
use crate::types::AxisSize;

/// Steps a directional walk may take before switching to binary search.
pub const DEFAULT_MAX_SCAN: u32 = 64;

/// How the engine finds the indices straddling the window edges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum SearchStrategy {
    /// Walk from the previous range only
    Directional,
    /// Binary search every time
    Binary,
    /// Walk from the previous range, binary search after `max_scan` steps
    #[serde(rename_all = "camelCase")]
    Adaptive { max_scan: u32 },
}

impl Default for SearchStrategy {
    fn default() -> Self {
        Self::Adaptive {
            max_scan: DEFAULT_MAX_SCAN,
        }
    }
}

impl SearchStrategy {
    fn budget(self) -> Option<u32> {
        match self {
            Self::Directional => None,
            Self::Binary => Some(0),
            Self::Adaptive { max_scan } => Some(max_scan),
        }
    }
}

/// Inclusive index span covering `[start, end)`, before overscan.
///
/// The first index is the one straddling `start`; the last is the first
/// one whose trailing edge reaches `end`. `None` for an empty axis.
pub fn visible_span(
    axis: &AxisPositions,
    seed: u32,
    start: f64,
    end: f64,
    strategy: SearchStrategy,
) -> Option<(u32, u32)> {
    let last_index = axis.len().checked_sub(1)?;
    let budget = strategy.budget();

    let first = match budget {
        Some(0) => axis.first_ending_after(start)?,
        _ => match walk_to_start(axis, seed.min(last_index), start, budget) {
            Some(i) => i,
            None => axis.first_ending_after(start)?,
        },
    };

    let last = match budget {
        Some(0) => axis.first_reaching(end)?,
        _ => match walk_to_end(axis, first, end, budget) {
            Some(i) => i,
            None => axis.first_reaching(end)?,
        },
    };

    Some((first, last.max(first)))
}

fn walk_to_start(axis: &AxisPositions, seed: u32, start: f64, budget: Option<u32>) -> Option<u32> {
    let last_index = axis.len().checked_sub(1)?;
    let mut i = seed;
    let mut steps: u32 = 0;
    while i > 0 && !axis.ends_before(i - 1, start) {
        i -= 1;
        steps += 1;
        if budget.is_some_and(|b| steps > b) {
            return None;
        }
    }
    while i < last_index && axis.ends_before(i, start) {
        i += 1;
        steps += 1;
        if budget.is_some_and(|b| steps > b) {
            return None;
        }
    }
    Some(i)
}

/// Pull `last` in so unmeasured entries count as `estimate` px each.
///
/// Unmeasured entries take no space in the positions, so without this an
/// axis waiting for measurements would materialize every remaining index.
/// Returns `last` unchanged when the axis is fully measured.
pub fn cap_unmeasured(
    axis: &AxisPositions,
    first: u32,
    last: u32,
    end: f64,
    estimate: f64,
) -> u32 {
    if axis.unmeasured() == 0 || last <= first {
        return last;
    }
    let estimate = if estimate.is_finite() { estimate.max(1.0) } else { 1.0 };
    let mut reach = axis.offset(first);
    let mut i = first;
    while i < last {
        reach += match axis.size(i) {
            Some(AxisSize::Unmeasured) => estimate,
            _ => axis.extent(i),
        };
        if reach >= end {
            break;
        }
        i += 1;
    }
    i
}

fn walk_to_end(axis: &AxisPositions, first: u32, end: f64, budget: Option<u32>) -> Option<u32> {
    let last_index = axis.len().checked_sub(1)?;
    let mut i = first;
    let mut steps: u32 = 0;
    while i < last_index && axis.end(i) < end {
        i += 1;
        steps += 1;
        if budget.is_some_and(|b| steps > b) {
            return None;
        }
    }
    Some(i)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const STRATEGIES: [SearchStrategy; 4] = [
        SearchStrategy::Directional,
        SearchStrategy::Binary,
        SearchStrategy::Adaptive { max_scan: 3 },
        SearchStrategy::Adaptive { max_scan: 64 },
    ];

    #[test]
    fn test_strategies_agree() {
        let sizes: Vec<AxisSize> = (0..500)
            .map(|i| match i % 7 {
                0 => AxisSize::Unmeasured,
                n => AxisSize::Measured(f64::from(n) * 6.0),
            })
            .collect();
        let axis = AxisPositions::build(&sizes);
        for seed in [0, 17, 250, 499] {
            for start in [0.0, 35.5, 400.0, 7000.0, 10_400.0] {
                let expected =
                    visible_span(&axis, seed, start, start + 300.0, SearchStrategy::Binary);
                for strategy in STRATEGIES {
                    assert_eq!(
                        visible_span(&axis, seed, start, start + 300.0, strategy),
                        expected,
                        "seed {seed} start {start} {strategy:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_boundary_row_is_not_visible() {
        let axis = AxisPositions::uniform(100, 40.0);
        // Row 4 ends exactly at 200, so the first visible row is 5
        assert_eq!(
            visible_span(&axis, 0, 200.0, 300.0, SearchStrategy::Directional),
            Some((5, 7))
        );
    }

    #[test]
    fn test_unmeasured_axis_starts_at_first_index() {
        let axis = AxisPositions::build(&vec![AxisSize::Unmeasured; 1000]);
        for strategy in STRATEGIES {
            let (first, last) = visible_span(&axis, 0, 0.0, 500.0, strategy).unwrap();
            assert_eq!(first, 0, "{strategy:?}");
            assert_eq!(cap_unmeasured(&axis, first, last, 500.0, 25.0), 19);
        }
        // Seeded from a later index, the walk comes back to the head
        let (first, _) =
            visible_span(&axis, 700, 0.0, 500.0, SearchStrategy::Directional).unwrap();
        assert_eq!(first, 0);
    }

    #[test]
    fn test_cap_counts_measured_sizes() {
        let mut sizes = vec![AxisSize::Measured(100.0); 3];
        sizes.extend(vec![AxisSize::Unmeasured; 100]);
        let axis = AxisPositions::build(&sizes);
        let (first, last) = visible_span(&axis, 0, 0.0, 500.0, SearchStrategy::default()).unwrap();
        assert_eq!(last, 102);
        // 300px measured, then 200px of 50px estimates
        assert_eq!(cap_unmeasured(&axis, first, last, 500.0, 50.0), 6);
        // Fully measured axes are left alone
        let measured = AxisPositions::uniform(10, 10.0);
        assert_eq!(cap_unmeasured(&measured, 0, 9, 50.0, 50.0), 9);
    }

    #[test]
    fn test_empty_axis_has_no_span() {
        let axis = AxisPositions::default();
        assert_eq!(
            visible_span(&axis, 0, 0.0, 100.0, SearchStrategy::default()),
            None
        );
    }

    #[test]
    fn test_strategy_json_shape() {
        let strategy: SearchStrategy =
            serde_json::from_str(r#"{"kind": "adaptive", "maxScan": 12}"#).unwrap();
        assert_eq!(strategy, SearchStrategy::Adaptive { max_scan: 12 });
    }
}
