//! Turns axis size specifications into concrete sizes.

use crate::types::{AxisSize, ItemSize, SizeOverrides, SizeSpec};

/// Resolve `count` sizes for one axis.
///
/// Measured overrides replace whatever the spec says for their index and
/// count as fixed space when flex entries are distributed. Flex entries
/// share `available - fixed_total` by weight when every minimum fits,
/// otherwise each takes its minimum and the axis overflows.
pub fn resolve(
    spec: &SizeSpec,
    count: u32,
    available: f64,
    overrides: &SizeOverrides,
) -> Vec<AxisSize> {
    let items: Vec<ItemSize> = (0..count)
        .map(|index| match overrides.get(index) {
            Some(px) => ItemSize::Fixed(px),
            None => spec.item(index),
        })
        .collect();

    let mut fixed_total: f64 = 0.0;
    let mut min_total: f64 = 0.0;
    let mut flex_total: f64 = 0.0;
    let mut has_flex = false;
    for item in &items {
        match *item {
            ItemSize::Fixed(px) => fixed_total += px.max(0.0),
            ItemSize::Flex { flex, min } => {
                has_flex = true;
                min_total += min.max(0.0);
                flex_total += flex.max(0.0);
            }
            ItemSize::Natural => {}
        }
    }

    let per_flex = if has_flex && flex_total > 0.0 && fixed_total + min_total < available {
        Some((available - fixed_total) / flex_total)
    } else {
        None
    };

    items
        .into_iter()
        .map(|item| match item {
            ItemSize::Fixed(px) => AxisSize::Measured(px.max(0.0)),
            ItemSize::Flex { flex, min } => {
                let min = min.max(0.0);
                AxisSize::Measured(match per_flex {
                    Some(per) => (per * flex.max(0.0)).max(min),
                    None => min,
                })
            }
            ItemSize::Natural => AxisSize::Unmeasured,
        })
        .collect()
}

/// Everything needed to resolve one axis: spec, item count and overrides.
#[derive(Debug, Clone)]
pub struct AxisLayout {
    spec: SizeSpec,
    count: u32,
    overrides: SizeOverrides,
}

impl AxisLayout {
    pub fn new(spec: SizeSpec, count: u32) -> Self {
        Self {
            spec,
            count,
            overrides: SizeOverrides::new(),
        }
    }

    /// `count` entries of the same fixed size
    pub fn fixed(count: u32, size: f64) -> Self {
        Self::new(SizeSpec::Fixed(size), count)
    }

    pub fn spec(&self) -> &SizeSpec {
        &self.spec
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn overrides(&self) -> &SizeOverrides {
        &self.overrides
    }

    pub fn set_spec(&mut self, spec: SizeSpec) {
        self.spec = spec;
    }

    /// Change the item count. Returns true if it differs from the current one.
    pub fn set_count(&mut self, count: u32) -> bool {
        if count == self.count {
            return false;
        }
        self.count = count;
        self.overrides.truncate(count);
        true
    }

    /// Record a measured size. Returns true if the axis must be rebuilt.
    pub fn set_override(&mut self, index: u32, px: f64) -> bool {
        index < self.count && self.overrides.set(index, px)
    }

    /// Forget measured sizes after a data change.
    pub fn invalidate_overrides(&mut self) -> bool {
        self.overrides.clear()
    }

    /// True if any entry is flexible, so the sizes depend on the viewport extent.
    pub fn depends_on_extent(&self) -> bool {
        match &self.spec {
            SizeSpec::Fixed(_) | SizeSpec::Natural => false,
            SizeSpec::Flex { .. } => self.overrides.len() < self.count as usize,
            SizeSpec::ByIndex(f) => (0..self.count).any(|index| {
                self.overrides.get(index).is_none() && matches!(f(index), ItemSize::Flex { .. })
            }),
        }
    }

    pub fn resolve(&self, available: f64) -> Vec<AxisSize> {
        resolve(&self.spec, self.count, available, &self.overrides)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn px(sizes: &[AxisSize]) -> Vec<f64> {
        sizes.iter().map(|s| s.extent()).collect()
    }

    #[test]
    fn test_fixed_spec() {
        let sizes = resolve(&SizeSpec::Fixed(40.0), 3, 0.0, &SizeOverrides::new());
        assert_eq!(px(&sizes), vec![40.0, 40.0, 40.0]);
    }

    #[test]
    fn test_flex_even_split() {
        let spec = SizeSpec::Flex {
            flex: 1.0,
            min: 80.0,
        };
        let sizes = resolve(&spec, 3, 300.0, &SizeOverrides::new());
        assert_eq!(px(&sizes), vec![100.0, 100.0, 100.0]);
    }

    #[test]
    fn test_flex_falls_back_to_min_when_cramped() {
        let spec = SizeSpec::Flex {
            flex: 1.0,
            min: 80.0,
        };
        let sizes = resolve(&spec, 3, 200.0, &SizeOverrides::new());
        assert_eq!(px(&sizes), vec![80.0, 80.0, 80.0]);
    }

    #[test]
    fn test_mixed_fixed_and_flex() {
        let spec = SizeSpec::by_index(|i| match i {
            0 => ItemSize::Fixed(100.0),
            1 => ItemSize::Flex {
                flex: 1.0,
                min: 10.0,
            },
            _ => ItemSize::Flex {
                flex: 3.0,
                min: 10.0,
            },
        });
        let sizes = resolve(&spec, 3, 500.0, &SizeOverrides::new());
        assert_eq!(px(&sizes), vec![100.0, 100.0, 300.0]);
    }

    #[test]
    fn test_low_weight_flex_keeps_its_minimum() {
        let spec = SizeSpec::by_index(|i| match i {
            0 => ItemSize::Flex {
                flex: 1.0,
                min: 60.0,
            },
            _ => ItemSize::Flex {
                flex: 9.0,
                min: 10.0,
            },
        });
        // 100 * 1/10 = 10 would undercut the 60px minimum
        let sizes = resolve(&spec, 2, 100.0, &SizeOverrides::new());
        assert_eq!(px(&sizes), vec![60.0, 90.0]);
    }

    #[test]
    fn test_natural_until_measured() {
        let mut overrides = SizeOverrides::new();
        overrides.set(1, 33.0);
        let sizes = resolve(&SizeSpec::Natural, 3, 0.0, &overrides);
        assert_eq!(sizes[0], AxisSize::Unmeasured);
        assert_eq!(sizes[1], AxisSize::Measured(33.0));
        assert_eq!(sizes[2], AxisSize::Unmeasured);
    }

    #[test]
    fn test_override_beats_flex() {
        let mut overrides = SizeOverrides::new();
        overrides.set(0, 50.0);
        let spec = SizeSpec::Flex {
            flex: 1.0,
            min: 0.0,
        };
        let sizes = resolve(&spec, 3, 250.0, &overrides);
        assert_eq!(px(&sizes), vec![50.0, 100.0, 100.0]);
    }

    #[test]
    fn test_axis_layout_change_tracking() {
        let mut axis = AxisLayout::new(SizeSpec::Natural, 4);
        assert!(!axis.depends_on_extent());
        assert!(axis.set_override(2, 18.0));
        assert!(!axis.set_override(2, 18.0));
        assert!(!axis.set_override(9, 18.0));
        assert!(!axis.set_count(4));
        assert!(axis.set_count(2));
        assert!(axis.overrides().is_empty());

        let flex = AxisLayout::new(
            SizeSpec::Flex {
                flex: 1.0,
                min: 0.0,
            },
            2,
        );
        assert!(flex.depends_on_extent());
    }
}
