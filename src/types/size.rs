use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Size of a single row or column before resolution
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ItemSize {
    /// Exact pixel size
    Fixed(f64),
    /// Share of the leftover extent, never below `min` once distributed
    Flex { flex: f64, min: f64 },
    /// Unknown until the host renders and measures the content
    Natural,
}

/// Per-index size callback used by [`SizeSpec::ByIndex`]
pub type SizeFn = Arc<dyn Fn(u32) -> ItemSize + Send + Sync>;

/// Size specification for a whole axis (all rows or all columns)
#[derive(Clone)]
pub enum SizeSpec {
    /// Every index has the same pixel size
    Fixed(f64),
    /// Every index is flexible with the same weight and minimum
    Flex { flex: f64, min: f64 },
    /// Every index is measured from content
    Natural,
    /// Size decided per index
    ByIndex(SizeFn),
}

impl SizeSpec {
    /// Build a per-index spec from a closure.
    pub fn by_index(f: impl Fn(u32) -> ItemSize + Send + Sync + 'static) -> Self {
        Self::ByIndex(Arc::new(f))
    }

    /// Item size for `index` under this spec.
    pub fn item(&self, index: u32) -> ItemSize {
        match self {
            Self::Fixed(px) => ItemSize::Fixed(*px),
            Self::Flex { flex, min } => ItemSize::Flex {
                flex: *flex,
                min: *min,
            },
            Self::Natural => ItemSize::Natural,
            Self::ByIndex(f) => f(index),
        }
    }
}

impl From<ItemSize> for SizeSpec {
    fn from(item: ItemSize) -> Self {
        match item {
            ItemSize::Fixed(px) => Self::Fixed(px),
            ItemSize::Flex { flex, min } => Self::Flex { flex, min },
            ItemSize::Natural => Self::Natural,
        }
    }
}

impl fmt::Debug for SizeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(px) => f.debug_tuple("Fixed").field(px).finish(),
            Self::Flex { flex, min } => f
                .debug_struct("Flex")
                .field("flex", flex)
                .field("min", min)
                .finish(),
            Self::Natural => f.write_str("Natural"),
            Self::ByIndex(_) => f.write_str("ByIndex(..)"),
        }
    }
}

/// Resolved size of one row or column
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AxisSize {
    /// Known pixel size
    Measured(f64),
    /// `Natural` entry the host has not measured yet
    Unmeasured,
}

impl AxisSize {
    /// Extent this entry occupies on its axis (0 until measured).
    pub fn extent(self) -> f64 {
        match self {
            Self::Measured(px) if px.is_finite() => px.max(0.0),
            _ => 0.0,
        }
    }

    pub fn is_measured(self) -> bool {
        matches!(self, Self::Measured(_))
    }
}

/// Measured sizes reported by the host for individual indices.
///
/// Grows as the host measures `Natural` content; cleared when the
/// underlying data changes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SizeOverrides {
    sizes: HashMap<u32, f64>,
}

impl SizeOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, index: u32) -> Option<f64> {
        self.sizes.get(&index).copied()
    }

    /// Record a measured size. Returns true if the stored value changed.
    pub fn set(&mut self, index: u32, px: f64) -> bool {
        let px = if px.is_finite() { px.max(0.0) } else { 0.0 };
        match self.sizes.insert(index, px) {
            Some(old) => (old - px).abs() > f64::EPSILON,
            None => true,
        }
    }

    /// Drop overrides at or beyond `count`. Returns true if any were removed.
    pub fn truncate(&mut self, count: u32) -> bool {
        let before = self.sizes.len();
        self.sizes.retain(|&index, _| index < count);
        self.sizes.len() != before
    }

    /// Forget every measurement. Returns true if there was anything to forget.
    pub fn clear(&mut self) -> bool {
        let had_any = !self.sizes.is_empty();
        self.sizes.clear();
        had_any
    }

    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_by_index_spec() {
        let spec = SizeSpec::by_index(|i| {
            if i == 0 {
                ItemSize::Fixed(30.0)
            } else {
                ItemSize::Natural
            }
        });
        assert_eq!(spec.item(0), ItemSize::Fixed(30.0));
        assert_eq!(spec.item(7), ItemSize::Natural);
    }

    #[test]
    fn test_unmeasured_has_no_extent() {
        assert_eq!(AxisSize::Unmeasured.extent(), 0.0);
        assert_eq!(AxisSize::Measured(-5.0).extent(), 0.0);
        assert_eq!(AxisSize::Measured(12.5).extent(), 12.5);
    }

    #[test]
    fn test_overrides_report_changes() {
        let mut overrides = SizeOverrides::new();
        assert!(overrides.set(3, 40.0));
        assert!(!overrides.set(3, 40.0));
        assert!(overrides.set(3, 44.0));
        assert!(overrides.set(9, 10.0));
        assert!(overrides.truncate(5));
        assert_eq!(overrides.len(), 1);
        assert!(overrides.clear());
        assert!(!overrides.clear());
    }

    #[test]
    fn test_item_size_json_shape() {
        let items: Vec<ItemSize> =
            serde_json::from_str(r#"[{"fixed": 40}, {"flex": {"flex": 1, "min": 80}}, "natural"]"#)
                .unwrap();
        assert_eq!(
            items,
            vec![
                ItemSize::Fixed(40.0),
                ItemSize::Flex {
                    flex: 1.0,
                    min: 80.0
                },
                ItemSize::Natural
            ]
        );
    }
}
