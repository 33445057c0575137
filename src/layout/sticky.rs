//! Sticky rows and columns pinned at the leading viewport edge.

use serde::Serialize;
use std::collections::BTreeMap;

use super::AxisPositions;

/// Where a stuck row or column is drawn while pinned
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Pinned {
    /// Offset from the viewport's leading edge
    pub offset: f64,
    pub size: f64,
}

/// Sticky indices currently pinned, keyed by index
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct StuckMap(BTreeMap<u32, Pinned>);

impl StuckMap {
    pub fn get(&self, index: u32) -> Option<&Pinned> {
        self.0.get(&index)
    }

    pub fn contains(&self, index: u32) -> bool {
        self.0.contains_key(&index)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &Pinned)> {
        self.0.iter().map(|(&index, pinned)| (index, pinned))
    }

    /// Combined size of the pinned stack
    pub fn stack_extent(&self) -> f64 {
        self.0.values().map(|p| p.size).sum()
    }

    /// True if both maps pin the same set of indices.
    pub fn same_members(&self, other: &Self) -> bool {
        self.0.len() == other.0.len() && self.0.keys().eq(other.0.keys())
    }
}

/// Sort and deduplicate a sticky index set.
pub(crate) fn normalize(indices: impl IntoIterator<Item = u32>) -> Vec<u32> {
    let mut sorted: Vec<u32> = indices.into_iter().collect();
    sorted.sort_unstable();
    sorted.dedup();
    sorted
}

/// Pin sticky indices against the scroll offset.
///
/// Walks `sticky` (sorted ascending) keeping a running stack height. An
/// index is stuck when its position, less the stack already pinned in
/// front of it, has scrolled above `scroll_offset`. The first index that
/// does not qualify ends the walk, so later ones are never pinned past a gap.
pub fn resolve_stuck(axis: &AxisPositions, sticky: &[u32], scroll_offset: f64) -> StuckMap {
    let mut stuck = BTreeMap::new();
    let mut stack: f64 = 0.0;
    for &index in sticky {
        let Some(position) = axis.get(index) else {
            break;
        };
        if position.offset - stack >= scroll_offset {
            break;
        }
        let size = position.extent();
        stuck.insert(
            index,
            Pinned {
                offset: stack,
                size,
            },
        );
        stack += size;
    }
    StuckMap(stuck)
}
