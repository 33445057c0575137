//! Prefix-sum position index for one grid axis.
//!
//! Positions are computed once per size change, giving O(1) offset lookup
//! by index and O(log n) lookup by offset.

use serde::Serialize;

use crate::types::AxisSize;

/// Placement of one row or column along its axis
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AxisPosition {
    /// Leading edge in content coordinates
    pub offset: f64,
    /// Resolved size (unmeasured entries occupy no space)
    pub size: AxisSize,
}

impl AxisPosition {
    pub fn extent(&self) -> f64 {
        self.size.extent()
    }

    /// Trailing edge in content coordinates
    pub fn end(&self) -> f64 {
        self.offset + self.extent()
    }

    /// True if the entry lies wholly before `offset`.
    ///
    /// An empty entry (unmeasured or zero-sized) sitting exactly at
    /// `offset` still reaches it.
    pub fn ends_before(&self, offset: f64) -> bool {
        if self.extent() > 0.0 {
            self.end() <= offset
        } else {
            self.offset < offset
        }
    }
}

/// Ordered positions for every index on one axis
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AxisPositions {
    entries: Vec<AxisPosition>,
    total: f64,
    unmeasured: u32,
}

impl AxisPositions {
    /// Build positions from resolved sizes with a running prefix sum.
    pub fn build(sizes: &[AxisSize]) -> Self {
        let mut entries = Vec::with_capacity(sizes.len());
        let mut offset: f64 = 0.0;
        let mut unmeasured: u32 = 0;
        for &size in sizes {
            entries.push(AxisPosition { offset, size });
            offset += size.extent();
            if size == AxisSize::Unmeasured {
                unmeasured = unmeasured.saturating_add(1);
            }
        }
        Self {
            entries,
            total: offset,
            unmeasured,
        }
    }

    /// Positions for `count` entries of the same pixel size.
    pub fn uniform(count: u32, size: f64) -> Self {
        let sizes = vec![AxisSize::Measured(size); count as usize];
        Self::build(&sizes)
    }

    /// Number of indices on the axis
    pub fn len(&self) -> u32 {
        u32::try_from(self.entries.len()).unwrap_or(u32::MAX)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: u32) -> Option<&AxisPosition> {
        self.entries.get(index as usize)
    }

    /// Leading edge of `index`; indices past the end map to the total extent.
    pub fn offset(&self, index: u32) -> f64 {
        self.get(index).map_or(self.total, |p| p.offset)
    }

    /// Occupied extent of `index` (0 when out of range or unmeasured)
    pub fn extent(&self, index: u32) -> f64 {
        self.get(index).map_or(0.0, AxisPosition::extent)
    }

    /// Trailing edge of `index`
    pub fn end(&self, index: u32) -> f64 {
        self.get(index).map_or(self.total, AxisPosition::end)
    }

    pub fn size(&self, index: u32) -> Option<AxisSize> {
        self.get(index).map(|p| p.size)
    }

    /// Number of entries still waiting for a measurement
    pub fn unmeasured(&self) -> u32 {
        self.unmeasured
    }

    /// True if `index` lies wholly before `offset` (false past the end)
    pub fn ends_before(&self, index: u32, offset: f64) -> bool {
        self.get(index).is_some_and(|p| p.ends_before(offset))
    }

    /// Total extent of the axis (0 for an empty axis)
    pub fn total_extent(&self) -> f64 {
        self.total
    }

    /// Combined extent of `count` consecutive indices starting at `start`.
    pub fn span_extent(&self, start: u32, count: u32) -> f64 {
        let end = start.saturating_add(count).min(self.len());
        (self.offset(end) - self.offset(start)).max(0.0)
    }

    /// Index whose extent contains `offset` (binary search).
    ///
    /// Returns `None` for an empty axis or an offset outside the content.
    pub fn index_at(&self, offset: f64) -> Option<u32> {
        if offset < 0.0 || offset >= self.total {
            return None;
        }
        let i = self.entries.partition_point(|p| p.end() <= offset);
        u32::try_from(i).ok().filter(|&i| i < self.len())
    }

    /// First index not wholly before `offset`, clamped to the last index.
    pub(crate) fn first_ending_after(&self, offset: f64) -> Option<u32> {
        let last = self.len().checked_sub(1)?;
        let i = self.entries.partition_point(|p| p.ends_before(offset));
        Some(u32::try_from(i).unwrap_or(last).min(last))
    }

    /// First index reaching `offset` or beyond, clamped to the last index.
    pub(crate) fn first_reaching(&self, offset: f64) -> Option<u32> {
        let last = self.len().checked_sub(1)?;
        let i = self.entries.partition_point(|p| p.end() < offset);
        Some(u32::try_from(i).unwrap_or(last).min(last))
    }

    pub fn iter(&self) -> impl Iterator<Item = &AxisPosition> {
        self.entries.iter()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_sums() {
        let positions = AxisPositions::build(&[
            AxisSize::Measured(10.0),
            AxisSize::Unmeasured,
            AxisSize::Measured(30.0),
        ]);
        assert_eq!(positions.len(), 3);
        assert_eq!(positions.offset(0), 0.0);
        assert_eq!(positions.offset(1), 10.0);
        assert_eq!(positions.offset(2), 10.0);
        assert_eq!(positions.end(2), 40.0);
        assert_eq!(positions.total_extent(), 40.0);
        assert_eq!(positions.size(1), Some(AxisSize::Unmeasured));
    }

    #[test]
    fn test_empty_axis() {
        let positions = AxisPositions::build(&[]);
        assert!(positions.is_empty());
        assert_eq!(positions.total_extent(), 0.0);
        assert_eq!(positions.index_at(0.0), None);
        assert_eq!(positions.first_ending_after(0.0), None);
    }

    #[test]
    fn test_index_at() {
        let positions = AxisPositions::uniform(10, 20.0);
        assert_eq!(positions.index_at(0.0), Some(0));
        assert_eq!(positions.index_at(19.9), Some(0));
        assert_eq!(positions.index_at(20.0), Some(1));
        assert_eq!(positions.index_at(199.0), Some(9));
        assert_eq!(positions.index_at(200.0), None);
        assert_eq!(positions.index_at(-1.0), None);
    }

    #[test]
    fn test_unmeasured_entries_at_offset_are_not_before_it() {
        let positions = AxisPositions::build(&[AxisSize::Unmeasured; 4]);
        assert_eq!(positions.unmeasured(), 4);
        assert_eq!(positions.first_ending_after(0.0), Some(0));

        let positions = AxisPositions::build(&[
            AxisSize::Measured(20.0),
            AxisSize::Unmeasured,
            AxisSize::Measured(20.0),
        ]);
        // Row 0 ends at 20 and row 1 is empty at 20, so row 1 is first
        assert_eq!(positions.first_ending_after(20.0), Some(1));
        assert_eq!(positions.first_ending_after(25.0), Some(2));
    }

    #[test]
    fn test_span_extent() {
        let positions = AxisPositions::uniform(10, 20.0);
        assert_eq!(positions.span_extent(2, 3), 60.0);
        assert_eq!(positions.span_extent(8, 5), 40.0);
    }
}
