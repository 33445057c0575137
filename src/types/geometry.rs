use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Grid axis: rows run vertically, columns horizontally
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    Row,
    Column,
}

/// A point or displacement in content coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// The visible window into the content, in content coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WindowRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl WindowRect {
    /// Scroll offset along an axis (`y` for rows, `x` for columns)
    pub fn offset(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Row => self.y,
            Axis::Column => self.x,
        }
    }

    /// Viewport extent along an axis
    pub fn extent(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Row => self.height,
            Axis::Column => self.width,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }
}

/// Materialized rectangle of cell indices, overscan included
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellRange {
    pub row: u32,
    pub col: u32,
    pub num_rows: u32,
    pub num_cols: u32,
}

impl CellRange {
    pub fn is_empty(&self) -> bool {
        self.num_rows == 0 || self.num_cols == 0
    }

    /// Row indices covered by the range
    pub fn rows(&self) -> Range<u32> {
        self.row..self.row.saturating_add(self.num_rows)
    }

    /// Column indices covered by the range
    pub fn cols(&self) -> Range<u32> {
        self.col..self.col.saturating_add(self.num_cols)
    }

    pub fn contains(&self, row: u32, col: u32) -> bool {
        self.rows().contains(&row) && self.cols().contains(&col)
    }
}

/// Total content extent of the grid
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct GridSize {
    pub width: f64,
    pub height: f64,
}

/// Whether the content overflows the viewport on each axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Scrollability {
    pub horizontal: bool,
    pub vertical: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_range_membership() {
        let range = CellRange {
            row: 4,
            col: 2,
            num_rows: 3,
            num_cols: 2,
        };
        assert!(range.contains(4, 2));
        assert!(range.contains(6, 3));
        assert!(!range.contains(7, 3));
        assert!(!range.contains(5, 4));
        assert!(!range.is_empty());
        assert!(CellRange::default().is_empty());
    }
}
