use serde::{Deserialize, Serialize};

/// How far a merged cell extends along one axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SpanExtent {
    /// A fixed number of rows or columns (0 is treated as 1)
    Count(u32),
    /// Through the last index visible in the current window
    Fill,
}

impl Default for SpanExtent {
    fn default() -> Self {
        Self::Count(1)
    }
}

/// A block of cells rendered as one, anchored at its top-left cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellSpan {
    pub row: u32,
    pub col: u32,
    #[serde(default)]
    pub row_span: SpanExtent,
    #[serde(default)]
    pub col_span: SpanExtent,
}

impl CellSpan {
    /// Span covering a fixed `rows` x `cols` block.
    pub fn new(row: u32, col: u32, rows: u32, cols: u32) -> Self {
        Self {
            row,
            col,
            row_span: SpanExtent::Count(rows),
            col_span: SpanExtent::Count(cols),
        }
    }
}
