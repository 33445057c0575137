//! Merged-cell (span) bookkeeping.

use std::collections::HashMap;

use super::AxisPositions;
use crate::types::{CellSpan, SpanExtent, WindowRect};

/// Span resolved against the current axes and window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedSpan {
    /// Row of the anchor (top-left) cell
    pub row: u32,
    /// Column of the anchor (top-left) cell
    pub col: u32,
    /// Number of rows covered (at least 1)
    pub rows: u32,
    /// Number of columns covered (at least 1)
    pub cols: u32,
}

impl ResolvedSpan {
    pub fn contains(&self, row: u32, col: u32) -> bool {
        row >= self.row
            && col >= self.col
            && row - self.row < self.rows
            && col - self.col < self.cols
    }

    pub fn is_anchor(&self, row: u32, col: u32) -> bool {
        row == self.row && col == self.col
    }
}

/// Fixed-count spans covering at most this many cells are indexed per cell
const INDEXED_CELL_LIMIT: u64 = 4096;

/// Declared spans, one per anchor cell
///
/// Declaring a second span at the same anchor replaces the first. Spans
/// that overlap each other are not rejected; lookups prefer the most
/// recently declared span.
///
/// Fixed-count spans are indexed by every cell they cover, so a lookup is
/// a hash probe. `Fill` spans and very large spans depend on the window
/// or would bloat the index; those are resolved on each lookup.
#[derive(Debug, Clone, Default)]
pub struct SpanMap {
    /// Declaration order; a slot's position is its age
    spans: Vec<CellSpan>,
    anchors: HashMap<(u32, u32), usize>,
    /// Covered cell -> slot of the newest indexed span covering it
    cells: HashMap<(u32, u32), usize>,
    /// Slots resolved on lookup, ascending
    unindexed: Vec<usize>,
}

impl SpanMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a span. Returns the span it replaced at the same anchor, if any.
    pub fn insert(&mut self, span: CellSpan) -> Option<CellSpan> {
        let key = (span.row, span.col);
        if let Some(&slot) = self.anchors.get(&key) {
            // Move to the back so it counts as the newest declaration
            let previous = self.spans.remove(slot);
            self.spans.push(span);
            self.reindex();
            return Some(previous);
        }
        let slot = self.spans.len();
        self.anchors.insert(key, slot);
        self.spans.push(span);
        self.index_slot(slot, span);
        None
    }

    fn reindex(&mut self) {
        self.anchors.clear();
        self.cells.clear();
        self.unindexed.clear();
        let spans = std::mem::take(&mut self.spans);
        for (slot, span) in spans.iter().enumerate() {
            self.anchors.insert((span.row, span.col), slot);
            self.index_slot(slot, *span);
        }
        self.spans = spans;
    }

    fn index_slot(&mut self, slot: usize, span: CellSpan) {
        let (SpanExtent::Count(rows), SpanExtent::Count(cols)) = (span.row_span, span.col_span)
        else {
            self.unindexed.push(slot);
            return;
        };
        let (rows, cols) = (rows.max(1), cols.max(1));
        if u64::from(rows) * u64::from(cols) > INDEXED_CELL_LIMIT {
            self.unindexed.push(slot);
            return;
        }
        for row in span.row..span.row.saturating_add(rows) {
            for col in span.col..span.col.saturating_add(cols) {
                self.cells.insert((row, col), slot);
            }
        }
    }

    pub fn clear(&mut self) {
        self.spans.clear();
        self.anchors.clear();
        self.cells.clear();
        self.unindexed.clear();
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CellSpan> {
        self.spans.iter()
    }

    pub fn anchored_at(&self, row: u32, col: u32) -> Option<&CellSpan> {
        self.anchors
            .get(&(row, col))
            .and_then(|&slot| self.spans.get(slot))
    }

    /// Newest span covering `(row, col)`, resolved against the window.
    pub fn covering(
        &self,
        row: u32,
        col: u32,
        rows: &AxisPositions,
        cols: &AxisPositions,
        window: &WindowRect,
    ) -> Option<ResolvedSpan> {
        let resolve = |slot: usize| {
            self.spans
                .get(slot)
                .map(|span| resolve_span(span, rows, cols, window))
                .filter(|resolved| resolved.contains(row, col))
        };
        let mut best = self
            .cells
            .get(&(row, col))
            .and_then(|&slot| resolve(slot).map(|resolved| (slot, resolved)));
        for &slot in self.unindexed.iter().rev() {
            if best.is_some_and(|(newest, _)| newest > slot) {
                break;
            }
            if let Some(resolved) = resolve(slot) {
                best = Some((slot, resolved));
                break;
            }
        }
        best.map(|(_, resolved)| resolved)
    }
}

/// Resolve `Fill` and out-of-range counts into concrete spans.
pub fn resolve_span(
    span: &CellSpan,
    rows: &AxisPositions,
    cols: &AxisPositions,
    window: &WindowRect,
) -> ResolvedSpan {
    ResolvedSpan {
        row: span.row,
        col: span.col,
        rows: span_count(span.row_span, span.row, rows, window.bottom()),
        cols: span_count(span.col_span, span.col, cols, window.right()),
    }
}

fn span_count(extent: SpanExtent, start: u32, axis: &AxisPositions, window_end: f64) -> u32 {
    let remaining = axis.len().saturating_sub(start).max(1);
    match extent {
        SpanExtent::Count(n) => n.clamp(1, remaining),
        SpanExtent::Fill => match axis.first_reaching(window_end) {
            Some(last) if last >= start => (last - start + 1).min(remaining),
            _ => 1,
        },
    }
}
