//! Sticky row and column tests
//!
//! Tests for pinning sticky rows/columns at the leading viewport edge,
//! stacking order, contiguity, and when stuck maps are re-emitted.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

use xlgrid::layout::resolve_stuck;
use xlgrid::{Axis, AxisLayout, AxisPositions, EngineConfig, GridModel, ManualClock};

fn grid_with_sticky_rows(sticky: &[u32]) -> GridModel<ManualClock> {
    let mut grid = GridModel::with_clock(
        AxisLayout::fixed(1000, 40.0),
        AxisLayout::fixed(20, 100.0),
        EngineConfig::default(),
        ManualClock::new(),
    );
    grid.set_sticky(Axis::Row, sticky.iter().copied());
    grid.set_viewport_size(800.0, 500.0);
    grid
}

#[test]
fn test_row_pinned_once_scrolled_past() {
    let mut grid = grid_with_sticky_rows(&[5, 10]);
    let record = grid.set_scroll_position(0.0, 250.0);

    let stuck = record.stuck_rows.unwrap();
    let pinned = stuck.get(5).unwrap();
    assert_eq!(pinned.offset, 0.0);
    assert_eq!(pinned.size, 40.0);
    assert!(!stuck.contains(10));
}

#[test]
fn test_next_row_sticks_below_the_stack() {
    let mut grid = grid_with_sticky_rows(&[5, 10]);
    // Row 10 sits at 400; with row 5 pinned it sticks once y passes 360
    let stuck = grid.set_scroll_position(0.0, 361.0).stuck_rows.unwrap();
    assert!(stuck.contains(10));
    assert_eq!(stuck.get(10).unwrap().offset, 40.0);
    assert_eq!(stuck.stack_extent(), 80.0);

    let stuck = grid.set_scroll_position(0.0, 360.0).stuck_rows.unwrap();
    assert!(!stuck.contains(10));
}

#[test]
fn test_later_rows_never_stuck_past_a_gap() {
    // Row 5 is tall, so row 9 trails it by a wide margin
    let sizes: Vec<_> = (0..100)
        .map(|i| xlgrid::AxisSize::Measured(if i == 5 { 400.0 } else { 10.0 }))
        .collect();
    let axis = AxisPositions::build(&sizes);
    let sticky = [2, 5, 9];

    let mut offset = 0.0;
    while offset < 1000.0 {
        let stuck = resolve_stuck(&axis, &sticky, offset);
        if !stuck.contains(5) {
            assert!(!stuck.contains(9), "row 9 stuck without row 5 at {offset}");
        }
        if !stuck.contains(2) {
            assert!(stuck.is_empty(), "rows stuck without row 2 at {offset}");
        }
        offset += 3.0;
    }
}

#[test]
fn test_stuck_rows_only_reported_on_change() {
    let clock = ManualClock::new();
    let mut grid = GridModel::with_clock(
        AxisLayout::fixed(1000, 40.0),
        AxisLayout::fixed(20, 100.0),
        EngineConfig::default(),
        clock.clone(),
    );
    grid.set_sticky(Axis::Row, [5]);
    grid.set_viewport_size(800.0, 500.0);

    clock.advance(20.0);
    let record = grid.move_window_absolute(0.0, 250.0).unwrap();
    assert!(record.stuck_rows.is_some());

    clock.advance(20.0);
    let record = grid.move_window_absolute(0.0, 260.0).unwrap();
    assert!(record.stuck_rows.is_none());

    clock.advance(20.0);
    let record = grid.move_window_absolute(0.0, 0.0).unwrap();
    assert!(record.stuck_rows.unwrap().is_empty());
}

#[test]
fn test_changing_sticky_set_reemits_map() {
    let mut grid = grid_with_sticky_rows(&[5]);
    grid.set_scroll_position(0.0, 250.0);

    grid.set_sticky(Axis::Row, [5, 6]);
    let record = grid.flush();
    let stuck = record.stuck_rows.unwrap();
    assert!(stuck.contains(5));
    assert!(stuck.contains(6));
}

#[test]
fn test_sticky_columns() {
    let mut grid = GridModel::with_clock(
        AxisLayout::fixed(100, 40.0),
        AxisLayout::fixed(50, 100.0),
        EngineConfig::default(),
        ManualClock::new(),
    );
    grid.set_sticky(Axis::Column, [0, 3]);
    grid.set_viewport_size(800.0, 500.0);

    // Column 0 sits at the leading edge and is stuck as soon as x > 0
    let record = grid.set_scroll_position(50.0, 0.0);
    let stuck = record.stuck_cols.unwrap();
    assert!(stuck.contains(0));
    assert!(!stuck.contains(3));
    assert!(grid.engine().stuck(Axis::Row).unwrap().is_empty());
}
