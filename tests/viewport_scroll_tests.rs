//! Viewport and scroll coordinate tests
//!
//! Tests for verifying scroll position, visible row/column windows,
//! scroll-to-row/column commands and frozen bands.

#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

mod common;

use common::{body_config, numbered_rows, record, uniform_grid};
use test_case::test_case;
use vgrid::{Column, EventKind, Grid, GridEvent, Position};

// ============================================================================
// Large dataset windows
// ============================================================================

#[test]
fn test_ten_thousand_rows_middle_window() {
    let mut grid = uniform_grid(10_000, 1, 30.0, 600.0);
    assert_eq!(grid.viewport().height, 600.0);

    assert!(grid.scroll_y_to(150_000.0));
    assert_eq!(grid.scroll_y(), 150_000.0);
    assert_eq!(grid.visible_rows().scrolling, 5000..5020);
}

#[test]
fn test_ten_thousand_rows_scroll_past_end_clamps() {
    let mut grid = uniform_grid(10_000, 1, 30.0, 600.0);

    grid.scroll_y_to(300_000.0);
    assert_eq!(grid.scroll_y(), 299_400.0);
    assert_eq!(grid.visible_rows().scrolling, 9980..10_000);
}

#[test_case(0.0, 0..20 ; "top")]
#[test_case(15.0, 0..21 ; "half row partially visible at both edges")]
#[test_case(30.0, 1..21 ; "exactly one row down")]
#[test_case(150_000.0, 5000..5020 ; "middle")]
#[test_case(1.0e9, 9980..10_000 ; "beyond the end")]
#[test_case(-500.0, 0..20 ; "negative clamps to top")]
fn test_visible_window_at(scroll: f32, expected: std::ops::Range<usize>) {
    let mut grid = uniform_grid(10_000, 1, 30.0, 600.0);
    grid.scroll_y_to(scroll);
    assert_eq!(grid.visible_rows().scrolling, expected);
}

#[test]
fn test_content_shorter_than_viewport() {
    let mut grid = uniform_grid(5, 1, 30.0, 600.0);
    assert!(!grid.scroll_y_to(100.0));
    assert_eq!(grid.scroll_y(), 0.0);
    assert_eq!(grid.visible_rows().scrolling, 0..5);
}

#[test]
fn test_empty_grid_has_empty_window() {
    let mut grid = uniform_grid(0, 1, 30.0, 600.0);
    assert!(grid.visible_rows().scrolling.is_empty());
    assert!(!grid.scroll_to_row_index(3));
    assert_eq!(grid.get_position_for_row_index(3), Position::default());
}

// ============================================================================
// Scroll commands
// ============================================================================

#[test]
fn test_scroll_to_row_index_moves_minimally() {
    let mut grid = uniform_grid(100, 1, 30.0, 600.0);

    // Already visible
    assert!(!grid.scroll_to_row_index(5));
    assert_eq!(grid.scroll_y(), 0.0);

    // Below the window: bottom-aligned
    assert!(grid.scroll_to_row_index(30));
    assert_eq!(grid.scroll_y(), 330.0);

    // Above the window: top-aligned
    assert!(grid.scroll_to_row_index(2));
    assert_eq!(grid.scroll_y(), 60.0);
}

#[test]
fn test_scroll_to_row_index_clamps_to_last_row() {
    let mut grid = uniform_grid(100, 1, 30.0, 600.0);
    assert!(grid.scroll_to_row_index(10_000));
    assert_eq!(grid.scroll_y(), 2400.0);
    assert!(grid.visible_rows().contains(99));
}

#[test]
fn test_scroll_to_row_key() {
    let mut grid = uniform_grid(100, 1, 30.0, 600.0);
    assert!(grid.scroll_to_row_key("42"));
    assert_eq!(grid.scroll_y(), 690.0);
    assert!(grid.visible_rows().contains(42));

    assert!(!grid.scroll_to_row_key("missing"));
    assert_eq!(grid.scroll_y(), 690.0);
}

#[test]
fn test_scroll_to_col_key() {
    let mut grid = uniform_grid(10, 20, 30.0, 600.0);
    // 800px wide body, column 15 spans 1500..1600
    assert!(grid.scroll_to_col_key("c15"));
    assert_eq!(grid.scroll_x(), 800.0);
    assert!(!grid.scroll_to_col_key("nope"));
}

#[test]
fn test_scroll_by_accumulates_and_clamps() {
    let mut grid = uniform_grid(100, 1, 30.0, 600.0);
    assert!(grid.scroll_by(0.0, 120.0));
    assert!(grid.scroll_by(0.0, 120.0));
    assert_eq!(grid.scroll_y(), 240.0);
    grid.scroll_by(0.0, 1.0e6);
    assert_eq!(grid.scroll_y(), 2400.0);
    assert!(!grid.scroll_by(0.0, 10.0));
}

#[test]
fn test_horizontal_window() {
    let mut grid = uniform_grid(10, 20, 30.0, 600.0);
    grid.scroll_x_to(250.0);
    assert_eq!(grid.visible_cols().scrolling, 2..11);
    grid.scroll_to(0.0, 0.0);
    assert_eq!(grid.visible_cols().scrolling, 0..8);
}

#[test]
fn test_scroll_emits_event_only_on_movement() {
    let mut grid = uniform_grid(100, 1, 30.0, 600.0);
    let events = record(&mut grid, EventKind::Scroll);

    grid.scroll_y_to(100.0);
    grid.scroll_y_to(100.0);

    let events = events.borrow();
    assert_eq!(events.len(), 1);
    match &events[0] {
        GridEvent::Scroll { x, y } => {
            assert_eq!(*x, 0.0);
            assert_eq!(*y, 100.0);
        }
        other => panic!("unexpected event {other:?}"),
    }
}

// ============================================================================
// Positions and resizing
// ============================================================================

#[test]
fn test_position_for_row_index() {
    let grid = uniform_grid(100, 1, 30.0, 600.0);
    assert_eq!(
        grid.get_position_for_row_index(5),
        Position {
            x: 0.0,
            y: 150.0,
            height: 30.0
        }
    );
    // Clamped to the last row
    assert_eq!(grid.get_position_for_row_index(999).y, 2970.0);
}

#[test]
fn test_row_height_shifts_following_rows() {
    let mut grid = uniform_grid(100, 1, 30.0, 600.0);
    assert!(grid.set_row_height("3", 100.0));
    assert_eq!(grid.get_position_for_row_index(3).height, 100.0);
    assert_eq!(grid.get_position_for_row_index(4).y, 190.0);
    assert_eq!(grid.get_position_for_row_index(2).y, 60.0);
    assert!(!grid.set_row_height("missing", 50.0));
}

#[test]
fn test_resize_reclamps_scroll() {
    let mut grid = uniform_grid(100, 1, 30.0, 600.0);
    grid.scroll_y_to(1.0e6);
    assert_eq!(grid.scroll_y(), 2400.0);

    grid.resize(800.0, 1236.0);
    assert_eq!(grid.viewport().height, 1200.0);
    assert_eq!(grid.scroll_y(), 1800.0);
}

// ============================================================================
// Frozen bands
// ============================================================================

fn frozen_grid(top: usize, bottom: usize) -> Grid {
    let config = vgrid::GridConfig {
        frozen_rows: top,
        frozen_bottom_rows: bottom,
        ..body_config(30.0, 600.0)
    };
    let mut grid = Grid::new(config).unwrap();
    grid.load_columns(vec![Column::new("value", "Value")]).unwrap();
    grid.load_data(&numbered_rows(100)).unwrap();
    grid
}

#[test]
fn test_frozen_top_rows_always_drawn() {
    let mut grid = frozen_grid(2, 0);
    grid.scroll_y_to(300.0);

    let window = grid.visible_rows();
    assert_eq!(window.leading, 0..2);
    assert_eq!(window.scrolling, 12..30);
    assert!(window.trailing.is_empty());
}

#[test]
fn test_frozen_bottom_rows_reduce_scroll_range() {
    let mut grid = frozen_grid(0, 2);
    grid.scroll_y_to(1.0e6);
    // 98 scrolling rows in a 540px region
    assert_eq!(grid.scroll_y(), 98.0 * 30.0 - 540.0);
    assert_eq!(grid.visible_rows().trailing, 98..100);
}

#[test]
fn test_scroll_to_frozen_row_is_noop() {
    let mut grid = frozen_grid(2, 0);
    grid.scroll_y_to(300.0);
    assert!(!grid.scroll_to_row_index(1));
    assert_eq!(grid.scroll_y(), 300.0);
}
