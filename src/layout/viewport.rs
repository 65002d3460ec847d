//! Viewport state management for scrolling.
//!
//! Scroll positions are measured inside the scrolling region of each axis:
//! `scroll_x == 0` puts the first non-frozen column right after the leading
//! frozen band. Both axes clamp to `[0, scrollable_content - scrollable_viewport]`.

use serde::Serialize;
use std::ops::Range;

use super::{to_pixels, GeometryTable};

/// Index window of one axis, split by frozen band.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct VisibleWindow {
    /// Leading frozen indices (always drawn)
    pub leading: Range<usize>,
    /// Scrolling indices intersecting the viewport
    pub scrolling: Range<usize>,
    /// Trailing frozen indices (always drawn)
    pub trailing: Range<usize>,
}

impl VisibleWindow {
    /// All drawn indices in ascending order.
    pub fn indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.leading
            .clone()
            .chain(self.scrolling.clone())
            .chain(self.trailing.clone())
    }

    pub fn contains(&self, index: usize) -> bool {
        self.leading.contains(&index)
            || self.scrolling.contains(&index)
            || self.trailing.contains(&index)
    }
}

/// Viewport state - represents the visible body area of the grid
#[derive(Debug, Clone)]
pub struct Viewport {
    /// Horizontal scroll position inside the scrolling column region
    pub scroll_x: f32,
    /// Vertical scroll position inside the scrolling row region
    pub scroll_y: f32,
    /// Body viewport width in pixels
    pub width: f32,
    /// Body viewport height in pixels
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new()
    }
}

impl Viewport {
    /// Create a new viewport with default values
    pub fn new() -> Self {
        Self {
            scroll_x: 0.0,
            scroll_y: 0.0,
            width: 800.0,
            height: 600.0,
        }
    }

    /// Resize the viewport
    pub fn resize(&mut self, width: f32, height: f32) {
        self.width = width.max(0.0);
        self.height = height.max(0.0);
    }

    /// Width left for scrolling columns once both frozen bands are placed.
    pub fn scrollable_width(&self, cols: &GeometryTable) -> f32 {
        (self.width - to_pixels(cols.leading_size() + cols.trailing_size())).max(0.0)
    }

    /// Height left for scrolling rows once both frozen bands are placed.
    pub fn scrollable_height(&self, rows: &GeometryTable) -> f32 {
        (self.height - to_pixels(rows.leading_size() + rows.trailing_size())).max(0.0)
    }

    pub fn max_scroll_x(&self, cols: &GeometryTable) -> f32 {
        to_pixels(cols.scrollable_size() - f64::from(self.scrollable_width(cols))).max(0.0)
    }

    pub fn max_scroll_y(&self, rows: &GeometryTable) -> f32 {
        to_pixels(rows.scrollable_size() - f64::from(self.scrollable_height(rows))).max(0.0)
    }

    /// Clamp scroll position to valid range.
    pub fn clamp_scroll(&mut self, cols: &GeometryTable, rows: &GeometryTable) {
        self.scroll_x = clamp_axis(self.scroll_x, self.max_scroll_x(cols));
        self.scroll_y = clamp_axis(self.scroll_y, self.max_scroll_y(rows));
    }

    /// Set horizontal scroll. Returns `true` if the position changed.
    pub fn set_scroll_x(&mut self, x: f32, cols: &GeometryTable) -> bool {
        let next = clamp_axis(x, self.max_scroll_x(cols));
        let changed = (next - self.scroll_x).abs() > f32::EPSILON;
        self.scroll_x = next;
        changed
    }

    /// Set vertical scroll. Returns `true` if the position changed.
    pub fn set_scroll_y(&mut self, y: f32, rows: &GeometryTable) -> bool {
        let next = clamp_axis(y, self.max_scroll_y(rows));
        let changed = (next - self.scroll_y).abs() > f32::EPSILON;
        self.scroll_y = next;
        changed
    }

    /// Scroll by delta amounts
    pub fn scroll_by(
        &mut self,
        delta_x: f32,
        delta_y: f32,
        cols: &GeometryTable,
        rows: &GeometryTable,
    ) -> bool {
        let moved_x = self.set_scroll_x(self.scroll_x + delta_x, cols);
        let moved_y = self.set_scroll_y(self.scroll_y + delta_y, rows);
        moved_x || moved_y
    }

    /// Visible row window for the current scroll position.
    pub fn visible_rows(&self, rows: &GeometryTable) -> VisibleWindow {
        window(rows, self.scroll_y, self.scrollable_height(rows))
    }

    /// Visible column window for the current scroll position.
    pub fn visible_cols(&self, cols: &GeometryTable) -> VisibleWindow {
        window(cols, self.scroll_x, self.scrollable_width(cols))
    }

    /// Scroll the least amount needed to show row `index` fully inside the
    /// scrolling region. Frozen rows and rows already in view are a no-op.
    pub fn ensure_row_visible(&mut self, index: usize, rows: &GeometryTable) -> bool {
        let target = reveal(rows, index, self.scroll_y, self.scrollable_height(rows));
        match target {
            Some(y) => self.set_scroll_y(y, rows),
            None => false,
        }
    }

    /// Column counterpart of [`Viewport::ensure_row_visible`].
    pub fn ensure_col_visible(&mut self, index: usize, cols: &GeometryTable) -> bool {
        let target = reveal(cols, index, self.scroll_x, self.scrollable_width(cols));
        match target {
            Some(x) => self.set_scroll_x(x, cols),
            None => false,
        }
    }

    /// Screen x (relative to the body's left edge) of column `col`.
    ///
    /// Frozen columns render at fixed positions; scrolling columns are shifted
    /// by the scroll offset; trailing columns are pinned to the right edge of
    /// the viewport (or of the content, when it is narrower).
    pub fn screen_x(&self, col: usize, cols: &GeometryTable) -> f32 {
        screen_pos(cols, col, self.scroll_x, self.width)
    }

    /// Screen y (relative to the body's top edge) of row `row`.
    pub fn screen_y(&self, row: usize, rows: &GeometryTable) -> f32 {
        screen_pos(rows, row, self.scroll_y, self.height)
    }
}

fn clamp_axis(value: f32, max: f32) -> f32 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, max)
}

fn window(table: &GeometryTable, scroll: f32, extent: f32) -> VisibleWindow {
    let scrollable = table.scrollable_range();
    VisibleWindow {
        leading: 0..scrollable.start,
        scrolling: table.visible_range(f64::from(scroll), f64::from(extent)),
        trailing: scrollable.end..table.len(),
    }
}

fn reveal(table: &GeometryTable, index: usize, scroll: f32, extent: f32) -> Option<f32> {
    if !table.scrollable_range().contains(&index) {
        return None;
    }
    let (scroll, extent) = (f64::from(scroll), f64::from(extent));
    let top = table.offset_of(index) - table.leading_size();
    let bottom = top + f64::from(table.size_of(index));
    if top < scroll {
        Some(to_pixels(top))
    } else if bottom > scroll + extent {
        Some(to_pixels(bottom - extent))
    } else {
        None
    }
}

fn screen_pos(table: &GeometryTable, index: usize, scroll: f32, extent: f32) -> f32 {
    let offset = table.offset_of(index);
    let scrollable = table.scrollable_range();
    let pos = if index < scrollable.start {
        offset
    } else if index < scrollable.end {
        offset - f64::from(scroll)
    } else {
        let total = table.total_size();
        f64::from(extent).min(total) - (total - offset)
    };
    to_pixels(pos)
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]
mod tests {
    use super::*;

    fn viewport(width: f32, height: f32) -> Viewport {
        let mut v = Viewport::new();
        v.resize(width, height);
        v
    }

    #[test]
    fn test_clamp_to_content() {
        let rows = GeometryTable::uniform(100, 20.0);
        let cols = GeometryTable::uniform(5, 100.0);
        let mut v = viewport(400.0, 600.0);
        assert!(v.set_scroll_y(10_000.0, &rows));
        assert_eq!(v.scroll_y, 1400.0);
        v.set_scroll_y(-50.0, &rows);
        assert_eq!(v.scroll_y, 0.0);
        v.set_scroll_x(90.0, &cols);
        assert_eq!(v.scroll_x, 90.0);
        v.set_scroll_x(900.0, &cols);
        assert_eq!(v.scroll_x, 100.0);
    }

    #[test]
    fn test_content_smaller_than_viewport_never_scrolls() {
        let rows = GeometryTable::uniform(5, 20.0);
        let mut v = viewport(400.0, 600.0);
        assert!(!v.set_scroll_y(50.0, &rows));
        assert_eq!(v.scroll_y, 0.0);
    }

    #[test]
    fn test_visible_rows_with_frozen_band() {
        let rows = GeometryTable::uniform(100, 20.0).with_frozen(2, 0);
        let mut v = viewport(400.0, 200.0);
        v.set_scroll_y(100.0, &rows);
        let window = v.visible_rows(&rows);
        assert_eq!(window.leading, 0..2);
        assert_eq!(window.scrolling, 7..15);
        assert!(window.trailing.is_empty());
        assert!(window.contains(1));
        assert!(!window.contains(5));
    }

    #[test]
    fn test_ensure_row_visible_minimal_adjustment() {
        let rows = GeometryTable::uniform(100, 20.0);
        let mut v = viewport(400.0, 200.0);
        // Already visible: no-op
        assert!(!v.ensure_row_visible(5, &rows));
        // Below: bottom-aligned
        assert!(v.ensure_row_visible(20, &rows));
        assert_eq!(v.scroll_y, 220.0);
        // Above: top-aligned
        assert!(v.ensure_row_visible(3, &rows));
        assert_eq!(v.scroll_y, 60.0);
    }

    #[test]
    fn test_ensure_visible_ignores_frozen() {
        let cols = GeometryTable::uniform(20, 100.0).with_frozen(1, 1);
        let mut v = viewport(500.0, 200.0);
        v.set_scroll_x(300.0, &cols);
        assert!(!v.ensure_col_visible(0, &cols));
        assert!(!v.ensure_col_visible(19, &cols));
        assert_eq!(v.scroll_x, 300.0);
    }

    #[test]
    fn test_screen_positions_across_bands() {
        let cols = GeometryTable::uniform(20, 100.0).with_frozen(1, 1);
        let mut v = viewport(500.0, 200.0);
        v.set_scroll_x(250.0, &cols);
        assert_eq!(v.screen_x(0, &cols), 0.0);
        assert_eq!(v.screen_x(3, &cols), 50.0);
        assert_eq!(v.screen_x(19, &cols), 400.0);
    }
}
