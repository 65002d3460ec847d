//! Scroll commands and visible windows.
//!
//! Positions are clamped by the viewport; out-of-range indices clamp to the
//! last row or column and unknown keys are a no-op.

use super::Grid;
use crate::events::GridEvent;
use crate::layout::VisibleWindow;

impl Grid {
    pub fn scroll_x(&self) -> f32 {
        self.viewport.scroll_x
    }

    pub fn scroll_y(&self) -> f32 {
        self.viewport.scroll_y
    }

    /// Scroll both axes. Returns `true` if the position changed.
    pub fn scroll_to(&mut self, x: f32, y: f32) -> bool {
        let cols = self.store.col_geometry();
        let rows = self.store.row_geometry();
        let moved_x = self.viewport.set_scroll_x(x, cols);
        let moved_y = self.viewport.set_scroll_y(y, rows);
        self.scrolled(moved_x || moved_y)
    }

    pub fn scroll_x_to(&mut self, x: f32) -> bool {
        let moved = self.viewport.set_scroll_x(x, self.store.col_geometry());
        self.scrolled(moved)
    }

    pub fn scroll_y_to(&mut self, y: f32) -> bool {
        let moved = self.viewport.set_scroll_y(y, self.store.row_geometry());
        self.scrolled(moved)
    }

    /// Scroll by a delta, e.g. from a wheel event.
    pub fn scroll_by(&mut self, dx: f32, dy: f32) -> bool {
        let moved = self.viewport.scroll_by(
            dx,
            dy,
            self.store.col_geometry(),
            self.store.row_geometry(),
        );
        self.scrolled(moved)
    }

    /// Bring a visible row fully into the scrolling region, moving as little
    /// as possible. Frozen rows never scroll.
    pub fn scroll_to_row_index(&mut self, row_index: usize) -> bool {
        let rows = self.store.row_geometry();
        if rows.is_empty() {
            return false;
        }
        let index = row_index.min(rows.len() - 1);
        let moved = self.viewport.ensure_row_visible(index, rows);
        self.scrolled(moved)
    }

    pub fn scroll_to_col_index(&mut self, col_index: usize) -> bool {
        let cols = self.store.col_geometry();
        if cols.is_empty() {
            return false;
        }
        let index = col_index.min(cols.len() - 1);
        let moved = self.viewport.ensure_col_visible(index, cols);
        self.scrolled(moved)
    }

    /// Scroll to a row by key. Rows hidden by a collapsed ancestor or the
    /// filter are left alone.
    pub fn scroll_to_row_key(&mut self, row_key: &str) -> bool {
        match self.store.visible_index_of(row_key) {
            Some(index) => self.scroll_to_row_index(index),
            None => false,
        }
    }

    pub fn scroll_to_col_key(&mut self, key: &str) -> bool {
        match self.store.columns().index_of(key) {
            Some(index) => self.scroll_to_col_index(index),
            None => false,
        }
    }

    /// Row indices drawn at the current scroll position.
    pub fn visible_rows(&self) -> VisibleWindow {
        self.viewport.visible_rows(self.store.row_geometry())
    }

    /// Column indices drawn at the current scroll position.
    pub fn visible_cols(&self) -> VisibleWindow {
        self.viewport.visible_cols(self.store.col_geometry())
    }

    fn scrolled(&mut self, moved: bool) -> bool {
        if moved {
            let (x, y) = (self.viewport.scroll_x, self.viewport.scroll_y);
            tracing::trace!(x, y, "scrolled");
            self.events.emit(&GridEvent::Scroll { x, y });
            self.invalidate(false);
        }
        moved
    }
}
