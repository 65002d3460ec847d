//! Row selection, cell ranges and row expansion.
//!
//! Row selection changes emit one `selectionChange` per command. Cell ranges
//! only affect the overlay, so they request a `drawView` frame.

use super::Grid;
use crate::events::{EventKind, GridEvent, SelectionSnapshot};
use crate::types::{CellRange, Row};

impl Grid {
    /// Current row selection resolved to keys and row records, in dataset order.
    pub fn selection_snapshot(&self) -> SelectionSnapshot {
        let nodes = self.store.selection_rows();
        SelectionSnapshot {
            all: self.store.selection().is_all(),
            keys: nodes.iter().map(|node| node.key.clone()).collect(),
            rows: nodes.iter().map(|node| node.row.clone()).collect(),
        }
    }

    pub(crate) fn emit_selection_change(&self) {
        if self.events.has_listeners(EventKind::SelectionChange) {
            self.events
                .emit(&GridEvent::SelectionChange(self.selection_snapshot()));
        }
    }

    fn selection_changed(&mut self, changed: bool) -> bool {
        if changed {
            self.emit_selection_change();
            self.invalidate(false);
        }
        changed
    }

    pub fn toggle_row_selection(&mut self, row_key: &str) -> bool {
        let changed = self.store.toggle_row_selection(row_key);
        self.selection_changed(changed)
    }

    pub fn set_row_selection(&mut self, row_key: &str, selected: bool) -> bool {
        let changed = self.store.set_row_selection(row_key, selected);
        self.selection_changed(changed)
    }

    /// Select or deselect rows given as records. Records are matched to keys
    /// the same way as [`Grid::get_row_key_by_item`].
    pub fn set_selection_by_rows(&mut self, rows: &[Row], selected: bool) -> bool {
        let keys: Vec<_> = rows
            .iter()
            .filter_map(|row| self.store.get_row_key_by_item(row))
            .collect();
        self.set_selection_by_row_keys(keys.iter().map(|k| k.as_str()), selected)
    }

    /// Select or deselect many rows; one `selectionChange` for the batch.
    pub fn set_selection_by_row_keys<'a>(
        &mut self,
        keys: impl IntoIterator<Item = &'a str>,
        selected: bool,
    ) -> bool {
        let mut changed = false;
        for key in keys {
            changed |= self.store.set_row_selection(key, selected);
        }
        self.selection_changed(changed)
    }

    /// Select every visible row, or restore the previous selection when
    /// everything is already selected.
    pub fn toggle_all_selection(&mut self) -> bool {
        let changed = self.store.toggle_all_selection();
        self.selection_changed(changed)
    }

    pub fn clear_selection(&mut self) -> bool {
        let changed = self.store.clear_selection();
        self.selection_changed(changed)
    }

    /// Selected rows in dataset order.
    pub fn get_selection_rows(&self) -> Vec<&Row> {
        self.store
            .selection_rows()
            .into_iter()
            .map(|node| &node.row)
            .collect()
    }

    pub fn is_row_selected(&self, row_key: &str) -> bool {
        self.store.is_row_selected(row_key)
    }

    // Cell range

    fn set_range(&mut self, range: Option<CellRange>) -> bool {
        let range = range.map(|r| self.merge_map().expand(r));
        let changed = self.store.set_cell_range(range);
        if changed {
            self.invalidate(true);
        }
        changed
    }

    /// Select one cell (grown to its merged region, if any).
    pub fn select_cell(&mut self, row: usize, col: usize) -> bool {
        self.set_range(Some(CellRange::cell(row, col)))
    }

    /// Move the focus corner of the current range, keeping its anchor. Starts
    /// a new range when none exists.
    pub fn extend_selection(&mut self, row: usize, col: usize) -> bool {
        let range = match self.store.cell_range() {
            Some(current) => CellRange::cell_range(current.anchor_row, current.anchor_col, row, col),
            None => CellRange::cell(row, col),
        };
        self.set_range(Some(range))
    }

    pub fn select_range(&mut self, range: CellRange) -> bool {
        self.set_range(Some(range))
    }

    pub fn select_all_cells(&mut self) -> bool {
        let all = CellRange::all(self.store.visible_len(), self.store.columns().len());
        self.set_range(Some(all))
    }

    pub fn clear_cell_selection(&mut self) -> bool {
        self.set_range(None)
    }

    pub fn selected_cells(&self) -> Option<CellRange> {
        self.store.cell_range()
    }

    // Expansion

    /// Expand or collapse one row. Collapsing also collapses its descendants.
    pub fn expand_item(&mut self, row_key: &str, expanded: bool) -> bool {
        if !self.store.expand_item(row_key, expanded) {
            return false;
        }
        self.after_expansion();
        self.events.emit(&GridEvent::ExpandChange {
            row_key: row_key.into(),
            expanded,
        });
        true
    }

    pub fn toggle_expand(&mut self, row_key: &str) -> bool {
        let expanded = self.store.is_expanded(row_key);
        self.expand_item(row_key, !expanded)
    }

    pub fn is_expanded(&self, row_key: &str) -> bool {
        self.store.is_expanded(row_key)
    }

    pub fn expand_all(&mut self, expanded: bool) -> bool {
        if !self.store.expand_all(expanded) {
            return false;
        }
        self.after_expansion();
        true
    }

    fn after_expansion(&mut self) {
        // Visible indices shifted; the old range no longer names the same cells
        self.store.set_cell_range(None);
        self.viewport
            .clamp_scroll(self.store.col_geometry(), self.store.row_geometry());
        self.invalidate(false);
    }
}
