//! Cell writes, the edit session, undo/redo and change queries.

use serde::Serialize;

use super::Grid;
use crate::error::Result;
use crate::events::GridEvent;
use crate::layout::MergeSpec;
use crate::ledger::HistoryChange;
use crate::types::{CellValue, ChangeItem, ColumnKey, Row, RowKey};

/// The cell currently open in the editor overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditingCell {
    pub row_key: RowKey,
    pub key: ColumnKey,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangedCell {
    pub key: ColumnKey,
    pub value: CellValue,
}

/// Current values of the changed cells of one row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangedRow {
    pub row_key: RowKey,
    pub changes: Vec<ChangedCell>,
}

impl ChangedRow {
    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.changes
            .iter()
            .find(|c| c.key.as_str() == key)
            .map(|c| &c.value)
    }
}

impl Grid {
    /// Write one cell.
    ///
    /// The row value is always updated. With `history` the write is recorded
    /// in the change ledger and the undo stack; `from_editor` tags the record
    /// as user-made. Without `history` no record is opened, but a cell that
    /// already has one keeps its current value in step. Editor writes to
    /// read-only columns are refused.
    ///
    /// Returns `Ok(false)` when nothing changed (unknown row, same value,
    /// refused write).
    ///
    /// # Errors
    /// Returns `GridError::ValueKind` if the value does not fit the column.
    pub fn set_item_value(
        &mut self,
        row_key: &str,
        key: &str,
        value: impl Into<CellValue>,
        history: bool,
        redraw: bool,
        from_editor: bool,
    ) -> Result<bool> {
        let item = ChangeItem::new(row_key, key, value);
        let applied = self.write_cells(vec![item], history, from_editor)?;
        self.after_write(applied, redraw)
    }

    /// Same as [`Grid::set_item_value`] tagged as an editor write; closes the
    /// edit session.
    pub fn set_item_value_by_editor(
        &mut self,
        row_key: &str,
        key: &str,
        value: impl Into<CellValue>,
        history: bool,
        redraw: bool,
    ) -> Result<bool> {
        let result = self.set_item_value(row_key, key, value, history, redraw, true);
        self.done_edit();
        result
    }

    /// Write several cells as one undo step. Either every write is applied or
    /// none is.
    pub fn batch_set_item_value(
        &mut self,
        items: Vec<ChangeItem>,
        history: bool,
        redraw: bool,
    ) -> Result<bool> {
        let applied = self.write_cells(items, history, false)?;
        self.after_write(applied, redraw)
    }

    fn write_cells(
        &mut self,
        items: Vec<ChangeItem>,
        history: bool,
        from_editor: bool,
    ) -> Result<Vec<(ChangeItem, CellValue)>> {
        let mut applied: Vec<(ChangeItem, CellValue)> = Vec::new();
        for item in items {
            if from_editor
                && self
                    .store
                    .columns()
                    .get(item.key.as_str())
                    .is_some_and(|c| c.readonly)
            {
                tracing::debug!(column = %item.key, "editor write to read-only column refused");
                continue;
            }
            let written =
                self.store
                    .replace_value(item.row_key.as_str(), item.key.as_str(), item.value.clone());
            match written {
                Ok(Some((previous, stored))) => {
                    if previous != stored {
                        let item = ChangeItem {
                            value: stored,
                            ..item
                        };
                        applied.push((item, previous));
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    // Roll back what this batch already wrote
                    for (done, previous) in applied.into_iter().rev() {
                        if let Err(rollback) = self.store.replace_value(
                            done.row_key.as_str(),
                            done.key.as_str(),
                            previous,
                        ) {
                            tracing::warn!(
                                row = %done.row_key,
                                column = %done.key,
                                error = %rollback,
                                "batch rollback write failed"
                            );
                        }
                    }
                    return Err(e);
                }
            }
        }

        let mut changes = Vec::new();
        for (item, previous) in &applied {
            self.validation
                .clear_cell(item.row_key.as_str(), item.key.as_str());
            if history {
                self.ledger.record(
                    &item.row_key,
                    &item.key,
                    previous.clone(),
                    item.value.clone(),
                    from_editor,
                );
                changes.push(HistoryChange {
                    row_key: item.row_key.clone(),
                    column_key: item.key.clone(),
                    before: previous.clone(),
                    after: item.value.clone(),
                });
            } else {
                // Untracked writes still move a cell that already has a record
                self.ledger
                    .follow(item.row_key.as_str(), item.key.as_str(), item.value.clone());
            }
        }
        if history {
            self.history.record(changes);
        }
        Ok(applied)
    }

    fn after_write(&mut self, applied: Vec<(ChangeItem, CellValue)>, redraw: bool) -> Result<bool> {
        if applied.is_empty() {
            return Ok(false);
        }
        let items: Vec<ChangeItem> = applied.into_iter().map(|(item, _)| item).collect();
        tracing::debug!(cells = items.len(), "cells written");
        self.events.emit(&GridEvent::Change(items));
        if redraw {
            self.invalidate(false);
        } else {
            self.touch();
        }
        Ok(true)
    }

    /// Restore values from history entries, updating the ledger as if the
    /// restored values had been written.
    fn restore(&mut self, changes: Vec<HistoryChange>, forward: bool) -> bool {
        let mut items = Vec::new();
        for change in changes.into_iter().rev() {
            let (from, to) = if forward {
                (change.before, change.after)
            } else {
                (change.after, change.before)
            };
            let written = self.store.replace_value(
                change.row_key.as_str(),
                change.column_key.as_str(),
                to.clone(),
            );
            if let Ok(Some(_)) = written {
                self.ledger
                    .record(&change.row_key, &change.column_key, from, to.clone(), false);
                self.validation
                    .clear_cell(change.row_key.as_str(), change.column_key.as_str());
                items.push(ChangeItem {
                    row_key: change.row_key,
                    key: change.column_key,
                    value: to,
                });
            }
        }
        if items.is_empty() {
            return false;
        }
        self.events.emit(&GridEvent::Change(items));
        self.invalidate(false);
        true
    }

    pub fn undo(&mut self) -> bool {
        match self.history.undo() {
            Some(changes) => self.restore(changes, false),
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.history.redo() {
            Some(mut changes) => {
                changes.reverse();
                self.restore(changes, true)
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Put every recorded cell back to its original value and empty the
    /// ledger and the undo stack. Returns the number of cells restored.
    pub fn revert_changes(&mut self) -> usize {
        let mut items = Vec::new();
        for (row_key, key, record) in self.ledger.drain() {
            if !record.is_changed() {
                continue;
            }
            if let Ok(Some(_)) =
                self.store
                    .replace_value(row_key.as_str(), key.as_str(), record.original.clone())
            {
                self.validation.clear_cell(row_key.as_str(), key.as_str());
                items.push(ChangeItem {
                    row_key,
                    key,
                    value: record.original,
                });
            }
        }
        self.history.clear();
        let restored = items.len();
        if restored > 0 {
            self.events.emit(&GridEvent::Change(items));
        }
        self.invalidate(false);
        restored
    }

    /// Put one cell back to its original value.
    pub fn revert_cell(&mut self, row_key: &str, key: &str) -> bool {
        let Some(record) = self.ledger.remove(row_key, key) else {
            return false;
        };
        if !record.is_changed() {
            return false;
        }
        if !matches!(
            self.store.replace_value(row_key, key, record.original.clone()),
            Ok(Some(_))
        ) {
            return false;
        }
        self.validation.clear_cell(row_key, key);
        self.events.emit(&GridEvent::Change(vec![ChangeItem::new(
            row_key,
            key,
            record.original,
        )]));
        self.invalidate(false);
        true
    }

    /// Forget recorded changes without touching any value.
    pub fn clear_change_history(&mut self) {
        self.ledger.clear();
        self.history.clear();
        self.invalidate(false);
    }

    /// Current values of changed cells, grouped by row in dataset order; cells
    /// follow leaf column order.
    pub fn get_changed_data(&self) -> Vec<ChangedRow> {
        let columns = self.store.columns();
        self.store
            .arena()
            .iter()
            .filter_map(|(_, node)| {
                let records = self.ledger.row(node.key.as_str())?;
                let mut changes: Vec<ChangedCell> = records
                    .iter()
                    .filter(|(_, record)| record.is_changed())
                    .map(|(key, record)| ChangedCell {
                        key: key.clone(),
                        value: record.current.clone(),
                    })
                    .collect();
                if changes.is_empty() {
                    return None;
                }
                changes.sort_by(|a, b| {
                    let rank = |k: &ColumnKey| columns.index_of(k.as_str()).unwrap_or(usize::MAX);
                    rank(&a.key).cmp(&rank(&b.key)).then_with(|| a.key.cmp(&b.key))
                });
                Some(ChangedRow {
                    row_key: node.key.clone(),
                    changes,
                })
            })
            .collect()
    }

    /// Full current rows that contain at least one changed cell.
    pub fn get_changed_rows(&self) -> Vec<&Row> {
        self.store
            .arena()
            .iter()
            .filter(|(_, node)| self.ledger.row_changed(node.key.as_str()))
            .map(|(_, node)| &node.row)
            .collect()
    }

    // Edit session

    /// Open the editor on a visible cell. Read-only columns refuse.
    pub fn begin_edit(&mut self, row_index: usize, col_index: usize) -> bool {
        let Some(column) = self.store.columns().leaf(col_index) else {
            return false;
        };
        if column.readonly {
            return false;
        }
        let Some(node) = self.store.visible_node(row_index) else {
            return false;
        };
        self.editing = Some(EditingCell {
            row_key: node.key.clone(),
            key: column.key.clone(),
        });
        self.scroll_to_row_index(row_index);
        self.scroll_to_col_index(col_index);
        self.invalidate(false);
        true
    }

    /// Close the edit session. Returns `true` if one was open.
    pub fn done_edit(&mut self) -> bool {
        if self.editing.take().is_some() {
            self.invalidate(false);
            true
        } else {
            false
        }
    }

    pub fn editing_cell(&self) -> Option<&EditingCell> {
        self.editing.as_ref()
    }

    // Sizes and merges

    pub fn set_row_height(&mut self, row_key: &str, height: f32) -> bool {
        if !self.store.set_row_height(row_key, height) {
            return false;
        }
        self.do_layout();
        self.invalidate(false);
        true
    }

    pub fn set_column_width(&mut self, key: &str, width: f32) -> bool {
        if self.store.set_column_width(key, width).is_none() {
            return false;
        }
        self.do_layout();
        self.invalidate(false);
        true
    }

    /// Replace the merged regions.
    pub fn set_merges(&mut self, merges: Vec<MergeSpec>) {
        self.merges = merges;
        self.invalidate(false);
    }
}
