//! Change tracking for edited cells.
//!
//! The ledger keeps one record per `(row, column)`: the value before the first
//! edit and the current value. Further edits update the record in place.
//! Rows are referenced by key only, so records survive a reload that reuses
//! the same keys.
//!
//! [`EditHistory`] is the undo/redo stack on top of it. A batch write is one
//! history entry.

use std::collections::{HashMap, VecDeque};

use crate::types::{CellValue, ColumnKey, RowKey};

/// Change-history entry for one cell.
#[derive(Debug, Clone, PartialEq)]
pub struct CellEditRecord {
    pub original: CellValue,
    pub current: CellValue,
    /// Set once any write to this cell came from the editor
    pub edited_by_user: bool,
}

impl CellEditRecord {
    /// Whether the cell currently differs from its original value.
    pub fn is_changed(&self) -> bool {
        self.original != self.current
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChangeLedger {
    records: HashMap<RowKey, HashMap<ColumnKey, CellEditRecord>>,
}

impl ChangeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a write. `previous` is only used when the cell has no record yet.
    /// A write that lands back on the original value drops the record.
    pub fn record(
        &mut self,
        row_key: &RowKey,
        column_key: &ColumnKey,
        previous: CellValue,
        current: CellValue,
        by_user: bool,
    ) {
        if let Some(record) = self
            .records
            .get_mut(row_key.as_str())
            .and_then(|cells| cells.get_mut(column_key.as_str()))
        {
            record.edited_by_user |= by_user;
            self.follow(row_key.as_str(), column_key.as_str(), current);
            return;
        }
        if previous == current {
            return;
        }
        self.records.entry(row_key.clone()).or_default().insert(
            column_key.clone(),
            CellEditRecord {
                original: previous,
                current,
                edited_by_user: by_user,
            },
        );
    }

    /// Move an existing record's current value without opening a new one.
    /// Returns `true` if the cell still has a record afterwards.
    pub fn follow(&mut self, row_key: &str, column_key: &str, current: CellValue) -> bool {
        let Some(record) = self
            .records
            .get_mut(row_key)
            .and_then(|cells| cells.get_mut(column_key))
        else {
            return false;
        };
        if record.original == current {
            self.remove(row_key, column_key);
            return false;
        }
        record.current = current;
        true
    }

    pub fn get(&self, row_key: &str, column_key: &str) -> Option<&CellEditRecord> {
        self.records.get(row_key)?.get(column_key)
    }

    pub fn is_changed(&self, row_key: &str, column_key: &str) -> bool {
        self.get(row_key, column_key)
            .is_some_and(CellEditRecord::is_changed)
    }

    /// Records of one row, if any.
    pub fn row(&self, row_key: &str) -> Option<&HashMap<ColumnKey, CellEditRecord>> {
        self.records.get(row_key)
    }

    /// Whether the row has at least one changed cell.
    pub fn row_changed(&self, row_key: &str) -> bool {
        self.records
            .get(row_key)
            .is_some_and(|cells| cells.values().any(CellEditRecord::is_changed))
    }

    /// Number of records (changed or not).
    pub fn len(&self) -> usize {
        self.records.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Remove one record, returning it.
    pub fn remove(&mut self, row_key: &str, column_key: &str) -> Option<CellEditRecord> {
        let cells = self.records.get_mut(row_key)?;
        let record = cells.remove(column_key);
        if cells.is_empty() {
            self.records.remove(row_key);
        }
        record
    }

    /// Take every record out of the ledger.
    pub fn drain(&mut self) -> Vec<(RowKey, ColumnKey, CellEditRecord)> {
        self.records
            .drain()
            .flat_map(|(row, cells)| {
                cells
                    .into_iter()
                    .map(move |(col, record)| (row.clone(), col, record))
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    /// Move records to renamed row keys.
    pub fn rename_rows(&mut self, renamed: &HashMap<RowKey, RowKey>) {
        if renamed.is_empty() {
            return;
        }
        self.records = std::mem::take(&mut self.records)
            .into_iter()
            .map(|(row, cells)| (renamed.get(&row).cloned().unwrap_or(row), cells))
            .collect();
    }

    /// Drop records whose row or column key vanished.
    pub fn retain_keys(
        &mut self,
        row_present: impl Fn(&str) -> bool,
        column_present: impl Fn(&str) -> bool,
    ) {
        self.records.retain(|row, cells| {
            if !row_present(row.as_str()) {
                return false;
            }
            cells.retain(|col, _| column_present(col.as_str()));
            !cells.is_empty()
        });
    }
}

/// One cell write as stored in the undo stack.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryChange {
    pub row_key: RowKey,
    pub column_key: ColumnKey,
    pub before: CellValue,
    pub after: CellValue,
}

/// Undo/redo stack of applied writes.
#[derive(Debug, Clone)]
pub struct EditHistory {
    undo_stack: VecDeque<Vec<HistoryChange>>,
    redo_stack: Vec<Vec<HistoryChange>>,
    max_entries: usize,
}

impl Default for EditHistory {
    fn default() -> Self {
        Self::new(100)
    }
}

impl EditHistory {
    pub fn new(max_entries: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            max_entries,
        }
    }

    pub fn set_limit(&mut self, max_entries: usize) {
        self.max_entries = max_entries;
        self.trim();
    }

    /// Push one entry. No-op writes are dropped; an empty entry is ignored.
    pub fn record(&mut self, changes: Vec<HistoryChange>) {
        let changes: Vec<_> = changes.into_iter().filter(|c| c.before != c.after).collect();
        if changes.is_empty() {
            return;
        }
        self.undo_stack.push_back(changes);
        self.redo_stack.clear();
        self.trim();
    }

    /// Pop the last entry for undo, returns the changes to revert
    pub fn undo(&mut self) -> Option<Vec<HistoryChange>> {
        let entry = self.undo_stack.pop_back()?;
        self.redo_stack.push(entry.clone());
        Some(entry)
    }

    /// Pop from redo stack, returns the changes to re-apply
    pub fn redo(&mut self) -> Option<Vec<HistoryChange>> {
        let entry = self.redo_stack.pop()?;
        self.undo_stack.push_back(entry.clone());
        Some(entry)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    pub fn rename_rows(&mut self, renamed: &HashMap<RowKey, RowKey>) {
        if renamed.is_empty() {
            return;
        }
        for change in self
            .undo_stack
            .iter_mut()
            .chain(self.redo_stack.iter_mut())
            .flatten()
        {
            if let Some(key) = renamed.get(&change.row_key) {
                change.row_key = key.clone();
            }
        }
    }

    /// Forget entries touching rows or columns that vanished.
    pub fn retain_keys(
        &mut self,
        row_present: impl Fn(&str) -> bool,
        column_present: impl Fn(&str) -> bool,
    ) {
        let keep = |c: &HistoryChange| {
            row_present(c.row_key.as_str()) && column_present(c.column_key.as_str())
        };
        for entry in self.undo_stack.iter_mut().chain(self.redo_stack.iter_mut()) {
            entry.retain(|c| keep(c));
        }
        self.undo_stack.retain(|e| !e.is_empty());
        self.redo_stack.retain(|e| !e.is_empty());
    }

    fn trim(&mut self) {
        while self.undo_stack.len() > self.max_entries {
            self.undo_stack.pop_front();
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn change(row: &str, before: i32, after: i32) -> HistoryChange {
        HistoryChange {
            row_key: row.into(),
            column_key: "age".into(),
            before: before.into(),
            after: after.into(),
        }
    }

    #[test]
    fn test_repeated_writes_keep_one_record() {
        let mut ledger = ChangeLedger::new();
        let (r, c) = (RowKey::from("r1"), ColumnKey::from("age"));
        ledger.record(&r, &c, 30.into(), 31.into(), false);
        ledger.record(&r, &c, 31.into(), 32.into(), true);
        assert_eq!(ledger.len(), 1);
        let record = ledger.get("r1", "age").unwrap();
        assert_eq!(record.original, CellValue::from(30));
        assert_eq!(record.current, CellValue::from(32));
        assert!(record.edited_by_user);
    }

    #[test]
    fn test_write_back_to_original_is_not_changed() {
        let mut ledger = ChangeLedger::new();
        let (r, c) = (RowKey::from("r1"), ColumnKey::from("age"));
        ledger.record(&r, &c, 30.into(), 31.into(), false);
        ledger.record(&r, &c, 31.into(), 30.into(), false);
        assert!(ledger.is_empty());
        assert!(ledger.get("r1", "age").is_none());
        assert!(!ledger.row_changed("r1"));

        // A fresh record is opened by the next real change
        ledger.record(&r, &c, 30.into(), 33.into(), false);
        assert_eq!(ledger.get("r1", "age").unwrap().original, CellValue::from(30));
    }

    #[test]
    fn test_follow_only_moves_existing_records() {
        let mut ledger = ChangeLedger::new();
        let (r, c) = (RowKey::from("r1"), ColumnKey::from("age"));
        assert!(!ledger.follow("r1", "age", 40.into()));
        assert!(ledger.is_empty());

        ledger.record(&r, &c, 30.into(), 31.into(), false);
        assert!(ledger.follow("r1", "age", 40.into()));
        assert_eq!(ledger.get("r1", "age").unwrap().current, CellValue::from(40));
        assert!(!ledger.follow("r1", "age", 30.into()));
        assert!(ledger.is_empty());
    }

    #[test]
    fn test_retain_keys_drops_vanished() {
        let mut ledger = ChangeLedger::new();
        ledger.record(&"r1".into(), &"a".into(), 1.into(), 2.into(), false);
        ledger.record(&"r1".into(), &"b".into(), 1.into(), 2.into(), false);
        ledger.record(&"r2".into(), &"a".into(), 1.into(), 2.into(), false);
        ledger.retain_keys(|r| r == "r1", |c| c == "a");
        assert_eq!(ledger.len(), 1);
        assert!(ledger.get("r1", "a").is_some());
    }

    #[test]
    fn test_rename_rows_moves_records_and_history() {
        let mut ledger = ChangeLedger::new();
        let mut history = EditHistory::new(10);
        ledger.record(&"0".into(), &"age".into(), 1.into(), 2.into(), false);
        history.record(vec![change("0", 1, 2)]);
        let renamed = HashMap::from([(RowKey::from("0"), RowKey::from("a"))]);
        ledger.rename_rows(&renamed);
        history.rename_rows(&renamed);

        assert!(ledger.get("0", "age").is_none());
        assert!(ledger.is_changed("a", "age"));
        assert_eq!(history.undo().unwrap()[0].row_key.as_str(), "a");
    }

    #[test]
    fn test_history_undo_redo() {
        let mut history = EditHistory::new(10);
        history.record(vec![change("r1", 1, 2)]);
        history.record(vec![change("r1", 2, 3), change("r2", 5, 6)]);
        assert_eq!(history.undo().unwrap().len(), 2);
        assert!(history.can_redo());
        assert_eq!(history.redo().unwrap().len(), 2);
        history.undo();
        history.record(vec![change("r1", 2, 9)]);
        assert!(!history.can_redo());
    }

    #[test]
    fn test_history_limit_and_noop_filter() {
        let mut history = EditHistory::new(2);
        history.record(vec![change("r1", 1, 1)]);
        assert!(!history.can_undo());
        for i in 0..5 {
            history.record(vec![change("r1", i, i + 1)]);
        }
        assert!(history.undo().is_some());
        assert!(history.undo().is_some());
        assert!(history.undo().is_none());
    }
}
