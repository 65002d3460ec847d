//! Row and cell-range selection, independent of rendering.
//!
//! Row selection is a key set plus an "all visible rows" flag. Selecting
//! everything stays O(1) while the visible row list is unchanged; before the
//! list changes (filter, expansion, reload) the store freezes the flag into
//! the keys it covered, so rows that appear later are not selected by it.
//! Toggling select-all remembers the previous selection, so a second toggle
//! restores it exactly.

use std::collections::{HashMap, HashSet};
use std::mem;

use crate::types::{CellRange, RowKey};

#[derive(Debug, Clone, Default, PartialEq)]
struct Snapshot {
    all: bool,
    keys: HashSet<RowKey>,
}

#[derive(Debug, Clone, Default)]
pub struct SelectionModel {
    /// Every row of the visible row list is selected, regardless of `keys`
    all: bool,
    keys: HashSet<RowKey>,
    /// State before the last select-all toggle; dropped by any other mutation
    toggled_from: Option<Box<Snapshot>>,
    range: Option<CellRange>,
}

impl SelectionModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the "all visible rows" flag is active.
    pub fn is_all(&self) -> bool {
        self.all
    }

    pub fn is_selected(&self, key: &str, visible: bool) -> bool {
        (self.all && visible) || self.keys.contains(key)
    }

    /// Explicitly selected keys (not including rows covered by the all flag).
    pub fn keys(&self) -> &HashSet<RowKey> {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        !self.all && self.keys.is_empty()
    }

    /// Select or deselect one row. `visible` lists the current visible row
    /// keys, needed only when the all flag has to be materialized.
    ///
    /// Returns `true` if membership changed.
    pub fn set<'a>(
        &mut self,
        key: &RowKey,
        selected: bool,
        is_visible: bool,
        visible: impl IntoIterator<Item = &'a RowKey>,
    ) -> bool {
        if self.is_selected(key.as_str(), is_visible) == selected {
            return false;
        }
        self.toggled_from = None;
        if self.all {
            self.materialize(visible);
        }
        if selected {
            self.keys.insert(key.clone());
        } else {
            self.keys.remove(key.as_str());
        }
        true
    }

    /// Flip between "all visible rows selected" and "none selected".
    ///
    /// `visible_len` and `all_visible_selected` describe the current visible
    /// row list. A second toggle with no mutation in between restores the
    /// selection from before the first one.
    pub fn toggle_all(&mut self, visible_len: usize, all_visible_selected: bool) -> bool {
        let before = self.snapshot();
        if let Some(previous) = self.toggled_from.take() {
            self.all = previous.all;
            self.keys = previous.keys;
        } else {
            let previous = Snapshot {
                all: self.all,
                keys: mem::take(&mut self.keys),
            };
            if self.all || (visible_len > 0 && all_visible_selected) {
                self.all = false;
            } else {
                self.all = true;
            }
            self.toggled_from = Some(Box::new(previous));
        }
        self.snapshot() != before
    }

    /// Deselect everything. Returns `true` if anything was selected.
    pub fn clear(&mut self) -> bool {
        let changed = !self.is_empty();
        self.all = false;
        self.keys.clear();
        self.toggled_from = None;
        changed
    }

    /// Drop keys that no longer name a selectable row. Returns `true` if any
    /// key was removed.
    pub fn retain(&mut self, mut keep: impl FnMut(&RowKey) -> bool) -> bool {
        let before = self.keys.len();
        self.keys.retain(|k| keep(k));
        if let Some(previous) = self.toggled_from.as_mut() {
            previous.keys.retain(|k| keep(k));
        }
        self.keys.len() != before
    }

    /// Whether [`SelectionModel::freeze`] has anything to do.
    pub fn needs_freeze(&self) -> bool {
        self.all || self.toggled_from.as_ref().is_some_and(|previous| previous.all)
    }

    /// Replace the all flag (and the one in the remembered toggle state) with
    /// the keys of `visible`, the visible row list it was set against.
    pub fn freeze(&mut self, visible: &[&RowKey]) {
        if self.all {
            self.materialize(visible.iter().copied());
        }
        if let Some(previous) = self.toggled_from.as_mut() {
            if previous.all {
                previous.all = false;
                previous.keys.extend(visible.iter().map(|k| (*k).clone()));
            }
        }
    }

    /// Move selected keys to new names. Keys missing from `renamed` stay.
    pub fn rename(&mut self, renamed: &HashMap<RowKey, RowKey>) {
        if renamed.is_empty() {
            return;
        }
        let apply = |keys: &mut HashSet<RowKey>| {
            *keys = mem::take(keys)
                .into_iter()
                .map(|k| renamed.get(&k).cloned().unwrap_or(k))
                .collect();
        };
        apply(&mut self.keys);
        if let Some(previous) = self.toggled_from.as_mut() {
            apply(&mut previous.keys);
        }
    }

    fn materialize<'a>(&mut self, visible: impl IntoIterator<Item = &'a RowKey>) {
        self.all = false;
        self.keys.extend(visible.into_iter().cloned());
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            all: self.all,
            keys: self.keys.clone(),
        }
    }

    // Cell range

    pub fn range(&self) -> Option<CellRange> {
        self.range
    }

    pub fn set_range(&mut self, range: Option<CellRange>) {
        self.range = range;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn keys(list: &[&str]) -> Vec<RowKey> {
        list.iter().map(|k| RowKey::from(*k)).collect()
    }

    #[test]
    fn test_set_reports_membership_change() {
        let visible = keys(&["a", "b"]);
        let mut model = SelectionModel::new();
        assert!(model.set(&"a".into(), true, true, &visible));
        assert!(!model.set(&"a".into(), true, true, &visible));
        assert!(model.set(&"a".into(), false, true, &visible));
        assert!(model.is_empty());
    }

    #[test]
    fn test_toggle_all_twice_restores_partial_selection() {
        let visible = keys(&["a", "b", "c"]);
        let mut model = SelectionModel::new();
        model.set(&"b".into(), true, true, &visible);
        assert!(model.toggle_all(3, false));
        assert!(model.is_all());
        assert!(model.is_selected("a", true));
        assert!(model.toggle_all(3, true));
        assert!(!model.is_all());
        assert!(model.is_selected("b", true));
        assert!(!model.is_selected("a", true));
    }

    #[test]
    fn test_toggle_all_when_everything_selected_clears() {
        let visible = keys(&["a", "b"]);
        let mut model = SelectionModel::new();
        for k in &visible {
            model.set(k, true, true, &visible);
        }
        assert!(model.toggle_all(2, true));
        assert!(model.is_empty());
        assert!(model.toggle_all(2, false));
        assert_eq!(model.keys().len(), 2);
    }

    #[test]
    fn test_deselect_under_all_materializes_rest() {
        let visible = keys(&["a", "b", "c"]);
        let mut model = SelectionModel::new();
        model.toggle_all(3, false);
        assert!(model.set(&"b".into(), false, true, &visible));
        assert!(!model.is_all());
        assert!(model.is_selected("a", true));
        assert!(!model.is_selected("b", true));
        assert!(model.is_selected("c", true));
    }

    #[test]
    fn test_freeze_pins_all_to_current_rows() {
        let visible = keys(&["a", "b"]);
        let mut model = SelectionModel::new();
        model.toggle_all(2, false);
        assert!(model.needs_freeze());
        model.freeze(&visible.iter().collect::<Vec<_>>());
        assert!(!model.is_all());
        assert!(model.is_selected("a", true));
        assert!(!model.is_selected("c", true));

        // The remembered state was "none", so a second toggle still clears
        assert!(model.toggle_all(3, false));
        assert!(model.is_empty());
    }

    #[test]
    fn test_rename_moves_keys() {
        let visible = keys(&["0", "1"]);
        let mut model = SelectionModel::new();
        model.set(&"1".into(), true, true, &visible);
        let renamed = HashMap::from([
            (RowKey::from("0"), RowKey::from("a")),
            (RowKey::from("1"), RowKey::from("b")),
        ]);
        model.rename(&renamed);
        assert!(model.is_selected("b", true));
        assert!(!model.is_selected("1", true));
        assert_eq!(model.keys().len(), 1);
    }

    #[test]
    fn test_retain_prunes_keys() {
        let visible = keys(&["a", "b"]);
        let mut model = SelectionModel::new();
        model.set(&"a".into(), true, true, &visible);
        model.set(&"b".into(), true, true, &visible);
        assert!(model.retain(|k| k.as_str() == "a"));
        assert!(!model.retain(|k| k.as_str() == "a"));
        assert_eq!(model.keys().len(), 1);
    }
}
