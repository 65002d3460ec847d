//! Data Store: columns, rows, the visible row list and the geometry built
//! from it.
//!
//! The visible row list is the only index space the rest of the grid works
//! in. It is rebuilt from scratch when data, columns or the filter change.
//! Expanding or collapsing one row splices the list (and the row geometry) in
//! place from that row onward instead.

mod columns;
mod tree;

pub use columns::{ColumnSet, LeafColumn};
pub use tree::{RowArena, RowId, RowNode};

use std::collections::HashMap;
use std::fmt;
use std::mem;
use std::rc::Rc;

use crate::config::GridConfig;
use crate::error::{GridError, Result};
use crate::layout::{GeometryTable, HeaderLayout};
use crate::selection::SelectionModel;
use crate::types::{CellRange, CellValue, Column, ColumnKey, Row, RowKey, ValueKind};

/// Row predicate installed by `set_filter_method`.
pub type RowFilter = Rc<dyn Fn(&Row) -> bool>;

pub struct DataStore {
    config: GridConfig,
    columns: ColumnSet,
    header: HeaderLayout,
    arena: RowArena,
    /// Rows as last loaded, re-read when the children field changes
    source: Vec<serde_json::Value>,
    footer: Vec<Row>,
    filter: Option<RowFilter>,
    /// Filter result per arena slot
    keep: Vec<bool>,
    visible: Vec<RowId>,
    /// Visible index per arena slot
    positions: Vec<Option<usize>>,
    row_geometry: GeometryTable,
    col_geometry: GeometryTable,
    footer_geometry: GeometryTable,
    row_heights: HashMap<RowKey, f32>,
    expansion: HashMap<RowKey, bool>,
    selection: SelectionModel,
    loading: bool,
}

impl fmt::Debug for DataStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataStore")
            .field("columns", &self.columns.len())
            .field("rows", &self.arena.len())
            .field("visible", &self.visible.len())
            .field("footer", &self.footer.len())
            .field("filtered", &self.filter.is_some())
            .field("loading", &self.loading)
            .finish_non_exhaustive()
    }
}

impl DataStore {
    pub fn new(config: GridConfig) -> Self {
        Self {
            config,
            columns: ColumnSet::default(),
            header: HeaderLayout::default(),
            arena: RowArena::default(),
            source: Vec::new(),
            footer: Vec::new(),
            filter: None,
            keep: Vec::new(),
            visible: Vec::new(),
            positions: Vec::new(),
            row_geometry: GeometryTable::default(),
            col_geometry: GeometryTable::default(),
            footer_geometry: GeometryTable::default(),
            row_heights: HashMap::new(),
            expansion: HashMap::new(),
            selection: SelectionModel::new(),
            loading: false,
        }
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    /// Swap the configuration and rebuild everything derived from it.
    ///
    /// A new row key field re-keys the loaded rows in place, current values
    /// included. Expansion, row heights and selection follow their rows; the
    /// returned map lists every key that changed, old to new. A new children
    /// field re-reads the rows as last loaded, like [`DataStore::set_data`],
    /// and returns an empty map. Nothing changes on error.
    pub fn set_config(&mut self, config: GridConfig) -> Result<HashMap<RowKey, RowKey>> {
        let columns = ColumnSet::new(self.columns.roots().to_vec(), &config)?;
        let reshaped = config.children_field != self.config.children_field;
        let arena = if reshaped {
            Some(RowArena::from_json(
                &self.source,
                &columns.schema(),
                config.row_key_field.as_deref(),
                &config.children_field,
            )?)
        } else if config.row_key_field != self.config.row_key_field {
            Some(self.arena.rekeyed(config.row_key_field.as_deref())?)
        } else {
            None
        };

        self.freeze_selection();
        let mut renamed = HashMap::new();
        if let Some(arena) = arena {
            if !reshaped {
                renamed = self
                    .arena
                    .iter()
                    .zip(arena.iter())
                    .filter(|((_, old), (_, new))| old.key != new.key)
                    .map(|((_, old), (_, new))| (old.key.clone(), new.key.clone()))
                    .collect();
            }
            self.arena = arena;
            rename_keys(&mut self.expansion, &renamed);
            rename_keys(&mut self.row_heights, &renamed);
            self.selection.rename(&renamed);
            let arena = &self.arena;
            self.expansion.retain(|k, _| arena.contains(k.as_str()));
            self.row_heights.retain(|k, _| arena.contains(k.as_str()));
            self.selection.retain(|k| arena.contains(k.as_str()));
            self.selection.set_range(None);
            tracing::debug!(rows = self.arena.len(), renamed = renamed.len(), "rows re-keyed");
        }
        self.config = config;
        self.columns = columns;
        self.init();
        Ok(renamed)
    }

    /// Replace the column definitions. Rows are re-typed against the new
    /// schema; nothing changes if any row does not fit it.
    pub fn set_columns(&mut self, columns: Vec<Column>) -> Result<()> {
        let set = ColumnSet::new(columns, &self.config)?;
        let schema = set.schema();
        let rows = self
            .arena
            .iter()
            .map(|(_, node)| node.row.conform(&schema))
            .collect::<Result<Vec<_>>>()?;
        let footer = self
            .footer
            .iter()
            .map(|row| row.conform(&schema))
            .collect::<Result<Vec<_>>>()?;

        for (node, row) in self.arena.iter_mut().zip(rows) {
            node.row = row;
        }
        self.footer = footer;
        self.header = HeaderLayout::new(set.roots());
        self.columns = set;
        self.selection.set_range(None);
        self.init();
        tracing::debug!(
            leaves = self.columns.len(),
            depth = self.header.depth(),
            "columns loaded"
        );
        Ok(())
    }

    /// Replace the dataset. Expansion, row heights and selection survive for
    /// keys that are still present. Returns `true` if selected keys were
    /// dropped.
    pub fn set_data(&mut self, rows: &[serde_json::Value]) -> Result<bool> {
        let arena = RowArena::from_json(
            rows,
            &self.columns.schema(),
            self.config.row_key_field.as_deref(),
            &self.config.children_field,
        )?;
        self.freeze_selection();
        self.arena = arena;
        self.source = rows.to_vec();
        let arena = &self.arena;
        self.expansion.retain(|k, _| arena.contains(k.as_str()));
        self.row_heights.retain(|k, _| arena.contains(k.as_str()));
        let pruned = self.selection.retain(|k| arena.contains(k.as_str()));
        self.selection.set_range(None);
        self.init();
        tracing::debug!(
            rows = self.arena.len(),
            visible = self.visible.len(),
            "data loaded"
        );
        Ok(pruned)
    }

    pub fn set_footer_data(&mut self, rows: &[serde_json::Value]) -> Result<()> {
        let schema = self.columns.schema();
        self.footer = rows
            .iter()
            .map(|value| Row::from_json(value, &schema, &self.config.children_field))
            .collect::<Result<Vec<_>>>()?;
        self.footer_geometry = self.build_footer_geometry();
        Ok(())
    }

    /// Install or remove the row filter. Returns `true` if selected rows were
    /// dropped because the filter removed them.
    pub fn set_filter_method(&mut self, filter: Option<RowFilter>) -> bool {
        self.freeze_selection();
        self.filter = filter;
        self.init();
        let (arena, keep) = (&self.arena, &self.keep);
        let pruned = self.selection.retain(|k| {
            arena
                .id_of(k.as_str())
                .and_then(|id| keep.get(id.index()).copied())
                .unwrap_or(false)
        });
        self.selection.set_range(None);
        pruned
    }

    pub fn has_filter(&self) -> bool {
        self.filter.is_some()
    }

    /// Rebuild the visible row list and all geometry from the current data,
    /// filter and expansion state.
    pub fn init(&mut self) {
        self.keep = match &self.filter {
            Some(filter) => self.arena.keep_mask(|node| filter(&node.row)),
            None => vec![true; self.arena.len()],
        };
        let (expansion, default) = (&self.expansion, self.config.default_expand_all);
        let visible = self
            .arena
            .flatten(&self.keep, |node| expanded_in(expansion, default, node.key.as_str()));
        self.visible = visible;
        self.reindex_from(0);

        let sizes = self.visible.iter().map(|id| self.row_height_of(*id)).collect();
        self.row_geometry = GeometryTable::new(sizes)
            .with_frozen(self.config.frozen_rows, self.config.frozen_bottom_rows);
        self.col_geometry = self.columns.geometry();
        self.footer_geometry = self.build_footer_geometry();
        tracing::debug!(
            rows = self.arena.len(),
            visible = self.visible.len(),
            "visible row list rebuilt"
        );
    }

    /// Pin a select-all to the rows it covers now. Called before anything
    /// that changes which rows are visible.
    fn freeze_selection(&mut self) {
        if !self.selection.needs_freeze() {
            return;
        }
        let arena = &self.arena;
        let visible: Vec<&RowKey> = self
            .visible
            .iter()
            .filter_map(|id| arena.node(*id))
            .map(|node| &node.key)
            .collect();
        self.selection.freeze(&visible);
    }

    fn build_footer_geometry(&self) -> GeometryTable {
        GeometryTable::uniform(self.footer.len(), self.config.footer_row_height)
    }

    fn reindex_from(&mut self, start: usize) {
        if start == 0 {
            self.positions = vec![None; self.arena.len()];
        }
        for (index, id) in self.visible.iter().enumerate().skip(start) {
            if let Some(slot) = self.positions.get_mut(id.index()) {
                *slot = Some(index);
            }
        }
    }

    fn row_height_of(&self, id: RowId) -> f32 {
        self.arena
            .node(id)
            .and_then(|node| self.row_heights.get(&node.key))
            .copied()
            .unwrap_or(self.config.row_height)
    }

    // Accessors

    pub fn columns(&self) -> &ColumnSet {
        &self.columns
    }

    pub fn header(&self) -> &HeaderLayout {
        &self.header
    }

    pub fn arena(&self) -> &RowArena {
        &self.arena
    }

    pub fn footer(&self) -> &[Row] {
        &self.footer
    }

    pub fn row_geometry(&self) -> &GeometryTable {
        &self.row_geometry
    }

    pub fn col_geometry(&self) -> &GeometryTable {
        &self.col_geometry
    }

    pub fn footer_geometry(&self) -> &GeometryTable {
        &self.footer_geometry
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Returns `true` if the flag changed.
    pub fn set_loading(&mut self, loading: bool) -> bool {
        let changed = self.loading != loading;
        self.loading = loading;
        changed
    }

    // Visible row list

    pub fn visible_len(&self) -> usize {
        self.visible.len()
    }

    pub fn visible_id(&self, index: usize) -> Option<RowId> {
        self.visible.get(index).copied()
    }

    pub fn visible_node(&self, index: usize) -> Option<&RowNode> {
        self.visible_id(index).and_then(|id| self.arena.node(id))
    }

    pub fn visible_nodes(&self) -> impl Iterator<Item = &RowNode> {
        self.visible.iter().filter_map(|id| self.arena.node(*id))
    }

    pub fn visible_index_of(&self, key: &str) -> Option<usize> {
        let id = self.arena.id_of(key)?;
        self.positions.get(id.index()).copied().flatten()
    }

    /// Whether the row passes the current filter.
    pub fn is_kept(&self, id: RowId) -> bool {
        self.keep.get(id.index()).copied().unwrap_or(false)
    }

    // Cell values

    pub fn get_item_value(&self, row_key: &str, column_key: &str) -> Option<&CellValue> {
        let id = self.arena.id_of(row_key)?;
        self.arena.node(id)?.row.get(column_key)
    }

    pub fn row(&self, row_key: &str) -> Option<&Row> {
        let id = self.arena.id_of(row_key)?;
        self.arena.node(id).map(|node| &node.row)
    }

    /// Write one cell. The value is checked against the column's kind first.
    ///
    /// Returns `(previous, stored)` or `None` when the row does not exist.
    pub fn replace_value(
        &mut self,
        row_key: &str,
        column_key: &str,
        value: CellValue,
    ) -> Result<Option<(CellValue, CellValue)>> {
        let Some(id) = self.arena.id_of(row_key) else {
            return Ok(None);
        };
        let kind = self
            .columns
            .get(column_key)
            .map_or(ValueKind::Any, |column| column.kind);
        let stored = kind.conform(&value).map_err(|found| GridError::ValueKind {
            column: ColumnKey::from(column_key),
            expected: kind,
            found,
        })?;
        let Some(node) = self.arena.node_mut(id) else {
            return Ok(None);
        };
        let previous = node.row.set(ColumnKey::from(column_key), stored.clone());
        Ok(Some((previous, stored)))
    }

    /// Every row that passes the filter, collapsed descendants included, in
    /// dataset pre-order.
    pub fn get_all_rows_data(&self) -> impl Iterator<Item = &RowNode> {
        self.arena
            .iter()
            .filter(|(id, _)| self.is_kept(*id))
            .map(|(_, node)| node)
    }

    /// Key of a row record, looked up by the key field when configured and by
    /// value otherwise.
    pub fn get_row_key_by_item(&self, row: &Row) -> Option<RowKey> {
        match self.config.row_key_field.as_deref() {
            Some(field) => {
                let key = match row.get(field)? {
                    CellValue::Text(s) => s.clone(),
                    CellValue::Number(n) => n.to_string(),
                    _ => return None,
                };
                self.arena.contains(&key).then(|| RowKey::from(key))
            }
            None => self
                .arena
                .iter()
                .find(|(_, node)| node.row == *row)
                .map(|(_, node)| node.key.clone()),
        }
    }

    // Expansion

    pub fn is_expanded(&self, key: &str) -> bool {
        expanded_in(&self.expansion, self.config.default_expand_all, key)
    }

    /// Expand or collapse one row. Collapsing also collapses every descendant.
    /// When the row is visible, its visible descendants are spliced out of (or
    /// into) the visible row list and the row geometry from the next index on.
    ///
    /// Returns `true` if any expansion state changed.
    pub fn expand_item(&mut self, key: &str, expand: bool) -> bool {
        let Some(id) = self.arena.id_of(key) else {
            return false;
        };
        if !self.arena.has_children(id) {
            return false;
        }
        let default = self.config.default_expand_all;
        let subtree = self.arena.descendants(id);

        let mut changed = expanded_in(&self.expansion, default, key) != expand;
        if let Some(node) = self.arena.node(id) {
            self.expansion.insert(node.key.clone(), expand);
        }
        if !expand {
            for (_, child) in self.arena.iter().skip(subtree.start).take(subtree.len()) {
                if !child.children.is_empty()
                    && expanded_in(&self.expansion, default, child.key.as_str())
                {
                    self.expansion.insert(child.key.clone(), false);
                    changed = true;
                }
            }
        }
        if !changed {
            return false;
        }

        let Some(position) = self.positions.get(id.index()).copied().flatten() else {
            // Hidden under a collapsed ancestor or filtered out
            return true;
        };
        self.freeze_selection();
        let start = position + 1;
        let removed = self
            .visible
            .iter()
            .skip(start)
            .take_while(|v| subtree.contains(&v.index()))
            .count();
        let inserted = if expand {
            let expansion = &self.expansion;
            self.arena.flatten_children(id, &self.keep, |node| {
                expanded_in(expansion, default, node.key.as_str())
            })
        } else {
            Vec::new()
        };
        for gone in self.visible.iter().skip(start).take(removed) {
            if let Some(slot) = self.positions.get_mut(gone.index()) {
                *slot = None;
            }
        }
        let sizes: Vec<f32> = inserted.iter().map(|id| self.row_height_of(*id)).collect();
        let added = inserted.len();
        self.visible.splice(start..start + removed, inserted);
        self.row_geometry.splice(start, removed, sizes);
        self.row_geometry
            .set_frozen(self.config.frozen_rows, self.config.frozen_bottom_rows);
        self.reindex_from(start);
        tracing::debug!(row = key, expand, removed, added, "row expansion changed");
        true
    }

    /// Expand or collapse every row with children, then rebuild.
    pub fn expand_all(&mut self, expand: bool) -> bool {
        let default = self.config.default_expand_all;
        let mut changed = false;
        for (_, node) in self.arena.iter() {
            if node.children.is_empty() {
                continue;
            }
            if expanded_in(&self.expansion, default, node.key.as_str()) != expand {
                changed = true;
            }
            self.expansion.insert(node.key.clone(), expand);
        }
        if changed {
            self.freeze_selection();
            self.init();
        }
        changed
    }

    // Sizes

    /// Override one row's height. Returns `true` if the row exists.
    pub fn set_row_height(&mut self, key: &str, height: f32) -> bool {
        let Some(node) = self.arena.id_of(key).and_then(|id| self.arena.node(id)) else {
            return false;
        };
        self.row_heights.insert(node.key.clone(), height);
        if let Some(index) = self.visible_index_of(key) {
            self.row_geometry.set_size(index, height);
        }
        true
    }

    /// Resize a leaf column, honoring the configured minimum. Returns its index.
    pub fn set_column_width(&mut self, key: &str, width: f32) -> Option<usize> {
        let index = self
            .columns
            .set_width(key, width, self.config.min_column_width)?;
        let stored = self.columns.leaf(index).map_or(width, |leaf| leaf.width);
        self.col_geometry.set_size(index, stored);
        Some(index)
    }

    // Selection

    pub fn selection(&self) -> &SelectionModel {
        &self.selection
    }

    pub fn is_row_selected(&self, key: &str) -> bool {
        let visible = self.visible_index_of(key).is_some();
        self.selection.is_selected(key, visible)
    }

    /// Select or deselect one row. Unknown and filtered-out rows are ignored.
    /// Returns `true` if membership changed.
    pub fn set_row_selection(&mut self, key: &str, selected: bool) -> bool {
        let Some(id) = self.arena.id_of(key) else {
            return false;
        };
        if !self.is_kept(id) {
            return false;
        }
        let Some(row_key) = self.arena.node(id).map(|node| node.key.clone()) else {
            return false;
        };
        let is_visible = self.positions.get(id.index()).copied().flatten().is_some();
        let arena = &self.arena;
        let visible = self
            .visible
            .iter()
            .filter_map(|id| arena.node(*id))
            .map(|node| &node.key);
        self.selection.set(&row_key, selected, is_visible, visible)
    }

    pub fn toggle_row_selection(&mut self, key: &str) -> bool {
        let selected = self.is_row_selected(key);
        self.set_row_selection(key, !selected)
    }

    pub fn toggle_all_selection(&mut self) -> bool {
        let all_selected = self
            .visible_nodes()
            .all(|node| self.selection.is_selected(node.key.as_str(), true));
        self.selection.toggle_all(self.visible.len(), all_selected)
    }

    pub fn clear_selection(&mut self) -> bool {
        self.selection.clear()
    }

    /// Selected rows in dataset pre-order.
    pub fn selection_rows(&self) -> Vec<&RowNode> {
        self.arena
            .iter()
            .filter(|(id, node)| {
                self.is_kept(*id)
                    && self.selection.is_selected(
                        node.key.as_str(),
                        self.positions.get(id.index()).copied().flatten().is_some(),
                    )
            })
            .map(|(_, node)| node)
            .collect()
    }

    pub fn cell_range(&self) -> Option<CellRange> {
        self.selection.range()
    }

    pub fn set_cell_range(&mut self, range: Option<CellRange>) -> bool {
        let range = range.and_then(|r| r.clamped(self.visible.len(), self.columns.len()));
        let changed = self.selection.range() != range;
        self.selection.set_range(range);
        changed
    }
}

/// Re-insert entries under their new keys in one pass, so a key that is both
/// renamed away and renamed to is not clobbered.
fn rename_keys<V>(map: &mut HashMap<RowKey, V>, renamed: &HashMap<RowKey, RowKey>) {
    if renamed.is_empty() {
        return;
    }
    *map = mem::take(map)
        .into_iter()
        .map(|(k, v)| (renamed.get(&k).cloned().unwrap_or(k), v))
        .collect();
}

fn expanded_in(expansion: &HashMap<RowKey, bool>, default: bool, key: &str) -> bool {
    expansion.get(key).copied().unwrap_or(default)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> DataStore {
        let config = GridConfig {
            row_key_field: Some("id".to_string()),
            row_height: 30.0,
            ..GridConfig::default()
        };
        let mut store = DataStore::new(config);
        store
            .set_columns(vec![Column::new("name", "Name")])
            .unwrap();
        store
            .set_data(&[
                json!({"id": "g1", "name": "group", "children": [
                    {"id": "c1", "name": "a"},
                    {"id": "c2", "name": "b", "children": [{"id": "d1", "name": "c"}]},
                ]}),
                json!({"id": "r2", "name": "tail"}),
            ])
            .unwrap();
        store
    }

    fn visible(store: &DataStore) -> Vec<String> {
        store.visible_nodes().map(|n| n.key.to_string()).collect()
    }

    #[test]
    fn test_expand_splices_geometry() {
        let mut store = store();
        assert_eq!(visible(&store), ["g1", "r2"]);
        assert!(store.expand_item("g1", true));
        assert_eq!(visible(&store), ["g1", "c1", "c2", "r2"]);
        assert_eq!(store.row_geometry().total_size(), 120.0);
        assert_eq!(store.visible_index_of("r2"), Some(3));
        assert!(store.expand_item("c2", true));
        assert_eq!(visible(&store), ["g1", "c1", "c2", "d1", "r2"]);
        assert!(!store.expand_item("c2", true));
    }

    #[test]
    fn test_collapse_collapses_descendants() {
        let mut store = store();
        store.expand_all(true);
        assert!(store.expand_item("g1", false));
        assert_eq!(visible(&store), ["g1", "r2"]);
        assert!(!store.is_expanded("c2"));
        assert_eq!(store.visible_index_of("d1"), None);
        assert_eq!(store.row_geometry().len(), 2);
    }

    #[test]
    fn test_leaf_rows_do_not_expand() {
        let mut store = store();
        assert!(!store.expand_item("r2", true));
        assert!(!store.expand_item("missing", true));
    }

    #[test]
    fn test_replace_value_checks_kind() {
        let mut store = store();
        store
            .set_columns(vec![
                Column::new("name", "Name"),
                Column::new("age", "Age").kind(ValueKind::Number),
            ])
            .unwrap();
        let (prev, stored) = store.replace_value("c1", "age", 31.into()).unwrap().unwrap();
        assert_eq!(prev, CellValue::Empty);
        assert_eq!(stored, CellValue::Number(31.0));
        assert!(store.replace_value("c1", "age", "old".into()).is_err());
        assert!(store.replace_value("zz", "age", 1.into()).unwrap().is_none());
    }

    #[test]
    fn test_set_columns_is_transactional() {
        let mut store = store();
        let err = store
            .set_columns(vec![Column::new("name", "Name").kind(ValueKind::Number)])
            .unwrap_err();
        assert!(matches!(err, GridError::ValueKind { .. }));
        assert_eq!(store.columns().get("name").unwrap().kind, ValueKind::Any);
        assert_eq!(
            store.get_item_value("g1", "name"),
            Some(&CellValue::from("group"))
        );
    }
}
