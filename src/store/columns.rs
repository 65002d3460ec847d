//! Column tree and its flattened leaf list.

use std::collections::HashMap;

use crate::config::GridConfig;
use crate::error::{GridError, Result};
use crate::layout::GeometryTable;
use crate::types::{Column, ColumnKey, Fixed, Schema, ValueKind};

/// A data-holding column after flattening.
#[derive(Debug, Clone)]
pub struct LeafColumn {
    pub key: ColumnKey,
    pub title: String,
    pub width: f32,
    pub fixed: Option<Fixed>,
    pub kind: ValueKind,
    pub readonly: bool,
    pub required: bool,
}

/// Column definitions, ordered left-fixed / scrolling / right-fixed, with the
/// leaf list every other component addresses by index.
#[derive(Debug, Clone, Default)]
pub struct ColumnSet {
    roots: Vec<Column>,
    leaves: Vec<LeafColumn>,
    index: HashMap<ColumnKey, usize>,
    depth: usize,
    left_count: usize,
    right_count: usize,
}

impl ColumnSet {
    /// Flatten a column tree. Leaf keys must be unique.
    pub fn new(columns: Vec<Column>, config: &GridConfig) -> Result<Self> {
        let (mut left, mut middle, mut right) = (Vec::new(), Vec::new(), Vec::new());
        for column in columns {
            match column.fixed {
                Some(Fixed::Left) => left.push(column),
                Some(Fixed::Right) => right.push(column),
                None => middle.push(column),
            }
        }

        let mut set = Self::default();
        for (band, fixed) in [(&left, Some(Fixed::Left)), (&middle, None), (&right, Some(Fixed::Right))] {
            for column in band {
                let depth = set.collect_leaves(column, fixed, 1, config)?;
                set.depth = set.depth.max(depth);
            }
        }
        set.right_count = right.iter().map(count_leaves).sum();
        set.left_count = left.iter().map(count_leaves).sum();
        set.roots = left.into_iter().chain(middle).chain(right).collect();
        Ok(set)
    }

    fn collect_leaves(
        &mut self,
        column: &Column,
        fixed: Option<Fixed>,
        depth: usize,
        config: &GridConfig,
    ) -> Result<usize> {
        if column.is_leaf() {
            if self.index.contains_key(&column.key) {
                return Err(GridError::DuplicateColumnKey(column.key.clone()));
            }
            self.index.insert(column.key.clone(), self.leaves.len());
            self.leaves.push(LeafColumn {
                key: column.key.clone(),
                title: column.title.clone(),
                width: column
                    .width
                    .unwrap_or(config.default_column_width)
                    .max(config.min_column_width),
                fixed,
                kind: column.kind,
                readonly: column.readonly,
                required: column.required,
            });
            return Ok(depth);
        }
        let mut deepest = depth;
        for child in &column.children {
            deepest = deepest.max(self.collect_leaves(child, fixed, depth + 1, config)?);
        }
        Ok(deepest)
    }

    /// Top-level columns in display order.
    pub fn roots(&self) -> &[Column] {
        &self.roots
    }

    pub fn leaves(&self) -> &[LeafColumn] {
        &self.leaves
    }

    pub fn leaf(&self, index: usize) -> Option<&LeafColumn> {
        self.leaves.get(index)
    }

    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }

    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.index.get(key).copied()
    }

    pub fn get(&self, key: &str) -> Option<&LeafColumn> {
        self.index_of(key).and_then(|i| self.leaves.get(i))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Number of header levels.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Leaf kinds by key, for typing rows.
    pub fn schema(&self) -> Schema {
        self.leaves.iter().map(|l| (l.key.clone(), l.kind)).collect()
    }

    /// Column geometry: left-fixed leaves form the leading band, right-fixed
    /// the trailing band.
    pub fn geometry(&self) -> GeometryTable {
        GeometryTable::new(self.leaves.iter().map(|l| l.width).collect())
            .with_frozen(self.left_count, self.right_count)
    }

    /// Resize a leaf column. Returns its index when found.
    pub fn set_width(&mut self, key: &str, width: f32, min_width: f32) -> Option<usize> {
        let index = self.index_of(key)?;
        let leaf = self.leaves.get_mut(index)?;
        leaf.width = width.max(min_width);
        let width = leaf.width;
        for root in &mut self.roots {
            if set_tree_width(root, key, width) {
                break;
            }
        }
        Some(index)
    }
}

fn set_tree_width(column: &mut Column, key: &str, width: f32) -> bool {
    if column.is_leaf() {
        if column.key.as_str() == key {
            column.width = Some(width);
            return true;
        }
        return false;
    }
    column
        .children
        .iter_mut()
        .any(|child| set_tree_width(child, key, width))
}

fn count_leaves(column: &Column) -> usize {
    if column.is_leaf() {
        1
    } else {
        column.children.iter().map(count_leaves).sum()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn config() -> GridConfig {
        GridConfig::default()
    }

    #[test]
    fn test_leaf_order_respects_fixed_bands() {
        let set = ColumnSet::new(
            vec![
                Column::new("b", "B"),
                Column::new("z", "Z").fixed(Fixed::Right),
                Column::new("a", "A").fixed(Fixed::Left),
                Column::new("c", "C"),
            ],
            &config(),
        )
        .unwrap();
        let keys: Vec<_> = set.leaves().iter().map(|l| l.key.as_str()).collect();
        assert_eq!(keys, ["a", "b", "c", "z"]);
        let geometry = set.geometry();
        assert_eq!(geometry.leading_count(), 1);
        assert_eq!(geometry.trailing_count(), 1);
    }

    #[test]
    fn test_groups_flatten_to_leaves() {
        let set = ColumnSet::new(
            vec![
                Column::new("id", "ID").width(50.0),
                Column::group(
                    "person",
                    "Person",
                    vec![Column::new("name", "Name"), Column::new("age", "Age")],
                ),
            ],
            &config(),
        )
        .unwrap();
        assert_eq!(set.len(), 3);
        assert_eq!(set.depth(), 2);
        assert_eq!(set.index_of("age"), Some(2));
        assert!(!set.contains("person"));
        assert_eq!(set.leaves()[0].width, 50.0);
        assert_eq!(set.leaves()[1].width, 100.0);
    }

    #[test]
    fn test_fixed_group_counts_all_leaves() {
        let set = ColumnSet::new(
            vec![
                Column::group("g", "G", vec![Column::new("a", "A"), Column::new("b", "B")])
                    .fixed(Fixed::Left),
                Column::new("c", "C"),
            ],
            &config(),
        )
        .unwrap();
        assert_eq!(set.geometry().leading_count(), 2);
        assert_eq!(set.leaf(1).unwrap().fixed, Some(Fixed::Left));
    }

    #[test]
    fn test_duplicate_leaf_key_is_rejected() {
        let err = ColumnSet::new(
            vec![
                Column::new("a", "A"),
                Column::group("g", "G", vec![Column::new("a", "Again")]),
            ],
            &config(),
        )
        .unwrap_err();
        assert!(matches!(err, GridError::DuplicateColumnKey(k) if k.as_str() == "a"));
    }

    #[test]
    fn test_set_width_honors_minimum() {
        let mut set = ColumnSet::new(vec![Column::new("a", "A")], &config()).unwrap();
        assert_eq!(set.set_width("a", 5.0, 20.0), Some(0));
        assert_eq!(set.leaves()[0].width, 20.0);
        assert_eq!(set.roots()[0].width, Some(20.0));
        assert_eq!(set.set_width("missing", 50.0, 20.0), None);
    }
}
