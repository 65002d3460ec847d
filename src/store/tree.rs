//! Row arena: tree rows stored flat in pre-order with index links.
//!
//! Parents always precede their descendants, so a reverse scan visits
//! children before parents (used for filter pruning) and a subtree occupies a
//! contiguous run of arena slots.

use std::collections::HashMap;

use crate::error::{GridError, Result};
use crate::types::{CellValue, Row, RowKey, Schema};

/// Index of a row inside the arena. Only valid until the next data load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RowId(usize);

impl RowId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone)]
pub struct RowNode {
    pub key: RowKey,
    pub row: Row,
    pub parent: Option<RowId>,
    pub children: Vec<RowId>,
    pub depth: usize,
}

#[derive(Debug, Clone, Default)]
pub struct RowArena {
    nodes: Vec<RowNode>,
    roots: Vec<RowId>,
    by_key: HashMap<RowKey, RowId>,
}

impl RowArena {
    /// Build the arena from JSON rows.
    ///
    /// Keys come from `key_field` when configured; otherwise they are the row's
    /// position path (`"3"`, `"3-0"`). Keys must be unique across all depths.
    pub fn from_json(
        rows: &[serde_json::Value],
        schema: &Schema,
        key_field: Option<&str>,
        children_field: &str,
    ) -> Result<Self> {
        let mut arena = Self::default();
        // (value, parent, path) in pre-order; pushed reversed so pops come out in order
        let mut stack: Vec<(&serde_json::Value, Option<RowId>, String)> = rows
            .iter()
            .enumerate()
            .rev()
            .map(|(i, v)| (v, None, i.to_string()))
            .collect();

        while let Some((value, parent, path)) = stack.pop() {
            let row = Row::from_json(value, schema, children_field)?;
            let key = match key_field {
                Some(field) => key_from_field(&row, field)?,
                None => RowKey::from(path.as_str()),
            };
            if arena.by_key.contains_key(&key) {
                return Err(GridError::DuplicateRowKey(key));
            }
            let id = RowId(arena.nodes.len());
            let depth = parent
                .and_then(|p| arena.node(p))
                .map_or(0, |p| p.depth + 1);
            match parent.and_then(|p| arena.nodes.get_mut(p.0)) {
                Some(parent_node) => parent_node.children.push(id),
                None => arena.roots.push(id),
            }
            arena.by_key.insert(key.clone(), id);
            arena.nodes.push(RowNode {
                key,
                row,
                parent,
                children: Vec::new(),
                depth,
            });

            if let Some(serde_json::Value::Array(children)) = value.get(children_field) {
                for (i, child) in children.iter().enumerate().rev() {
                    stack.push((child, Some(id), format!("{path}-{i}")));
                }
            }
        }
        Ok(arena)
    }

    /// The same rows and shape under keys read from `key_field`, or under
    /// position paths when it is `None`. Row ids stay valid across the call.
    pub fn rekeyed(&self, key_field: Option<&str>) -> Result<Self> {
        let mut paths = vec![String::new(); self.nodes.len()];
        for (i, root) in self.roots.iter().enumerate() {
            if let Some(path) = paths.get_mut(root.0) {
                *path = i.to_string();
            }
        }
        let mut arena = Self {
            nodes: Vec::with_capacity(self.nodes.len()),
            roots: self.roots.clone(),
            by_key: HashMap::with_capacity(self.nodes.len()),
        };
        // Parents precede children, so a row's path is set before it is read
        for (index, node) in self.nodes.iter().enumerate() {
            let path = paths.get(index).cloned().unwrap_or_default();
            for (i, child) in node.children.iter().enumerate() {
                if let Some(slot) = paths.get_mut(child.0) {
                    *slot = format!("{path}-{i}");
                }
            }
            let key = match key_field {
                Some(field) => key_from_field(&node.row, field)?,
                None => RowKey::from(path.as_str()),
            };
            if arena.by_key.insert(key.clone(), RowId(index)).is_some() {
                return Err(GridError::DuplicateRowKey(key));
            }
            arena.nodes.push(RowNode {
                key,
                ..node.clone()
            });
        }
        Ok(arena)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: RowId) -> Option<&RowNode> {
        self.nodes.get(id.0)
    }

    pub fn node_mut(&mut self, id: RowId) -> Option<&mut RowNode> {
        self.nodes.get_mut(id.0)
    }

    pub fn id_of(&self, key: &str) -> Option<RowId> {
        self.by_key.get(key).copied()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.by_key.contains_key(key)
    }

    /// All rows in pre-order.
    pub fn iter(&self) -> impl Iterator<Item = (RowId, &RowNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (RowId(i), n))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut RowNode> {
        self.nodes.iter_mut()
    }

    pub fn has_children(&self, id: RowId) -> bool {
        self.node(id).is_some_and(|n| !n.children.is_empty())
    }

    /// Arena slots of `id`'s descendants: `id + 1 .. end`.
    pub fn descendants(&self, id: RowId) -> std::ops::Range<usize> {
        let start = id.0 + 1;
        let Some(depth) = self.node(id).map(|n| n.depth) else {
            return start..start;
        };
        let end = self
            .nodes
            .iter()
            .skip(start)
            .position(|n| n.depth <= depth)
            .map_or(self.nodes.len(), |offset| start + offset);
        start..end
    }

    /// Ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: RowId) -> impl Iterator<Item = RowId> + '_ {
        std::iter::successors(self.node(id).and_then(|n| n.parent), move |p| {
            self.node(*p).and_then(|n| n.parent)
        })
    }

    /// Compute which rows survive a filter: a row is kept when it matches or
    /// when any descendant is kept.
    pub fn keep_mask(&self, matches: impl Fn(&RowNode) -> bool) -> Vec<bool> {
        let mut keep = vec![false; self.nodes.len()];
        for index in (0..self.nodes.len()).rev() {
            let Some(node) = self.nodes.get(index) else {
                continue;
            };
            let kept = matches(node)
                || node
                    .children
                    .iter()
                    .any(|c| keep.get(c.0).copied().unwrap_or(false));
            if let Some(slot) = keep.get_mut(index) {
                *slot = kept;
            }
        }
        keep
    }

    /// Flatten kept rows in display order, descending only into expanded rows.
    pub fn flatten(&self, keep: &[bool], is_expanded: impl Fn(&RowNode) -> bool) -> Vec<RowId> {
        let mut out = Vec::new();
        self.flatten_into(&self.roots, keep, &is_expanded, &mut out);
        out
    }

    /// Flatten the visible descendants of `id` (the row itself excluded).
    pub fn flatten_children(
        &self,
        id: RowId,
        keep: &[bool],
        is_expanded: impl Fn(&RowNode) -> bool,
    ) -> Vec<RowId> {
        let mut out = Vec::new();
        if let Some(node) = self.node(id) {
            self.flatten_into(&node.children, keep, &is_expanded, &mut out);
        }
        out
    }

    fn flatten_into(
        &self,
        start: &[RowId],
        keep: &[bool],
        is_expanded: &dyn Fn(&RowNode) -> bool,
        out: &mut Vec<RowId>,
    ) {
        let mut stack: Vec<RowId> = start.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            if !keep.get(id.0).copied().unwrap_or(false) {
                continue;
            }
            let Some(node) = self.node(id) else {
                continue;
            };
            out.push(id);
            if is_expanded(node) {
                stack.extend(node.children.iter().rev().copied());
            }
        }
    }
}

fn key_from_field(row: &Row, field: &str) -> Result<RowKey> {
    match row.get(field) {
        Some(CellValue::Text(s)) if !s.is_empty() => Ok(RowKey::from(s.as_str())),
        Some(CellValue::Number(n)) => Ok(RowKey::from(n.to_string())),
        other => Err(GridError::InvalidRow(format!(
            "row key field {field:?} must be a non-empty text or number, got {other:?}"
        ))),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tree() -> RowArena {
        RowArena::from_json(
            &[
                json!({"id": "g1", "name": "group", "children": [
                    {"id": "c1", "name": "alpha"},
                    {"id": "c2", "name": "beta", "children": [{"id": "d1", "name": "deep"}]},
                ]}),
                json!({"id": "r2", "name": "alpha"}),
            ],
            &Schema::new(),
            Some("id"),
            "children",
        )
        .unwrap()
    }

    fn keys(arena: &RowArena, ids: &[RowId]) -> Vec<String> {
        ids.iter()
            .map(|id| arena.node(*id).unwrap().key.to_string())
            .collect()
    }

    #[test]
    fn test_pre_order_with_depths() {
        let arena = tree();
        let order: Vec<_> = arena
            .iter()
            .map(|(_, n)| (n.key.to_string(), n.depth))
            .collect();
        assert_eq!(
            order,
            [
                ("g1".to_string(), 0),
                ("c1".to_string(), 1),
                ("c2".to_string(), 1),
                ("d1".to_string(), 2),
                ("r2".to_string(), 0)
            ]
        );
        let d1 = arena.id_of("d1").unwrap();
        assert_eq!(keys(&arena, &arena.ancestors(d1).collect::<Vec<_>>()), ["c2", "g1"]);
        assert_eq!(arena.descendants(arena.id_of("g1").unwrap()), 1..4);
        assert_eq!(arena.descendants(arena.id_of("c1").unwrap()), 2..2);
        assert_eq!(arena.descendants(arena.id_of("r2").unwrap()), 5..5);
    }

    #[test]
    fn test_synthesized_path_keys() {
        let arena = RowArena::from_json(
            &[json!({"children": [{}, {}]}), json!({})],
            &Schema::new(),
            None,
            "children",
        )
        .unwrap();
        let all: Vec<_> = arena.iter().map(|(_, n)| n.key.to_string()).collect();
        assert_eq!(all, ["0", "0-0", "0-1", "1"]);
    }

    #[test]
    fn test_rekeyed_keeps_shape() {
        let arena = tree();
        let by_path = arena.rekeyed(None).unwrap();
        let order: Vec<_> = by_path.iter().map(|(_, n)| n.key.to_string()).collect();
        assert_eq!(order, ["0", "0-0", "0-1", "0-1-0", "1"]);
        assert_eq!(by_path.id_of("0-1-0"), arena.id_of("d1"));

        let back = by_path.rekeyed(Some("id")).unwrap();
        assert_eq!(back.id_of("c2"), arena.id_of("c2"));
        assert!(!back.contains("0-1"));
        assert!(matches!(
            back.rekeyed(Some("name")),
            Err(GridError::DuplicateRowKey(_))
        ));
    }

    #[test]
    fn test_duplicate_key_across_depths() {
        let err = RowArena::from_json(
            &[json!({"id": "a", "children": [{"id": "a"}]})],
            &Schema::new(),
            Some("id"),
            "children",
        )
        .unwrap_err();
        assert!(matches!(err, GridError::DuplicateRowKey(k) if k.as_str() == "a"));
    }

    #[test]
    fn test_missing_key_field_is_invalid() {
        let err = RowArena::from_json(&[json!({"name": "x"})], &Schema::new(), Some("id"), "children")
            .unwrap_err();
        assert!(matches!(err, GridError::InvalidRow(_)));
    }

    #[test]
    fn test_flatten_respects_expansion() {
        let arena = tree();
        let keep = arena.keep_mask(|_| true);
        assert_eq!(keys(&arena, &arena.flatten(&keep, |_| false)), ["g1", "r2"]);
        assert_eq!(
            keys(&arena, &arena.flatten(&keep, |_| true)),
            ["g1", "c1", "c2", "d1", "r2"]
        );
        let g1 = arena.id_of("g1").unwrap();
        assert_eq!(
            keys(&arena, &arena.flatten_children(g1, &keep, |n| n.key.as_str() == "g1")),
            ["c1", "c2"]
        );
    }

    #[test]
    fn test_filter_keeps_ancestors_of_matches() {
        let arena = tree();
        let keep = arena.keep_mask(|n| n.key.as_str() == "d1");
        assert_eq!(
            keys(&arena, &arena.flatten(&keep, |_| true)),
            ["g1", "c2", "d1"]
        );
    }

    #[test]
    fn test_filter_matching_parent_without_matching_children() {
        let arena = tree();
        let keep = arena.keep_mask(|n| n.key.as_str() == "g1");
        assert_eq!(keys(&arena, &arena.flatten(&keep, |_| true)), ["g1"]);
    }
}
