//! Header cells computed from the column tree.
//!
//! Header structure only depends on the column tree, so it is built once per
//! column load. Pixel extents are read from the column [`GeometryTable`] when a
//! frame is laid out, which keeps group widths equal to the sum of their leaf
//! widths after any resize.

use serde::Serialize;

use super::{to_pixels, GeometryTable};
use crate::types::{Column, ColumnKey};

/// One header cell: a leaf column or a group spanning its leaves.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderCell {
    pub key: ColumnKey,
    pub title: String,
    /// Header row, 0 = top
    pub level: usize,
    /// Header rows covered; leaves stretch down to the last header row
    pub row_span: usize,
    /// First leaf index covered
    pub col_start: usize,
    /// Number of leaves covered
    pub col_span: usize,
    pub leaf: bool,
}

impl HeaderCell {
    pub fn col_end(&self) -> usize {
        self.col_start + self.col_span
    }

    /// Pixel width: the sum of covered leaf widths.
    pub fn width(&self, cols: &GeometryTable) -> f32 {
        to_pixels(cols.offset_of(self.col_end()) - cols.offset_of(self.col_start))
    }
}

#[derive(Debug, Clone, Default)]
pub struct HeaderLayout {
    cells: Vec<HeaderCell>,
    depth: usize,
}

impl HeaderLayout {
    /// Walk the column tree in display order. `roots` must already be in the
    /// order the leaf list was built from.
    pub fn new(roots: &[Column]) -> Self {
        let depth = roots.iter().map(tree_depth).max().unwrap_or(0);
        let mut layout = Self {
            cells: Vec::new(),
            depth,
        };
        let mut next_leaf = 0;
        for column in roots {
            layout.push(column, 0, &mut next_leaf);
        }
        layout
    }

    fn push(&mut self, column: &Column, level: usize, next_leaf: &mut usize) -> usize {
        let slot = self.cells.len();
        let col_start = *next_leaf;
        self.cells.push(HeaderCell {
            key: column.key.clone(),
            title: column.title.clone(),
            level,
            row_span: 1,
            col_start,
            col_span: 0,
            leaf: column.is_leaf(),
        });
        let col_span = if column.is_leaf() {
            *next_leaf += 1;
            1
        } else {
            column
                .children
                .iter()
                .map(|child| self.push(child, level + 1, next_leaf))
                .sum()
        };
        let row_span = if column.is_leaf() {
            self.depth.saturating_sub(level).max(1)
        } else {
            1
        };
        if let Some(cell) = self.cells.get_mut(slot) {
            cell.col_span = col_span;
            cell.row_span = row_span;
        }
        col_span
    }

    pub fn cells(&self) -> &[HeaderCell] {
        &self.cells
    }

    /// Number of header rows.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn height(&self, row_height: f32) -> f32 {
        row_height * self.depth as f32
    }
}

fn tree_depth(column: &Column) -> usize {
    1 + column.children.iter().map(tree_depth).max().unwrap_or(0)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn columns() -> Vec<Column> {
        vec![
            Column::new("id", "ID"),
            Column::group(
                "person",
                "Person",
                vec![
                    Column::new("name", "Name"),
                    Column::group(
                        "contact",
                        "Contact",
                        vec![Column::new("mail", "Mail"), Column::new("phone", "Phone")],
                    ),
                ],
            ),
        ]
    }

    #[test]
    fn test_spans_follow_tree() {
        let header = HeaderLayout::new(&columns());
        assert_eq!(header.depth(), 3);
        let by_key = |k: &str| header.cells().iter().find(|c| c.key.as_str() == k).unwrap();
        assert_eq!(by_key("id").row_span, 3);
        assert_eq!(by_key("person").col_span, 3);
        assert_eq!(by_key("person").col_start, 1);
        assert_eq!(by_key("name").row_span, 2);
        assert_eq!(by_key("contact").col_start, 2);
        assert_eq!(by_key("phone").col_start, 3);
        assert_eq!(by_key("phone").level, 2);
    }

    #[test]
    fn test_group_width_is_sum_of_leaves() {
        let header = HeaderLayout::new(&columns());
        let cols = GeometryTable::new(vec![40.0, 100.0, 120.0, 80.0]);
        let person = header
            .cells()
            .iter()
            .find(|c| c.key.as_str() == "person")
            .unwrap();
        assert_eq!(person.width(&cols), 300.0);
    }

    #[test]
    fn test_empty_columns() {
        let header = HeaderLayout::new(&[]);
        assert_eq!(header.depth(), 0);
        assert!(header.cells().is_empty());
        assert_eq!(header.height(36.0), 0.0);
    }
}
