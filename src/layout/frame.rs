//! Structural layout of one frame: header, body and footer cells in widget
//! coordinates, plus the merge map the body is built against.
//!
//! A frame is recomputed from scratch on every repaint; the painter only ever
//! sees a complete [`FrameLayout`], never a partially updated one.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{HeaderCell, VisibleWindow};
use crate::types::{CellRange, ColumnKey, RowKey};

/// Rectangle representing a cell's bounds
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct CellRect {
    /// X position (left edge)
    pub x: f32,
    /// Y position (top edge)
    pub y: f32,
    /// Width of the cell
    pub width: f32,
    /// Height of the cell
    pub height: f32,
    /// True if this cell should be skipped (part of merge but not origin)
    pub skip: bool,
}

/// A merged region as supplied by the caller, anchored by keys so it follows
/// its rows through filtering and expansion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeSpec {
    pub row_key: RowKey,
    pub column_key: ColumnKey,
    pub row_span: usize,
    pub col_span: usize,
}

/// A merged region resolved to visible index space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeRange {
    pub row: usize,
    pub col: usize,
    pub row_span: usize,
    pub col_span: usize,
}

impl MergeRange {
    fn end_row(&self) -> usize {
        self.row + self.row_span - 1
    }

    fn end_col(&self) -> usize {
        self.col + self.col_span - 1
    }

    fn cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (self.row..=self.end_row()).flat_map(move |r| (self.col..=self.end_col()).map(move |c| (r, c)))
    }
}

/// Information about a merged cell region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeInfo {
    /// True if this cell is the top-left origin of the merge
    pub is_origin: bool,
    pub origin_row: usize,
    pub origin_col: usize,
    pub row_span: usize,
    pub col_span: usize,
}

/// Merge lookup by `(row, col)`.
#[derive(Debug, Clone, Default)]
pub struct MergeMap {
    ranges: Vec<MergeRange>,
    cells: HashMap<(usize, usize), MergeInfo>,
}

impl MergeMap {
    /// Build the lookup. Single-cell ranges are ignored; a range overlapping an
    /// earlier one is dropped.
    pub fn new(ranges: impl IntoIterator<Item = MergeRange>) -> Self {
        let mut map = Self::default();
        for range in ranges {
            if range.row_span == 0 || range.col_span == 0 {
                continue;
            }
            if range.row_span == 1 && range.col_span == 1 {
                continue;
            }
            if range.cells().any(|cell| map.cells.contains_key(&cell)) {
                tracing::warn!(row = range.row, col = range.col, "overlapping merge dropped");
                continue;
            }
            for (r, c) in range.cells() {
                map.cells.insert(
                    (r, c),
                    MergeInfo {
                        is_origin: r == range.row && c == range.col,
                        origin_row: range.row,
                        origin_col: range.col,
                        row_span: range.row_span,
                        col_span: range.col_span,
                    },
                );
            }
            map.ranges.push(range);
        }
        map
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&MergeInfo> {
        self.cells.get(&(row, col))
    }

    pub fn ranges(&self) -> &[MergeRange] {
        &self.ranges
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Grow `range` until no merge straddles its border.
    pub fn expand(&self, range: CellRange) -> CellRange {
        let (mut r0, mut c0, mut r1, mut c1) = range.bounds();
        loop {
            let mut grown = false;
            for merge in &self.ranges {
                let intersects = merge.row <= r1
                    && merge.end_row() >= r0
                    && merge.col <= c1
                    && merge.end_col() >= c0;
                if !intersects {
                    continue;
                }
                let (nr0, nc0) = (r0.min(merge.row), c0.min(merge.col));
                let (nr1, nc1) = (r1.max(merge.end_row()), c1.max(merge.end_col()));
                if (nr0, nc0, nr1, nc1) != (r0, c0, r1, c1) {
                    (r0, c0, r1, c1) = (nr0, nc0, nr1, nc1);
                    grown = true;
                }
            }
            if !grown {
                break;
            }
        }
        // Keep the anchor at the corner it started on
        let (anchor_row, focus_row) = if range.anchor_row <= range.focus_row {
            (r0, r1)
        } else {
            (r1, r0)
        };
        let (anchor_col, focus_col) = if range.anchor_col <= range.focus_col {
            (c0, c1)
        } else {
            (c1, c0)
        };
        CellRange {
            anchor_row,
            anchor_col,
            focus_row,
            focus_col,
            ..range
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedHeader {
    #[serde(flatten)]
    pub cell: HeaderCell,
    pub rect: CellRect,
}

/// Per-row state the painter needs once per row (tree toggle, selection).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BodyRow {
    pub index: usize,
    pub key: RowKey,
    pub y: f32,
    pub height: f32,
    pub depth: usize,
    pub has_children: bool,
    pub expanded: bool,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BodyCell {
    pub row: usize,
    pub col: usize,
    pub rect: CellRect,
    pub text: String,
    /// Differs from its original value
    pub changed: bool,
    /// Active validation message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Inside the current cell-range selection
    pub in_range: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FooterCell {
    pub row: usize,
    pub col: usize,
    pub rect: CellRect,
    pub text: String,
}

/// Everything a painter needs for one frame.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameLayout {
    pub revision: u64,
    /// The overlay layer keeps its previous contents this frame
    pub skip_overlay: bool,
    pub width: f32,
    pub height: f32,
    pub header_height: f32,
    pub body_height: f32,
    pub footer_height: f32,
    pub scroll_x: f32,
    pub scroll_y: f32,
    pub rows: VisibleWindow,
    pub cols: VisibleWindow,
    pub header: Vec<PlacedHeader>,
    pub body_rows: Vec<BodyRow>,
    pub body: Vec<BodyCell>,
    pub footer: Vec<FooterCell>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selection: Option<CellRange>,
}

impl FrameLayout {
    pub fn cell(&self, row: usize, col: usize) -> Option<&BodyCell> {
        self.body.iter().find(|c| c.row == row && c.col == col)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn range(row: usize, col: usize, row_span: usize, col_span: usize) -> MergeRange {
        MergeRange {
            row,
            col,
            row_span,
            col_span,
        }
    }

    #[test]
    fn test_merge_map_marks_origin() {
        let map = MergeMap::new([range(1, 1, 2, 3)]);
        assert!(map.get(1, 1).unwrap().is_origin);
        let covered = map.get(2, 3).unwrap();
        assert!(!covered.is_origin);
        assert_eq!((covered.origin_row, covered.origin_col), (1, 1));
        assert!(map.get(3, 1).is_none());
    }

    #[test]
    fn test_overlapping_and_trivial_merges_dropped() {
        let map = MergeMap::new([range(0, 0, 2, 2), range(1, 1, 2, 2), range(5, 5, 1, 1)]);
        assert_eq!(map.ranges().len(), 1);
    }

    #[test]
    fn test_expand_covers_chained_merges() {
        let map = MergeMap::new([range(0, 1, 2, 1), range(1, 2, 3, 1)]);
        let expanded = map.expand(CellRange::cell(0, 1));
        assert_eq!(expanded.bounds(), (0, 1, 1, 1));
        let expanded = map.expand(CellRange::cell_range(0, 1, 1, 2));
        assert_eq!(expanded.bounds(), (0, 1, 3, 2));
    }

    #[test]
    fn test_expand_keeps_direction() {
        let map = MergeMap::new([range(2, 2, 2, 2)]);
        let expanded = map.expand(CellRange::cell_range(3, 3, 0, 0));
        assert_eq!((expanded.anchor_row, expanded.anchor_col), (3, 3));
        assert_eq!((expanded.focus_row, expanded.focus_col), (0, 0));
    }
}
