use serde::Serialize;

/// Type of cell-range selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SelectionType {
    /// Standard cell selection (default)
    #[default]
    CellRange,
    /// Entire row(s) selected
    RowRange,
    /// Entire column(s) selected
    ColumnRange,
    /// All cells selected (corner click)
    All,
}

/// Rectangular selection in visible index space, described by an anchor
/// (where the gesture started) and a focus (where it currently ends).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CellRange {
    pub selection_type: SelectionType,
    pub anchor_row: usize,
    pub anchor_col: usize,
    pub focus_row: usize,
    pub focus_col: usize,
}

impl CellRange {
    /// Create a new cell range selection
    pub fn cell_range(anchor_row: usize, anchor_col: usize, focus_row: usize, focus_col: usize) -> Self {
        Self {
            selection_type: SelectionType::CellRange,
            anchor_row,
            anchor_col,
            focus_row,
            focus_col,
        }
    }

    /// Single cell selection
    pub fn cell(row: usize, col: usize) -> Self {
        Self::cell_range(row, col, row, col)
    }

    /// Create a row range selection spanning `col_count` columns
    pub fn row_range(start_row: usize, end_row: usize, col_count: usize) -> Self {
        Self {
            selection_type: SelectionType::RowRange,
            anchor_row: start_row,
            anchor_col: 0,
            focus_row: end_row,
            focus_col: col_count.saturating_sub(1),
        }
    }

    /// Create a column range selection spanning `row_count` rows
    pub fn column_range(start_col: usize, end_col: usize, row_count: usize) -> Self {
        Self {
            selection_type: SelectionType::ColumnRange,
            anchor_row: 0,
            anchor_col: start_col,
            focus_row: row_count.saturating_sub(1),
            focus_col: end_col,
        }
    }

    /// Create a select-all selection
    pub fn all(row_count: usize, col_count: usize) -> Self {
        Self {
            selection_type: SelectionType::All,
            anchor_row: 0,
            anchor_col: 0,
            focus_row: row_count.saturating_sub(1),
            focus_col: col_count.saturating_sub(1),
        }
    }

    /// Get normalized bounds `(min_row, min_col, max_row, max_col)`, inclusive
    pub fn bounds(&self) -> (usize, usize, usize, usize) {
        (
            self.anchor_row.min(self.focus_row),
            self.anchor_col.min(self.focus_col),
            self.anchor_row.max(self.focus_row),
            self.anchor_col.max(self.focus_col),
        )
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        let (r0, c0, r1, c1) = self.bounds();
        (r0..=r1).contains(&row) && (c0..=c1).contains(&col)
    }

    /// Clamp both corners into a `rows` x `cols` grid. `None` when the grid is empty.
    pub fn clamped(&self, rows: usize, cols: usize) -> Option<Self> {
        if rows == 0 || cols == 0 {
            return None;
        }
        let max_row = rows - 1;
        let max_col = cols - 1;
        Some(Self {
            anchor_row: self.anchor_row.min(max_row),
            anchor_col: self.anchor_col.min(max_col),
            focus_row: self.focus_row.min(max_row),
            focus_col: self.focus_col.min(max_col),
            ..*self
        })
    }
}
