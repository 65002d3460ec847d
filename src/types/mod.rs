//! Data types for the grid model.

mod column;
mod keys;
mod row;
mod selection;
mod value;

pub use column::*;
pub use keys::*;
pub use row::*;
pub use selection::*;
pub use value::*;

use serde::{Deserialize, Serialize};

/// One cell write, as accepted by batch updates and reported by `change` events.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeItem {
    pub row_key: RowKey,
    pub key: ColumnKey,
    pub value: CellValue,
}

impl ChangeItem {
    pub fn new(
        row_key: impl Into<RowKey>,
        key: impl Into<ColumnKey>,
        value: impl Into<CellValue>,
    ) -> Self {
        Self {
            row_key: row_key.into(),
            key: key.into(),
            value: value.into(),
        }
    }
}

/// An externally supplied validation error (e.g. from a server-side check).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationErrorInput {
    pub row_index: usize,
    pub key: ColumnKey,
    pub message: String,
}

/// Content-space position of a row, as returned by `get_position_for_row_index`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub height: f32,
}
