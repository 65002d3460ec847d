//! Structured error types for vgrid.
//!
//! Out-of-range indices and unknown keys are not errors: lookups clamp or
//! return `None`. What remains here are load-time configuration faults, typed
//! boundary checks, the validation outcome and painter failures.

use crate::types::{ColumnKey, RowKey, ValueKind};
use crate::validation::ValidationReport;

/// All errors that can occur while loading, mutating or drawing a grid.
#[derive(Debug, thiserror::Error)]
pub enum GridError {
    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Two leaf columns share the same key.
    #[error("Duplicate column key: {0}")]
    DuplicateColumnKey(ColumnKey),

    /// Two rows (at any depth) share the same key.
    #[error("Duplicate row key: {0}")]
    DuplicateRowKey(RowKey),

    /// A row could not be converted into a record.
    #[error("Invalid row: {0}")]
    InvalidRow(String),

    /// A value does not match the kind its column declares.
    #[error("Column {column} expects {expected}, got {found}")]
    ValueKind {
        column: ColumnKey,
        expected: ValueKind,
        found: ValueKind,
    },

    /// One or more cells failed validation.
    #[error("{0}")]
    ValidationFailed(ValidationReport),

    /// `validate()` was started while another run is still in flight.
    #[error("Validation already in progress")]
    ValidationInProgress,

    /// The painter failed while drawing a frame.
    #[error("Paint error: {0}")]
    Paint(String),

    /// JSON conversion error.
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GridError>;

impl GridError {
    /// The validation report carried by a failed `validate()`, if any.
    pub fn validation_report(&self) -> Option<&ValidationReport> {
        match self {
            Self::ValidationFailed(report) => Some(report),
            _ => None,
        }
    }
}

#[cfg(target_arch = "wasm32")]
impl From<GridError> for wasm_bindgen::JsValue {
    fn from(e: GridError) -> Self {
        if let GridError::ValidationFailed(report) = &e {
            if let Ok(value) = serde_wasm_bindgen::to_value(&report.groups) {
                return value;
            }
        }
        wasm_bindgen::JsValue::from_str(&e.to_string())
    }
}
