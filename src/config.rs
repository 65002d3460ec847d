//! Grid configuration.

use serde::{Deserialize, Serialize};

use crate::error::{GridError, Result};

/// Configuration for a grid instance.
///
/// Deserializes from camelCase keys; every field has a default so callers
/// only pass what they change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GridConfig {
    /// Field holding each row's unique key. When `None`, keys are synthesized
    /// from the row's position in the tree (`"0"`, `"0-2"`, ...).
    pub row_key_field: Option<String>,
    /// Field holding child rows in tree data
    pub children_field: String,
    /// Height of one header level in pixels
    pub header_row_height: f32,
    /// Default body row height in pixels
    pub row_height: f32,
    /// Footer row height in pixels
    pub footer_row_height: f32,
    /// Width of leaf columns that declare none
    pub default_column_width: f32,
    /// Lower bound for column resizing
    pub min_column_width: f32,
    /// Body rows frozen at the top
    pub frozen_rows: usize,
    /// Body rows frozen at the bottom
    pub frozen_bottom_rows: usize,
    /// Tree rows start expanded
    pub default_expand_all: bool,
    /// Horizontal indent per tree level (layout hint for the painter)
    pub tree_indent: f32,
    /// Maximum undo entries kept
    pub history_limit: usize,
    /// Full widget size, headers and footers included
    pub viewport_width: f32,
    pub viewport_height: f32,
    pub show_footer: bool,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            row_key_field: None,
            children_field: "children".to_string(),
            header_row_height: 36.0,
            row_height: 36.0,
            footer_row_height: 36.0,
            default_column_width: 100.0,
            min_column_width: 20.0,
            frozen_rows: 0,
            frozen_bottom_rows: 0,
            default_expand_all: false,
            tree_indent: 16.0,
            history_limit: 100,
            viewport_width: 800.0,
            viewport_height: 600.0,
            show_footer: true,
        }
    }
}

impl GridConfig {
    /// Reject sizes that would break the offset tables.
    pub fn validate(&self) -> Result<()> {
        let sizes = [
            ("headerRowHeight", self.header_row_height),
            ("rowHeight", self.row_height),
            ("footerRowHeight", self.footer_row_height),
            ("defaultColumnWidth", self.default_column_width),
            ("minColumnWidth", self.min_column_width),
        ];
        for (name, value) in sizes {
            if !value.is_finite() || value <= 0.0 {
                return Err(GridError::Config(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }
        if self.row_height < 1.0 || self.default_column_width < 1.0 {
            return Err(GridError::Config(
                "rowHeight and defaultColumnWidth must be at least 1px".to_string(),
            ));
        }
        if !self.viewport_width.is_finite() || !self.viewport_height.is_finite() {
            return Err(GridError::Config("viewport size must be finite".to_string()));
        }
        if self.children_field.is_empty() {
            return Err(GridError::Config("childrenField must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        let config: Self = serde_json::from_value(value.clone())?;
        config.validate()?;
        Ok(config)
    }
}
