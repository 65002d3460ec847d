use serde::{Deserialize, Serialize};

use super::{ColumnKey, ValueKind};

/// Frozen band a top-level column belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Fixed {
    Left,
    Right,
}

/// Column definition. Columns with `children` are header groups; only leaf
/// columns hold cell data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub key: ColumnKey,
    #[serde(default)]
    pub title: String,
    /// Leaf width in pixels (`None` = configured default). Ignored for groups.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,
    /// Frozen band. Only honored on top-level columns; descendants inherit it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixed: Option<Fixed>,
    #[serde(default)]
    pub kind: ValueKind,
    #[serde(default)]
    pub readonly: bool,
    /// Empty values fail validation before any custom validator runs
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Column>,
}

impl Column {
    pub fn new(key: impl Into<ColumnKey>, title: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            title: title.into(),
            width: None,
            fixed: None,
            kind: ValueKind::Any,
            readonly: false,
            required: false,
            children: Vec::new(),
        }
    }

    /// Create a header group over the given columns.
    pub fn group(
        key: impl Into<ColumnKey>,
        title: impl Into<String>,
        children: Vec<Column>,
    ) -> Self {
        Self {
            children,
            ..Self::new(key, title)
        }
    }

    #[must_use]
    pub fn width(mut self, width: f32) -> Self {
        self.width = Some(width);
        self
    }

    #[must_use]
    pub fn fixed(mut self, fixed: Fixed) -> Self {
        self.fixed = Some(fixed);
        self
    }

    #[must_use]
    pub fn kind(mut self, kind: ValueKind) -> Self {
        self.kind = kind;
        self
    }

    #[must_use]
    pub fn readonly(mut self) -> Self {
        self.readonly = true;
        self
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}
