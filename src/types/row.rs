use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use super::{CellValue, ColumnKey, ValueKind};
use crate::error::{GridError, Result};

/// A row record: cell values keyed by column identifier.
///
/// Values for columns declared in the schema are checked against the column's
/// [`ValueKind`] when the row enters the grid. Extra fields are kept as
/// [`ValueKind::Any`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Row {
    fields: BTreeMap<ColumnKey, CellValue>,
}

/// Column kinds by key, used to type rows at the boundary.
pub type Schema = HashMap<ColumnKey, ValueKind>;

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field insert, mostly for tests and footers.
    #[must_use]
    pub fn with(mut self, key: impl Into<ColumnKey>, value: impl Into<CellValue>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.fields.get(key)
    }

    /// Replace a field, returning the previous value (`Empty` if unset).
    pub fn set(&mut self, key: ColumnKey, value: CellValue) -> CellValue {
        self.fields.insert(key, value).unwrap_or_default()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&ColumnKey, &CellValue)> {
        self.fields.iter()
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_json()))
                .collect(),
        )
    }

    /// Convert a JSON object into a typed row.
    ///
    /// `skip_field` names a field that is not a cell value (the children list
    /// in tree data) and is left out of the record.
    pub fn from_json(value: &serde_json::Value, schema: &Schema, skip_field: &str) -> Result<Self> {
        let serde_json::Value::Object(map) = value else {
            return Err(GridError::InvalidRow(format!("expected an object, got {value}")));
        };
        let mut fields = BTreeMap::new();
        for (name, raw) in map {
            if name == skip_field {
                continue;
            }
            let kind = schema.get(name.as_str()).copied().unwrap_or_default();
            let cell = kind.coerce_json(raw).map_err(|found| GridError::ValueKind {
                column: ColumnKey::from(name.as_str()),
                expected: kind,
                found,
            })?;
            fields.insert(ColumnKey::from(name.as_str()), cell);
        }
        Ok(Self { fields })
    }

    /// Re-type every field against a (new) schema.
    pub fn conform(&self, schema: &Schema) -> Result<Self> {
        let mut fields = BTreeMap::new();
        for (key, value) in &self.fields {
            let kind = schema.get(key.as_str()).copied().unwrap_or_default();
            let cell = kind.conform(value).map_err(|found| GridError::ValueKind {
                column: key.clone(),
                expected: kind,
                found,
            })?;
            fields.insert(key.clone(), cell);
        }
        Ok(Self { fields })
    }
}
