use chrono::NaiveDate;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Date format accepted at the boundary and used for display.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Value kind a column declares for its cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    /// Accepts any value (fields not described by a column use this too)
    #[default]
    Any,
    Text,
    Number,
    Bool,
    Date,
    /// Only reported as the found kind of an empty value or a nested structure
    Empty,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Any => "any",
            Self::Text => "text",
            Self::Number => "number",
            Self::Bool => "bool",
            Self::Date => "date",
            Self::Empty => "empty",
        };
        f.write_str(name)
    }
}

/// A single cell value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDate),
}

impl CellValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Empty => ValueKind::Empty,
            Self::Text(_) => ValueKind::Text,
            Self::Number(_) => ValueKind::Number,
            Self::Bool(_) => ValueKind::Bool,
            Self::Date(_) => ValueKind::Date,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Convert back to a JSON value (dates become `YYYY-MM-DD` strings).
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Empty => serde_json::Value::Null,
            Self::Text(s) => serde_json::Value::String(s.clone()),
            Self::Number(n) => serde_json::Number::from_f64(*n)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Date(d) => serde_json::Value::String(d.format(DATE_FORMAT).to_string()),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Text(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{n}"),
            Self::Bool(b) => f.write_str(if *b { "TRUE" } else { "FALSE" }),
            Self::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
        }
    }
}

impl Serialize for CellValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Empty => serializer.serialize_none(),
            Self::Text(s) => serializer.serialize_str(s),
            Self::Number(n) => serializer.serialize_f64(*n),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Date(d) => serializer.collect_str(&d.format(DATE_FORMAT)),
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i32> for CellValue {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<NaiveDate> for CellValue {
    fn from(d: NaiveDate) -> Self {
        Self::Date(d)
    }
}

impl ValueKind {
    /// Whether a value may be stored in a column of this kind.
    ///
    /// Empty values are always accepted.
    pub fn accepts(self, value: &CellValue) -> bool {
        match (self, value) {
            (_, CellValue::Empty) | (Self::Any, _) => true,
            (Self::Text, CellValue::Text(_))
            | (Self::Number, CellValue::Number(_))
            | (Self::Bool, CellValue::Bool(_))
            | (Self::Date, CellValue::Date(_)) => true,
            _ => false,
        }
    }

    /// Convert a JSON value into a cell value of this kind.
    ///
    /// Dates are accepted as `YYYY-MM-DD` strings. On mismatch the kind that
    /// was actually found is returned.
    pub fn coerce_json(self, value: &serde_json::Value) -> Result<CellValue, ValueKind> {
        use serde_json::Value;

        match (self, value) {
            (_, Value::Null) => Ok(CellValue::Empty),
            (Self::Any | Self::Bool, Value::Bool(b)) => Ok(CellValue::Bool(*b)),
            (Self::Any | Self::Number, Value::Number(n)) => {
                n.as_f64().map(CellValue::Number).ok_or(ValueKind::Number)
            }
            (Self::Any | Self::Text, Value::String(s)) => Ok(CellValue::Text(s.clone())),
            (Self::Date, Value::String(s)) => NaiveDate::parse_from_str(s, DATE_FORMAT)
                .map(CellValue::Date)
                .map_err(|_| ValueKind::Text),
            (Self::Any, other) => Ok(CellValue::Text(other.to_string())),
            (_, Value::Bool(_)) => Err(ValueKind::Bool),
            (_, Value::Number(_)) => Err(ValueKind::Number),
            (_, Value::String(_)) => Err(ValueKind::Text),
            (_, Value::Array(_) | Value::Object(_)) => Err(ValueKind::Empty),
        }
    }

    /// Re-check an already typed value against this kind, converting where the
    /// JSON form allows it (a text `"2024-01-31"` becomes a date column value).
    pub fn conform(self, value: &CellValue) -> Result<CellValue, ValueKind> {
        if self.accepts(value) {
            return Ok(value.clone());
        }
        self.coerce_json(&value.to_json())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coerce_matching_kinds() {
        assert_eq!(
            ValueKind::Number.coerce_json(&json!(31)).unwrap(),
            CellValue::Number(31.0)
        );
        assert_eq!(
            ValueKind::Text.coerce_json(&json!("a")).unwrap(),
            CellValue::from("a")
        );
        assert_eq!(
            ValueKind::Date.coerce_json(&json!("2024-02-29")).unwrap(),
            CellValue::Date(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap())
        );
        assert_eq!(
            ValueKind::Bool.coerce_json(&json!(null)).unwrap(),
            CellValue::Empty
        );
    }

    #[test]
    fn test_coerce_mismatch_reports_found_kind() {
        assert_eq!(
            ValueKind::Number.coerce_json(&json!("x")),
            Err(ValueKind::Text)
        );
        assert_eq!(ValueKind::Text.coerce_json(&json!(true)), Err(ValueKind::Bool));
        assert_eq!(
            ValueKind::Date.coerce_json(&json!("31/01/2024")),
            Err(ValueKind::Text)
        );
    }

    #[test]
    fn test_any_accepts_nested_as_text() {
        let v = ValueKind::Any.coerce_json(&json!({"a": 1})).unwrap();
        assert_eq!(v, CellValue::from(r#"{"a":1}"#));
    }

    #[test]
    fn test_conform_text_to_date() {
        let v = ValueKind::Date.conform(&CellValue::from("2024-01-31")).unwrap();
        assert_eq!(v.to_string(), "2024-01-31");
        assert!(ValueKind::Number.conform(&CellValue::from("abc")).is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(CellValue::Number(32.0).to_string(), "32");
        assert_eq!(CellValue::Bool(true).to_string(), "TRUE");
        assert_eq!(CellValue::Empty.to_string(), "");
    }
}
