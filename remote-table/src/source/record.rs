//! Untyped JSON rows.

use std::fmt;

use serde_json::Map;
use serde_json::Value;

use crate::error::SourceError;
use crate::row::TableRow;

/// Primary key of a [`JsonRecord`].
///
/// Numeric identifiers are kept in their decimal string form so that `7`
/// and `"7"` select the same row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordKey(String);

impl RecordKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A row decoded from a JSON object.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonRecord {
    key: RecordKey,
    fields: Map<String, Value>,
}

impl JsonRecord {
    /// Builds a record from a JSON object, reading the key from `id_field`.
    ///
    /// Fails if the value is not an object or the identifier is missing or
    /// not a string/number.
    pub fn from_value(value: Value, id_field: &str) -> Result<Self, SourceError> {
        let fields = match value {
            Value::Object(fields) => fields,
            other => {
                return Err(SourceError::parse(format!(
                    "expected a JSON object row, got {}",
                    kind_of(&other)
                )));
            }
        };

        let key = match fields.get(id_field) {
            Some(Value::String(s)) if !s.is_empty() => RecordKey(s.clone()),
            Some(Value::Number(n)) => RecordKey(n.to_string()),
            Some(other) => {
                return Err(SourceError::parse(format!(
                    "row identifier '{}' must be a string or number, got {}",
                    id_field,
                    kind_of(other)
                )));
            }
            None => {
                return Err(SourceError::parse(format!(
                    "row is missing identifier field '{}'",
                    id_field
                )));
            }
        };

        Ok(Self { key, fields })
    }

    /// Returns a field value.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Returns a string field value.
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }

    /// Returns all fields.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

impl TableRow for JsonRecord {
    type Key = RecordKey;

    fn key(&self) -> RecordKey {
        self.key.clone()
    }

    fn value(&self, field: &str) -> Value {
        self.fields.get(field).cloned().unwrap_or(Value::Null)
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_string_and_numeric_keys() {
        let record = JsonRecord::from_value(json!({"id": "E-12", "lastName": "Martin"}), "id").unwrap();
        assert_eq!(record.key(), RecordKey::from("E-12"));
        assert_eq!(record.value("lastName"), json!("Martin"));
        assert_eq!(record.value("missing"), Value::Null);

        let record = JsonRecord::from_value(json!({"matricule": 7}), "matricule").unwrap();
        assert_eq!(record.key().as_str(), "7");
    }

    #[test]
    fn test_missing_or_invalid_key() {
        assert!(JsonRecord::from_value(json!({"name": "x"}), "id").is_err());
        assert!(JsonRecord::from_value(json!({"id": null}), "id").is_err());
        assert!(JsonRecord::from_value(json!({"id": ""}), "id").is_err());
        assert!(JsonRecord::from_value(json!([1, 2]), "id").is_err());
    }
}
