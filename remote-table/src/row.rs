//! Row records displayed by a table.

use std::fmt::Debug;
use std::fmt::Display;
use std::hash::Hash;

use serde_json::Value;

/// Trait for rows that can be displayed by a remote table.
///
/// Rows are replaced wholesale on every fetch, so selection is tracked by
/// [`TableRow::Key`] rather than by row object.
///
/// # Example
///
/// ```
/// use remote_table::TableRow;
/// use serde_json::{json, Value};
///
/// #[derive(Clone)]
/// struct Employee {
///     id: u32,
///     name: String,
/// }
///
/// impl TableRow for Employee {
///     type Key = u32;
///
///     fn key(&self) -> u32 {
///         self.id
///     }
///
///     fn value(&self, field: &str) -> Value {
///         match field {
///             "id" => json!(self.id),
///             "name" => json!(self.name),
///             _ => Value::Null,
///         }
///     }
/// }
/// ```
pub trait TableRow: Clone + Send + Sync + 'static {
    /// The primary key type of this row.
    type Key: Clone + Eq + Hash + Debug + Display + Send + Sync + 'static;

    /// Return the row's primary key.
    fn key(&self) -> Self::Key;

    /// Return the raw value for a field, `Value::Null` when absent.
    fn value(&self, field: &str) -> Value;
}

/// Formats a raw cell value as display text.
///
/// Strings are shown without quotes, `null` as an empty string, arrays
/// joined with commas.
pub fn display_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => if *b { "yes" } else { "no" }.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items
            .iter()
            .map(display_value)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(_) => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_display_value() {
        assert_eq!(display_value(&Value::Null), "");
        assert_eq!(display_value(&json!("Dupont")), "Dupont");
        assert_eq!(display_value(&json!(42)), "42");
        assert_eq!(display_value(&json!(true)), "yes");
        assert_eq!(display_value(&json!(["CDI", "CDD"])), "CDI, CDD");
    }
}
