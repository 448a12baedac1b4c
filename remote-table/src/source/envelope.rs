//! Response envelope normalization.
//!
//! Backends wrap list responses differently. Everything past this module
//! only sees a list of row values and an optional total.

use serde_json::Value;

use crate::error::SourceError;

/// Keys that may hold the row array in an envelope object.
const ROW_KEYS: &[&str] = &["data", "items", "results", "rows"];

/// Keys that may hold the total row count in an envelope object.
const TOTAL_KEYS: &[&str] = &["total", "count", "totalCount", "total_count"];

/// Extracts the row values and total count from a response body.
///
/// Accepted shapes:
/// - a bare array (`[...]`)
/// - an object with rows under `data`, `items`, `results` or `rows`, and a
///   total under `total`, `count`, `totalCount`, `total_count` or
///   `meta.total`
///
/// `header_total` (from `X-Total-Count`) is used when the body has no total.
pub fn normalize_envelope(
    body: Value,
    header_total: Option<u64>,
) -> Result<(Vec<Value>, Option<u64>), SourceError> {
    match body {
        Value::Array(rows) => Ok((rows, header_total)),
        Value::Object(mut map) => {
            let rows = ROW_KEYS
                .iter()
                .find_map(|key| match map.remove(*key) {
                    Some(Value::Array(rows)) => Some(rows),
                    _ => None,
                })
                .ok_or_else(|| {
                    SourceError::parse(format!(
                        "response object has no row array under any of {:?}",
                        ROW_KEYS
                    ))
                })?;

            let total = TOTAL_KEYS
                .iter()
                .find_map(|key| map.get(*key).and_then(as_count))
                .or_else(|| {
                    map.get("meta")
                        .and_then(|meta| meta.get("total"))
                        .and_then(as_count)
                })
                .or(header_total);

            Ok((rows, total))
        }
        other => Err(SourceError::parse(format!(
            "expected an array or an object envelope, got {}",
            other
        ))),
    }
}

/// Builds an HTTP error from a non-2xx response body.
///
/// Understands `{ "message": ..., "code": ... }` and the OData-style
/// `{ "error": { "code": ..., "message": ... } }`. Any other body is used as
/// the message verbatim.
pub fn parse_error_body(status: u16, body: &str) -> SourceError {
    if body.trim().is_empty() {
        return SourceError::http(status, format!("Request failed with status {}", status));
    }

    if let Ok(json) = serde_json::from_str::<Value>(body) {
        let scope = match json.get("error") {
            Some(inner) if inner.is_object() => inner,
            _ => &json,
        };

        let message = scope
            .get("message")
            .and_then(Value::as_str)
            .or_else(|| json.get("error").and_then(Value::as_str))
            .map(|s| s.to_string());
        let code = scope.get("code").and_then(|v| match v {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        });

        if let Some(message) = message {
            return SourceError::Http {
                status,
                message,
                code,
            };
        }
    }

    SourceError::http(status, body.to_string())
}

fn as_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}
