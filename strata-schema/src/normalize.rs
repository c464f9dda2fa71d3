//! Error normalization.
//!
//! Validation engines have shipped two report shapes over time: an `issues`
//! collection and an older `errors` collection. [`normalize_errors`] accepts
//! either (or neither), flattening every entry into one uniform
//! [`NormalizedError`] record. It never fails: absent or malformed entries
//! degrade to defaults without disturbing their siblings.

use serde::Serialize;
use serde_json::Value;

use crate::validate::ValidationFailure;

/// One field-level error in the uniform shape callers report upstream.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedError {
    /// Dot-joined field path, or `"unknown"` when the entry had none.
    pub field: String,
    /// Human-readable message.
    pub message: String,
    /// Machine-readable code.
    pub code: String,
    /// The offending input value.
    pub value: Value,
    /// The expected type or format.
    #[serde(rename = "type")]
    pub kind: String,
}

/// Normalize a heterogeneous validation-failure report.
///
/// Picks the `issues` collection, falling back to `errors`, falling back to
/// an empty list. Every entry yields exactly one record.
pub fn normalize_errors(failure: &Value) -> Vec<NormalizedError> {
    let entries = failure
        .get("issues")
        .and_then(Value::as_array)
        .or_else(|| failure.get("errors").and_then(Value::as_array));

    entries
        .map(|entries| entries.iter().map(normalize_entry).collect())
        .unwrap_or_default()
}

/// Normalize the evaluator's own failure type.
pub fn normalize_failure(failure: &ValidationFailure) -> Vec<NormalizedError> {
    normalize_errors(&failure.to_value())
}

fn normalize_entry(entry: &Value) -> NormalizedError {
    let field = entry
        .get("path")
        .and_then(Value::as_array)
        .filter(|segments| !segments.is_empty())
        .map(|segments| {
            segments
                .iter()
                .map(segment_text)
                .collect::<Vec<_>>()
                .join(".")
        })
        .unwrap_or_else(|| "unknown".to_string());

    let message = entry
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("Validation failed")
        .to_string();

    let code = entry
        .get("code")
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .to_string();

    let value = entry
        .get("input")
        .or_else(|| entry.get("received"))
        .cloned()
        .unwrap_or(Value::Null);

    let kind = entry
        .get("expected")
        .or_else(|| entry.get("format"))
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .to_string();

    NormalizedError {
        field,
        message,
        code,
        value,
        kind,
    }
}

fn segment_text(segment: &Value) -> String {
    match segment {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_normalizes_issues_collection() {
        let failure = json!({
            "issues": [{
                "path": ["email"],
                "code": "invalid_format",
                "message": "email must be a valid email address",
                "input": "nope",
                "expected": "email",
            }],
        });

        let errors = normalize_errors(&failure);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "email");
        assert_eq!(errors[0].code, "invalid_format");
        assert_eq!(errors[0].value, json!("nope"));
        assert_eq!(errors[0].kind, "email");
    }

    #[test]
    fn test_falls_back_to_errors_collection() {
        let failure = json!({
            "errors": [{
                "path": ["age"],
                "message": "age must be a number",
                "received": "old",
                "format": "number",
            }],
        });

        let errors = normalize_errors(&failure);
        assert_eq!(errors[0].field, "age");
        assert_eq!(errors[0].message, "age must be a number");
        assert_eq!(errors[0].code, "unknown");
        assert_eq!(errors[0].value, json!("old"));
        assert_eq!(errors[0].kind, "number");
    }

    #[test]
    fn test_issues_preferred_over_errors() {
        let failure = json!({
            "issues": [{ "path": ["a"], "message": "from issues" }],
            "errors": [{ "path": ["b"], "message": "from errors" }],
        });

        let errors = normalize_errors(&failure);
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "a");
    }

    #[test]
    fn test_neither_collection_yields_empty() {
        assert!(normalize_errors(&json!({})).is_empty());
        assert!(normalize_errors(&json!(null)).is_empty());
        assert!(normalize_errors(&json!("catastrophe")).is_empty());
        assert!(normalize_errors(&json!({ "issues": "not-a-list" })).is_empty());
    }

    #[test]
    fn test_numeric_path_segments_join() {
        let failure = json!({
            "issues": [{ "path": ["tags", 0], "message": "bad tag" }],
        });
        assert_eq!(normalize_errors(&failure)[0].field, "tags.0");
    }

    #[test]
    fn test_empty_path_becomes_unknown() {
        let failure = json!({ "issues": [{ "path": [], "message": "root" }] });
        assert_eq!(normalize_errors(&failure)[0].field, "unknown");
    }

    #[test]
    fn test_malformed_entry_degrades_to_defaults() {
        let failure = json!({
            "issues": [
                42,
                { "path": ["ok"], "message": "fine" },
            ],
        });

        let errors = normalize_errors(&failure);
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].field, "unknown");
        assert_eq!(errors[0].message, "Validation failed");
        assert_eq!(errors[0].code, "unknown");
        assert_eq!(errors[0].value, Value::Null);
        assert_eq!(errors[0].kind, "unknown");
        assert_eq!(errors[1].field, "ok");
    }

    #[test]
    fn test_input_preferred_over_received() {
        let failure = json!({
            "issues": [{ "path": ["x"], "input": 1, "received": 2 }],
        });
        assert_eq!(normalize_errors(&failure)[0].value, json!(1));
    }

    #[test]
    fn test_non_string_code_degrades() {
        let failure = json!({
            "issues": [{ "path": ["x"], "code": 99 }],
        });
        assert_eq!(normalize_errors(&failure)[0].code, "unknown");
    }

    #[test]
    fn test_serializes_with_type_key() {
        let errors = normalize_errors(&json!({
            "issues": [{ "path": ["x"], "expected": "string" }],
        }));
        let value = serde_json::to_value(&errors[0]).unwrap();
        assert_eq!(value["type"], json!("string"));
        assert!(value.get("kind").is_none());
    }
}
