//! Compiled validation rules and their evaluation.
//!
//! A [`ValidationRule`] is an immutable tree node: a base validator plus an
//! ordered list of refinements. Refinements run left-to-right after the
//! base accepts the value; a failed base records one issue and skips the
//! refinements, since they assume the base type.

use std::sync::LazyLock;

use regex_lite::Regex;
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;

use super::ValidationSchema;

static EMAIL_FORM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email form pattern is valid")
});

static OBJECT_ID_FORM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9a-fA-F]{24}$").expect("object id form pattern is valid"));

/// Symbols the strong-password rule accepts.
const PASSWORD_SYMBOLS: &str = "@$!%*?&#";

/// The fixed 24-hex-character ObjectId form.
pub(crate) fn object_id_pattern() -> Regex {
    OBJECT_ID_FORM.clone()
}

/// One compiled rule for one field.
#[derive(Debug, Clone)]
pub struct ValidationRule {
    pub(crate) base: RuleBase,
    pub(crate) refinements: Vec<Refinement>,
    pub(crate) optional: bool,
    pub(crate) default: Option<Value>,
    pub(crate) required_message: String,
}

/// The base validator of a rule.
#[derive(Debug, Clone)]
pub(crate) enum RuleBase {
    /// UTF-8 string.
    String,
    /// JSON number.
    Number,
    /// Boolean.
    Boolean,
    /// RFC 3339 timestamp, `YYYY-MM-DD` date, or epoch-millisecond number.
    Date,
    /// Array, optionally with a per-item rule.
    Array(Option<Box<ValidationRule>>),
    /// Object, optionally with a nested compiled schema.
    Object(Option<ValidationSchema>),
    /// Object whose values are strings for unspecified keys.
    Map,
    /// Anything.
    Any,
}

impl RuleBase {
    fn expected_name(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::Array(_) => "array",
            Self::Object(_) | Self::Map => "object",
            Self::Any => "any",
        }
    }
}

/// A refinement applied after the base validator.
#[derive(Debug, Clone)]
pub(crate) enum Refinement {
    MinLength { limit: u64, message: String },
    MaxLength { limit: u64, message: String },
    Min { limit: f64, message: String },
    Max { limit: f64, message: String },
    MinItems { limit: f64, message: String },
    MaxItems { limit: f64, message: String },
    Email { message: String },
    Pattern { regex: Regex, message: String },
    OneOf { allowed: Vec<String>, message: String },
    StrongPassword { message: String },
}

impl ValidationRule {
    fn new(base: RuleBase) -> Self {
        Self {
            base,
            refinements: Vec::new(),
            optional: false,
            default: None,
            required_message: String::new(),
        }
    }

    /// A plain string rule.
    pub fn string() -> Self {
        Self::new(RuleBase::String)
    }

    /// A numeric rule.
    pub fn number() -> Self {
        Self::new(RuleBase::Number)
    }

    /// A boolean rule.
    pub fn boolean() -> Self {
        Self::new(RuleBase::Boolean)
    }

    /// A date rule.
    pub fn date() -> Self {
        Self::new(RuleBase::Date)
    }

    /// An array rule with a per-item rule.
    pub fn array_of(item: ValidationRule) -> Self {
        Self::new(RuleBase::Array(Some(Box::new(item))))
    }

    /// An array rule accepting any items.
    pub fn array_any() -> Self {
        Self::new(RuleBase::Array(None))
    }

    /// An object rule with a nested compiled schema.
    pub fn object_of(schema: ValidationSchema) -> Self {
        Self::new(RuleBase::Object(Some(schema)))
    }

    /// An open object rule.
    pub fn object_open() -> Self {
        Self::new(RuleBase::Object(None))
    }

    /// A string rule constrained to the 24-hex-character ObjectId form.
    pub fn object_id(field: &str) -> Self {
        let mut rule = Self::string();
        rule.refinements.push(Refinement::Pattern {
            regex: object_id_pattern(),
            message: format!("{field} must be a valid ObjectId"),
        });
        rule
    }

    /// An anything-goes rule.
    pub fn any() -> Self {
        Self::new(RuleBase::Any)
    }

    /// An open string-valued map rule.
    pub fn map() -> Self {
        Self::new(RuleBase::Map)
    }

    /// A case-insensitive string membership rule. The allowed set is stored
    /// lowercased; input is lowercased before the test.
    pub fn one_of(allowed: Vec<String>, message: String) -> Self {
        let mut rule = Self::string();
        rule.refinements.push(Refinement::OneOf {
            allowed: allowed.iter().map(|v| v.to_lowercase()).collect(),
            message,
        });
        rule
    }

    /// Whether a missing value is acceptable.
    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// The default value contributed for a missing field, if any.
    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub(crate) fn is_string_typed(&self) -> bool {
        matches!(self.base, RuleBase::String)
    }

    pub(crate) fn is_number_typed(&self) -> bool {
        matches!(self.base, RuleBase::Number)
    }

    pub(crate) fn is_array_typed(&self) -> bool {
        matches!(self.base, RuleBase::Array(_))
    }

    /// Check a present value. Base first, then refinements in order; issues
    /// accumulate. Returns the output value when the base accepted.
    pub(crate) fn check(
        &self,
        path: &[String],
        value: &Value,
        issues: &mut Vec<Issue>,
    ) -> Option<Value> {
        let out = match &self.base {
            RuleBase::String => {
                if value.is_string() {
                    value.clone()
                } else {
                    issues.push(Issue::invalid_type(path, value, self.base.expected_name()));
                    return None;
                }
            }
            RuleBase::Number => {
                if value.is_number() {
                    value.clone()
                } else {
                    issues.push(Issue::invalid_type(path, value, self.base.expected_name()));
                    return None;
                }
            }
            RuleBase::Boolean => {
                if value.is_boolean() {
                    value.clone()
                } else {
                    issues.push(Issue::invalid_type(path, value, self.base.expected_name()));
                    return None;
                }
            }
            RuleBase::Date => {
                if is_date_value(value) {
                    value.clone()
                } else {
                    issues.push(Issue::invalid_type(path, value, self.base.expected_name()));
                    return None;
                }
            }
            RuleBase::Array(item) => match value.as_array() {
                Some(elements) => {
                    let mut out = Vec::with_capacity(elements.len());
                    for (index, element) in elements.iter().enumerate() {
                        let mut element_path = path.to_vec();
                        element_path.push(index.to_string());
                        match item {
                            Some(rule) => match rule.check(&element_path, element, issues) {
                                Some(checked) => out.push(checked),
                                None => out.push(element.clone()),
                            },
                            None => out.push(element.clone()),
                        }
                    }
                    Value::Array(out)
                }
                None => {
                    issues.push(Issue::invalid_type(path, value, self.base.expected_name()));
                    return None;
                }
            },
            RuleBase::Object(schema) => match value.as_object() {
                Some(object) => match schema {
                    Some(nested) => Value::Object(nested.check_object(path, object, issues)),
                    None => value.clone(),
                },
                None => {
                    issues.push(Issue::invalid_type(path, value, self.base.expected_name()));
                    return None;
                }
            },
            RuleBase::Map => match value.as_object() {
                Some(object) => {
                    for (key, entry) in object {
                        if !entry.is_string() {
                            let mut entry_path = path.to_vec();
                            entry_path.push(key.clone());
                            issues.push(Issue::invalid_type(&entry_path, entry, "string"));
                        }
                    }
                    value.clone()
                }
                None => {
                    issues.push(Issue::invalid_type(path, value, self.base.expected_name()));
                    return None;
                }
            },
            RuleBase::Any => value.clone(),
        };

        for refinement in &self.refinements {
            refinement.check(path, value, issues);
        }

        Some(out)
    }
}

impl Refinement {
    fn check(&self, path: &[String], value: &Value, issues: &mut Vec<Issue>) {
        match self {
            Self::MinLength { limit, message } => {
                if let Some(s) = value.as_str() {
                    if (s.chars().count() as u64) < *limit {
                        issues.push(Issue::failed(path, value, "too_small", message));
                    }
                }
            }
            Self::MaxLength { limit, message } => {
                if let Some(s) = value.as_str() {
                    if (s.chars().count() as u64) > *limit {
                        issues.push(Issue::failed(path, value, "too_big", message));
                    }
                }
            }
            Self::Min { limit, message } => {
                if let Some(n) = value.as_f64() {
                    if n < *limit {
                        issues.push(Issue::failed(path, value, "too_small", message));
                    }
                }
            }
            Self::Max { limit, message } => {
                if let Some(n) = value.as_f64() {
                    if n > *limit {
                        issues.push(Issue::failed(path, value, "too_big", message));
                    }
                }
            }
            Self::MinItems { limit, message } => {
                if let Some(elements) = value.as_array() {
                    if (elements.len() as f64) < *limit {
                        issues.push(Issue::failed(path, value, "too_small", message));
                    }
                }
            }
            Self::MaxItems { limit, message } => {
                if let Some(elements) = value.as_array() {
                    if (elements.len() as f64) > *limit {
                        issues.push(Issue::failed(path, value, "too_big", message));
                    }
                }
            }
            Self::Email { message } => {
                if let Some(s) = value.as_str() {
                    if !EMAIL_FORM.is_match(s) {
                        issues.push(Issue::format(path, value, "email", message));
                    }
                }
            }
            Self::Pattern { regex, message } => {
                if let Some(s) = value.as_str() {
                    if !regex.is_match(s) {
                        issues.push(Issue::format(path, value, "pattern", message));
                    }
                }
            }
            Self::OneOf { allowed, message } => {
                if let Some(s) = value.as_str() {
                    if !allowed.contains(&s.to_lowercase()) {
                        issues.push(Issue {
                            path: path.to_vec(),
                            code: "invalid_enum_value".to_string(),
                            message: message.clone(),
                            input: value.clone(),
                            expected: None,
                        });
                    }
                }
            }
            Self::StrongPassword { message } => {
                if let Some(s) = value.as_str() {
                    if !is_strong_password(s) {
                        issues.push(Issue::format(path, value, "password", message));
                    }
                }
            }
        }
    }
}

/// The fixed strong-password check: at least 8 characters, one lowercase
/// letter, one uppercase letter, one digit, one symbol from the fixed set.
fn is_strong_password(s: &str) -> bool {
    s.chars().count() >= 8
        && s.chars().any(|c| c.is_ascii_lowercase())
        && s.chars().any(|c| c.is_ascii_uppercase())
        && s.chars().any(|c| c.is_ascii_digit())
        && s.chars().any(|c| PASSWORD_SYMBOLS.contains(c))
}

/// Accepted date forms: RFC 3339 timestamps, plain dates, epoch numbers.
fn is_date_value(value: &Value) -> bool {
    match value {
        Value::String(s) => {
            chrono::DateTime::parse_from_rfc3339(s).is_ok()
                || chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
        }
        Value::Number(_) => true,
        _ => false,
    }
}

/// One rule violation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Issue {
    /// Path segments from the input root to the offending value.
    pub path: Vec<String>,
    /// Machine-readable violation code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// The offending input value (`null` for missing fields).
    pub input: Value,
    /// The expected type or form, when one applies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,
}

impl Issue {
    fn label(path: &[String]) -> &str {
        path.last().map(String::as_str).unwrap_or("value")
    }

    pub(crate) fn invalid_type(path: &[String], input: &Value, expected: &str) -> Self {
        let article = if matches!(expected, "array" | "object") {
            "an"
        } else {
            "a"
        };
        Self {
            path: path.to_vec(),
            code: "invalid_type".to_string(),
            message: format!("{} must be {article} {expected}", Self::label(path)),
            input: input.clone(),
            expected: Some(expected.to_string()),
        }
    }

    pub(crate) fn required(path: &[String], message: &str) -> Self {
        let message = if message.is_empty() {
            format!("{} is required", Self::label(path))
        } else {
            message.to_string()
        };
        Self {
            path: path.to_vec(),
            code: "required".to_string(),
            message,
            input: Value::Null,
            expected: None,
        }
    }

    pub(crate) fn failed(path: &[String], input: &Value, code: &str, message: &str) -> Self {
        Self {
            path: path.to_vec(),
            code: code.to_string(),
            message: message.to_string(),
            input: input.clone(),
            expected: None,
        }
    }

    pub(crate) fn format(path: &[String], input: &Value, expected: &str, message: &str) -> Self {
        Self {
            path: path.to_vec(),
            code: "invalid_format".to_string(),
            message: message.to_string(),
            input: input.clone(),
            expected: Some(expected.to_string()),
        }
    }

    pub(crate) fn unrecognized_key(path: &[String], key: &str) -> Self {
        let mut full = path.to_vec();
        full.push(key.to_string());
        Self {
            path: full,
            code: "unrecognized_key".to_string(),
            message: format!("{key} is not a recognized field"),
            input: Value::Null,
            expected: None,
        }
    }
}

/// A failed `parse`: one issue per violated rule, accumulated across all
/// fields; validation never stops at the first failure.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("validation failed with {} issue(s)", .issues.len())]
pub struct ValidationFailure {
    /// The accumulated violations, in field declaration order.
    pub issues: Vec<Issue>,
}

impl ValidationFailure {
    /// The failure as a JSON report, in the shape the error normalizer
    /// accepts (an `issues` collection).
    pub fn to_value(&self) -> Value {
        json!({ "issues": self.issues })
    }
}
