//! Diagnostic message synthesis.
//!
//! Every synthesized message resolves the same way: an explicit entry in the
//! custom-message table under `"<field>.<rule>"` wins, otherwise the default
//! template for that rule kind applies. Pattern constraints additionally get
//! a heuristic pass over the field name and pattern source, so common
//! formats (email, password, phone, URL) read like a human wrote them.
//!
//! Everything here is pure: same inputs, same output, no state.

use std::collections::BTreeMap;

/// Custom message table, keyed `"<field>.<rule>"`.
pub type CustomMessages = BTreeMap<String, String>;

/// Extra context a template may interpolate.
#[derive(Debug, Clone, Copy)]
pub enum MessageDetail<'a> {
    /// No interpolation.
    None,
    /// A numeric value bound (`min`/`max` on numbers).
    Bound(f64),
    /// An item-count bound (`min`/`max` on arrays).
    Count(f64),
    /// A character-length bound (`minlength`/`maxlength`).
    Length(u64),
    /// The allowed-values set (`enum`).
    Allowed(&'a [String]),
}

/// Synthesize the message for one rule on one field.
///
/// Unknown rule kinds fall back to a generic failure message, so callers
/// never have to special-case a kind this module has not heard of.
pub fn synthesize(
    field: &str,
    kind: &str,
    detail: MessageDetail<'_>,
    custom: &CustomMessages,
) -> String {
    if let Some(message) = custom.get(&format!("{field}.{kind}")) {
        return message.clone();
    }

    match (kind, detail) {
        ("required", _) => format!("{field} is required"),
        ("min", MessageDetail::Count(limit)) => {
            format!("{field} must contain at least {limit} items")
        }
        ("min", MessageDetail::Bound(limit)) => format!("{field} must be at least {limit}"),
        ("max", MessageDetail::Count(limit)) => {
            format!("{field} must contain at most {limit} items")
        }
        ("max", MessageDetail::Bound(limit)) => format!("{field} must be at most {limit}"),
        ("minlength", MessageDetail::Length(limit)) => {
            format!("{field} must be at least {limit} characters")
        }
        ("maxlength", MessageDetail::Length(limit)) => {
            format!("{field} must be at most {limit} characters")
        }
        ("email", _) => format!("{field} must be a valid email address"),
        ("regex", _) => format!("{field} format is invalid"),
        ("enum", MessageDetail::Allowed(values)) => {
            format!("{field} must be one of: {}", values.join(", "))
        }
        _ => format!("{field} validation failed"),
    }
}

/// The fixed message for the built-in strong-password rule.
pub fn strong_password_message(field: &str) -> String {
    format!(
        "{field} must be at least 8 characters and include a lowercase letter, \
         an uppercase letter, a number, and a symbol"
    )
}

/// Resolve the message for a `regex`/`match` constraint.
///
/// Resolution order: explicit custom message, then a heuristic over the
/// field name and pattern source, then the generic format message. First
/// heuristic match wins.
pub fn pattern_message(field: &str, pattern: &str, custom: &CustomMessages) -> String {
    if let Some(message) = custom.get(&format!("{field}.regex")) {
        return message.clone();
    }

    let name = field.to_ascii_lowercase();

    if name.contains("email") || pattern.contains('@') {
        return format!("{field} must be a valid email address");
    }
    if name.contains("password") || pattern.contains("(?=") {
        return strong_password_message(field);
    }
    if name.contains("phone") || pattern.contains("\\d") || pattern.contains("[0-9]") {
        return format!("{field} must be a valid phone number");
    }
    if name.contains("url") || pattern.contains("http") {
        return format!("{field} must be a valid URL");
    }

    format!("{field} format is invalid")
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;

    fn no_custom() -> CustomMessages {
        CustomMessages::new()
    }

    // ==================== Template Tests ====================

    #[test]
    fn test_required_template() {
        assert_snapshot!(
            synthesize("email", "required", MessageDetail::None, &no_custom()),
            @"email is required"
        );
    }

    #[test]
    fn test_length_templates() {
        assert_snapshot!(
            synthesize("name", "minlength", MessageDetail::Length(2), &no_custom()),
            @"name must be at least 2 characters"
        );
        assert_snapshot!(
            synthesize("name", "maxlength", MessageDetail::Length(64), &no_custom()),
            @"name must be at most 64 characters"
        );
    }

    #[test]
    fn test_bound_templates_diverge_by_kind() {
        assert_snapshot!(
            synthesize("age", "min", MessageDetail::Bound(18.0), &no_custom()),
            @"age must be at least 18"
        );
        assert_snapshot!(
            synthesize("tags", "max", MessageDetail::Count(2.0), &no_custom()),
            @"tags must contain at most 2 items"
        );
    }

    #[test]
    fn test_enum_template() {
        let values = vec!["admin".to_string(), "user".to_string()];
        assert_snapshot!(
            synthesize("role", "enum", MessageDetail::Allowed(&values), &no_custom()),
            @"role must be one of: admin, user"
        );
    }

    #[test]
    fn test_unknown_kind_falls_back() {
        assert_snapshot!(
            synthesize("thing", "telepathy", MessageDetail::None, &no_custom()),
            @"thing validation failed"
        );
    }

    #[test]
    fn test_custom_message_wins() {
        let mut custom = CustomMessages::new();
        custom.insert("email.required".into(), "we need your email".into());

        assert_eq!(
            synthesize("email", "required", MessageDetail::None, &custom),
            "we need your email"
        );
        // Other fields still get the template.
        assert_eq!(
            synthesize("name", "required", MessageDetail::None, &custom),
            "name is required"
        );
    }

    // ==================== Referential Transparency ====================

    #[test]
    fn test_synthesize_is_referentially_transparent() {
        let custom = no_custom();
        let first = synthesize("age", "min", MessageDetail::Bound(3.0), &custom);
        let second = synthesize("age", "min", MessageDetail::Bound(3.0), &custom);
        assert_eq!(first, second);
    }

    // ==================== Pattern Heuristic Tests ====================

    #[test]
    fn test_pattern_heuristic_email_by_name() {
        assert_snapshot!(
            pattern_message("workEmail", "^.+$", &no_custom()),
            @"workEmail must be a valid email address"
        );
    }

    #[test]
    fn test_pattern_heuristic_email_by_pattern() {
        let message = pattern_message("contact", "^[^@]+@[^@]+$", &no_custom());
        assert!(message.contains("valid email address"));
    }

    #[test]
    fn test_pattern_heuristic_password_by_lookahead_marker() {
        let message = pattern_message("secret", "(?=.*[A-Z]).{8,}", &no_custom());
        assert!(message.contains("at least 8 characters"));
    }

    #[test]
    fn test_pattern_heuristic_phone_by_digit_class() {
        assert_snapshot!(
            pattern_message("mobile", "^\\d{10}$", &no_custom()),
            @"mobile must be a valid phone number"
        );
    }

    #[test]
    fn test_pattern_heuristic_url() {
        assert_snapshot!(
            pattern_message("homepage", "^https?://", &no_custom()),
            @"homepage must be a valid URL"
        );
        let by_name = pattern_message("avatarUrl", "^.+$", &no_custom());
        assert!(by_name.contains("valid URL"));
    }

    #[test]
    fn test_pattern_heuristic_generic_fallback() {
        assert_snapshot!(
            pattern_message("slug", "^[a-z-]+$", &no_custom()),
            @"slug format is invalid"
        );
    }

    #[test]
    fn test_pattern_heuristic_order_email_before_password() {
        // A field named "emailPassword" hits the email branch first.
        let message = pattern_message("emailPassword", "^.+$", &no_custom());
        assert!(message.contains("valid email address"));
    }

    #[test]
    fn test_pattern_custom_message_beats_heuristics() {
        let mut custom = CustomMessages::new();
        custom.insert("mobile.regex".into(), "ten digits, no dashes".into());
        assert_eq!(
            pattern_message("mobile", "^\\d{10}$", &custom),
            "ten digits, no dashes"
        );
    }
}
