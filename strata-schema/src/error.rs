//! Error types for schema compilation.

use miette::Diagnostic;
use thiserror::Error;

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Fatal errors raised while compiling a schema definition.
///
/// These abort the whole compilation; no partial schema is ever returned.
/// Data-dependent validation failures are a separate, recoverable type
/// ([`crate::validate::ValidationFailure`]).
#[derive(Error, Debug, Diagnostic)]
pub enum SchemaError {
    /// A type token the validation compiler cannot resolve.
    #[error("unsupported type `{token}` for field `{field}`")]
    #[diagnostic(code(strata::schema::unsupported_type))]
    UnsupportedType { field: String, token: String },

    /// A `regex`/`match` pattern source that does not compile.
    #[error("invalid pattern for field `{field}`: {message}")]
    #[diagnostic(code(strata::schema::invalid_pattern))]
    InvalidPattern {
        field: String,
        pattern: String,
        message: String,
    },

    /// An `enum` modifier with an empty allowed set.
    #[error("enum for field `{field}` must list at least one allowed value")]
    #[diagnostic(code(strata::schema::empty_enum))]
    EmptyEnum { field: String },

    /// Error reading a configuration file.
    #[error("failed to read file: {path}")]
    #[diagnostic(code(strata::schema::io_error))]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// TOML parsing error in a configuration file.
    #[error("failed to parse TOML")]
    #[diagnostic(code(strata::schema::toml_error))]
    TomlError {
        #[source]
        source: toml::de::Error,
    },

    /// Configuration error.
    #[error("configuration error: {message}")]
    #[diagnostic(code(strata::schema::config_error))]
    ConfigError { message: String },
}

impl SchemaError {
    /// Create an unsupported-type error.
    pub fn unsupported_type(field: impl Into<String>, token: impl Into<String>) -> Self {
        Self::UnsupportedType {
            field: field.into(),
            token: token.into(),
        }
    }

    /// Create an invalid-pattern error.
    pub fn invalid_pattern(
        field: impl Into<String>,
        pattern: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidPattern {
            field: field.into(),
            pattern: pattern.into(),
            message: message.into(),
        }
    }

    /// Create an empty-enum error.
    pub fn empty_enum(field: impl Into<String>) -> Self {
        Self::EmptyEnum {
            field: field.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }
}
