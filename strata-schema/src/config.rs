//! Configuration file parsing for `strata.toml`.
//!
//! ```toml
//! [cache]
//! enabled = true
//! max_entries = 256
//! ttl_seconds = 600
//!
//! [validation]
//! strict = true
//!
//! [messages]
//! "email.required" = "we need your email"
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cache::CachePolicy;
use crate::compiler::CompileOptions;
use crate::error::{SchemaError, SchemaResult};
use crate::messages::CustomMessages;

/// Main configuration structure for `strata.toml`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CompilerConfig {
    /// Cache settings.
    #[serde(default)]
    pub cache: CacheSettings,

    /// Validation settings.
    #[serde(default)]
    pub validation: ValidationSettings,

    /// Custom diagnostic messages, keyed `"<field>.<rule>"`.
    #[serde(default)]
    pub messages: CustomMessages,
}

/// Cache settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CacheSettings {
    /// Whether compilation results are cached at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Maximum resident entries; unbounded when absent.
    #[serde(default)]
    pub max_entries: Option<usize>,

    /// Entry time-to-live in seconds; no expiry when absent.
    #[serde(default)]
    pub ttl_seconds: Option<u64>,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: None,
            ttl_seconds: None,
        }
    }
}

/// Validation settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ValidationSettings {
    /// Reject unrecognized input keys instead of stripping them.
    #[serde(default)]
    pub strict: bool,
}

fn default_true() -> bool {
    true
}

impl CompilerConfig {
    /// Load configuration from a file path.
    pub fn from_file(path: impl AsRef<Path>) -> SchemaResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| SchemaError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> SchemaResult<Self> {
        toml::from_str(content).map_err(|e| SchemaError::TomlError { source: e })
    }

    /// The cache retention policy these settings describe.
    pub fn cache_policy(&self) -> CachePolicy {
        CachePolicy {
            max_entries: self.cache.max_entries,
            ttl: self.cache.ttl_seconds.map(Duration::from_secs),
        }
    }

    /// Compile options seeded from these settings.
    pub fn base_options(&self) -> CompileOptions {
        CompileOptions::new()
            .enable_cache(self.cache.enabled)
            .strict_mode(self.validation.strict)
            .messages(self.messages.clone())
    }
}
