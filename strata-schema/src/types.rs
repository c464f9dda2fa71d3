//! Canonical type tags and type-token resolution.
//!
//! Every field declaration carries a type token: either one of the nine
//! well-known canonical tags, or a raw alias string ("string", "objectid",
//! "object_id", ...). Resolution goes through a single lookup table and is
//! case-insensitive for raw strings; the two compilation targets disagree
//! only on the `object` alias and on what happens to unmatched tokens.

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// The closed set of canonical types all tokens resolve to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CanonicalType {
    /// UTF-8 string.
    String,
    /// Double-precision number.
    Number,
    /// Boolean.
    Boolean,
    /// Calendar date or timestamp.
    Date,
    /// Homogeneous or open array.
    Array,
    /// Nested document with its own field map.
    Object,
    /// 24-character hexadecimal document identifier.
    ObjectId,
    /// Schemaless value, anything goes.
    Mixed,
    /// Open string-keyed map with string values.
    Map,
}

/// Which compiler is asking for resolution.
///
/// The validation target resolves the `object` alias to [`CanonicalType::Object`]
/// (triggering the nested-schema path); the persistence target resolves it to
/// [`CanonicalType::Mixed`]. This asymmetry is part of the contract, not an
/// accident of implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveTarget {
    /// Resolution for the validation-rule compiler.
    Validation,
    /// Resolution for the persistence-config compiler.
    Persistence,
}

impl CanonicalType {
    /// Resolve a lowercased-on-demand alias string to a canonical tag.
    ///
    /// Returns `None` for unrecognized aliases; the caller decides whether
    /// that is fatal (validation) or a pass-through (persistence).
    pub fn from_alias(alias: &str, target: ResolveTarget) -> Option<Self> {
        match alias.to_ascii_lowercase().as_str() {
            "string" => Some(Self::String),
            "number" => Some(Self::Number),
            "boolean" => Some(Self::Boolean),
            "date" => Some(Self::Date),
            "array" => Some(Self::Array),
            "objectid" | "object_id" => Some(Self::ObjectId),
            "mixed" => Some(Self::Mixed),
            "map" => Some(Self::Map),
            "object" => Some(match target {
                ResolveTarget::Validation => Self::Object,
                ResolveTarget::Persistence => Self::Mixed,
            }),
            _ => None,
        }
    }

    /// Get the tag name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "String",
            Self::Number => "Number",
            Self::Boolean => "Boolean",
            Self::Date => "Date",
            Self::Array => "Array",
            Self::Object => "Object",
            Self::ObjectId => "ObjectId",
            Self::Mixed => "Mixed",
            Self::Map => "Map",
        }
    }
}

impl std::fmt::Display for CanonicalType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A raw type token as it appears in a field declaration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypeToken {
    /// One of the canonical tags, matched by identity.
    Known(CanonicalType),
    /// An alias string, matched case-insensitively through the lookup table.
    Raw(SmolStr),
}

impl TypeToken {
    /// Create a raw alias token.
    pub fn raw(alias: impl Into<SmolStr>) -> Self {
        Self::Raw(alias.into())
    }

    /// Resolve the token for the given target.
    ///
    /// Canonical tags resolve to themselves; raw strings go through the
    /// alias table. `None` means the token is unsupported for this target.
    pub fn resolve(&self, target: ResolveTarget) -> Option<CanonicalType> {
        match self {
            Self::Known(tag) => Some(*tag),
            Self::Raw(alias) => CanonicalType::from_alias(alias, target),
        }
    }

    /// The token as the user wrote it, for diagnostics.
    pub fn as_written(&self) -> &str {
        match self {
            Self::Known(tag) => tag.as_str(),
            Self::Raw(alias) => alias.as_str(),
        }
    }
}

impl From<CanonicalType> for TypeToken {
    fn from(tag: CanonicalType) -> Self {
        Self::Known(tag)
    }
}

impl From<&str> for TypeToken {
    fn from(alias: &str) -> Self {
        Self::Raw(alias.into())
    }
}

impl std::fmt::Display for TypeToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_written())
    }
}
