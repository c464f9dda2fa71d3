//! The raw declarative schema model.
//!
//! A [`SchemaDefinition`] maps field names to declarations. Each declaration
//! is either a full [`FieldSpec`] (a type token plus optional modifiers) or
//! the array-shorthand form, an ordered sequence of specs of which only the
//! first is consulted. Declarations deserialize from plain JSON, so a
//! definition can live in a config document:
//!
//! ```rust
//! use strata_schema::definition::SchemaDefinition;
//!
//! let def: SchemaDefinition = serde_json::from_value(serde_json::json!({
//!     "email": { "type": "String", "required": true, "email": true },
//!     "tags":  { "type": "Array", "items": { "type": "String" } },
//! })).unwrap();
//! assert_eq!(def.len(), 2);
//! ```
//!
//! Compilation never mutates a definition; both compilers borrow it.

use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use smol_str::SmolStr;

use crate::types::{CanonicalType, TypeToken};

/// A full schema definition: field name to declaration, declaration order
/// preserved and carried through to both compiled outputs.
pub type SchemaDefinition = IndexMap<SmolStr, FieldEntry>;

/// One field declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldEntry {
    /// Array shorthand: `"tags": [{ "type": "String" }]`. Compiles to an
    /// array rule whose item type comes from the first element (String when
    /// the sequence is empty).
    Shorthand(Vec<FieldSpec>),
    /// A regular field spec.
    Spec(Box<FieldSpec>),
}

impl FieldEntry {
    /// The spec whose modifiers apply to this entry: the boxed spec, or the
    /// first shorthand element if any.
    pub fn spec(&self) -> Option<&FieldSpec> {
        match self {
            Self::Shorthand(specs) => specs.first(),
            Self::Spec(spec) => Some(spec),
        }
    }

    /// Whether this is the array-shorthand form.
    pub fn is_shorthand(&self) -> bool {
        matches!(self, Self::Shorthand(_))
    }
}

impl From<FieldSpec> for FieldEntry {
    fn from(spec: FieldSpec) -> Self {
        Self::Spec(Box::new(spec))
    }
}

/// One field's raw declarative definition: a mandatory type token plus
/// optional modifiers.
///
/// Unknown keys in a serialized spec are ignored, matching the permissive
/// intake of definitions authored alongside application code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// The type token. Either a canonical tag or a case-insensitive alias.
    #[serde(rename = "type")]
    pub field_type: TypeToken,

    /// Whether the field must be present. `Some(false)` marks the
    /// validation rule optional; persistence copies the flag verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,

    /// Uniqueness constraint. Documentation-only for validation; the
    /// storage engine enforces it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique: Option<bool>,

    /// Minimum string length. Accepts the `minLength` spelling on input.
    #[serde(default, alias = "minLength", skip_serializing_if = "Option::is_none")]
    pub minlength: Option<u64>,

    /// Maximum string length. Accepts the `maxLength` spelling on input.
    #[serde(default, alias = "maxLength", skip_serializing_if = "Option::is_none")]
    pub maxlength: Option<u64>,

    /// Lower bound: a value bound on numbers, an item-count bound on arrays.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,

    /// Upper bound: a value bound on numbers, an item-count bound on arrays.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,

    /// Default value. Setting a default marks the validation rule optional
    /// unless `required` is explicitly `true`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    /// Referenced collection name. Reference fields validate as ObjectId
    /// strings regardless of their declared type.
    #[serde(default, rename = "ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<SmolStr>,

    /// Item declaration for Array fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<FieldEntry>>,

    /// Nested definition for Object fields. Only the validation compiler
    /// recurses into it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<SchemaDefinition>,

    /// Email-format check for string fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<bool>,

    /// Allowed values. A non-empty set replaces the whole validation rule
    /// with a case-insensitive string membership test.
    #[serde(default, rename = "enum", skip_serializing_if = "Option::is_none")]
    pub allowed: Option<Vec<String>>,

    /// Pattern constraint for string fields. Accepts the `match` spelling
    /// on input; either a source string or a pre-compiled pattern.
    #[serde(
        default,
        rename = "regex",
        alias = "match",
        skip_serializing_if = "Option::is_none"
    )]
    pub pattern: Option<PatternSpec>,

    /// Projection hint, copied verbatim to persistence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub select: Option<bool>,

    /// Sparse-index hint, copied verbatim to persistence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sparse: Option<bool>,

    /// Secondary-index hint, copied verbatim to persistence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<bool>,

    /// Text-index hint, copied verbatim to persistence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<bool>,

    /// Immutability hint, copied verbatim to persistence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub immutable: Option<bool>,

    /// Storage-side value transform. Opaque to the core.
    #[serde(default, skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub transform: Option<FieldHook>,

    /// Storage-side accessor. Opaque to the core.
    #[serde(default, skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub get: Option<FieldHook>,

    /// Storage-side mutator. Opaque to the core.
    #[serde(default, skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub set: Option<FieldHook>,
}

impl FieldSpec {
    /// Create a spec with the given type token and no modifiers.
    pub fn of(field_type: impl Into<TypeToken>) -> Self {
        Self {
            field_type: field_type.into(),
            required: None,
            unique: None,
            minlength: None,
            maxlength: None,
            min: None,
            max: None,
            default: None,
            reference: None,
            items: None,
            schema: None,
            email: None,
            allowed: None,
            pattern: None,
            select: None,
            sparse: None,
            index: None,
            text: None,
            immutable: None,
            transform: None,
            get: None,
            set: None,
        }
    }

    /// Set the `required` modifier.
    pub fn required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    /// Set the `unique` modifier.
    pub fn unique(mut self, unique: bool) -> Self {
        self.unique = Some(unique);
        self
    }

    /// Set the minimum string length.
    pub fn minlength(mut self, limit: u64) -> Self {
        self.minlength = Some(limit);
        self
    }

    /// Set the maximum string length.
    pub fn maxlength(mut self, limit: u64) -> Self {
        self.maxlength = Some(limit);
        self
    }

    /// Set the lower bound.
    pub fn min(mut self, limit: f64) -> Self {
        self.min = Some(limit);
        self
    }

    /// Set the upper bound.
    pub fn max(mut self, limit: f64) -> Self {
        self.max = Some(limit);
        self
    }

    /// Set the default value.
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Set the referenced collection.
    pub fn reference(mut self, collection: impl Into<SmolStr>) -> Self {
        self.reference = Some(collection.into());
        self
    }

    /// Set the item declaration.
    pub fn items(mut self, entry: impl Into<FieldEntry>) -> Self {
        self.items = Some(Box::new(entry.into()));
        self
    }

    /// Set the nested definition.
    pub fn schema(mut self, schema: SchemaDefinition) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Enable the email-format check.
    pub fn email(mut self, email: bool) -> Self {
        self.email = Some(email);
        self
    }

    /// Set the allowed-values set.
    pub fn allowed(mut self, values: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.allowed = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Set the pattern constraint.
    pub fn pattern(mut self, pattern: impl Into<PatternSpec>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    /// Set the immutability hint.
    pub fn immutable(mut self, immutable: bool) -> Self {
        self.immutable = Some(immutable);
        self
    }

    /// Attach a storage-side transform hook.
    pub fn transform(mut self, hook: FieldHook) -> Self {
        self.transform = Some(hook);
        self
    }

    /// Attach a storage-side accessor hook.
    pub fn getter(mut self, hook: FieldHook) -> Self {
        self.get = Some(hook);
        self
    }

    /// Attach a storage-side mutator hook.
    pub fn setter(mut self, hook: FieldHook) -> Self {
        self.set = Some(hook);
        self
    }
}

impl From<CanonicalType> for FieldSpec {
    fn from(tag: CanonicalType) -> Self {
        Self::of(tag)
    }
}

/// A pattern constraint: a raw source string, or a pattern compiled ahead
/// of time by the caller.
#[derive(Debug, Clone)]
pub enum PatternSpec {
    /// A pattern source string, compiled during schema compilation.
    Source(String),
    /// A pre-compiled pattern.
    Compiled(regex_lite::Regex),
}

impl PatternSpec {
    /// The pattern source text, regardless of representation.
    pub fn source(&self) -> &str {
        match self {
            Self::Source(source) => source,
            Self::Compiled(regex) => regex.as_str(),
        }
    }
}

impl PartialEq for PatternSpec {
    fn eq(&self, other: &Self) -> bool {
        self.source() == other.source()
    }
}

impl From<&str> for PatternSpec {
    fn from(source: &str) -> Self {
        Self::Source(source.to_string())
    }
}

impl From<String> for PatternSpec {
    fn from(source: String) -> Self {
        Self::Source(source)
    }
}

impl From<regex_lite::Regex> for PatternSpec {
    fn from(regex: regex_lite::Regex) -> Self {
        Self::Compiled(regex)
    }
}

impl Serialize for PatternSpec {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.source())
    }
}

impl<'de> Deserialize<'de> for PatternSpec {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Self::Source(String::deserialize(deserializer)?))
    }
}

/// An opaque storage-side handler (transform, accessor, mutator, or
/// lifecycle middleware). The core never invokes hooks; it registers them
/// for the storage engine.
#[derive(Clone)]
pub struct FieldHook(Arc<dyn Fn(Value) -> Value + Send + Sync>);

impl FieldHook {
    /// Wrap a handler function.
    pub fn new(handler: impl Fn(Value) -> Value + Send + Sync + 'static) -> Self {
        Self(Arc::new(handler))
    }

    /// Invoke the handler. Exposed for the storage layer, never called
    /// during compilation.
    pub fn apply(&self, value: Value) -> Value {
        (self.0)(value)
    }
}

impl std::fmt::Debug for FieldHook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FieldHook(..)")
    }
}

impl PartialEq for FieldHook {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Serialize for FieldHook {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        // Hooks contribute presence, not identity, to content signatures.
        serializer.serialize_str("<hook>")
    }
}
