//! Persistence-config compilation.
//!
//! The persistence compiler is the permissive half of the pair: it never
//! fails, it copies modifiers verbatim, and it leaves enum enforcement and
//! nested-schema expansion to the validation side. Its output is the flat
//! configuration a document-store engine consumes: field configs plus
//! registered lifecycle middleware, virtual accessors, and secondary
//! indexes. The engine itself is an external collaborator; everything
//! registered here is opaque to the core.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use smol_str::SmolStr;

use crate::definition::{FieldEntry, FieldHook, FieldSpec, SchemaDefinition};
use crate::messages::{self, CustomMessages, MessageDetail};
use crate::types::{CanonicalType, ResolveTarget, TypeToken};

/// The storage-side type of a field.
///
/// Unlike the validation resolver, unknown tokens pass through opaquely:
/// whatever was written becomes the literal type value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceType {
    /// A resolved canonical tag.
    Scalar(CanonicalType),
    /// An unrecognized token, passed through as written.
    Opaque(SmolStr),
    /// An array of a nested type.
    ArrayOf(Box<PersistenceType>),
}

impl PersistenceType {
    /// Resolve a token permissively.
    pub fn resolve(token: &TypeToken) -> Self {
        match token.resolve(ResolveTarget::Persistence) {
            Some(tag) => Self::Scalar(tag),
            None => Self::Opaque(token.as_written().into()),
        }
    }
}

impl std::fmt::Display for PersistenceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Scalar(tag) => write!(f, "{tag}"),
            Self::Opaque(raw) => write!(f, "{raw}"),
            Self::ArrayOf(inner) => write!(f, "[{inner}]"),
        }
    }
}

impl Serialize for PersistenceType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Scalar(tag) => serializer.serialize_str(tag.as_str()),
            Self::Opaque(raw) => serializer.serialize_str(raw),
            Self::ArrayOf(inner) => [inner.as_ref()].serialize(serializer),
        }
    }
}

/// The single format check a field config may carry.
///
/// Both `email: true` and `regex`/`match` lower into this slot; when a
/// declaration has both, the pattern wins because modifiers apply in a
/// fixed order (email first, pattern second).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormatValidator {
    /// What the check tests.
    pub kind: FormatKind,
    /// The message the storage layer should report on violation.
    pub message: String,
}

/// The kind of format check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum FormatKind {
    /// Email form.
    Email,
    /// An explicit pattern source.
    Pattern(String),
}

/// The flat storage-side configuration of one field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersistenceFieldConfig {
    /// Resolved (or passed-through) storage type.
    #[serde(rename = "type")]
    pub field_type: PersistenceType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minlength: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maxlength: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Referenced collection, carried forward from ObjectId items.
    #[serde(rename = "ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<SmolStr>,
    /// The lowered format check, at most one per field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validator: Option<FormatValidator>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub select: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sparse: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub immutable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transform: Option<FieldHook>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub get: Option<FieldHook>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub set: Option<FieldHook>,
}

impl PersistenceFieldConfig {
    fn of(field_type: PersistenceType) -> Self {
        Self {
            field_type,
            required: None,
            unique: None,
            minlength: None,
            maxlength: None,
            min: None,
            max: None,
            default: None,
            reference: None,
            validator: None,
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
}

/// A virtual accessor field: computed on read, optionally writable.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VirtualField {
    /// Getter handler.
    pub get: Option<FieldHook>,
    /// Setter handler.
    pub set: Option<FieldHook>,
}

/// A secondary index definition for one field path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Sort direction, `1` ascending or `-1` descending.
    #[serde(default = "default_direction")]
    pub direction: i32,
    /// Uniqueness constraint on the index.
    #[serde(default)]
    pub unique: bool,
    /// Skip documents missing the indexed path.
    #[serde(default)]
    pub sparse: bool,
}

fn default_direction() -> i32 {
    1
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            direction: 1,
            unique: false,
            sparse: false,
        }
    }
}

/// Lifecycle middleware handlers, one per hook name.
#[derive(Debug, Clone, Default)]
pub struct MiddlewareOptions {
    /// Handlers run before the named operation.
    pub pre: IndexMap<SmolStr, FieldHook>,
    /// Handlers run after the named operation.
    pub post: IndexMap<SmolStr, FieldHook>,
}

/// Options for persistence-schema compilation, delegated verbatim to the
/// storage engine.
#[derive(Debug, Clone, Default)]
pub struct PersistenceOptions {
    /// Engine-level schema options, opaque to the core.
    pub schema_options: Map<String, Value>,
    /// Lifecycle middleware to register.
    pub middleware: MiddlewareOptions,
    /// Virtual accessor fields to register.
    pub virtuals: IndexMap<SmolStr, VirtualField>,
    /// Secondary indexes to register, by field path.
    pub indexes: IndexMap<SmolStr, IndexConfig>,
}

impl PersistenceOptions {
    /// The options' contribution to a content signature. Handlers are
    /// opaque, so only their names participate.
    pub(crate) fn signature(&self) -> Value {
        json!({
            "schema_options": self.schema_options,
            "pre": self.middleware.pre.keys().collect::<Vec<_>>(),
            "post": self.middleware.post.keys().collect::<Vec<_>>(),
            "virtuals": self.virtuals.keys().collect::<Vec<_>>(),
            "indexes": self.indexes,
        })
    }
}

/// The compiled persistence schema: field configs plus the registered
/// engine-side extras.
#[derive(Debug, Clone, Default)]
pub struct PersistenceSchema {
    /// Field configs, in declaration order.
    pub fields: IndexMap<SmolStr, PersistenceFieldConfig>,
    /// Engine-level schema options, passed through untouched.
    pub options: Map<String, Value>,
    pre_hooks: IndexMap<SmolStr, Vec<FieldHook>>,
    post_hooks: IndexMap<SmolStr, Vec<FieldHook>>,
    virtuals: IndexMap<SmolStr, VirtualField>,
    indexes: IndexMap<SmolStr, IndexConfig>,
}

impl PersistenceSchema {
    /// The config compiled for a field, if declared.
    pub fn field(&self, name: &str) -> Option<&PersistenceFieldConfig> {
        self.fields.get(name)
    }

    /// Register a handler to run before the named operation.
    pub fn pre(&mut self, hook: impl Into<SmolStr>, handler: FieldHook) {
        self.pre_hooks.entry(hook.into()).or_default().push(handler);
    }

    /// Register a handler to run after the named operation.
    pub fn post(&mut self, hook: impl Into<SmolStr>, handler: FieldHook) {
        self.post_hooks.entry(hook.into()).or_default().push(handler);
    }

    /// Register a virtual accessor field.
    pub fn virtual_field(&mut self, name: impl Into<SmolStr>, virtual_field: VirtualField) {
        self.virtuals.insert(name.into(), virtual_field);
    }

    /// Register a secondary index on a field path.
    pub fn index(&mut self, path: impl Into<SmolStr>, config: IndexConfig) {
        self.indexes.insert(path.into(), config);
    }

    /// Handlers registered before the named operation.
    pub fn pre_handlers(&self, hook: &str) -> &[FieldHook] {
        self.pre_hooks.get(hook).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Handlers registered after the named operation.
    pub fn post_handlers(&self, hook: &str) -> &[FieldHook] {
        self.post_hooks.get(hook).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The registered virtual fields.
    pub fn virtuals(&self) -> &IndexMap<SmolStr, VirtualField> {
        &self.virtuals
    }

    /// The registered secondary indexes.
    pub fn indexes(&self) -> &IndexMap<SmolStr, IndexConfig> {
        &self.indexes
    }
}

/// Compile a whole definition into a persistence schema and register the
/// supplied middleware, virtuals, and indexes.
pub fn compile_persistence_schema(
    definition: &SchemaDefinition,
    options: &PersistenceOptions,
) -> PersistenceSchema {
    let mut schema = PersistenceSchema {
        options: options.schema_options.clone(),
        ..Default::default()
    };

    for (name, entry) in definition {
        schema
            .fields
            .insert(name.clone(), compile_persistence_field(name, entry));
    }

    for (hook, handler) in &options.middleware.pre {
        schema.pre(hook.clone(), handler.clone());
    }
    for (hook, handler) in &options.middleware.post {
        schema.post(hook.clone(), handler.clone());
    }
    for (name, virtual_field) in &options.virtuals {
        schema.virtual_field(name.clone(), virtual_field.clone());
    }
    for (path, config) in &options.indexes {
        schema.index(path.clone(), config.clone());
    }

    schema
}

/// Compile one field declaration into its storage config. Never fails;
/// unresolved type tokens pass through as literal values.
pub fn compile_persistence_field(name: &str, entry: &FieldEntry) -> PersistenceFieldConfig {
    let (field_type, carried_ref) = entry_type(entry);
    let mut config = PersistenceFieldConfig::of(field_type);
    config.reference = carried_ref;

    let Some(spec) = entry.spec() else {
        return config;
    };

    // Shorthand entries carry no field-level modifiers; the first element
    // only contributes the item type (and a carried ref) above.
    if entry.is_shorthand() {
        return config;
    }

    config.required = spec.required;
    config.unique = spec.unique;
    config.minlength = spec.minlength;
    config.maxlength = spec.maxlength;
    config.min = spec.min;
    config.max = spec.max;
    config.default = spec.default.clone();
    if let Some(reference) = &spec.reference {
        config.reference = Some(reference.clone());
    }
    config.select = spec.select;
    config.sparse = spec.sparse;
    config.index = spec.index;
    config.text = spec.text;
    config.immutable = spec.immutable;
    config.transform = spec.transform.clone();
    config.get = spec.get.clone();
    config.set = spec.set.clone();

    // `enum` is deliberately not copied: membership is enforced on the
    // validation side only.

    // email and regex/match share the single validator slot; the pattern
    // applies second and wins when both are present.
    let no_custom = CustomMessages::new();
    if spec.email == Some(true) {
        config.validator = Some(FormatValidator {
            kind: FormatKind::Email,
            message: messages::synthesize(name, "email", MessageDetail::None, &no_custom),
        });
    }
    if let Some(pattern) = &spec.pattern {
        config.validator = Some(FormatValidator {
            kind: FormatKind::Pattern(pattern.source().to_string()),
            message: messages::pattern_message(name, pattern.source(), &no_custom),
        });
    }

    // A nested `schema` is not expanded here; only the validation compiler
    // recurses into nested definitions.

    config
}

/// The storage type of an entry, plus a `ref` carried up from ObjectId
/// items.
fn entry_type(entry: &FieldEntry) -> (PersistenceType, Option<SmolStr>) {
    match entry {
        FieldEntry::Shorthand(specs) => match specs.first() {
            Some(first) => {
                let (item, reference) = spec_type(first);
                (PersistenceType::ArrayOf(Box::new(item)), reference)
            }
            None => (
                PersistenceType::ArrayOf(Box::new(PersistenceType::Scalar(CanonicalType::String))),
                None,
            ),
        },
        FieldEntry::Spec(spec) => spec_type(spec),
    }
}

fn spec_type(spec: &FieldSpec) -> (PersistenceType, Option<SmolStr>) {
    let base = PersistenceType::resolve(&spec.field_type);

    if base == PersistenceType::Scalar(CanonicalType::Array) {
        if let Some(items) = &spec.items {
            let (item, reference) = entry_type(items);
            return (PersistenceType::ArrayOf(Box::new(item)), reference);
        }
    }

    if base == PersistenceType::Scalar(CanonicalType::ObjectId) {
        return (base, spec.reference.clone());
    }

    (base, None)
}
