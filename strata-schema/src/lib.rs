//! # strata-schema
//!
//! Schema compiler core for the Strata ODM.
//!
//! This crate compiles one declarative field-definition map into two
//! independent, semantically aligned representations:
//! - a **persistence schema** consumed by a document-store engine for
//!   integrity constraints, indexes, middleware, and virtual fields
//! - a **validation schema** that checks input documents at the application
//!   boundary with human-readable diagnostics
//!
//! ## Example
//!
//! ```rust
//! use strata_schema::{CompileOptions, SchemaDefinition, compile_schemas, normalize_errors};
//!
//! let definition: SchemaDefinition = serde_json::from_value(serde_json::json!({
//!     "email": { "type": "String", "required": true, "email": true },
//!     "tags":  { "type": "Array", "items": { "type": "String" }, "max": 2 },
//! }))
//! .unwrap();
//!
//! let pair = compile_schemas(&definition, &CompileOptions::new()).unwrap();
//!
//! let failure = pair.validation
//!     .parse(&serde_json::json!({ "email": "not-an-email" }))
//!     .unwrap_err();
//! let errors = normalize_errors(&failure.to_value());
//! assert_eq!(errors[0].field, "email");
//! ```

pub mod cache;
pub mod compiler;
pub mod config;
pub mod definition;
pub mod error;
pub mod messages;
pub mod normalize;
pub mod persist;
pub mod types;
pub mod validate;

pub use cache::{CachePolicy, CacheStats, CompilationCache, MemoryCache, content_signature};
pub use compiler::{
    CompileOptions, CompiledSchemaPair, SchemaCompiler, compile_persistence_only,
    compile_schemas, compile_validation_only, default_compiler,
};
pub use config::CompilerConfig;
pub use definition::{FieldEntry, FieldHook, FieldSpec, PatternSpec, SchemaDefinition};
pub use error::{SchemaError, SchemaResult};
pub use normalize::{NormalizedError, normalize_errors, normalize_failure};
pub use persist::{
    IndexConfig, PersistenceFieldConfig, PersistenceOptions, PersistenceSchema, PersistenceType,
    VirtualField, compile_persistence_schema,
};
pub use types::{CanonicalType, ResolveTarget, TypeToken};
pub use validate::{
    Issue, ValidationFailure, ValidationRule, ValidationSchema, compile_validation_schema,
};
