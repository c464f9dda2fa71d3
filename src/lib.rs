//! # Strata
//!
//! A schema compiler for document-oriented Rust services, inspired by
//! Mongoose.
//!
//! Strata turns one declarative field-definition map into two independent,
//! semantically aligned schemas:
//! - a **persistence schema** handed to a document-store engine (integrity
//!   constraints, indexes, lifecycle middleware, virtual fields)
//! - a **validation schema** that rejects malformed input at the
//!   application boundary with human-readable diagnostics
//!
//! ## Quick Start
//!
//! ```rust
//! use strata::prelude::*;
//!
//! let definition: SchemaDefinition = serde_json::from_value(serde_json::json!({
//!     "email":    { "type": "String", "required": true, "email": true },
//!     "password": { "type": "String", "minlength": 8 },
//!     "tags":     { "type": "Array", "items": { "type": "String" }, "max": 5 },
//! }))
//! .unwrap();
//!
//! let pair = compile_schemas(&definition, &CompileOptions::new()).unwrap();
//!
//! // The validation side rejects bad input early...
//! assert!(pair.validation.parse(&serde_json::json!({
//!     "email": "not-an-email",
//!     "password": "weak",
//! })).is_err());
//!
//! // ...while the persistence side describes the same fields for storage.
//! assert!(pair.persistence.field("email").is_some());
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// Schema compilation, validation, and persistence-config types.
pub mod schema {
    pub use strata_schema::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::schema::{
        CompileOptions, CompiledSchemaPair, CompilerConfig, FieldSpec, PersistenceOptions,
        SchemaCompiler, SchemaDefinition, compile_schemas, normalize_errors,
    };
}

// Re-export key types at the crate root
pub use schema::{
    CompileOptions, CompiledSchemaPair, SchemaCompiler, SchemaDefinition, SchemaError,
    compile_schemas, normalize_errors,
};
