//! Schema compilation entry points.
//!
//! [`SchemaCompiler`] ties the pieces together: it derives the content
//! signature for a (definition, options) pair, consults its injected cache,
//! and on a miss runs the two field compilers before storing the assembled
//! pair. The compilers run independently; neither consults the other's
//! output.
//!
//! The free functions at the bottom run against a process-wide default
//! compiler for callers that do not need cache injection.

use std::sync::{Arc, LazyLock};

use crate::cache::{CachePolicy, CompilationCache, MemoryCache, content_signature};
use crate::config::CompilerConfig;
use crate::definition::SchemaDefinition;
use crate::error::SchemaResult;
use crate::messages::CustomMessages;
use crate::persist::{PersistenceOptions, PersistenceSchema, compile_persistence_schema};
use crate::validate::{ValidationSchema, compile_validation_schema};

/// Options for schema compilation.
#[derive(Debug, Clone)]
pub struct CompileOptions {
    /// When `false`, [`SchemaCompiler::compile`] skips the cache entirely,
    /// neither looking up nor storing. Defaults to caching.
    pub enable_cache: bool,
    /// Reject unrecognized input keys during validation instead of
    /// stripping them.
    pub strict_mode: bool,
    /// Custom diagnostic messages, keyed `"<field>.<rule>"`.
    pub custom_messages: CustomMessages,
    /// Options for the persistence side.
    pub persistence: PersistenceOptions,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl CompileOptions {
    /// Options with caching enabled and everything else at defaults.
    pub fn new() -> Self {
        Self {
            enable_cache: true,
            strict_mode: false,
            custom_messages: CustomMessages::new(),
            persistence: PersistenceOptions::default(),
        }
    }

    /// Toggle the cache for this compilation.
    pub fn enable_cache(mut self, enable: bool) -> Self {
        self.enable_cache = enable;
        self
    }

    /// Toggle strict input validation.
    pub fn strict_mode(mut self, strict: bool) -> Self {
        self.strict_mode = strict;
        self
    }

    /// Add a custom message for `"<field>.<rule>"`.
    pub fn message(mut self, key: impl Into<String>, message: impl Into<String>) -> Self {
        self.custom_messages.insert(key.into(), message.into());
        self
    }

    /// Replace the whole custom-message table.
    pub fn messages(mut self, messages: CustomMessages) -> Self {
        self.custom_messages = messages;
        self
    }

    /// Set the persistence options.
    pub fn persistence(mut self, options: PersistenceOptions) -> Self {
        self.persistence = options;
        self
    }
}

/// The compiled pair for one (definition, options) signature.
#[derive(Debug, Clone)]
pub struct CompiledSchemaPair {
    /// The storage-side schema.
    pub persistence: PersistenceSchema,
    /// The input-validation schema.
    pub validation: ValidationSchema,
}

/// Compiles definitions through an injected compilation cache.
pub struct SchemaCompiler {
    cache: Arc<dyn CompilationCache>,
}

impl SchemaCompiler {
    /// A compiler over a fresh unbounded in-memory cache.
    pub fn new() -> Self {
        Self::with_cache(Arc::new(MemoryCache::new()))
    }

    /// A compiler over a fresh in-memory cache with the given policy.
    pub fn with_policy(policy: CachePolicy) -> Self {
        Self::with_cache(Arc::new(MemoryCache::with_policy(policy)))
    }

    /// A compiler over the given cache.
    pub fn with_cache(cache: Arc<dyn CompilationCache>) -> Self {
        Self { cache }
    }

    /// A compiler configured from a [`CompilerConfig`].
    pub fn from_config(config: &CompilerConfig) -> Self {
        Self::with_policy(config.cache_policy())
    }

    /// The compiler's cache.
    pub fn cache(&self) -> &Arc<dyn CompilationCache> {
        &self.cache
    }

    /// Compile both schemas for a definition, or return the cached pair for
    /// an identical (definition, options) signature.
    pub fn compile(
        &self,
        definition: &SchemaDefinition,
        options: &CompileOptions,
    ) -> SchemaResult<Arc<CompiledSchemaPair>> {
        if !options.enable_cache {
            tracing::debug!(fields = definition.len(), "compiling schema pair, cache bypassed");
            return Ok(Arc::new(compile_pair(definition, options)?));
        }

        let key = content_signature(definition, options);
        if let Some(pair) = self.cache.get(&key) {
            tracing::debug!(fields = definition.len(), "schema cache hit");
            return Ok(pair);
        }

        tracing::debug!(fields = definition.len(), "schema cache miss, compiling");
        let pair = Arc::new(compile_pair(definition, options)?);
        self.cache.insert(key, Arc::clone(&pair));
        Ok(pair)
    }
}

impl Default for SchemaCompiler {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SchemaCompiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaCompiler")
            .field("cached", &self.cache.len())
            .finish()
    }
}

/// Compile both schemas, uncached. A validation-side compilation error
/// aborts the whole pair; no partial result escapes.
pub(crate) fn compile_pair(
    definition: &SchemaDefinition,
    options: &CompileOptions,
) -> SchemaResult<CompiledSchemaPair> {
    let validation = compile_validation_schema(definition, options)?;
    let persistence = compile_persistence_schema(definition, &options.persistence);
    Ok(CompiledSchemaPair {
        persistence,
        validation,
    })
}

static DEFAULT_COMPILER: LazyLock<SchemaCompiler> = LazyLock::new(SchemaCompiler::new);

/// The process-wide default compiler backing the free functions.
pub fn default_compiler() -> &'static SchemaCompiler {
    &DEFAULT_COMPILER
}

/// Compile both schemas through the default compiler.
pub fn compile_schemas(
    definition: &SchemaDefinition,
    options: &CompileOptions,
) -> SchemaResult<Arc<CompiledSchemaPair>> {
    DEFAULT_COMPILER.compile(definition, options)
}

/// Compile only the validation schema. Uncached.
pub fn compile_validation_only(
    definition: &SchemaDefinition,
    options: &CompileOptions,
) -> SchemaResult<ValidationSchema> {
    compile_validation_schema(definition, options)
}

/// Compile only the persistence schema. Uncached, never fails.
pub fn compile_persistence_only(
    definition: &SchemaDefinition,
    options: &PersistenceOptions,
) -> PersistenceSchema {
    compile_persistence_schema(definition, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn definition(value: serde_json::Value) -> SchemaDefinition {
        serde_json::from_value(value).unwrap()
    }

    fn cached_options() -> CompileOptions {
        CompileOptions::new()
    }

    #[test]
    fn test_identical_inputs_share_one_compilation() {
        let compiler = SchemaCompiler::new();
        let def = definition(json!({ "name": { "type": "String" } }));
        let options = cached_options();

        let first = compiler.compile(&def, &options).unwrap();
        let second = compiler.compile(&def, &options).unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        // A structurally identical but separately built definition hits too.
        let rebuilt = definition(json!({ "name": { "type": "String" } }));
        let third = compiler.compile(&rebuilt, &options).unwrap();
        assert!(Arc::ptr_eq(&first, &third));
    }

    #[test]
    fn test_different_definitions_compile_separately() {
        let compiler = SchemaCompiler::new();
        let options = cached_options();

        let a = compiler
            .compile(&definition(json!({ "a": { "type": "String" } })), &options)
            .unwrap();
        let b = compiler
            .compile(&definition(json!({ "b": { "type": "String" } })), &options)
            .unwrap();

        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(compiler.cache().len(), 2);
    }

    #[test]
    fn test_disabled_cache_bypasses_lookup_and_storage() {
        let compiler = SchemaCompiler::new();
        let def = definition(json!({ "name": { "type": "String" } }));
        let options = CompileOptions::new().enable_cache(false);

        let first = compiler.compile(&def, &options).unwrap();
        let second = compiler.compile(&def, &options).unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(compiler.cache().len(), 0);
    }

    #[test]
    fn test_compilation_error_populates_nothing() {
        let compiler = SchemaCompiler::new();
        let def = definition(json!({ "x": { "type": "quaternion" } }));

        assert!(compiler.compile(&def, &cached_options()).is_err());
        assert_eq!(compiler.cache().len(), 0);
    }

    #[test]
    fn test_pair_contains_both_sides() {
        let compiler = SchemaCompiler::new();
        let def = definition(json!({
            "email": { "type": "String", "required": true, "email": true },
        }));

        let pair = compiler.compile(&def, &cached_options()).unwrap();
        assert!(pair.persistence.field("email").is_some());
        assert!(pair.validation.field("email").is_some());
    }

    #[test]
    fn test_bounded_compiler_policy() {
        let compiler = SchemaCompiler::with_policy(CachePolicy::bounded(1));
        let options = cached_options();

        compiler
            .compile(&definition(json!({ "a": { "type": "String" } })), &options)
            .unwrap();
        compiler
            .compile(&definition(json!({ "b": { "type": "String" } })), &options)
            .unwrap();

        assert_eq!(compiler.cache().len(), 1);
    }

    #[test]
    fn test_default_compiler_free_function() {
        let def = definition(json!({ "title": { "type": "String" } }));
        let first = compile_schemas(&def, &cached_options()).unwrap();
        let second = compile_schemas(&def, &cached_options()).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }
}
