//! Compilation caching.
//!
//! Compiling a definition twice is pure waste: the pair is a deterministic
//! function of (definition, options). The cache keys compiled pairs by a
//! stable content serialization of both, so structurally identical inputs
//! share one `Arc`; callers may rely on reference equality across repeated
//! compilations.
//!
//! The cache is an injected abstraction, not ambient global state. The
//! default [`MemoryCache`] is unbounded, matching the historical behavior,
//! but a [`CachePolicy`] can cap entries (FIFO eviction) or attach a TTL.

use std::sync::Arc;
use std::time::{Duration, Instant};

use indexmap::IndexMap;
use parking_lot::RwLock;
use serde_json::json;

use crate::compiler::{CompileOptions, CompiledSchemaPair};
use crate::definition::SchemaDefinition;

// ============================================================================
// Content signature
// ============================================================================

/// Derive the cache key for a compilation: a stable, order-sensitive
/// serialization of the definition and the output-affecting options.
///
/// Opaque hooks contribute presence markers, not identity; two definitions
/// differing only in hook identity share a signature.
pub fn content_signature(definition: &SchemaDefinition, options: &CompileOptions) -> String {
    json!({
        "definition": definition,
        "strict": options.strict_mode,
        "messages": options.custom_messages,
        "persistence": options.persistence.signature(),
    })
    .to_string()
}

// ============================================================================
// Cache abstraction
// ============================================================================

/// A store for compiled schema pairs, keyed by content signature.
pub trait CompilationCache: Send + Sync {
    /// Look up a previously compiled pair.
    fn get(&self, key: &str) -> Option<Arc<CompiledSchemaPair>>;

    /// Store a compiled pair.
    fn insert(&self, key: String, pair: Arc<CompiledSchemaPair>);

    /// Drop every entry.
    fn clear(&self);

    /// Number of resident entries.
    fn len(&self) -> usize;

    /// Whether the cache is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Retention policy for [`MemoryCache`].
///
/// The default keeps everything forever: every distinct signature ever
/// compiled stays resident for the cache's lifetime.
#[derive(Debug, Clone, Copy, Default)]
pub struct CachePolicy {
    /// Maximum resident entries; the oldest insertion is evicted first.
    pub max_entries: Option<usize>,
    /// Time-to-live per entry, checked lazily on lookup.
    pub ttl: Option<Duration>,
}

impl CachePolicy {
    /// A policy bounded to `max_entries` entries.
    pub fn bounded(max_entries: usize) -> Self {
        Self {
            max_entries: Some(max_entries),
            ttl: None,
        }
    }

    /// Attach a time-to-live.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }
}

/// Statistics for a [`MemoryCache`].
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Number of pairs currently cached.
    pub cached_count: usize,
}

impl CacheStats {
    /// Get the cache hit rate.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// ============================================================================
// In-memory cache
// ============================================================================

struct CacheEntry {
    pair: Arc<CompiledSchemaPair>,
    inserted_at: Instant,
}

/// The default in-memory cache: an insertion-ordered map behind an
/// `RwLock`, so the check-then-insert sequence is atomic for embedders
/// that compile from multiple threads.
#[derive(Default)]
pub struct MemoryCache {
    entries: RwLock<IndexMap<String, CacheEntry>>,
    policy: CachePolicy,
    stats: RwLock<CacheStats>,
}

impl MemoryCache {
    /// Create an unbounded cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a cache with the given retention policy.
    pub fn with_policy(policy: CachePolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.read().clone();
        stats.cached_count = self.entries.read().len();
        stats
    }

    fn is_expired(&self, entry: &CacheEntry) -> bool {
        self.policy
            .ttl
            .is_some_and(|ttl| entry.inserted_at.elapsed() > ttl)
    }
}

impl std::fmt::Debug for MemoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCache")
            .field("len", &self.entries.read().len())
            .field("policy", &self.policy)
            .finish()
    }
}

impl CompilationCache for MemoryCache {
    fn get(&self, key: &str) -> Option<Arc<CompiledSchemaPair>> {
        let expired = {
            let entries = self.entries.read();
            match entries.get(key) {
                Some(entry) if !self.is_expired(entry) => {
                    self.stats.write().hits += 1;
                    return Some(Arc::clone(&entry.pair));
                }
                Some(_) => true,
                None => false,
            }
        };

        if expired {
            self.entries.write().shift_remove(key);
        }
        self.stats.write().misses += 1;
        None
    }

    fn insert(&self, key: String, pair: Arc<CompiledSchemaPair>) {
        let mut entries = self.entries.write();

        if let Some(max) = self.policy.max_entries {
            if !entries.contains_key(&key) && entries.len() >= max {
                let oldest = entries.keys().next().cloned();
                if let Some(oldest) = oldest {
                    entries.shift_remove(&oldest);
                }
            }
        }

        entries.insert(
            key,
            CacheEntry {
                pair,
                inserted_at: Instant::now(),
            },
        );
    }

    fn clear(&self) {
        self.entries.write().clear();
    }

    fn len(&self) -> usize {
        self.entries.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::compile_pair;
    use serde_json::json;

    fn sample_pair(marker: &str) -> Arc<CompiledSchemaPair> {
        let definition: SchemaDefinition = serde_json::from_value(json!({
            "name": { "type": "String", "default": marker },
        }))
        .unwrap();
        Arc::new(compile_pair(&definition, &CompileOptions::default()).unwrap())
    }

    // ==================== Signature Tests ====================

    #[test]
    fn test_signature_stable_for_identical_inputs() {
        let def: SchemaDefinition =
            serde_json::from_value(json!({ "a": { "type": "String" } })).unwrap();
        let options = CompileOptions::default();
        assert_eq!(
            content_signature(&def, &options),
            content_signature(&def, &options)
        );
    }

    #[test]
    fn test_signature_is_order_sensitive() {
        let ab: SchemaDefinition = serde_json::from_value(
            json!({ "a": { "type": "String" }, "b": { "type": "String" } }),
        )
        .unwrap();
        let ba: SchemaDefinition = serde_json::from_value(
            json!({ "b": { "type": "String" }, "a": { "type": "String" } }),
        )
        .unwrap();

        let options = CompileOptions::default();
        assert_ne!(content_signature(&ab, &options), content_signature(&ba, &options));
    }

    #[test]
    fn test_signature_changes_with_options() {
        let def: SchemaDefinition =
            serde_json::from_value(json!({ "a": { "type": "String" } })).unwrap();

        let plain = CompileOptions::default();
        let mut strict = CompileOptions::default();
        strict.strict_mode = true;

        assert_ne!(content_signature(&def, &plain), content_signature(&def, &strict));
    }

    // ==================== Memory Cache Tests ====================

    #[test]
    fn test_hit_returns_same_arc() {
        let cache = MemoryCache::new();
        let pair = sample_pair("a");
        cache.insert("k".to_string(), Arc::clone(&pair));

        let hit = cache.get("k").unwrap();
        assert!(Arc::ptr_eq(&hit, &pair));

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 0);
    }

    #[test]
    fn test_miss_recorded() {
        let cache = MemoryCache::new();
        assert!(cache.get("absent").is_none());
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_clear() {
        let cache = MemoryCache::new();
        cache.insert("k".to_string(), sample_pair("a"));
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_bounded_policy_evicts_oldest_first() {
        let cache = MemoryCache::with_policy(CachePolicy::bounded(2));
        cache.insert("first".to_string(), sample_pair("a"));
        cache.insert("second".to_string(), sample_pair("b"));
        cache.insert("third".to_string(), sample_pair("c"));

        assert_eq!(cache.len(), 2);
        assert!(cache.get("first").is_none());
        assert!(cache.get("second").is_some());
        assert!(cache.get("third").is_some());
    }

    #[test]
    fn test_reinserting_existing_key_does_not_evict() {
        let cache = MemoryCache::with_policy(CachePolicy::bounded(2));
        cache.insert("a".to_string(), sample_pair("a"));
        cache.insert("b".to_string(), sample_pair("b"));
        cache.insert("a".to_string(), sample_pair("a"));

        assert_eq!(cache.len(), 2);
        assert!(cache.get("b").is_some());
    }

    #[test]
    fn test_ttl_expires_entries() {
        let cache =
            MemoryCache::with_policy(CachePolicy::default().with_ttl(Duration::from_millis(10)));
        cache.insert("k".to_string(), sample_pair("a"));
        assert!(cache.get("k").is_some());

        std::thread::sleep(Duration::from_millis(30));
        assert!(cache.get("k").is_none());
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_stats_hit_rate() {
        let stats = CacheStats {
            hits: 8,
            misses: 2,
            cached_count: 5,
        };
        assert!((stats.hit_rate() - 0.8).abs() < 0.001);
        assert_eq!(CacheStats::default().hit_rate(), 0.0);
    }
}
