//! Bounded time-to-live cache for metadata answers

use log::trace;
use moka::policy::EvictionPolicy;
use moka::sync::Cache;
use std::hash::Hash;
use std::time::Duration;

/// Key/value cache where entries expire `ttl` after insertion and the least
/// recently used entry is evicted once `capacity` is reached.
pub struct TtlCache<K, V> {
    cache: Cache<K, V>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        let cache = Cache::builder()
            .max_capacity(capacity.max(1) as u64)
            .time_to_live(ttl)
            // LRU admits every fresh insert
            .eviction_policy(EvictionPolicy::lru())
            .build();
        Self { cache }
    }

    /// Cached value for `key` if it has not expired.
    pub fn get(&self, key: &K) -> Option<V> {
        self.cache.get(key)
    }

    pub fn insert(&self, key: K, value: V) {
        self.cache.insert(key, value);
    }

    /// Returns the cached value, or computes, stores and returns a fresh one.
    /// Failed fetches leave the cache untouched.
    pub fn get_or_try_insert_with<E, F>(&self, key: K, fetch: F) -> Result<V, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        if let Some(value) = self.cache.get(&key) {
            trace!("Cache hit");
            return Ok(value);
        }
        let value = fetch()?;
        self.cache.insert(key, value.clone());
        Ok(value)
    }

    /// Number of live entries after pending evictions are applied.
    pub fn len(&self) -> u64 {
        self.cache.run_pending_tasks();
        self.cache.entry_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
