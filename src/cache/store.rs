//! Generic bounded cache with TTL expiration and LRU eviction
//!
//! This is the foundation primitive both tiers are built on:
//! - Thread-safe async access via RwLock
//! - Lazy TTL-based expiration (expired entries are treated as absent)
//! - LRU eviction when the entry capacity is reached
//! - Tag-based invalidation for cascades
//! - Monotonic hit/miss/eviction counters

use crate::cache::{
    clock::{Clock, SystemClock},
    config::CacheConfig,
    entry::CacheEntry,
    invalidation::{InvalidationEvent, InvalidationReason},
    types::{CacheKey, CacheStats},
};
use crate::error::Result;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Bounded key-value store with TTL expiration and LRU eviction
pub struct MemoryCache<V> {
    /// Cache configuration
    pub(crate) config: CacheConfig,

    /// Time source for TTL bookkeeping
    clock: Arc<dyn Clock>,

    /// Internal storage
    store: Arc<RwLock<CacheShard<V>>>,
}

/// Internal cache storage
struct CacheShard<V> {
    /// Main storage: key -> entry
    entries: HashMap<CacheKey, CacheEntry<V>>,

    /// LRU tracking: front = least recently used. Never-accessed entries
    /// keep insertion order, so ties break FIFO deterministically.
    lru_queue: VecDeque<CacheKey>,

    /// Monotonic counters
    stats: CacheStats,
}

impl<V: Clone + Send + Sync> MemoryCache<V> {
    /// Create a new cache with the given configuration
    ///
    /// Fails fast with a configuration error on zero capacity or TTL.
    pub fn new(config: CacheConfig) -> Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a cache with an explicit time source (used by TTL tests)
    pub fn with_clock(config: CacheConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;
        info!(capacity = config.capacity, ttl_secs = config.default_ttl.as_secs(), "initializing cache");

        let shard = CacheShard {
            entries: HashMap::new(),
            lru_queue: VecDeque::new(),
            stats: CacheStats::default(),
        };

        Ok(Self {
            config,
            clock,
            store: Arc::new(RwLock::new(shard)),
        })
    }

    /// Insert a value with the cache default TTL
    pub async fn insert(&self, key: CacheKey, value: V) {
        self.insert_full(key, value, None, Vec::new()).await
    }

    /// Insert a value with an explicit TTL (`None` means the cache default)
    pub async fn insert_with_ttl(&self, key: CacheKey, value: V, ttl: Option<Duration>) {
        self.insert_full(key, value, ttl, Vec::new()).await
    }

    /// Insert a value carrying invalidation tags
    pub async fn insert_with_tags(&self, key: CacheKey, value: V, tags: Vec<String>) {
        self.insert_full(key, value, None, tags).await
    }

    /// Insert or overwrite an entry
    ///
    /// Overwriting resets the created/accessed timestamps and bumps the
    /// entry version. When the cache is at capacity and the key is new,
    /// expired entries are purged first; only if none were expired is the
    /// least-recently-used live entry evicted.
    pub async fn insert_full(
        &self,
        key: CacheKey,
        value: V,
        ttl: Option<Duration>,
        tags: Vec<String>,
    ) {
        let now = self.clock.now();
        let ttl = match ttl {
            Some(ttl) if !ttl.is_zero() => ttl,
            _ => self.config.ttl_with_jitter(),
        };

        let mut shard = self.store.write().await;

        if let Some(existing) = shard.entries.get_mut(&key) {
            debug!(%key, "updating existing cache entry");
            existing.update_value(value, ttl, now);
            for tag in tags {
                existing.add_tag(tag);
            }
            shard.touch(&key);
            return;
        }

        if shard.entries.len() >= self.config.capacity {
            shard.make_room(now);
        }

        debug!(%key, "inserting new cache entry");
        let mut entry = CacheEntry::new(key.clone(), value, ttl, now);
        for tag in tags {
            entry.add_tag(tag);
        }
        shard.entries.insert(key.clone(), entry);
        shard.lru_queue.push_back(key);

        debug_assert!(shard.entries.len() <= self.config.capacity);
    }

    /// Get a value if present and not expired
    ///
    /// A hit marks the entry most-recently-used. An expired entry found in
    /// place is removed (counted as a TTL eviction) and reported as a miss.
    pub async fn get(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        let mut shard = self.store.write().await;

        match shard.entries.get(key).map(|entry| entry.is_expired(now)) {
            Some(true) => {
                debug!(%key, "cache entry expired");
                shard.remove_entry(key);
                shard.stats.misses += 1;
                shard.stats.evictions_ttl += 1;
                None
            }
            Some(false) => {
                let value = shard.entries.get_mut(key).map(|entry| {
                    entry.mark_accessed(now);
                    entry.value.clone()
                });
                shard.touch(key);
                shard.stats.hits += 1;
                debug!(%key, "cache hit");
                value
            }
            None => {
                debug!(%key, "cache miss");
                shard.stats.misses += 1;
                None
            }
        }
    }

    /// Check if a key exists (without updating access time or stats)
    pub async fn contains_key(&self, key: &str) -> bool {
        let now = self.clock.now();
        let shard = self.store.read().await;
        shard
            .entries
            .get(key)
            .map(|entry| !entry.is_expired(now))
            .unwrap_or(false)
    }

    /// Remove a specific entry, returning its value if anything was removed
    pub async fn remove(&self, key: &str) -> Option<V> {
        let mut shard = self.store.write().await;

        let removed = shard.remove_entry(key);
        if removed.is_some() {
            shard.stats.invalidations += 1;
            debug!(%key, "removed cache entry");
        }
        removed.map(|entry| entry.value)
    }

    /// Remove an entry by key, reporting whether anything was removed
    pub async fn invalidate(&self, key: &str) -> bool {
        self.remove(key).await.is_some()
    }

    /// Remove all entries
    pub async fn clear(&self) {
        let mut shard = self.store.write().await;

        let count = shard.entries.len();
        shard.entries.clear();
        shard.lru_queue.clear();
        shard.stats.invalidations += count as u64;

        info!(count, "cleared cache");
    }

    /// Remove every entry carrying the given tag, returning how many fell
    pub async fn invalidate_by_tag(&self, tag: &str) -> usize {
        let mut shard = self.store.write().await;

        let keys_to_remove: Vec<CacheKey> = shard
            .entries
            .values()
            .filter(|entry| entry.has_tag(tag))
            .map(|entry| entry.key.clone())
            .collect();

        for key in &keys_to_remove {
            shard.remove_entry(key);
        }

        let removed = keys_to_remove.len();
        shard.stats.invalidations += removed as u64;
        if removed > 0 {
            info!(tag, removed, "invalidated cache entries by tag");
        }

        removed
    }

    /// Remove all expired entries
    pub async fn cleanup_expired(&self) -> Vec<InvalidationEvent> {
        let now = self.clock.now();
        let mut shard = self.store.write().await;

        let expired_keys: Vec<CacheKey> = shard
            .entries
            .values()
            .filter(|entry| entry.is_expired(now))
            .map(|entry| entry.key.clone())
            .collect();

        if expired_keys.is_empty() {
            return Vec::new();
        }

        for key in &expired_keys {
            shard.remove_entry(key);
        }
        shard.stats.evictions_ttl += expired_keys.len() as u64;

        debug!(count = expired_keys.len(), "cleaned up expired entries");
        vec![InvalidationEvent::new(
            InvalidationReason::Expired,
            expired_keys,
        )]
    }

    /// Get cache statistics
    pub async fn stats(&self) -> CacheStats {
        let shard = self.store.read().await;
        let mut stats = shard.stats.clone();
        stats.entries = shard.entries.len();
        stats
    }

    /// Get number of entries physically in the cache
    pub async fn len(&self) -> usize {
        let shard = self.store.read().await;
        shard.entries.len()
    }

    /// Check if cache is empty
    pub async fn is_empty(&self) -> bool {
        let shard = self.store.read().await;
        shard.entries.is_empty()
    }
}

impl<V> CacheShard<V> {
    /// Move a key to the back of the LRU queue (most recently used)
    fn touch(&mut self, key: &str) {
        self.lru_queue.retain(|k| k != key);
        self.lru_queue.push_back(key.to_string());
    }

    /// Remove an entry and its queue slot
    fn remove_entry(&mut self, key: &str) -> Option<CacheEntry<V>> {
        let removed = self.entries.remove(key);
        if removed.is_some() {
            self.lru_queue.retain(|k| k != key);
        }
        removed
    }

    /// Make room for one new entry: purge expired entries first; if none
    /// were expired, evict the least-recently-used live entry.
    fn make_room(&mut self, now: chrono::DateTime<chrono::Utc>) {
        let expired_keys: Vec<CacheKey> = self
            .entries
            .values()
            .filter(|entry| entry.is_expired(now))
            .map(|entry| entry.key.clone())
            .collect();

        if !expired_keys.is_empty() {
            for key in &expired_keys {
                self.remove_entry(key);
            }
            self.stats.evictions_ttl += expired_keys.len() as u64;
            debug!(count = expired_keys.len(), "purged expired entries to make room");
            return;
        }

        if let Some(victim) = self.lru_queue.pop_front() {
            debug!(key = %victim, "evicting least-recently-used entry");
            self.entries.remove(&victim);
            self.stats.evictions_lru += 1;
        }
    }
}

/// Background task for automatic expired-entry cleanup
pub async fn start_auto_cleanup<V: Clone + Send + Sync + 'static>(cache: Arc<MemoryCache<V>>) {
    let interval = cache.config.cleanup_interval;

    info!(?interval, "starting automatic cache cleanup task");

    loop {
        tokio::time::sleep(interval).await;

        let events = cache.cleanup_expired().await;
        if !events.is_empty() {
            let swept: usize = events.iter().map(|e| e.keys.len()).sum();
            if swept > 0 {
                warn!(swept, "auto cleanup removed expired entries");
            }
        }
    }
}
