//! Cache entry management with TTL support

use crate::cache::types::CacheKey;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A cache entry with TTL and metadata
///
/// An entry is visible to lookups iff `now < expires_at`; expired entries
/// are treated as absent regardless of physical presence in storage. Cached
/// values are never mutated in place - `get` hands out clones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry<V> {
    /// The cache key
    pub key: CacheKey,

    /// The cached value
    pub value: V,

    /// Entry metadata
    pub metadata: EntryMetadata,
}

impl<V> CacheEntry<V> {
    /// Create a new cache entry expiring `ttl` after `now`
    pub fn new(key: CacheKey, value: V, ttl: Duration, now: DateTime<Utc>) -> Self {
        let expires_at =
            now + chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::seconds(3600));

        Self {
            key,
            value,
            metadata: EntryMetadata {
                created_at: now,
                accessed_at: now,
                expires_at,
                access_count: 0,
                version: 1,
                tags: Vec::new(),
            },
        }
    }

    /// Check if the entry has expired as of `now`
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.metadata.expires_at
    }

    /// Get time until expiration, or `None` when already expired
    pub fn time_until_expiration(&self, now: DateTime<Utc>) -> Option<Duration> {
        if now > self.metadata.expires_at {
            None
        } else {
            (self.metadata.expires_at - now).to_std().ok()
        }
    }

    /// Mark the entry as accessed (updates access time and count)
    pub fn mark_accessed(&mut self, now: DateTime<Utc>) {
        self.metadata.accessed_at = now;
        self.metadata.access_count += 1;
    }

    /// Replace the value and restart the TTL horizon
    pub fn update_value(&mut self, new_value: V, ttl: Duration, now: DateTime<Utc>) {
        self.value = new_value;
        self.metadata.created_at = now;
        self.metadata.accessed_at = now;
        self.metadata.expires_at =
            now + chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::seconds(3600));
        self.metadata.version += 1;
    }

    /// Add a tag to the entry for selective invalidation
    pub fn add_tag(&mut self, tag: String) {
        if !self.metadata.tags.contains(&tag) {
            self.metadata.tags.push(tag);
        }
    }

    /// Check if entry has a specific tag
    pub fn has_tag(&self, tag: &str) -> bool {
        self.metadata.tags.iter().any(|t| t == tag)
    }
}

/// Metadata associated with a cache entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryMetadata {
    /// When the entry was created (reset on overwrite)
    pub created_at: DateTime<Utc>,

    /// Last access time (for LRU tracking)
    pub accessed_at: DateTime<Utc>,

    /// When the entry expires
    pub expires_at: DateTime<Utc>,

    /// Number of times this entry has been accessed
    pub access_count: u64,

    /// Version number (incremented on overwrites)
    pub version: u64,

    /// Tags for selective invalidation (`db:...`, `uc:...`)
    pub tags: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    fn t0() -> DateTime<Utc> {
        Utc::now()
    }

    #[test]
    fn test_cache_entry_creation() {
        let now = t0();
        let entry = CacheEntry::new(
            "df:biorempp:abc".to_string(),
            "payload".to_string(),
            Duration::from_secs(3600),
            now,
        );

        assert_eq!(entry.key, "df:biorempp:abc");
        assert_eq!(entry.value, "payload");
        assert!(!entry.is_expired(now));
        assert_eq!(entry.metadata.version, 1);
    }

    #[test]
    fn test_entry_expiration_horizon() {
        let now = t0();
        let entry = CacheEntry::new(
            "k".to_string(),
            "v".to_string(),
            Duration::from_secs(1),
            now,
        );

        assert!(!entry.is_expired(now));
        assert!(!entry.is_expired(now + ChronoDuration::milliseconds(900)));
        assert!(entry.is_expired(now + ChronoDuration::milliseconds(1100)));
    }

    #[test]
    fn test_mark_accessed() {
        let now = t0();
        let mut entry = CacheEntry::new(
            "k".to_string(),
            "v".to_string(),
            Duration::from_secs(3600),
            now,
        );

        let later = now + ChronoDuration::seconds(5);
        entry.mark_accessed(later);

        assert_eq!(entry.metadata.access_count, 1);
        assert_eq!(entry.metadata.accessed_at, later);
        assert_eq!(entry.metadata.created_at, now);
    }

    #[test]
    fn test_update_value_resets_horizon() {
        let now = t0();
        let mut entry = CacheEntry::new(
            "k".to_string(),
            "old".to_string(),
            Duration::from_secs(10),
            now,
        );

        let later = now + ChronoDuration::seconds(8);
        entry.update_value("new".to_string(), Duration::from_secs(10), later);

        assert_eq!(entry.value, "new");
        assert_eq!(entry.metadata.version, 2);
        assert_eq!(entry.metadata.created_at, later);
        assert!(!entry.is_expired(now + ChronoDuration::seconds(15)));
    }

    #[test]
    fn test_tags() {
        let mut entry = CacheEntry::new(
            "k".to_string(),
            "v".to_string(),
            Duration::from_secs(3600),
            t0(),
        );

        entry.add_tag("db:biorempp".to_string());
        entry.add_tag("uc:UC-1.1".to_string());
        entry.add_tag("db:biorempp".to_string());

        assert!(entry.has_tag("db:biorempp"));
        assert!(entry.has_tag("uc:UC-1.1"));
        assert!(!entry.has_tag("db:toxcsm"));
        assert_eq!(entry.metadata.tags.len(), 2);
    }

    #[test]
    fn test_time_until_expiration() {
        let now = t0();
        let entry = CacheEntry::new(
            "k".to_string(),
            "v".to_string(),
            Duration::from_secs(3600),
            now,
        );

        let left = entry.time_until_expiration(now).unwrap();
        assert!(left <= Duration::from_secs(3600));

        assert!(entry
            .time_until_expiration(now + ChronoDuration::seconds(7200))
            .is_none());
    }
}
