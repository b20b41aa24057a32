//! Cache invalidation records
//!
//! TTL expiry and tag sweeps are the two invalidation sources in this core.
//! Every removal that was not a plain `remove` call is reported as an
//! [`InvalidationEvent`] so callers can observe what the cascade touched.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reason a cache entry was invalidated
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InvalidationReason {
    /// Entry expired based on TTL
    Expired,

    /// Manual invalidation by key
    Manual,

    /// Invalidated because a source database changed (e.g. new upload)
    SourceUpdated { database: String },

    /// Evicted by the LRU policy to make room
    LeastRecentlyUsed,

    /// Invalidated by tag match
    TagMatch { tag: String },
}

impl std::fmt::Display for InvalidationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvalidationReason::Expired => write!(f, "TTL expired"),
            InvalidationReason::Manual => write!(f, "manual invalidation"),
            InvalidationReason::SourceUpdated { database } => {
                write!(f, "source database updated: {}", database)
            }
            InvalidationReason::LeastRecentlyUsed => write!(f, "LRU eviction"),
            InvalidationReason::TagMatch { tag } => write!(f, "tag match: {}", tag),
        }
    }
}

/// Record of an invalidation sweep
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvalidationEvent {
    /// Reason for invalidation
    pub reason: InvalidationReason,

    /// When the invalidation occurred
    pub timestamp: DateTime<Utc>,

    /// Keys that were invalidated
    pub keys: Vec<String>,
}

impl InvalidationEvent {
    /// Create a new invalidation event
    pub fn new(reason: InvalidationReason, keys: Vec<String>) -> Self {
        Self {
            reason,
            timestamp: Utc::now(),
            keys,
        }
    }
}
