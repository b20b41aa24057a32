//! Dataframe cache tier (L1)
//!
//! Stores aggregated tabular results keyed by a deterministic hash of
//! `(database, normalized query parameters)`. All TTL/LRU behavior is
//! delegated to the underlying [`MemoryCache`]; this wrapper only owns key
//! construction, source tags, and the tier's default TTL.

use crate::cache::{
    clock::Clock,
    config::CacheConfig,
    key::{DataFrameKey, QueryParams},
    store::MemoryCache,
    types::CacheStats,
};
use crate::error::Result;
use crate::repository::DatabaseId;
use crate::table::aggregate::AggregatedResult;
use std::sync::Arc;

/// Cache for aggregated dataframes
pub struct DataFrameCache {
    cache: MemoryCache<AggregatedResult>,
}

impl DataFrameCache {
    /// Create the tier with its own configuration
    pub fn new(config: CacheConfig) -> Result<Self> {
        Ok(Self {
            cache: MemoryCache::new(config)?,
        })
    }

    /// Create the tier with an explicit time source (tests)
    pub fn with_clock(config: CacheConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        Ok(Self {
            cache: MemoryCache::with_clock(config, clock)?,
        })
    }

    /// Look up the dataframe for `(database, params)`
    pub async fn get_dataframe(
        &self,
        database: DatabaseId,
        params: &QueryParams,
    ) -> Option<AggregatedResult> {
        let key = DataFrameKey::derive(database, params);
        self.cache.get(key.as_str()).await
    }

    /// Store the dataframe for `(database, params)`
    ///
    /// The entry is tagged with every source database in `sources` so that
    /// a database invalidation can find it; for single-source dataframes
    /// that is just `database` itself.
    pub async fn put_dataframe(
        &self,
        database: DatabaseId,
        params: &QueryParams,
        sources: &[DatabaseId],
        result: AggregatedResult,
    ) {
        let key = DataFrameKey::derive(database, params);
        let tags = sources.iter().map(|db| db.tag()).collect();
        self.cache
            .insert_with_tags(key.as_str().to_string(), result, tags)
            .await;
    }

    /// Look up by an already-derived key
    pub async fn get(&self, key: &DataFrameKey) -> Option<AggregatedResult> {
        self.cache.get(key.as_str()).await
    }

    /// Remove every dataframe derived from a database
    pub async fn invalidate_database(&self, database: DatabaseId) -> usize {
        self.cache.invalidate_by_tag(&database.tag()).await
    }

    /// Tier statistics
    pub async fn stats(&self) -> CacheStats {
        self.cache.stats().await
    }

    /// Number of live entries
    pub async fn len(&self) -> usize {
        self.cache.len().await
    }

    /// Whether the tier is empty
    pub async fn is_empty(&self) -> bool {
        self.cache.is_empty().await
    }

    /// Drop all entries (tests and shutdown)
    pub async fn clear(&self) {
        self.cache.clear().await
    }
}
