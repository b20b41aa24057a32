//! Graph cache tier (L2)
//!
//! Stores finished chart definitions keyed by a deterministic hash of
//! `(use case, data hash, filters hash)`. Entries are tagged with their
//! use case and every source database so invalidation can cascade without
//! parsing keys. TTL/LRU behavior is delegated to the underlying
//! [`MemoryCache`]; this tier defaults to a shorter TTL than the dataframe
//! tier since chart state keyed by user filters churns faster.

use crate::cache::{
    clock::Clock,
    config::CacheConfig,
    key::GraphKey,
    store::MemoryCache,
    types::CacheStats,
};
use crate::chart::definition::ChartDefinition;
use crate::error::Result;
use crate::repository::DatabaseId;
use std::sync::Arc;

/// Cache for chart definitions
pub struct GraphCache {
    cache: MemoryCache<ChartDefinition>,
}

impl GraphCache {
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

    /// Look up the chart for `(use_case, data_hash, filters_hash)`
    pub async fn get_graph(
        &self,
        use_case: &str,
        data_hash: &str,
        filters_hash: &str,
    ) -> Option<ChartDefinition> {
        let key = GraphKey::derive(use_case, data_hash, filters_hash);
        self.cache.get(key.as_str()).await
    }

    /// Store the chart for `(use_case, data_hash, filters_hash)`
    pub async fn put_graph(
        &self,
        use_case: &str,
        data_hash: &str,
        filters_hash: &str,
        sources: &[DatabaseId],
        definition: ChartDefinition,
    ) {
        let key = GraphKey::derive(use_case, data_hash, filters_hash);
        let mut tags: Vec<String> = vec![format!("uc:{}", use_case)];
        tags.extend(sources.iter().map(|db| db.tag()));
        self.cache
            .insert_with_tags(key.as_str().to_string(), definition, tags)
            .await;
    }

    /// Remove every chart belonging to a use case
    pub async fn invalidate_use_case(&self, use_case: &str) -> usize {
        self.cache.invalidate_by_tag(&format!("uc:{}", use_case)).await
    }

    /// Remove every chart whose data depended on a database
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::strategy::ChartKind;
    use std::time::Duration;

    fn tier() -> GraphCache {
        let config = CacheConfig::builder()
            .capacity(10)
            .default_ttl(Duration::from_secs(1800))
            .build();
        GraphCache::new(config).unwrap()
    }

    fn chart(use_case: &str) -> ChartDefinition {
        ChartDefinition::empty(use_case, ChartKind::Bar, "Gene counts per sample")
    }

    #[tokio::test]
    async fn test_round_trip() {
        let cache = tier();

        assert!(cache.get_graph("UC-1.1", "d1", "f1").await.is_none());

        cache
            .put_graph("UC-1.1", "d1", "f1", &[DatabaseId::BioRemPP], chart("UC-1.1"))
            .await;

        let cached = cache.get_graph("UC-1.1", "d1", "f1").await;
        assert_eq!(cached, Some(chart("UC-1.1")));

        // A different filter hash is a different entry.
        assert!(cache.get_graph("UC-1.1", "d1", "f2").await.is_none());
    }

    #[tokio::test]
    async fn test_use_case_invalidation() {
        let cache = tier();

        cache
            .put_graph("UC-1.1", "d1", "f1", &[DatabaseId::BioRemPP], chart("UC-1.1"))
            .await;
        cache
            .put_graph("UC-1.1", "d1", "f2", &[DatabaseId::BioRemPP], chart("UC-1.1"))
            .await;
        cache
            .put_graph("UC-2.1", "d2", "f1", &[DatabaseId::Kegg], chart("UC-2.1"))
            .await;

        let removed = cache.invalidate_use_case("UC-1.1").await;
        assert_eq!(removed, 2);
        assert!(cache.get_graph("UC-2.1", "d2", "f1").await.is_some());
    }

    #[tokio::test]
    async fn test_database_invalidation_cascades_to_dependents_only() {
        let cache = tier();

        cache
            .put_graph(
                "UC-6.1",
                "d1",
                "f1",
                &[DatabaseId::BioRemPP, DatabaseId::ToxCsm],
                chart("UC-6.1"),
            )
            .await;
        cache
            .put_graph("UC-2.1", "d2", "f1", &[DatabaseId::Kegg], chart("UC-2.1"))
            .await;

        let removed = cache.invalidate_database(DatabaseId::ToxCsm).await;
        assert_eq!(removed, 1);
        assert!(cache.get_graph("UC-6.1", "d1", "f1").await.is_none());
        assert!(cache.get_graph("UC-2.1", "d2", "f1").await.is_some());
    }
}
