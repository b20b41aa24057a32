//! Two-tier cache orchestration
//!
//! [`GraphCacheManager`] is the single entry point for "get me the chart
//! for this use case under these filters". It derives the composite keys,
//! consults the graph tier, falls back through the dataframe tier to the
//! repository, and caches on the way out. The two tiers hold independent
//! locks; the repository load is the only suspension point; and concurrent
//! misses for the same graph key are coalesced through a per-key build
//! guard so the load/aggregate path runs at most once per live entry.

use crate::cache::{
    clock::{Clock, SystemClock},
    config::CoreConfig,
    dataframe::DataFrameCache,
    graph::GraphCache,
    key::{self, DataFrameKey, Filters, GraphKey, QueryParams},
    types::CacheStats,
};
use crate::chart::definition::ChartDefinition;
use crate::chart::registry::{UseCaseRegistry, UseCaseSpec};
use crate::chart::strategy;
use crate::error::Result;
use crate::repository::{DatabaseId, Repository};
use crate::table::aggregate::{AggregatedResult, AggregationEngine};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Combined statistics for both tiers
#[derive(Debug, Clone, Serialize)]
pub struct ManagerStats {
    /// Dataframe tier (L1)
    pub dataframe: CacheStats,
    /// Graph tier (L2)
    pub graph: CacheStats,
}

/// Orchestrates the dataframe and graph cache tiers
pub struct GraphCacheManager {
    registry: UseCaseRegistry,
    engine: AggregationEngine,
    repository: Arc<dyn Repository>,
    dataframes: DataFrameCache,
    graphs: GraphCache,

    /// Per-graph-key build guards for single-flight miss coalescing
    builds: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl GraphCacheManager {
    /// Create the manager from an explicit configuration
    ///
    /// Fails fast on invalid capacities or TTLs.
    pub fn new(
        config: &CoreConfig,
        registry: UseCaseRegistry,
        repository: Arc<dyn Repository>,
    ) -> Result<Self> {
        Self::with_clock(config, registry, repository, Arc::new(SystemClock))
    }

    /// Create the manager with an explicit time source for both tiers
    pub fn with_clock(
        config: &CoreConfig,
        registry: UseCaseRegistry,
        repository: Arc<dyn Repository>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let dataframes = DataFrameCache::with_clock(config.dataframe_config(), clock.clone())?;
        let graphs = GraphCache::with_clock(config.graph_config(), clock)?;

        info!(
            use_cases = registry.len(),
            dataframe_capacity = config.dataframe_capacity,
            graph_capacity = config.graph_capacity,
            "initializing graph cache manager"
        );

        Ok(Self {
            registry,
            engine: AggregationEngine::new(),
            repository,
            dataframes,
            graphs,
            builds: Mutex::new(HashMap::new()),
        })
    }

    /// Get the chart for a use case under the given filters, building and
    /// caching it if necessary
    ///
    /// Repository and aggregation errors propagate unchanged; the manager
    /// never retries.
    pub async fn get_or_build(
        &self,
        use_case_id: &str,
        filters: &Filters,
    ) -> Result<ChartDefinition> {
        let spec = self.registry.get(use_case_id)?.clone();

        let params = spec.dataframe_params().merged_with(filters);
        let df_keys: Vec<DataFrameKey> = spec
            .databases
            .iter()
            .map(|&db| DataFrameKey::derive(db, &params))
            .collect();
        let data_hash = key::data_hash(&df_keys);
        let filters_hash = key::filters_hash(filters);

        // Fast path: a live chart never recomputes.
        if let Some(chart) = self
            .graphs
            .get_graph(&spec.id, &data_hash, &filters_hash)
            .await
        {
            debug!(use_case = %spec.id, "graph cache hit");
            return Ok(chart);
        }

        let graph_key = GraphKey::derive(&spec.id, &data_hash, &filters_hash);
        let build_lock = {
            let mut builds = self.builds.lock().await;
            builds
                .entry(graph_key.as_str().to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };

        let _guard = build_lock.lock().await;
        let result = self
            .build_locked(&spec, filters, &params, &df_keys, &data_hash, &filters_hash)
            .await;

        self.builds.lock().await.remove(graph_key.as_str());
        result
    }

    /// Build path executed under the per-key guard
    async fn build_locked(
        &self,
        spec: &UseCaseSpec,
        filters: &Filters,
        params: &QueryParams,
        df_keys: &[DataFrameKey],
        data_hash: &str,
        filters_hash: &str,
    ) -> Result<ChartDefinition> {
        // A waiter that lost the race finds the winner's chart here.
        if let Some(chart) = self.graphs.get_graph(&spec.id, data_hash, filters_hash).await {
            debug!(use_case = %spec.id, "graph cache hit after build wait");
            return Ok(chart);
        }

        let aggregated = self.dataframe_for(spec, filters, params, &df_keys[0]).await?;

        let chart = strategy::build_chart(spec.chart, &spec.id, &spec.title, &aggregated, filters)?;

        self.graphs
            .put_graph(
                &spec.id,
                data_hash,
                filters_hash,
                &spec.databases,
                chart.clone(),
            )
            .await;

        debug!(use_case = %spec.id, "built and cached chart");
        Ok(chart)
    }

    /// Fetch or compute the aggregated dataframe for a use case
    async fn dataframe_for(
        &self,
        spec: &UseCaseSpec,
        filters: &Filters,
        params: &QueryParams,
        storage_key: &DataFrameKey,
    ) -> Result<AggregatedResult> {
        if let Some(cached) = self.dataframes.get(storage_key).await {
            debug!(use_case = %spec.id, "dataframe cache hit");
            return Ok(cached);
        }

        debug!(use_case = %spec.id, "dataframe cache miss, loading from repository");

        // The only suspension point in the pipeline.
        let mut table = self.repository.load(spec.databases[0], params).await?;

        for &db in &spec.databases[1..] {
            let right = self.repository.load(db, params).await?;
            let on = spec.join_on.as_deref().unwrap_or("ko");
            table = self.engine.inner_join(&table, &right, on)?;
        }

        let filtered = self.engine.apply_filters(&table, filters);
        let aggregated = self.engine.aggregate(&spec.aggregation, &filtered)?;

        self.dataframes
            .put_dataframe(
                spec.databases[0],
                params,
                &spec.databases,
                aggregated.clone(),
            )
            .await;

        Ok(aggregated)
    }

    /// Remove every cached chart belonging to a use case
    pub async fn invalidate_use_case(&self, use_case_id: &str) -> usize {
        let removed = self.graphs.invalidate_use_case(use_case_id).await;
        info!(use_case = use_case_id, removed, "invalidated use case");
        removed
    }

    /// Purge a source database: its dataframes fall, and every chart whose
    /// data depended on it cascades out. Returns `(dataframes, graphs)`
    /// removal counts.
    pub async fn invalidate_database(&self, database: DatabaseId) -> (usize, usize) {
        let dataframes = self.dataframes.invalidate_database(database).await;
        let graphs = self.graphs.invalidate_database(database).await;
        info!(
            database = %database,
            dataframes,
            graphs,
            "invalidated database with cascade"
        );
        (dataframes, graphs)
    }

    /// Combined statistics for both tiers
    pub async fn stats(&self) -> ManagerStats {
        ManagerStats {
            dataframe: self.dataframes.stats().await,
            graph: self.graphs.stats().await,
        }
    }

    /// Drop every entry in both tiers (tests and shutdown)
    pub async fn clear_all(&self) {
        self.dataframes.clear().await;
        self.graphs.clear().await;
    }

    /// The registry this manager serves
    pub fn registry(&self) -> &UseCaseRegistry {
        &self.registry
    }
}
