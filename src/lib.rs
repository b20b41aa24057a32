//! # BioRemPP Core (biorempp-core)
//!
//! The analysis core behind the BioRemPP visualization panels: a two-tier
//! cache (TTL + LRU) feeding a deterministic merge-and-aggregate pipeline
//! for chart generation.
//!
//! ## Features
//!
//! - Two cache tiers with independent locks: aggregated dataframes (L1)
//!   and finished chart definitions (L2)
//! - Deterministic, permutation-invariant cache keys
//! - Single-flight miss coalescing: the load/aggregate path runs at most
//!   once per live chart entry
//! - Cascading invalidation: a database upload purges its dataframes and
//!   every dependent chart
//! - A pure aggregation engine (distinct counts, multi-level group-bys,
//!   wide-to-long reshapes, intersection sizes, key joins)
//! - Async-first design using tokio
//!
//! ## Getting a chart
//!
//! ```no_run
//! use biorempp_core::cache::{CoreConfig, Filters, GraphCacheManager};
//! use biorempp_core::chart::UseCaseRegistry;
//! use biorempp_core::repository::{DatabaseId, MemoryRepository};
//! use biorempp_core::table::DataTable;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut annotations = DataTable::new(["sample", "ko"]);
//!     annotations.push_row(["S1", "K00001"])?;
//!     annotations.push_row(["S2", "K00003"])?;
//!
//!     let repository = Arc::new(
//!         MemoryRepository::new().with_table(DatabaseId::BioRemPP, annotations),
//!     );
//!
//!     let manager = GraphCacheManager::new(
//!         &CoreConfig::default(),
//!         UseCaseRegistry::builtin(),
//!         repository,
//!     )?;
//!
//!     let chart = manager.get_or_build("UC-1.1", &Filters::new()).await?;
//!     println!("built {} (empty: {})", chart.use_case, chart.empty);
//!     Ok(())
//! }
//! ```
//!
//! ## Invalidation after an upload
//!
//! ```no_run
//! # use biorempp_core::cache::{CoreConfig, GraphCacheManager};
//! # use biorempp_core::chart::UseCaseRegistry;
//! # use biorempp_core::repository::{DatabaseId, MemoryRepository};
//! # use std::sync::Arc;
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! # let manager = GraphCacheManager::new(
//! #     &CoreConfig::default(),
//! #     UseCaseRegistry::builtin(),
//! #     Arc::new(MemoryRepository::new()),
//! # )?;
//! let (dataframes, graphs) = manager.invalidate_database(DatabaseId::BioRemPP).await;
//! println!("purged {} dataframes and {} dependent charts", dataframes, graphs);
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod chart;
pub mod error;
pub mod repository;
pub mod table;

// Re-export main types for convenience
pub use cache::{
    CacheConfig, CacheConfigBuilder, CacheEntry, CacheKey, CacheStats, Clock, CoreConfig,
    DataFrameCache, DataFrameKey, Filters, GraphCache, GraphCacheManager, GraphKey,
    InvalidationEvent, InvalidationReason, ManagerStats, ManualClock, MemoryCache, ParamValue,
    QueryParams, SystemClock,
};
pub use chart::{ChartData, ChartDefinition, ChartKind, UseCaseRegistry, UseCaseSpec};
pub use error::{CoreError, Result};
pub use repository::{DatabaseId, MemoryRepository, Repository};
pub use table::{AggregatedResult, AggregationEngine, AggregationSpec, ColumnAliases, DataTable, Value};
