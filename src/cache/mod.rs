//! # Two-Tier Analysis Cache
//!
//! This module implements the caching layer between visualization requests
//! and the reference-table repository.
//!
//! ## Features
//!
//! - **TTL-Based Expiration**: entries expire lazily against an injectable
//!   clock; expired entries are treated as absent
//! - **LRU Eviction**: bounded entry counts with deterministic
//!   least-recently-used eviction (FIFO among never-accessed ties)
//! - **Tag-Based Invalidation**: entries carry `db:`/`uc:` tags so a
//!   database update cascades to every dependent chart in one sweep
//! - **Deterministic Keys**: normalized parameters hash to the same key
//!   regardless of input order
//! - **Single-Flight Builds**: concurrent misses for the same chart are
//!   coalesced so the load/aggregate path runs at most once per live entry
//!
//! ## Architecture
//!
//! Two tiers sit over the repository:
//! - L1 [`DataFrameCache`]: aggregated tabular results keyed by
//!   `(database, normalized params)`
//! - L2 [`GraphCache`]: finished chart definitions keyed by
//!   `(use case, data hash, filters hash)`
//!
//! [`GraphCacheManager`] owns both tiers and the lookup/store protocol.
//!
//! ## Example
//!
//! ```rust
//! use biorempp_core::cache::{CacheConfig, MemoryCache};
//! use std::time::Duration;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = CacheConfig::builder()
//!     .capacity(100)
//!     .default_ttl(Duration::from_secs(3600))
//!     .build();
//!
//! let cache: MemoryCache<String> = MemoryCache::new(config)?;
//!
//! cache.insert("df:biorempp:1".to_string(), "cached".to_string()).await;
//!
//! if let Some(value) = cache.get("df:biorempp:1").await {
//!     println!("cache hit: {}", value);
//! }
//! # Ok(())
//! # }
//! ```

pub mod clock;
pub mod config;
pub mod dataframe;
pub mod entry;
pub mod graph;
pub mod invalidation;
pub mod key;
pub mod manager;
pub mod store;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{CacheConfig, CacheConfigBuilder, CoreConfig};
pub use dataframe::DataFrameCache;
pub use entry::{CacheEntry, EntryMetadata};
pub use graph::GraphCache;
pub use invalidation::{InvalidationEvent, InvalidationReason};
pub use key::{data_hash, filters_hash, DataFrameKey, Filters, GraphKey, ParamValue, QueryParams};
pub use manager::{GraphCacheManager, ManagerStats};
pub use store::{start_auto_cleanup, MemoryCache};
pub use types::{CacheKey, CacheStats};
