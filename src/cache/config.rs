//! Configuration for the cache tiers
//!
//! Capacities and TTLs are product-tuning knobs, not architectural
//! constants: every construction path takes them explicitly, and the
//! documented defaults live only in the `Default` impls here.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for a single cache tier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Maximum number of live entries; exceeding it triggers LRU eviction
    pub capacity: usize,

    /// Default time-to-live for entries inserted without an explicit TTL
    pub default_ttl: Duration,

    /// TTL jitter factor (0.0 - 1.0) spreading expiry to avoid stampedes
    pub ttl_jitter: f64,

    /// Interval for the background expired-entry sweep
    pub cleanup_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: 100,
            default_ttl: Duration::from_secs(3600),
            ttl_jitter: 0.0,
            cleanup_interval: Duration::from_secs(300),
        }
    }
}

impl CacheConfig {
    /// Create a new builder for cache configuration
    pub fn builder() -> CacheConfigBuilder {
        CacheConfigBuilder::default()
    }

    /// Validate the configuration, failing fast on unusable values
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(CoreError::Configuration(
                "capacity must be greater than 0".to_string(),
            ));
        }

        if self.default_ttl.is_zero() {
            return Err(CoreError::Configuration(
                "default_ttl must be greater than 0".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.ttl_jitter) {
            return Err(CoreError::Configuration(
                "ttl_jitter must be between 0.0 and 1.0".to_string(),
            ));
        }

        Ok(())
    }

    /// Calculate an effective TTL with jitter applied
    pub fn ttl_with_jitter(&self) -> Duration {
        if self.ttl_jitter == 0.0 {
            return self.default_ttl;
        }

        let base_secs = self.default_ttl.as_secs_f64();
        let jitter_range = base_secs * self.ttl_jitter;
        let jitter = (rand::random::<f64>() * 2.0 - 1.0) * jitter_range;
        let final_secs = (base_secs + jitter).max(1.0);

        Duration::from_secs_f64(final_secs)
    }
}

/// Builder for cache configuration
#[derive(Debug, Default)]
pub struct CacheConfigBuilder {
    capacity: Option<usize>,
    default_ttl: Option<Duration>,
    ttl_jitter: Option<f64>,
    cleanup_interval: Option<Duration>,
}

impl CacheConfigBuilder {
    /// Set the maximum number of live entries
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Set the default TTL for cache entries
    pub fn default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = Some(ttl);
        self
    }

    /// Set the TTL jitter factor (0.0 - 1.0)
    pub fn ttl_jitter(mut self, jitter: f64) -> Self {
        self.ttl_jitter = Some(jitter);
        self
    }

    /// Set the background cleanup interval
    pub fn cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = Some(interval);
        self
    }

    /// Build the cache configuration
    pub fn build(self) -> CacheConfig {
        let defaults = CacheConfig::default();

        CacheConfig {
            capacity: self.capacity.unwrap_or(defaults.capacity),
            default_ttl: self.default_ttl.unwrap_or(defaults.default_ttl),
            ttl_jitter: self.ttl_jitter.unwrap_or(defaults.ttl_jitter),
            cleanup_interval: self.cleanup_interval.unwrap_or(defaults.cleanup_interval),
        }
    }
}

/// Process-wide configuration for both cache tiers
///
/// Constructed once at startup and passed explicitly to
/// [`GraphCacheManager`](crate::cache::GraphCacheManager) - there is no
/// global state. The dataframe tier defaults to a longer TTL than the graph
/// tier: raw joined data churns less often than chart state keyed by user
/// filters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Maximum number of cached aggregated dataframes
    pub dataframe_capacity: usize,

    /// TTL for cached aggregated dataframes, in seconds
    pub dataframe_ttl_seconds: u64,

    /// Maximum number of cached chart definitions
    pub graph_capacity: usize,

    /// TTL for cached chart definitions, in seconds
    pub graph_ttl_seconds: u64,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            dataframe_capacity: 100,
            dataframe_ttl_seconds: 3600,
            graph_capacity: 50,
            graph_ttl_seconds: 1800,
        }
    }
}

impl CoreConfig {
    /// Tier configuration for the dataframe cache
    pub fn dataframe_config(&self) -> CacheConfig {
        CacheConfig::builder()
            .capacity(self.dataframe_capacity)
            .default_ttl(Duration::from_secs(self.dataframe_ttl_seconds))
            .build()
    }

    /// Tier configuration for the graph cache
    pub fn graph_config(&self) -> CacheConfig {
        CacheConfig::builder()
            .capacity(self.graph_capacity)
            .default_ttl(Duration::from_secs(self.graph_ttl_seconds))
            .build()
    }

    /// Validate both tier configurations
    pub fn validate(&self) -> Result<()> {
        self.dataframe_config().validate()?;
        self.graph_config().validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CacheConfig::default();
        assert_eq!(config.capacity, 100);
        assert_eq!(config.default_ttl, Duration::from_secs(3600));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_rejects_zero_capacity() {
        let config = CacheConfig {
            capacity: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(CoreError::Configuration(_))
        ));
    }

    #[test]
    fn test_config_validation_rejects_zero_ttl() {
        let config = CacheConfig {
            default_ttl: Duration::from_secs(0),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_rejects_bad_jitter() {
        let config = CacheConfig {
            ttl_jitter: 1.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_builder() {
        let config = CacheConfig::builder()
            .capacity(500)
            .default_ttl(Duration::from_secs(600))
            .ttl_jitter(0.1)
            .build();

        assert_eq!(config.capacity, 500);
        assert_eq!(config.default_ttl, Duration::from_secs(600));
        assert_eq!(config.ttl_jitter, 0.1);
    }

    #[test]
    fn test_ttl_with_jitter_bounds() {
        let config = CacheConfig {
            default_ttl: Duration::from_secs(3600),
            ttl_jitter: 0.1,
            ..Default::default()
        };

        let ttl = config.ttl_with_jitter();
        assert!(ttl.as_secs_f64() >= 3600.0 * 0.9);
        assert!(ttl.as_secs_f64() <= 3600.0 * 1.1);
    }

    #[test]
    fn test_ttl_without_jitter_is_exact() {
        let config = CacheConfig {
            default_ttl: Duration::from_secs(1800),
            ttl_jitter: 0.0,
            ..Default::default()
        };
        assert_eq!(config.ttl_with_jitter(), Duration::from_secs(1800));
    }

    #[test]
    fn test_core_config_tiers() {
        let core = CoreConfig::default();
        assert!(core.validate().is_ok());

        let df = core.dataframe_config();
        let graph = core.graph_config();
        assert_eq!(df.capacity, 100);
        assert_eq!(df.default_ttl, Duration::from_secs(3600));
        assert_eq!(graph.capacity, 50);
        assert_eq!(graph.default_ttl, Duration::from_secs(1800));
        assert!(df.default_ttl > graph.default_ttl);
    }

    #[test]
    fn test_core_config_validation_cascades() {
        let core = CoreConfig {
            graph_capacity: 0,
            ..Default::default()
        };
        assert!(core.validate().is_err());
    }
}
