//! Repository boundary for raw reference tables
//!
//! The cache core never reads files itself: on a dataframe-cache miss it
//! asks a [`Repository`] for the raw table. The load is the only suspension
//! point in the pipeline. Errors from the repository propagate unchanged
//! through the cache manager - the cache is an optimization layer and never
//! retries on its own.

use crate::cache::key::QueryParams;
use crate::error::{CoreError, Result};
use crate::table::frame::DataTable;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// The reference databases visualization data is joined against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseId {
    /// Core bioremediation annotation database
    BioRemPP,
    /// KEGG degradation pathway mapping
    Kegg,
    /// Hydrocarbon degradation gene database
    Hadeg,
    /// Toxicity prediction database (super-categories and endpoints)
    ToxCsm,
}

impl DatabaseId {
    /// Identifier used in cache keys and invalidation tags
    pub fn as_str(&self) -> &'static str {
        match self {
            DatabaseId::BioRemPP => "biorempp",
            DatabaseId::Kegg => "kegg",
            DatabaseId::Hadeg => "hadeg",
            DatabaseId::ToxCsm => "toxcsm",
        }
    }

    /// Parse an identifier
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "biorempp" => Some(DatabaseId::BioRemPP),
            "kegg" => Some(DatabaseId::Kegg),
            "hadeg" => Some(DatabaseId::Hadeg),
            "toxcsm" => Some(DatabaseId::ToxCsm),
            _ => None,
        }
    }

    /// Invalidation tag carried by every cache entry derived from this source
    pub fn tag(&self) -> String {
        format!("db:{}", self.as_str())
    }
}

impl fmt::Display for DatabaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Supplier of raw tables on cache miss
#[async_trait]
pub trait Repository: Send + Sync {
    /// Load the raw table for a database under the given query parameters
    ///
    /// Fails with [`CoreError::NotFound`] if the backing source is absent
    /// and [`CoreError::Parse`] if it is malformed.
    async fn load(&self, database: DatabaseId, params: &QueryParams) -> Result<DataTable>;
}

/// In-memory repository serving pre-registered tables
///
/// Used by tests and demos in place of the CSV-backed repository that the
/// ingestion layer owns.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    tables: HashMap<DatabaseId, DataTable>,
}

impl MemoryRepository {
    /// Create an empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the raw table served for a database
    pub fn with_table(mut self, database: DatabaseId, table: DataTable) -> Self {
        self.tables.insert(database, table);
        self
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn load(&self, database: DatabaseId, _params: &QueryParams) -> Result<DataTable> {
        self.tables
            .get(&database)
            .cloned()
            .ok_or_else(|| CoreError::NotFound {
                database: database.as_str().to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> DataTable {
        let mut table = DataTable::new(["sample", "ko"]);
        table.push_row(["S1", "K00001"]).unwrap();
        table
    }

    #[test]
    fn test_database_id_round_trip() {
        for db in [
            DatabaseId::BioRemPP,
            DatabaseId::Kegg,
            DatabaseId::Hadeg,
            DatabaseId::ToxCsm,
        ] {
            assert_eq!(DatabaseId::from_str(db.as_str()), Some(db));
        }
        assert_eq!(DatabaseId::from_str("unknown"), None);
    }

    #[test]
    fn test_database_tag() {
        assert_eq!(DatabaseId::ToxCsm.tag(), "db:toxcsm");
    }

    #[tokio::test]
    async fn test_memory_repository_load() {
        let repo = MemoryRepository::new().with_table(DatabaseId::BioRemPP, sample_table());

        let table = repo
            .load(DatabaseId::BioRemPP, &QueryParams::new())
            .await
            .unwrap();
        assert_eq!(table.n_rows(), 1);
    }

    #[tokio::test]
    async fn test_memory_repository_not_found() {
        let repo = MemoryRepository::new();

        let err = repo
            .load(DatabaseId::Kegg, &QueryParams::new())
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound { .. }));
    }
}
