//! Error types for the analysis core
//!
//! This module defines custom error types for the biorempp-core library,
//! covering configuration validation, aggregation failures, and the
//! repository boundary.

use thiserror::Error;

/// Main error type for analysis-core operations
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration error - invalid capacity or TTL at construction
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Required columns are absent from a raw table
    #[error("Missing required column(s): {}", columns.join(", "))]
    MissingColumns { columns: Vec<String> },

    /// Malformed data encountered during aggregation
    #[error("Data error: {0}")]
    Data(String),

    /// Backing data source is absent
    #[error("Database not found: {database}")]
    NotFound { database: String },

    /// Backing data source could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// Use case id is not registered
    #[error("Unknown use case: {0}")]
    UnknownUseCase(String),

    /// Serialization/Deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for analysis-core operations
pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    /// Build a `MissingColumns` error from any iterator of column names
    pub fn missing_columns<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CoreError::MissingColumns {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<String> for CoreError {
    fn from(s: String) -> Self {
        CoreError::Data(s)
    }
}

impl From<&str> for CoreError {
    fn from(s: &str) -> Self {
        CoreError::Data(s.to_string())
    }
}
