//! Tabular data model and the merge/aggregation engine

pub mod aggregate;
pub mod frame;

pub use aggregate::{AggregatedResult, AggregationEngine, AggregationSpec};
pub use frame::{ColumnAliases, DataTable, Value};
