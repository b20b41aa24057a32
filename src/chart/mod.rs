//! Chart definitions, strategies, and the use-case registry

pub mod definition;
pub mod registry;
pub mod strategy;

pub use definition::{ChartData, ChartDefinition, HierarchyNode, Link, Trace};
pub use registry::{UseCaseRegistry, UseCaseSpec};
pub use strategy::{build_chart, ChartKind};
