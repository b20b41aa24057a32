//! Serializable chart definitions
//!
//! The cache stores finished chart definitions, not live figure objects:
//! a definition is the chart-kind-shaped payload a rendering frontend turns
//! into a figure. Definitions are immutable once built and safe to hand out
//! as snapshots.

use crate::chart::strategy::ChartKind;
use crate::error::{CoreError, Result};
use crate::table::frame::Value;
use serde::{Deserialize, Serialize};

/// A fully specified chart, ready for a rendering frontend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartDefinition {
    /// Use case this chart belongs to (e.g. `UC-1.1`)
    pub use_case: String,

    /// Chart kind that was rendered
    pub kind: ChartKind,

    /// Human-readable title
    pub title: String,

    /// Explicit "no data" state: the frontend renders an empty-state panel
    /// instead of a figure when set
    pub empty: bool,

    /// Kind-shaped payload
    pub data: ChartData,
}

/// Payload variants per chart family
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum ChartData {
    /// Bar/scatter families: one or more traces
    Series { traces: Vec<Trace> },

    /// Heatmap: axis labels plus a dense value matrix (row-major over y)
    Matrix {
        x_labels: Vec<Value>,
        y_labels: Vec<Value>,
        z: Vec<Vec<Value>>,
    },

    /// Treemap/sunburst: parent-linked nodes
    Hierarchy { nodes: Vec<HierarchyNode> },

    /// Sankey/chord: weighted links
    Links { links: Vec<Link> },
}

/// A single plotted series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    /// Series name (legend entry)
    pub name: String,
    /// X values
    pub x: Vec<Value>,
    /// Y values
    pub y: Vec<Value>,
}

/// One node of a hierarchical chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HierarchyNode {
    /// Node label
    pub label: String,
    /// Parent label; empty string for roots
    pub parent: String,
    /// Node weight
    pub value: i64,
}

/// One weighted link of a flow chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    /// Source node label
    pub source: String,
    /// Target node label
    pub target: String,
    /// Link weight
    pub value: i64,
}

impl ChartDefinition {
    /// An explicit empty-state chart for a use case
    pub fn empty(use_case: &str, kind: ChartKind, title: &str) -> Self {
        let data = match kind {
            ChartKind::Bar | ChartKind::GroupedBar | ChartKind::Scatter => ChartData::Series {
                traces: Vec::new(),
            },
            ChartKind::Heatmap => ChartData::Matrix {
                x_labels: Vec::new(),
                y_labels: Vec::new(),
                z: Vec::new(),
            },
            ChartKind::Treemap => ChartData::Hierarchy { nodes: Vec::new() },
            ChartKind::Sankey => ChartData::Links { links: Vec::new() },
        };

        Self {
            use_case: use_case.to_string(),
            kind,
            title: title.to_string(),
            empty: true,
            data,
        }
    }

    /// Serialize for transport to a rendering frontend
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| CoreError::Serialization(e.to_string()))
    }

    /// Deserialize a definition produced by [`ChartDefinition::to_json`]
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| CoreError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_chart_state() {
        let chart = ChartDefinition::empty("UC-1.1", ChartKind::Bar, "Gene counts per sample");
        assert!(chart.empty);
        assert!(matches!(chart.data, ChartData::Series { ref traces } if traces.is_empty()));
    }

    #[test]
    fn test_definition_serializes() {
        let chart = ChartDefinition {
            use_case: "UC-1.1".to_string(),
            kind: ChartKind::Bar,
            title: "Gene counts per sample".to_string(),
            empty: false,
            data: ChartData::Series {
                traces: vec![Trace {
                    name: "count".to_string(),
                    x: vec![Value::from("S1")],
                    y: vec![Value::from(2i64)],
                }],
            },
        };

        let json = chart.to_json().unwrap();
        assert!(json.contains("\"shape\":\"series\""));

        let back = ChartDefinition::from_json(&json).unwrap();
        assert_eq!(back, chart);
    }

    #[test]
    fn test_malformed_json_is_serialization_error() {
        let err = ChartDefinition::from_json("{not json").unwrap_err();
        assert!(matches!(err, crate::error::CoreError::Serialization(_)));
    }
}
