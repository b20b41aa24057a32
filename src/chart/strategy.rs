//! Chart-kind strategies
//!
//! Chart construction is a fixed pipeline: validate the aggregated shape,
//! short-circuit to the explicit empty state, render. Each kind supplies
//! only the render step; there is no inheritance, just a tagged union
//! dispatched here. Every render is a pure function of its inputs.

use crate::cache::key::Filters;
use crate::chart::definition::{ChartData, ChartDefinition, HierarchyNode, Link, Trace};
use crate::error::{CoreError, Result};
use crate::table::aggregate::AggregatedResult;
use crate::table::frame::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The chart families the analysis modules draw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    /// Single-series bar chart
    Bar,
    /// Bar chart with one series per second-level group
    GroupedBar,
    /// Two-axis value matrix
    Heatmap,
    /// Two-level hierarchy
    Treemap,
    /// Weighted flow links
    Sankey,
    /// Single-series scatter plot
    Scatter,
}

impl ChartKind {
    /// Identifier used in serialized definitions
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartKind::Bar => "bar",
            ChartKind::GroupedBar => "grouped_bar",
            ChartKind::Heatmap => "heatmap",
            ChartKind::Treemap => "treemap",
            ChartKind::Sankey => "sankey",
            ChartKind::Scatter => "scatter",
        }
    }

    /// Number of table columns this kind expects, when fixed
    fn expected_columns(&self) -> Option<usize> {
        match self {
            ChartKind::Bar | ChartKind::Scatter => None,
            ChartKind::GroupedBar
            | ChartKind::Heatmap
            | ChartKind::Treemap
            | ChartKind::Sankey => Some(3),
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Build a chart definition from an aggregated result
///
/// The `filters` argument is part of the strategy contract; the stock kinds
/// render from the aggregated table alone since filtering already happened
/// upstream.
pub fn build_chart(
    kind: ChartKind,
    use_case: &str,
    title: &str,
    aggregated: &AggregatedResult,
    _filters: &Filters,
) -> Result<ChartDefinition> {
    validate(kind, aggregated)?;

    if aggregated.is_empty() {
        return Ok(ChartDefinition::empty(use_case, kind, title));
    }

    let data = match kind {
        ChartKind::Bar => render_bar(aggregated),
        ChartKind::GroupedBar => render_grouped_bar(aggregated),
        ChartKind::Heatmap => render_heatmap(aggregated),
        ChartKind::Treemap => render_treemap(aggregated),
        ChartKind::Sankey => render_sankey(aggregated),
        ChartKind::Scatter => render_scatter(aggregated),
    };

    Ok(ChartDefinition {
        use_case: use_case.to_string(),
        kind,
        title: title.to_string(),
        empty: false,
        data,
    })
}

/// Shape check: the aggregated table must fit the kind's render step
fn validate(kind: ChartKind, aggregated: &AggregatedResult) -> Result<()> {
    let n_cols = aggregated.table.columns().len();

    if n_cols < 2 {
        return Err(CoreError::Data(format!(
            "{} chart needs grouping and metric columns, got {}",
            kind, n_cols
        )));
    }

    if let Some(expected) = kind.expected_columns() {
        if n_cols != expected {
            return Err(CoreError::Data(format!(
                "{} chart expects {} columns, got {}",
                kind, expected, n_cols
            )));
        }
    }

    Ok(())
}

fn metric_index(aggregated: &AggregatedResult) -> usize {
    aggregated
        .table
        .column_index(&aggregated.value_column)
        .unwrap_or(aggregated.table.columns().len() - 1)
}

fn render_bar(aggregated: &AggregatedResult) -> ChartData {
    let metric = metric_index(aggregated);
    let trace = Trace {
        name: aggregated.value_column.clone(),
        x: aggregated.table.rows().iter().map(|r| r[0].clone()).collect(),
        y: aggregated
            .table
            .rows()
            .iter()
            .map(|r| r[metric].clone())
            .collect(),
    };
    ChartData::Series {
        traces: vec![trace],
    }
}

fn render_scatter(aggregated: &AggregatedResult) -> ChartData {
    render_bar(aggregated)
}

fn render_grouped_bar(aggregated: &AggregatedResult) -> ChartData {
    let metric = metric_index(aggregated);

    let mut series: BTreeMap<Value, (Vec<Value>, Vec<Value>)> = BTreeMap::new();
    for row in aggregated.table.rows() {
        let entry = series.entry(row[1].clone()).or_default();
        entry.0.push(row[0].clone());
        entry.1.push(row[metric].clone());
    }

    let traces = series
        .into_iter()
        .map(|(name, (x, y))| Trace {
            name: name.to_string(),
            x,
            y,
        })
        .collect();
    ChartData::Series { traces }
}

fn render_heatmap(aggregated: &AggregatedResult) -> ChartData {
    let metric = metric_index(aggregated);

    let mut y_labels: Vec<Value> = Vec::new();
    let mut x_labels: Vec<Value> = Vec::new();
    let mut cells: BTreeMap<(Value, Value), Value> = BTreeMap::new();

    for row in aggregated.table.rows() {
        let y = row[0].clone();
        let x = row[1].clone();
        if !y_labels.contains(&y) {
            y_labels.push(y.clone());
        }
        if !x_labels.contains(&x) {
            x_labels.push(x.clone());
        }
        cells.insert((y, x), row[metric].clone());
    }

    let z = y_labels
        .iter()
        .map(|y| {
            x_labels
                .iter()
                .map(|x| {
                    cells
                        .get(&(y.clone(), x.clone()))
                        .cloned()
                        .unwrap_or(Value::Int(0))
                })
                .collect()
        })
        .collect();

    ChartData::Matrix {
        x_labels,
        y_labels,
        z,
    }
}

fn render_treemap(aggregated: &AggregatedResult) -> ChartData {
    let metric = metric_index(aggregated);

    let mut parents: BTreeMap<Value, i64> = BTreeMap::new();
    let mut children: Vec<HierarchyNode> = Vec::new();

    for row in aggregated.table.rows() {
        let weight = row[metric].as_int().unwrap_or(0);
        *parents.entry(row[0].clone()).or_insert(0) += weight;
        children.push(HierarchyNode {
            label: row[1].to_string(),
            parent: row[0].to_string(),
            value: weight,
        });
    }

    let mut nodes: Vec<HierarchyNode> = parents
        .into_iter()
        .map(|(label, value)| HierarchyNode {
            label: label.to_string(),
            parent: String::new(),
            value,
        })
        .collect();
    nodes.extend(children);

    ChartData::Hierarchy { nodes }
}

fn render_sankey(aggregated: &AggregatedResult) -> ChartData {
    let metric = metric_index(aggregated);

    let links = aggregated
        .table
        .rows()
        .iter()
        .map(|row| Link {
            source: row[0].to_string(),
            target: row[1].to_string(),
            value: row[metric].as_int().unwrap_or(0),
        })
        .collect();

    ChartData::Links { links }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::frame::DataTable;

    fn bar_result() -> AggregatedResult {
        let mut table = DataTable::new(["sample", "count"]);
        table.push_row([Value::from("S1"), Value::from(2i64)]).unwrap();
        table.push_row([Value::from("S2"), Value::from(1i64)]).unwrap();
        AggregatedResult {
            table,
            group_columns: vec!["sample".to_string()],
            value_column: "count".to_string(),
            distinct_column: Some("ko".to_string()),
        }
    }

    fn two_level_result() -> AggregatedResult {
        let mut table = DataTable::new(["compoundclass", "compoundname", "count"]);
        table
            .push_row([Value::from("Aromatic"), Value::from("Benzene"), Value::from(2i64)])
            .unwrap();
        table
            .push_row([Value::from("Aromatic"), Value::from("Toluene"), Value::from(1i64)])
            .unwrap();
        table
            .push_row([Value::from("Metal"), Value::from("Cadmium"), Value::from(3i64)])
            .unwrap();
        AggregatedResult {
            table,
            group_columns: vec!["compoundclass".to_string(), "compoundname".to_string()],
            value_column: "count".to_string(),
            distinct_column: Some("ko".to_string()),
        }
    }

    #[test]
    fn test_bar_chart() {
        let chart = build_chart(
            ChartKind::Bar,
            "UC-1.1",
            "Gene counts per sample",
            &bar_result(),
            &Filters::new(),
        )
        .unwrap();

        assert!(!chart.empty);
        match chart.data {
            ChartData::Series { traces } => {
                assert_eq!(traces.len(), 1);
                assert_eq!(traces[0].x.len(), 2);
                assert_eq!(traces[0].y[0], Value::from(2i64));
            }
            other => panic!("expected series, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_input_renders_empty_state() {
        let empty = AggregatedResult {
            table: DataTable::new(["sample", "count"]),
            group_columns: vec!["sample".to_string()],
            value_column: "count".to_string(),
            distinct_column: None,
        };

        let chart = build_chart(
            ChartKind::Bar,
            "UC-1.1",
            "Gene counts per sample",
            &empty,
            &Filters::new(),
        )
        .unwrap();
        assert!(chart.empty);
    }

    #[test]
    fn test_grouped_bar_one_trace_per_group() {
        let chart = build_chart(
            ChartKind::GroupedBar,
            "UC-1.3",
            "Genes by class",
            &two_level_result(),
            &Filters::new(),
        )
        .unwrap();

        match chart.data {
            ChartData::Series { traces } => {
                assert_eq!(traces.len(), 3);
                assert_eq!(traces[0].name, "Benzene");
            }
            other => panic!("expected series, got {other:?}"),
        }
    }

    #[test]
    fn test_heatmap_fills_missing_cells() {
        let chart = build_chart(
            ChartKind::Heatmap,
            "UC-2.1",
            "Pathway heatmap",
            &two_level_result(),
            &Filters::new(),
        )
        .unwrap();

        match chart.data {
            ChartData::Matrix { x_labels, y_labels, z } => {
                assert_eq!(y_labels.len(), 2);
                assert_eq!(x_labels.len(), 3);
                // Metal x Benzene has no row and fills with zero.
                assert_eq!(z[1][0], Value::Int(0));
                assert_eq!(z[1][2], Value::Int(3));
            }
            other => panic!("expected matrix, got {other:?}"),
        }
    }

    #[test]
    fn test_treemap_parent_totals() {
        let chart = build_chart(
            ChartKind::Treemap,
            "UC-3.1",
            "Compound class treemap",
            &two_level_result(),
            &Filters::new(),
        )
        .unwrap();

        match chart.data {
            ChartData::Hierarchy { nodes } => {
                let aromatic = nodes
                    .iter()
                    .find(|n| n.label == "Aromatic" && n.parent.is_empty())
                    .unwrap();
                assert_eq!(aromatic.value, 3);
                assert_eq!(nodes.len(), 5);
            }
            other => panic!("expected hierarchy, got {other:?}"),
        }
    }

    #[test]
    fn test_sankey_links() {
        let chart = build_chart(
            ChartKind::Sankey,
            "UC-4.1",
            "Sample flows",
            &two_level_result(),
            &Filters::new(),
        )
        .unwrap();

        match chart.data {
            ChartData::Links { links } => {
                assert_eq!(links.len(), 3);
                assert_eq!(links[0].source, "Aromatic");
                assert_eq!(links[0].target, "Benzene");
                assert_eq!(links[0].value, 2);
            }
            other => panic!("expected links, got {other:?}"),
        }
    }

    #[test]
    fn test_shape_mismatch_is_data_error() {
        let err = build_chart(
            ChartKind::Heatmap,
            "UC-2.1",
            "Pathway heatmap",
            &bar_result(),
            &Filters::new(),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::Data(_)));
    }
}
