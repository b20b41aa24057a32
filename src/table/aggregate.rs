//! Merge/aggregation engine
//!
//! Deterministic, pure transformations from raw reference tables into the
//! aggregated shapes chart strategies consume. Given the same raw tables
//! and the same specification the output is byte-identical: grouping uses
//! ordered maps, output rows come out sorted, and nothing here touches the
//! wall clock or a random source. The engine holds no mutable state and
//! needs no synchronization.

use crate::cache::key::{Filters, ParamValue, QueryParams};
use crate::error::Result;
use crate::table::frame::{ColumnAliases, DataTable, Value};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// How a use case reduces its raw table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AggregationSpec {
    /// Count of distinct `distinct` values within each `group_by` group;
    /// duplicates inside a group are counted once. Multi-level grouping
    /// feeds hierarchical charts (treemap, sunburst).
    UniqueCount {
        group_by: Vec<String>,
        distinct: String,
    },

    /// Plain row count per group
    RowCount { group_by: Vec<String> },

    /// Wide-to-long reshape: id columns are repeated per melted value column
    LongFormat {
        id_columns: Vec<String>,
        value_columns: Vec<String>,
    },

    /// Pairwise distinct-member overlap between categories (chord/network)
    IntersectionSizes { category: String, member: String },
}

impl AggregationSpec {
    /// Logical columns this aggregation requires from the raw table
    pub fn required_columns(&self) -> Vec<&str> {
        match self {
            AggregationSpec::UniqueCount { group_by, distinct } => {
                let mut cols: Vec<&str> = group_by.iter().map(String::as_str).collect();
                cols.push(distinct.as_str());
                cols
            }
            AggregationSpec::RowCount { group_by } => {
                group_by.iter().map(String::as_str).collect()
            }
            AggregationSpec::LongFormat {
                id_columns,
                value_columns,
            } => id_columns
                .iter()
                .chain(value_columns.iter())
                .map(String::as_str)
                .collect(),
            AggregationSpec::IntersectionSizes { category, member } => {
                vec![category.as_str(), member.as_str()]
            }
        }
    }

    /// Fold the aggregation shape into query parameters
    ///
    /// Two use cases sharing a raw source but aggregating differently must
    /// derive distinct dataframe keys; folding the signature into the key
    /// parameters guarantees that.
    pub fn signature(&self) -> QueryParams {
        match self {
            AggregationSpec::UniqueCount { group_by, distinct } => QueryParams::new()
                .set("agg", "unique_count")
                .set_list("group_by", group_by.iter().cloned())
                .set("distinct", distinct.clone()),
            AggregationSpec::RowCount { group_by } => QueryParams::new()
                .set("agg", "row_count")
                .set_list("group_by", group_by.iter().cloned()),
            AggregationSpec::LongFormat {
                id_columns,
                value_columns,
            } => QueryParams::new()
                .set("agg", "long_format")
                .set_list("id_columns", id_columns.iter().cloned())
                .set_list("value_columns", value_columns.iter().cloned()),
            AggregationSpec::IntersectionSizes { category, member } => QueryParams::new()
                .set("agg", "intersection_sizes")
                .set("category", category.clone())
                .set("member", member.clone()),
        }
    }
}

/// Output of the merge/aggregation engine
///
/// Immutable once computed: rows are grouping keys plus metric columns,
/// already sorted, plus metadata naming the grouping that was applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedResult {
    /// The aggregated table
    pub table: DataTable,

    /// Grouping columns that were applied (logical names)
    pub group_columns: Vec<String>,

    /// Name of the metric column in `table`
    pub value_column: String,

    /// Which column uniqueness was counted over, when it applies
    pub distinct_column: Option<String>,
}

impl AggregatedResult {
    /// Whether the aggregation produced no rows (well-formed "no data")
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

/// The merge/aggregation engine
///
/// Stateless apart from its alias table, which is fixed at construction.
#[derive(Debug, Clone, Default)]
pub struct AggregationEngine {
    aliases: ColumnAliases,
}

impl AggregationEngine {
    /// Engine with the stock alias table
    pub fn new() -> Self {
        Self {
            aliases: ColumnAliases::standard(),
        }
    }

    /// Engine with a custom alias table
    pub fn with_aliases(aliases: ColumnAliases) -> Self {
        Self { aliases }
    }

    /// Run an aggregation spec against an already-filtered raw table
    pub fn aggregate(&self, spec: &AggregationSpec, table: &DataTable) -> Result<AggregatedResult> {
        match spec {
            AggregationSpec::UniqueCount { group_by, distinct } => {
                self.unique_count(table, group_by, distinct)
            }
            AggregationSpec::RowCount { group_by } => self.row_count(table, group_by),
            AggregationSpec::LongFormat {
                id_columns,
                value_columns,
            } => self.long_format(table, id_columns, value_columns),
            AggregationSpec::IntersectionSizes { category, member } => {
                self.intersection_sizes(table, category, member)
            }
        }
    }

    /// Keep only rows matching every filter that resolves to a column
    ///
    /// Filters that do not name a column of this table (e.g. a database
    /// toggle consumed by the manager) are routing filters and pass through.
    /// An empty surviving subset is a well-formed zero-row table.
    pub fn apply_filters(&self, table: &DataTable, filters: &Filters) -> DataTable {
        let mut column_filters: Vec<(usize, &ParamValue)> = Vec::new();
        for (name, value) in filters.iter() {
            if let Some(idx) = self.aliases.resolve_one(table, name) {
                column_filters.push((idx, value));
            }
        }

        if column_filters.is_empty() {
            return table.clone();
        }

        let mut filtered = DataTable::new(table.columns().iter().cloned());
        for row in table.rows() {
            let keep = column_filters.iter().all(|(idx, wanted)| {
                let cell = row[*idx].to_string();
                match wanted {
                    ParamValue::One(v) => cell == *v,
                    ParamValue::Many(vs) => vs.iter().any(|v| *v == cell),
                }
            });
            if keep {
                // Arity matches the source table by construction.
                let _ = filtered.push_row(row.clone());
            }
        }
        filtered
    }

    /// Count distinct `distinct` values per `group_by` group
    pub fn unique_count(
        &self,
        table: &DataTable,
        group_by: &[String],
        distinct: &str,
    ) -> Result<AggregatedResult> {
        let logical: Vec<&str> = group_by.iter().map(String::as_str).collect();
        let group_idx = self.aliases.resolve(table, &logical)?;
        let distinct_idx = self.aliases.resolve(table, &[distinct])?[0];

        let mut groups: BTreeMap<Vec<Value>, BTreeSet<Value>> = BTreeMap::new();
        for row in table.rows() {
            let key: Vec<Value> = group_idx.iter().map(|&i| row[i].clone()).collect();
            groups.entry(key).or_default().insert(row[distinct_idx].clone());
        }

        let mut out = DataTable::new(
            group_by
                .iter()
                .cloned()
                .chain(std::iter::once("count".to_string())),
        );
        for (key, members) in groups {
            let mut row = key;
            row.push(Value::Int(members.len() as i64));
            out.push_row(row)?;
        }

        Ok(AggregatedResult {
            table: out,
            group_columns: group_by.to_vec(),
            value_column: "count".to_string(),
            distinct_column: Some(distinct.to_string()),
        })
    }

    /// Count rows per `group_by` group
    pub fn row_count(&self, table: &DataTable, group_by: &[String]) -> Result<AggregatedResult> {
        let logical: Vec<&str> = group_by.iter().map(String::as_str).collect();
        let group_idx = self.aliases.resolve(table, &logical)?;

        let mut groups: BTreeMap<Vec<Value>, i64> = BTreeMap::new();
        for row in table.rows() {
            let key: Vec<Value> = group_idx.iter().map(|&i| row[i].clone()).collect();
            *groups.entry(key).or_insert(0) += 1;
        }

        let mut out = DataTable::new(
            group_by
                .iter()
                .cloned()
                .chain(std::iter::once("count".to_string())),
        );
        for (key, count) in groups {
            let mut row = key;
            row.push(Value::Int(count));
            out.push_row(row)?;
        }

        Ok(AggregatedResult {
            table: out,
            group_columns: group_by.to_vec(),
            value_column: "count".to_string(),
            distinct_column: None,
        })
    }

    /// Wide-to-long reshape
    pub fn long_format(
        &self,
        table: &DataTable,
        id_columns: &[String],
        value_columns: &[String],
    ) -> Result<AggregatedResult> {
        let id_logical: Vec<&str> = id_columns.iter().map(String::as_str).collect();
        let value_logical: Vec<&str> = value_columns.iter().map(String::as_str).collect();
        let id_idx = self.aliases.resolve(table, &id_logical)?;
        let value_idx = self.aliases.resolve(table, &value_logical)?;

        let mut out = DataTable::new(
            id_columns
                .iter()
                .cloned()
                .chain(["variable".to_string(), "value".to_string()]),
        );
        for row in table.rows() {
            for (name, &idx) in value_columns.iter().zip(value_idx.iter()) {
                let mut long_row: Vec<Value> = id_idx.iter().map(|&i| row[i].clone()).collect();
                long_row.push(Value::Str(name.clone()));
                long_row.push(row[idx].clone());
                out.push_row(long_row)?;
            }
        }
        out.sort_rows();

        Ok(AggregatedResult {
            table: out,
            group_columns: id_columns.to_vec(),
            value_column: "value".to_string(),
            distinct_column: None,
        })
    }

    /// Pairwise distinct-member intersection sizes between categories
    pub fn intersection_sizes(
        &self,
        table: &DataTable,
        category: &str,
        member: &str,
    ) -> Result<AggregatedResult> {
        let idx = self.aliases.resolve(table, &[category, member])?;
        let (cat_idx, member_idx) = (idx[0], idx[1]);

        let mut sets: BTreeMap<Value, BTreeSet<Value>> = BTreeMap::new();
        for row in table.rows() {
            sets.entry(row[cat_idx].clone())
                .or_default()
                .insert(row[member_idx].clone());
        }

        let categories: Vec<Value> = sets.keys().cloned().collect();
        let mut out = DataTable::new(["source", "target", "count"]);
        for (i, a) in categories.iter().enumerate() {
            for b in categories.iter().skip(i + 1) {
                let overlap = sets[a].intersection(&sets[b]).count();
                out.push_row(vec![a.clone(), b.clone(), Value::Int(overlap as i64)])?;
            }
        }

        Ok(AggregatedResult {
            table: out,
            group_columns: vec![category.to_string()],
            value_column: "count".to_string(),
            distinct_column: Some(member.to_string()),
        })
    }

    /// Inner join of two raw tables on a shared logical key column
    ///
    /// Right-side columns keep their names unless they collide with a left
    /// column, in which case they get a `_right` suffix; the right key
    /// column is dropped. Output row order follows the left table.
    pub fn inner_join(&self, left: &DataTable, right: &DataTable, on: &str) -> Result<DataTable> {
        let left_key = self.aliases.resolve(left, &[on])?[0];
        let right_key = self.aliases.resolve(right, &[on])?[0];

        let mut columns: Vec<String> = left.columns().to_vec();
        let mut right_cols: Vec<usize> = Vec::new();
        for (idx, name) in right.columns().iter().enumerate() {
            if idx == right_key {
                continue;
            }
            right_cols.push(idx);
            if columns.iter().any(|c| c == name) {
                columns.push(format!("{}_right", name));
            } else {
                columns.push(name.clone());
            }
        }

        let mut by_key: HashMap<&Value, Vec<&Vec<Value>>> = HashMap::new();
        for row in right.rows() {
            by_key.entry(&row[right_key]).or_default().push(row);
        }

        let mut out = DataTable::new(columns);
        for row in left.rows() {
            if let Some(matches) = by_key.get(&row[left_key]) {
                for right_row in matches {
                    let mut joined = row.clone();
                    joined.extend(right_cols.iter().map(|&i| right_row[i].clone()));
                    out.push_row(joined)?;
                }
            }
        }
        Ok(out)
    }
}
