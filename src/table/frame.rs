//! Tabular data model for raw and aggregated tables
//!
//! Raw reference tables arrive from the repository as [`DataTable`]s:
//! named columns over rows of [`Value`]s. Values carry bit-exact equality,
//! hashing, and a total order so grouping and output sorting are
//! deterministic.

use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A single cell value
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Absent value
    Null,
    /// Integer metric
    Int(i64),
    /// Floating-point metric (compared and hashed by bit pattern)
    Float(f64),
    /// Identifier or label
    Str(String),
}

impl Value {
    /// Variant rank used for the total order
    fn rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Int(_) => 1,
            Value::Float(_) => 2,
            Value::Str(_) => 3,
        }
    }

    /// Borrow the string content, if any
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow the integer content, if any
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Str(a), Value::Str(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.rank().hash(state);
        match self {
            Value::Null => {}
            Value::Int(i) => i.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Str(s) => s.hash(state),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a.cmp(b),
            (Value::Float(a), Value::Float(b)) => a.total_cmp(b),
            (Value::Str(a), Value::Str(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, ""),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(v) => write!(f, "{}", v),
            Value::Str(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

/// A named-column row store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataTable {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl DataTable {
    /// Create an empty table with the given column names
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row; its arity must match the column count
    pub fn push_row<I, V>(&mut self, row: I) -> Result<()>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let row: Vec<Value> = row.into_iter().map(Into::into).collect();
        if row.len() != self.columns.len() {
            return Err(CoreError::Data(format!(
                "row arity {} does not match {} columns",
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    /// Column names
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Rows in insertion order
    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Number of rows
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of an exactly named column
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Sort rows by their full value tuple (canonical order for
    /// byte-identical serialization of equal content)
    pub fn sort_rows(&mut self) {
        self.rows.sort();
    }
}

/// Logical-to-physical column name resolution
///
/// Reference tables name the same identifier differently (`ko` vs `Gene`);
/// resolution happens once per table, not per row.
#[derive(Debug, Clone)]
pub struct ColumnAliases {
    aliases: BTreeMap<String, Vec<String>>,
}

impl ColumnAliases {
    /// Empty alias table: logical names must match physically
    pub fn empty() -> Self {
        Self {
            aliases: BTreeMap::new(),
        }
    }

    /// The stock alias table for the bundled reference databases
    pub fn standard() -> Self {
        let mut aliases = BTreeMap::new();
        aliases.insert(
            "ko".to_string(),
            vec!["ko".to_string(), "KO".to_string(), "Gene".to_string()],
        );
        aliases.insert(
            "sample".to_string(),
            vec!["sample".to_string(), "Sample".to_string()],
        );
        aliases.insert(
            "compoundname".to_string(),
            vec!["compoundname".to_string(), "Compound_Name".to_string()],
        );
        aliases.insert(
            "compoundclass".to_string(),
            vec!["compoundclass".to_string(), "Compound_Class".to_string()],
        );
        aliases.insert(
            "pathway".to_string(),
            vec!["pathway".to_string(), "Pathway".to_string()],
        );
        aliases.insert(
            "supercategory".to_string(),
            vec!["supercategory".to_string(), "Super_Category".to_string()],
        );
        aliases.insert(
            "endpoint".to_string(),
            vec!["endpoint".to_string(), "Endpoint".to_string()],
        );
        Self { aliases }
    }

    /// Add or replace the candidates for a logical name
    pub fn with_alias<I, S>(mut self, logical: impl Into<String>, candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases.insert(
            logical.into(),
            candidates.into_iter().map(Into::into).collect(),
        );
        self
    }

    /// Resolve one logical name against a table
    pub fn resolve_one(&self, table: &DataTable, logical: &str) -> Option<usize> {
        if let Some(idx) = table.column_index(logical) {
            return Some(idx);
        }
        self.aliases
            .get(logical)?
            .iter()
            .find_map(|candidate| table.column_index(candidate))
    }

    /// Resolve several logical names, reporting every missing one at once
    pub fn resolve(&self, table: &DataTable, logical: &[&str]) -> Result<Vec<usize>> {
        let mut indices = Vec::with_capacity(logical.len());
        let mut missing = Vec::new();

        for name in logical {
            match self.resolve_one(table, name) {
                Some(idx) => indices.push(idx),
                None => missing.push(name.to_string()),
            }
        }

        if missing.is_empty() {
            Ok(indices)
        } else {
            Err(CoreError::MissingColumns { columns: missing })
        }
    }
}

impl Default for ColumnAliases {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn annotation_table() -> DataTable {
        let mut table = DataTable::new(["sample", "ko"]);
        table.push_row(["S1", "K00001"]).unwrap();
        table.push_row(["S2", "K00003"]).unwrap();
        table
    }

    #[test]
    fn test_value_equality_and_hash_are_bit_exact() {
        assert_eq!(Value::Float(1.5), Value::Float(1.5));
        assert_ne!(Value::Float(0.0), Value::Float(-0.0));
        assert_ne!(Value::Int(1), Value::Float(1.0));
        assert_eq!(Value::from("K00001"), Value::Str("K00001".to_string()));
    }

    #[test]
    fn test_value_total_order() {
        let mut values = vec![
            Value::from("b"),
            Value::Null,
            Value::from(2i64),
            Value::from("a"),
            Value::from(1i64),
        ];
        values.sort();
        assert_eq!(
            values,
            vec![
                Value::Null,
                Value::from(1i64),
                Value::from(2i64),
                Value::from("a"),
                Value::from("b"),
            ]
        );
    }

    #[test]
    fn test_push_row_checks_arity() {
        let mut table = DataTable::new(["sample", "ko"]);
        let result = table.push_row(["S1"]);
        assert!(matches!(result, Err(CoreError::Data(_))));
    }

    #[test]
    fn test_column_index() {
        let table = annotation_table();
        assert_eq!(table.column_index("ko"), Some(1));
        assert_eq!(table.column_index("pathway"), None);
    }

    #[test]
    fn test_alias_resolution_prefers_exact_name() {
        let table = annotation_table();
        let aliases = ColumnAliases::standard();
        assert_eq!(aliases.resolve_one(&table, "ko"), Some(1));
    }

    #[test]
    fn test_alias_resolution_falls_back_to_candidates() {
        let mut table = DataTable::new(["Sample", "Gene"]);
        table.push_row(["S1", "K00001"]).unwrap();

        let aliases = ColumnAliases::standard();
        assert_eq!(aliases.resolve_one(&table, "sample"), Some(0));
        assert_eq!(aliases.resolve_one(&table, "ko"), Some(1));
    }

    #[test]
    fn test_resolve_names_every_missing_column() {
        let table = annotation_table();
        let aliases = ColumnAliases::standard();

        let err = aliases
            .resolve(&table, &["sample", "compoundname", "pathway"])
            .unwrap_err();
        match err {
            CoreError::MissingColumns { columns } => {
                assert_eq!(columns, vec!["compoundname", "pathway"]);
            }
            other => panic!("expected MissingColumns, got {other:?}"),
        }
    }

    #[test]
    fn test_sort_rows_is_canonical() {
        let mut a = DataTable::new(["sample", "ko"]);
        a.push_row(["S2", "K00003"]).unwrap();
        a.push_row(["S1", "K00001"]).unwrap();
        a.sort_rows();

        let mut b = DataTable::new(["sample", "ko"]);
        b.push_row(["S1", "K00001"]).unwrap();
        b.push_row(["S2", "K00003"]).unwrap();
        b.sort_rows();

        assert_eq!(a, b);
    }
}
