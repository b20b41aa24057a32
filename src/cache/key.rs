//! Deterministic cache key derivation
//!
//! Keys are pure functions of their inputs: parameters are carried in an
//! ordered map and list values are sorted and deduplicated before hashing,
//! so two semantically identical requests (e.g. KO id lists in different
//! input order) always derive the same key. Keys are prefix-structured
//! (`df:{database}:{hash}`, `graph:{use_case}:{data}:{filters}`) so they
//! stay readable in logs.

use crate::repository::DatabaseId;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A single normalized parameter value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Scalar parameter
    One(String),
    /// List parameter; order-irrelevant, stored sorted and deduplicated
    Many(Vec<String>),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::One(v) => write!(f, "{}", v),
            ParamValue::Many(vs) => write!(f, "{}", vs.join(",")),
        }
    }
}

/// Normalized query parameters for repository loads and key derivation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryParams {
    params: BTreeMap<String, ParamValue>,
}

/// User-selected filters (chemical class, database toggle, sample set, ...)
///
/// Same normalization rules as query parameters.
pub type Filters = QueryParams;

impl QueryParams {
    /// Create an empty parameter set
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a scalar parameter (builder style)
    pub fn set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params
            .insert(key.into(), ParamValue::One(value.into()));
        self
    }

    /// Set a list parameter (builder style); sorted and deduplicated
    pub fn set_list<I, S>(mut self, key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut values: Vec<String> = values.into_iter().map(Into::into).collect();
        values.sort();
        values.dedup();
        self.params.insert(key.into(), ParamValue::Many(values));
        self
    }

    /// Look up a parameter
    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.params.get(key)
    }

    /// Whether no parameters are set
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Iterate parameters in canonical (sorted-key) order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamValue)> {
        self.params.iter()
    }

    /// Union of two parameter sets; `other` wins on key collision
    pub fn merged_with(&self, other: &QueryParams) -> QueryParams {
        let mut merged = self.clone();
        for (k, v) in other.params.iter() {
            merged.params.insert(k.clone(), v.clone());
        }
        merged
    }

    /// Canonical string form: `k1=v1&k2=a,b,c` in sorted-key order
    pub fn canonical(&self) -> String {
        self.params
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Stable hex digest of a canonical string
///
/// `DefaultHasher::new()` is keyed deterministically, so the digest is a
/// pure function of the input.
fn stable_hash(input: &str) -> String {
    let mut hasher = DefaultHasher::new();
    input.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

/// Cache key for the dataframe tier: `df:{database}:{param_hash}`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DataFrameKey(String);

impl DataFrameKey {
    /// Derive the key for `(database, normalized params)`
    pub fn derive(database: DatabaseId, params: &QueryParams) -> Self {
        Self(format!(
            "df:{}:{}",
            database.as_str(),
            stable_hash(&params.canonical())
        ))
    }

    /// The full key string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DataFrameKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Cache key for the graph tier: `graph:{use_case}:{data_hash}:{filters_hash}`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GraphKey(String);

impl GraphKey {
    /// Derive the key for `(use_case, data_hash, filters_hash)`
    pub fn derive(use_case: &str, data_hash: &str, filters_hash: &str) -> Self {
        Self(format!("graph:{}:{}:{}", use_case, data_hash, filters_hash))
    }

    /// The full key string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GraphKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Combine the dataframe keys a chart consumed into one data hash
///
/// Keys are sorted before hashing so the combination is order-independent.
pub fn data_hash(keys: &[DataFrameKey]) -> String {
    let mut parts: Vec<&str> = keys.iter().map(|k| k.as_str()).collect();
    parts.sort_unstable();
    stable_hash(&parts.join("|"))
}

/// Hash of the normalized filter selection
pub fn filters_hash(filters: &Filters) -> String {
    stable_hash(&filters.canonical())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_canonical_order() {
        let a = QueryParams::new().set("b", "2").set("a", "1");
        let b = QueryParams::new().set("a", "1").set("b", "2");
        assert_eq!(a.canonical(), b.canonical());
        assert_eq!(a.canonical(), "a=1&b=2");
    }

    #[test]
    fn test_list_params_normalized() {
        let a = QueryParams::new().set_list("ko", ["K00003", "K00001", "K00002", "K00001"]);
        let b = QueryParams::new().set_list("ko", ["K00001", "K00002", "K00003"]);
        assert_eq!(a, b);
        assert_eq!(a.canonical(), "ko=K00001,K00002,K00003");
    }

    #[test]
    fn test_dataframe_key_idempotent() {
        let params = QueryParams::new().set_list("ko", ["K00100", "K00200"]);
        let k1 = DataFrameKey::derive(DatabaseId::BioRemPP, &params);
        let k2 = DataFrameKey::derive(DatabaseId::BioRemPP, &params);
        assert_eq!(k1, k2);
        assert!(k1.as_str().starts_with("df:biorempp:"));
    }

    #[test]
    fn test_dataframe_key_permutation_invariant() {
        let shuffled = QueryParams::new().set_list("ko", ["K00200", "K00100"]);
        let sorted = QueryParams::new().set_list("ko", ["K00100", "K00200"]);
        assert_eq!(
            DataFrameKey::derive(DatabaseId::Kegg, &shuffled),
            DataFrameKey::derive(DatabaseId::Kegg, &sorted)
        );
    }

    #[test]
    fn test_dataframe_key_distinguishes_database() {
        let params = QueryParams::new().set("sample", "S1");
        assert_ne!(
            DataFrameKey::derive(DatabaseId::BioRemPP, &params),
            DataFrameKey::derive(DatabaseId::ToxCsm, &params)
        );
    }

    #[test]
    fn test_graph_key_pure() {
        let df = DataFrameKey::derive(DatabaseId::BioRemPP, &QueryParams::new());
        let data = data_hash(&[df.clone()]);
        let filters = filters_hash(&Filters::new().set("class", "Aromatic"));

        let k1 = GraphKey::derive("UC-2.1", &data, &filters);
        let k2 = GraphKey::derive("UC-2.1", &data, &filters);
        assert_eq!(k1, k2);
        assert!(k1.as_str().starts_with("graph:UC-2.1:"));
    }

    #[test]
    fn test_data_hash_order_independent() {
        let a = DataFrameKey::derive(DatabaseId::BioRemPP, &QueryParams::new());
        let b = DataFrameKey::derive(DatabaseId::ToxCsm, &QueryParams::new());
        assert_eq!(
            data_hash(&[a.clone(), b.clone()]),
            data_hash(&[b, a])
        );
    }

    #[test]
    fn test_filters_hash_differs_on_selection() {
        let none = filters_hash(&Filters::new());
        let class = filters_hash(&Filters::new().set("class", "Aromatic"));
        assert_ne!(none, class);
    }
}
