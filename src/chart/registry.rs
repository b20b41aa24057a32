//! Use-case registry
//!
//! Every analysis panel is one use case: a fixed data requirement (which
//! databases, which query parameters), one aggregation, one chart kind.
//! The registry is resolved once at configuration-load time and handed to
//! the cache manager; use cases are never dispatched through runtime
//! inheritance.

use crate::cache::key::QueryParams;
use crate::chart::strategy::ChartKind;
use crate::error::{CoreError, Result};
use crate::repository::DatabaseId;
use crate::table::aggregate::AggregationSpec;
use std::collections::HashMap;

/// One chart/analysis with a fixed data requirement
#[derive(Debug, Clone)]
pub struct UseCaseSpec {
    /// Stable identifier (e.g. `UC-1.1`)
    pub id: String,

    /// Panel title
    pub title: String,

    /// Source databases, primary first
    pub databases: Vec<DatabaseId>,

    /// Join column when more than one database is consumed
    pub join_on: Option<String>,

    /// Static query parameters for the repository load
    pub base_params: QueryParams,

    /// How the raw table reduces to the chart's shape
    pub aggregation: AggregationSpec,

    /// Chart family to render
    pub chart: ChartKind,
}

impl UseCaseSpec {
    /// Query parameters that identify this use case's dataframe: the static
    /// parameters, the source list, and the aggregation signature folded
    /// together. Two use cases sharing a raw source but aggregating
    /// differently derive distinct dataframe keys through this.
    pub fn dataframe_params(&self) -> QueryParams {
        self.base_params
            .merged_with(&self.aggregation.signature())
            .merged_with(
                &QueryParams::new()
                    .set_list("databases", self.databases.iter().map(|db| db.as_str())),
            )
    }
}

/// Registry mapping use-case id to its specification
#[derive(Debug, Clone, Default)]
pub struct UseCaseRegistry {
    specs: HashMap<String, UseCaseSpec>,
}

impl UseCaseRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a use case, replacing any previous spec with the same id
    pub fn register(&mut self, spec: UseCaseSpec) {
        self.specs.insert(spec.id.clone(), spec);
    }

    /// Look up a use case
    pub fn get(&self, id: &str) -> Result<&UseCaseSpec> {
        self.specs
            .get(id)
            .ok_or_else(|| CoreError::UnknownUseCase(id.to_string()))
    }

    /// Registered use-case ids in sorted order
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.specs.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Number of registered use cases
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    /// Whether no use case is registered
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// The stock analysis modules
    pub fn builtin() -> Self {
        let mut registry = Self::new();

        registry.register(UseCaseSpec {
            id: "UC-1.1".to_string(),
            title: "Gene counts per sample".to_string(),
            databases: vec![DatabaseId::BioRemPP],
            join_on: None,
            base_params: QueryParams::new(),
            aggregation: AggregationSpec::UniqueCount {
                group_by: vec!["sample".to_string()],
                distinct: "ko".to_string(),
            },
            chart: ChartKind::Bar,
        });

        registry.register(UseCaseSpec {
            id: "UC-1.3".to_string(),
            title: "Gene counts per sample and compound class".to_string(),
            databases: vec![DatabaseId::BioRemPP],
            join_on: None,
            base_params: QueryParams::new(),
            aggregation: AggregationSpec::UniqueCount {
                group_by: vec!["sample".to_string(), "compoundclass".to_string()],
                distinct: "ko".to_string(),
            },
            chart: ChartKind::GroupedBar,
        });

        registry.register(UseCaseSpec {
            id: "UC-2.1".to_string(),
            title: "Degradation pathway activity per sample".to_string(),
            databases: vec![DatabaseId::Kegg],
            join_on: None,
            base_params: QueryParams::new(),
            aggregation: AggregationSpec::UniqueCount {
                group_by: vec!["pathway".to_string(), "sample".to_string()],
                distinct: "ko".to_string(),
            },
            chart: ChartKind::Heatmap,
        });

        registry.register(UseCaseSpec {
            id: "UC-2.3".to_string(),
            title: "Samples ranked by degradation pathway coverage".to_string(),
            databases: vec![DatabaseId::Kegg],
            join_on: None,
            base_params: QueryParams::new(),
            aggregation: AggregationSpec::UniqueCount {
                group_by: vec!["sample".to_string()],
                distinct: "pathway".to_string(),
            },
            chart: ChartKind::Bar,
        });

        registry.register(UseCaseSpec {
            id: "UC-3.1".to_string(),
            title: "Gene coverage by compound class and compound".to_string(),
            databases: vec![DatabaseId::BioRemPP],
            join_on: None,
            base_params: QueryParams::new(),
            aggregation: AggregationSpec::UniqueCount {
                group_by: vec!["compoundclass".to_string(), "compoundname".to_string()],
                distinct: "ko".to_string(),
            },
            chart: ChartKind::Treemap,
        });

        registry.register(UseCaseSpec {
            id: "UC-4.1".to_string(),
            title: "Sample to compound class flows".to_string(),
            databases: vec![DatabaseId::BioRemPP],
            join_on: None,
            base_params: QueryParams::new(),
            aggregation: AggregationSpec::UniqueCount {
                group_by: vec!["sample".to_string(), "compoundclass".to_string()],
                distinct: "ko".to_string(),
            },
            chart: ChartKind::Sankey,
        });

        registry.register(UseCaseSpec {
            id: "UC-5.2".to_string(),
            title: "Shared gene repertoire between compound classes".to_string(),
            databases: vec![DatabaseId::BioRemPP],
            join_on: None,
            base_params: QueryParams::new(),
            aggregation: AggregationSpec::IntersectionSizes {
                category: "compoundclass".to_string(),
                member: "ko".to_string(),
            },
            chart: ChartKind::Sankey,
        });

        registry.register(UseCaseSpec {
            id: "UC-6.1".to_string(),
            title: "Toxicity profile of annotated genes".to_string(),
            databases: vec![DatabaseId::BioRemPP, DatabaseId::ToxCsm],
            join_on: Some("ko".to_string()),
            base_params: QueryParams::new(),
            aggregation: AggregationSpec::UniqueCount {
                group_by: vec!["supercategory".to_string(), "endpoint".to_string()],
                distinct: "ko".to_string(),
            },
            chart: ChartKind::Heatmap,
        });

        registry
    }
}
