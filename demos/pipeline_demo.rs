//! Pipeline Demo Application
//!
//! Walks the full cache pipeline: register the stock use cases, serve a
//! small annotation fixture, build charts cold, hit them warm, and show
//! what a database update invalidates.
//!
//! Usage:
//!   cargo run --example pipeline_demo

use biorempp_core::cache::{CoreConfig, Filters, GraphCacheManager};
use biorempp_core::chart::UseCaseRegistry;
use biorempp_core::repository::{DatabaseId, MemoryRepository};
use biorempp_core::table::DataTable;
use std::sync::Arc;
use tracing::{info, Level};

fn annotation_table() -> anyhow::Result<DataTable> {
    let mut table = DataTable::new(["sample", "ko", "compoundclass", "compoundname"]);
    table.push_row(["S1", "K00001", "Aromatic", "Benzene"])?;
    table.push_row(["S1", "K00001", "Aromatic", "Benzene"])?;
    table.push_row(["S1", "K00002", "Aromatic", "Toluene"])?;
    table.push_row(["S1", "K00446", "Chlorinated", "Chlorobenzene"])?;
    table.push_row(["S2", "K00003", "Metal", "Cadmium"])?;
    table.push_row(["S2", "K00446", "Chlorinated", "Chlorobenzene"])?;
    table.push_row(["S3", "K18068", "Aromatic", "Toluene"])?;
    Ok(table)
}

fn pathway_table() -> anyhow::Result<DataTable> {
    let mut table = DataTable::new(["sample", "ko", "pathway"]);
    table.push_row(["S1", "K00001", "Benzoate degradation"])?;
    table.push_row(["S1", "K00002", "Toluene degradation"])?;
    table.push_row(["S2", "K00003", "Benzoate degradation"])?;
    table.push_row(["S3", "K18068", "Toluene degradation"])?;
    Ok(table)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .init();

    info!("=== BioRemPP analysis cache demo ===");

    let repository = Arc::new(
        MemoryRepository::new()
            .with_table(DatabaseId::BioRemPP, annotation_table()?)
            .with_table(DatabaseId::Kegg, pathway_table()?),
    );

    let config = CoreConfig::default();
    let registry = UseCaseRegistry::builtin();
    info!("registered use cases: {:?}", registry.ids());

    let manager = GraphCacheManager::new(&config, registry, repository)?;

    info!("--- Cold builds ---");
    for use_case in ["UC-1.1", "UC-2.1", "UC-3.1", "UC-4.1"] {
        let chart = manager.get_or_build(use_case, &Filters::new()).await?;
        info!(
            "built {} ({}): empty = {}",
            chart.use_case, chart.kind, chart.empty
        );
    }

    info!("--- Warm hits ---");
    for use_case in ["UC-1.1", "UC-2.1"] {
        let chart = manager.get_or_build(use_case, &Filters::new()).await?;
        info!("served {} from cache", chart.use_case);
    }

    info!("--- Filtered variant ---");
    let filtered = manager
        .get_or_build("UC-1.1", &Filters::new().set("compoundclass", "Aromatic"))
        .await?;
    info!(
        "built filtered {} variant: empty = {}",
        filtered.use_case, filtered.empty
    );

    let stats = manager.stats().await;
    info!("dataframe tier: {}", stats.dataframe);
    info!("graph tier:     {}", stats.graph);

    info!("--- Simulating a new biorempp upload ---");
    let (dataframes, graphs) = manager.invalidate_database(DatabaseId::BioRemPP).await;
    info!(
        "cascade removed {} dataframes and {} dependent charts",
        dataframes, graphs
    );

    let chart = manager.get_or_build("UC-1.1", &Filters::new()).await?;
    info!("rebuilt {} after invalidation", chart.use_case);

    let stats = manager.stats().await;
    info!("dataframe tier: {}", stats.dataframe);
    info!("graph tier:     {}", stats.graph);

    Ok(())
}
