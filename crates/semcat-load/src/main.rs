//! CLI entry point for the semcat-load metadata loader.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use semcat_core::{EdgeType, Neo4jSettings, NodeLabel};
use semcat_graph::{GraphClient, GraphConfig};

use semcat_load::config::{LoadOptions, DEFAULT_DOMAIN, DEFAULT_METADATA_ROOT};
use semcat_load::error::LoadError;
use semcat_load::loader::MetadataLoader;
use semcat_load::mapper::{log_warnings, map_domain};
use semcat_load::writer::write_plan;

#[derive(Parser)]
#[command(name = "semcat-load")]
#[command(about = "Load YAML catalog metadata into the Neo4j semantic catalog graph")]
struct Cli {
    /// Domain to load (a directory under the metadata root).
    #[arg(long, default_value = DEFAULT_DOMAIN)]
    domain: String,

    /// Root directory holding one sub-directory per domain.
    #[arg(long, default_value = DEFAULT_METADATA_ROOT)]
    metadata_root: PathBuf,

    /// Delete the domain's existing nodes before loading.
    #[arg(long)]
    clear: bool,

    /// Load and map only; print the upsert plan as JSON and exit.
    #[arg(long, conflicts_with = "clear")]
    dry_run: bool,

    /// Emit logs as JSON lines.
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if cli.json_logs {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    let options = LoadOptions {
        domain: cli.domain,
        metadata_root: cli.metadata_root,
        clear: cli.clear,
        dry_run: cli.dry_run,
    }
    .resolve_root(&std::env::current_dir()?);

    // Credentials are checked before any metadata file is read.
    let settings = if options.dry_run {
        None
    } else {
        Some(Neo4jSettings::from_env().map_err(LoadError::from)?)
    };

    let metadata = MetadataLoader::new(&options.metadata_root, &options.domain).load()?;
    let plan = map_domain(&metadata);
    log_warnings(&plan);

    let Some(settings) = settings else {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    };

    let graph_config = GraphConfig {
        max_connections: 1,
        ..GraphConfig::from(&settings)
    };
    let graph = GraphClient::connect(&graph_config)
        .await
        .map_err(|e| LoadError::Connection(e.to_string()))?;
    tracing::info!(uri = %settings.uri, "Connected to Neo4j");

    write_plan(&graph, &plan, options.clear).await?;

    let summary = graph.domain_summary(&options.domain).await?;
    tracing::info!(
        domain = %options.domain,
        tables = summary.tables,
        columns = summary.columns,
        metrics = summary.metrics,
        concepts = summary.concepts,
        joins = summary.joins,
        foreign_keys = summary.foreign_keys,
        "Domain now in graph"
    );
    for label in NodeLabel::ALL {
        let count = graph.count_nodes(label).await?;
        tracing::debug!(label = %label, count, "Graph total");
    }
    for edge_type in EdgeType::ALL {
        let count = graph.count_relationships(edge_type).await?;
        tracing::debug!(edge_type = %edge_type, count, "Graph total");
    }
    tracing::info!("Try: MATCH (t:Table)-[r:JOIN]->(t2:Table) RETURN t,r,t2 LIMIT 50");

    Ok(())
}
