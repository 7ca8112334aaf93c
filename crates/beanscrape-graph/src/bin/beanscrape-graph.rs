use anyhow::{Context, Result};
use beanscrape_graph::GraphConfig;
use beanscrape_monitoring::{init_logging, LogExt, LoggingConfig};
use tracing::info;

fn main() -> Result<()> {
    init_logging(&LoggingConfig::from_env("beanscrape-graph"))
        .context("Failed to initialize logging")?;

    let config = GraphConfig::load().context("Failed to load configuration")?;

    let report = beanscrape_graph::run(&config)
        .log_ok("Flavor graph rendered")
        .log_err("Graph run failed")
        .context("Failed to build flavor graph")?;

    info!(
        nodes = report.nodes,
        edges = report.edges,
        skipped = report.rows_skipped,
        svg = %report.svg_path.display(),
        "Graph summary"
    );

    Ok(())
}
