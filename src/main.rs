use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use saferoute::amenity::OverpassClient;
use saferoute::config::ServerConfig;
use saferoute::graph::cache::GraphCache;
use saferoute::graph::source::DirGraphSource;
use saferoute::hazard::{CsvReportStore, ReportStore};
use saferoute::safety::SafetyMap;
use saferoute::{EngineConfig, RouteEngine, server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::parse();

    // 1. Hazard data, also used to derive edge safety for OSM extracts
    let reports = CsvReportStore::new(&config.reports_file);
    let existing = reports.read_all().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "could not read existing reports");
        Vec::new()
    });
    let safety_map = SafetyMap::from_reports(&existing);
    if safety_map.is_empty() {
        tracing::info!("no hazard reports yet, OSM edges rate on lighting alone");
    } else {
        tracing::info!(reports = existing.len(), hazard_cells = safety_map.len(), "loaded hazard reports");
    }

    // 2. Graphs load lazily per city
    let source = DirGraphSource::new(&config.graph_dir, safety_map);
    let graphs = GraphCache::new(source);
    tracing::info!(cities = ?graphs.cities(), dir = %config.graph_dir.display(), "graph catalog");

    let poi = OverpassClient::new(&config.overpass_url, config.poi_timeout())?;
    let engine = Arc::new(RouteEngine::new(graphs, poi, reports, EngineConfig::default()));

    let app = server::router(engine);

    tracing::info!("API server running on http://{}", config.bind);
    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
