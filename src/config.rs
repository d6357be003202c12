use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::amenity::OVERPASS_URL;

#[derive(Debug, Clone, Parser)]
#[command(name = "saferoute", version, about = "Fastest and safest routes with safety scores")]
pub struct ServerConfig {
    /// Address the HTTP API listens on.
    #[arg(long, env = "SAFEROUTE_BIND", default_value = "0.0.0.0:8000")]
    pub bind: SocketAddr,

    /// Directory holding `graph_<city>.json` or `<city>.osm.pbf` files.
    #[arg(long, env = "SAFEROUTE_GRAPH_DIR", default_value = "graph_data")]
    pub graph_dir: PathBuf,

    /// Append-only CSV of hazard reports.
    #[arg(long, env = "SAFEROUTE_REPORTS", default_value = "reports/reports.csv")]
    pub reports_file: PathBuf,

    #[arg(long, env = "SAFEROUTE_OVERPASS_URL", default_value = OVERPASS_URL)]
    pub overpass_url: String,

    /// Upper bound on a single POI lookup.
    #[arg(long, env = "SAFEROUTE_POI_TIMEOUT_SECS", default_value_t = 30)]
    pub poi_timeout_secs: u64,
}

impl ServerConfig {
    pub fn poi_timeout(&self) -> Duration {
        Duration::from_secs(self.poi_timeout_secs)
    }
}
