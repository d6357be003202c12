#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use saferoute::amenity::{AmenityKind, AmenityPoint, PoiService};
use saferoute::graph::cache::GraphCache;
use saferoute::graph::source::DirGraphSource;
use saferoute::hazard::CsvReportStore;
use saferoute::safety::SafetyMap;
use saferoute::{EngineConfig, PoiError, RouteEngine};
use tempfile::TempDir;

pub type TestEngine = RouteEngine<DirGraphSource, StubPoi, CsvReportStore>;

/// Start and end of every one-edge fixture, ~1 km apart.
pub const A: (f64, f64) = (12.970, 77.590);
pub const B: (f64, f64) = (12.979, 77.590);

fn one_edge(length: &str, safety: &str) -> String {
    format!(
        r#"{{
            "nodes": [{{"id": 1, "lat": {}, "lon": {}}}, {{"id": 2, "lat": {}, "lon": {}}}],
            "edges": [{{"from": 1, "to": 2, "length": {length}, "safety": {safety}}}]
        }}"#,
        A.0, A.1, B.0, B.1
    )
}

/// Writes the graph fixtures:
///
/// - `safe`:     A → B, 1000 m, safety 1.0
/// - `unsafe`:   A → B, 1000 m, safety 0.0
/// - `overflow`: A → B whose risk weight overflows, so only the fastest path exists
/// - `split`:    A → B and a far away C → D, nothing connects them
/// - `empty`:    no nodes at all
pub fn graph_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let write = |city: &str, body: String| {
        std::fs::write(dir.path().join(format!("graph_{city}.json")), body).unwrap();
    };

    write("safe", one_edge("1000.0", "1.0"));
    write("unsafe", one_edge("1000.0", "0.0"));
    write("overflow", one_edge("1e308", "0.5"));
    write(
        "split",
        r#"{
            "nodes": [
                {"id": 1, "lat": 12.970, "lon": 77.590},
                {"id": 2, "lat": 12.979, "lon": 77.590},
                {"id": 3, "lat": 13.100, "lon": 77.700},
                {"id": 4, "lat": 13.109, "lon": 77.700}
            ],
            "edges": [
                {"from": 1, "to": 2, "length": 1000.0, "safety": 0.9},
                {"from": 3, "to": 4, "length": 1000.0, "safety": 0.9}
            ]
        }"#
        .to_string(),
    );
    write("empty", r#"{"nodes": [], "edges": []}"#.to_string());
    dir
}

pub fn amenity(kind: AmenityKind, lat: f64, lon: f64, name: Option<&str>) -> AmenityPoint {
    AmenityPoint {
        lat,
        lon,
        kind,
        name: name.map(str::to_string),
        phone: None,
        address: None,
    }
}

/// Answers every lookup with the same points, or with a service error.
#[derive(Default)]
pub struct StubPoi {
    pub points: Vec<AmenityPoint>,
    pub fail: bool,
    pub calls: AtomicUsize,
}

impl StubPoi {
    pub fn with(points: Vec<AmenityPoint>) -> Self {
        Self { points, ..Self::default() }
    }

    pub fn failing() -> Self {
        Self { fail: true, ..Self::default() }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PoiService for StubPoi {
    async fn query(
        &self,
        _lat: f64,
        _lon: f64,
        _radius_m: f64,
        categories: &[AmenityKind],
    ) -> Result<Vec<AmenityPoint>, PoiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(PoiError::Status(503));
        }
        Ok(self
            .points
            .iter()
            .filter(|p| categories.contains(&p.kind))
            .cloned()
            .collect())
    }
}

pub fn engine(graphs: &TempDir, reports: &TempDir, poi: StubPoi) -> TestEngine {
    engine_with(graphs, reports, poi, EngineConfig::default())
}

pub fn engine_with(graphs: &TempDir, reports: &TempDir, poi: StubPoi, config: EngineConfig) -> TestEngine {
    let source = DirGraphSource::new(graphs.path(), SafetyMap::default());
    RouteEngine::new(
        GraphCache::new(source),
        poi,
        CsvReportStore::new(reports.path().join("reports.csv")),
        config,
    )
}
