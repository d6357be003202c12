//! Where city graphs come from.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use itertools::Itertools;
use petgraph::graph::Graph;
use serde::Deserialize;

use crate::error::GraphError;
use crate::graph::{GeoNode, NavigationGraph, RoadEdge};
use crate::safety::SafetyMap;

const JSON_PREFIX: &str = "graph_";
const JSON_SUFFIX: &str = ".json";
const PBF_SUFFIX: &str = ".osm.pbf";

/// Loads a city's road graph. Implementations are called at most once per
/// city by [`crate::graph::cache::GraphCache`].
pub trait GraphSource: Send + Sync {
    fn load(&self, city: &str) -> Result<NavigationGraph, GraphError>;

    /// Keys of every city this source can load.
    fn cities(&self) -> Vec<String>;
}

/// Reads `graph_<city>.json` or `<city>.osm.pbf` files from one directory.
pub struct DirGraphSource {
    dir: PathBuf,
    safety_map: SafetyMap,
}

impl DirGraphSource {
    pub fn new(dir: impl Into<PathBuf>, safety_map: SafetyMap) -> Self {
        Self {
            dir: dir.into(),
            safety_map,
        }
    }

    fn json_path(&self, city: &str) -> PathBuf {
        self.dir.join(format!("{JSON_PREFIX}{city}{JSON_SUFFIX}"))
    }

    fn pbf_path(&self, city: &str) -> PathBuf {
        self.dir.join(format!("{city}{PBF_SUFFIX}"))
    }
}

impl GraphSource for DirGraphSource {
    fn load(&self, city: &str) -> Result<NavigationGraph, GraphError> {
        // keys come from request input; keep them inside the directory
        if city.is_empty() || city.contains(['/', '\\']) || city.contains("..") {
            return Err(GraphError::NotFound { city: city.to_string() });
        }

        let json = self.json_path(city);
        if json.is_file() {
            tracing::info!(path = %json.display(), "loading graph");
            return read_json_graph(BufReader::new(File::open(&json)?));
        }

        let pbf = self.pbf_path(city);
        if pbf.is_file() {
            tracing::info!(path = %pbf.display(), "loading graph");
            return NavigationGraph::from_pbf(&pbf, &self.safety_map);
        }

        Err(GraphError::NotFound { city: city.to_string() })
    }

    fn cities(&self) -> Vec<String> {
        let Ok(entries) = std::fs::read_dir(&self.dir) else {
            return Vec::new();
        };

        entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| city_key(&entry.path()))
            .sorted()
            .dedup()
            .collect()
    }
}

fn city_key(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    let key = name
        .strip_prefix(JSON_PREFIX)
        .and_then(|rest| rest.strip_suffix(JSON_SUFFIX))
        .or_else(|| name.strip_suffix(PBF_SUFFIX))?;
    (!key.is_empty()).then(|| key.to_string())
}

// --- JSON graph file ---

#[derive(Deserialize)]
struct GraphFile {
    nodes: Vec<NodeRecord>,
    edges: Vec<EdgeRecord>,
}

#[derive(Deserialize)]
struct NodeRecord {
    id: i64,
    lat: f64,
    lon: f64,
}

#[derive(Deserialize)]
struct EdgeRecord {
    from: i64,
    to: i64,
    length: f64,
    #[serde(default)]
    safety: Option<f64>,
}

/// Parses the JSON graph format: `{"nodes": [{id, lat, lon}], "edges":
/// [{from, to, length, safety?}]}`. Edges keep their file order, which is
/// what "first parallel edge" refers to.
pub fn read_json_graph<R: Read>(reader: R) -> Result<NavigationGraph, GraphError> {
    let file: GraphFile = serde_json::from_reader(reader)?;

    let mut graph = Graph::with_capacity(file.nodes.len(), file.edges.len());
    let mut id_map = HashMap::with_capacity(file.nodes.len());

    for node in file.nodes {
        if !node.lat.is_finite() || !node.lon.is_finite() {
            return Err(GraphError::InvalidData(format!(
                "node {} has a non-finite position",
                node.id
            )));
        }
        let idx = graph.add_node(GeoNode { lat: node.lat, lon: node.lon });
        if id_map.insert(node.id, idx).is_some() {
            return Err(GraphError::InvalidData(format!("duplicate node id {}", node.id)));
        }
    }

    for edge in file.edges {
        if !edge.length.is_finite() || edge.length < 0.0 {
            return Err(GraphError::InvalidData(format!(
                "edge {}->{} has invalid length {}",
                edge.from, edge.to, edge.length
            )));
        }
        let (Some(&from), Some(&to)) = (id_map.get(&edge.from), id_map.get(&edge.to)) else {
            return Err(GraphError::InvalidData(format!(
                "edge {}->{} references an unknown node",
                edge.from, edge.to
            )));
        };
        graph.add_edge(from, to, RoadEdge::new(edge.length, edge.safety));
    }

    tracing::info!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "graph built"
    );
    Ok(NavigationGraph::new(graph))
}
