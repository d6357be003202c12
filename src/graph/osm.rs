use std::collections::HashMap;
use std::path::Path;

use geo::Point;
use geo::prelude::*;
use osmpbf::{Element, ElementReader};
use petgraph::graph::Graph;

use crate::error::GraphError;
use crate::graph::{GeoNode, NavigationGraph, RoadEdge};
use crate::safety::SafetyMap;

const LIT_LIGHTING: f64 = 1.0;
const UNLIT_LIGHTING: f64 = 0.35;

/// Edge safety from street lighting and the hazard risk around the edge.
pub fn edge_safety(lit: &str, hazard_risk: f64) -> f64 {
    let lighting = if matches!(lit, "yes" | "street" | "24/7") {
        LIT_LIGHTING
    } else {
        UNLIT_LIGHTING
    };
    (lighting * 0.7 + (1.0 - hazard_risk) * 0.3).clamp(0.0, 1.0)
}

fn is_walkable(tags: &HashMap<&str, &str>) -> bool {
    let highway = tags.get("highway").copied().unwrap_or("");
    let foot = tags.get("foot").copied().unwrap_or("");
    let sidewalk = tags.get("sidewalk").copied().unwrap_or("");

    let is_walkable_type = matches!(highway,
        "footway" | "path" | "steps" | "pedestrian" | "living_street" |
        "residential" | "tertiary" | "service" | "unclassified"
    );

    let is_motor_road = matches!(highway, "motorway" | "trunk" | "primary" | "secondary");
    let foot_allowed = matches!(foot, "yes" | "designated" | "permissive");
    let has_sidewalk = matches!(sidewalk, "both" | "left" | "right" | "yes" | "separate");

    is_walkable_type || (is_motor_road && (foot_allowed || has_sidewalk))
}

impl NavigationGraph {
    /// Two passes over an OSM extract: node positions first, then walkable
    /// ways split into bidirectional segments.
    pub fn from_pbf(path: &Path, safety_map: &SafetyMap) -> Result<Self, GraphError> {
        let mut graph = Graph::new();
        let mut osm_id_map = HashMap::new();
        let mut temp_nodes = HashMap::new();

        // PASS 1: Nodes
        let reader = ElementReader::from_path(path)?;
        reader.for_each(|element| match element {
            Element::Node(node) => {
                temp_nodes.insert(node.id(), (node.lat(), node.lon()));
            }
            Element::DenseNode(node) => {
                temp_nodes.insert(node.id(), (node.lat(), node.lon()));
            }
            _ => {}
        })?;

        tracing::debug!(nodes = temp_nodes.len(), "read OSM nodes, building edges");

        // PASS 2: Ways
        let reader_pass2 = ElementReader::from_path(path)?;
        reader_pass2.for_each(|element| {
            let Element::Way(way) = element else {
                return;
            };

            let tags: HashMap<&str, &str> = way.tags().collect();
            if !is_walkable(&tags) {
                return;
            }
            let lit = tags.get("lit").copied().unwrap_or("");

            let refs: Vec<i64> = way.refs().collect();
            for window in refs.windows(2) {
                let (id_a, id_b) = (window[0], window[1]);

                let (Some(&(lat_a, lon_a)), Some(&(lat_b, lon_b))) =
                    (temp_nodes.get(&id_a), temp_nodes.get(&id_b))
                else {
                    continue;
                };

                let idx_a = *osm_id_map
                    .entry(id_a)
                    .or_insert_with(|| graph.add_node(GeoNode { lat: lat_a, lon: lon_a }));
                let idx_b = *osm_id_map
                    .entry(id_b)
                    .or_insert_with(|| graph.add_node(GeoNode { lat: lat_b, lon: lon_b }));

                let dist = Point::new(lon_a, lat_a).haversine_distance(&Point::new(lon_b, lat_b));
                let hazard = safety_map.get_risk_score((lat_a + lat_b) / 2.0, (lon_a + lon_b) / 2.0);
                let edge = RoadEdge::new(dist, Some(edge_safety(lit, hazard)));

                graph.add_edge(idx_a, idx_b, edge);
                graph.add_edge(idx_b, idx_a, edge);
            }
        })?;

        tracing::info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "graph built"
        );
        Ok(Self::new(graph))
    }
}
