//! In-memory road graph shared read-only across requests.
//!
//! Nodes carry a geographic position, edges carry a physical length and a
//! safety coefficient in `[0, 1]`. Routing weights are never stored here; they
//! are computed per request by [`crate::cost::CostModel`].

pub mod cache;
pub mod osm;
pub mod source;

use petgraph::graph::{Graph, NodeIndex};
use petgraph::visit::EdgeRef;
use rstar::RTree;
use rstar::primitives::GeomWithData;

/// Safety coefficient assumed for edges that carry none.
pub const DEFAULT_SAFETY: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoNode {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoadEdge {
    pub distance_meters: f64,
    pub safety: f64,
}

impl RoadEdge {
    /// Builds an edge, defaulting a missing safety coefficient and clamping
    /// the rest into `[0, 1]`.
    pub fn new(distance_meters: f64, safety: Option<f64>) -> Self {
        let safety = safety
            .filter(|s| s.is_finite())
            .map_or(DEFAULT_SAFETY, |s| s.clamp(0.0, 1.0));
        Self { distance_meters, safety }
    }
}

type NodeEntry = GeomWithData<[f64; 2], NodeIndex>;

pub struct NavigationGraph {
    pub graph: Graph<GeoNode, RoadEdge>,
    // [lon, lat] points, planar nearest-neighbour in degree space
    index: RTree<NodeEntry>,
}

impl NavigationGraph {
    pub fn new(graph: Graph<GeoNode, RoadEdge>) -> Self {
        let entries = graph
            .node_indices()
            .map(|idx| {
                let node = graph[idx];
                GeomWithData::new([node.lon, node.lat], idx)
            })
            .collect();

        Self {
            graph,
            index: RTree::bulk_load(entries),
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn node(&self, idx: NodeIndex) -> GeoNode {
        self.graph[idx]
    }

    /// Node closest to the given position, `None` only for an empty graph.
    pub fn find_nearest_node(&self, lat: f64, lon: f64) -> Option<NodeIndex> {
        self.index
            .nearest_neighbor(&[lon, lat])
            .map(|entry| entry.data)
    }

    /// Every edge as `(from, to, length_m, safety)`.
    pub fn edges(&self) -> impl Iterator<Item = (NodeIndex, NodeIndex, f64, f64)> + '_ {
        self.graph.edge_references().map(|e| {
            let w = e.weight();
            (e.source(), e.target(), w.distance_meters, w.safety)
        })
    }

    /// The first-loaded edge between two nodes. Parallel edges beyond the
    /// first are ignored when measuring a path.
    pub fn first_edge(&self, from: NodeIndex, to: NodeIndex) -> Option<&RoadEdge> {
        self.graph
            .edges_connecting(from, to)
            .min_by_key(|e| e.id())
            .map(|e| e.weight())
    }
}
