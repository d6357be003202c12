//! Single-pair Dijkstra over a [`NavigationGraph`] under a caller-chosen
//! [`CostModel`].

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;

use crate::cost::CostModel;
use crate::graph::NavigationGraph;

/// Result of a shortest-path search. Unreachability is an outcome, not an
/// error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathOutcome {
    Found(Vec<NodeIndex>),
    Unreachable,
}

impl PathOutcome {
    pub fn nodes(&self) -> Option<&[NodeIndex]> {
        match self {
            PathOutcome::Found(nodes) => Some(nodes),
            PathOutcome::Unreachable => None,
        }
    }

    pub fn is_unreachable(&self) -> bool {
        matches!(self, PathOutcome::Unreachable)
    }
}

#[derive(Copy, Clone, PartialEq)]
struct State {
    cost: f64,
    node: NodeIndex,
}

impl Eq for State {}

// Min-heap by cost, then by node index so equal-cost ties pop in a fixed order.
impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Cheapest path from `source` to `target` with every edge weighed by `model`.
///
/// Distances and predecessors live in per-call buffers, so two searches over
/// the same graph with different models never observe each other. For a fixed
/// graph and model the same path is returned on every call. Edges whose weight
/// is not finite are impassable.
pub fn shortest_path(
    nav: &NavigationGraph,
    source: NodeIndex,
    target: NodeIndex,
    model: CostModel,
) -> PathOutcome {
    let n = nav.node_count();
    if source.index() >= n || target.index() >= n {
        return PathOutcome::Unreachable;
    }
    if source == target {
        return PathOutcome::Found(vec![source]);
    }

    let mut dist = vec![f64::INFINITY; n];
    let mut prev: Vec<Option<NodeIndex>> = vec![None; n];
    let mut heap = BinaryHeap::new();

    dist[source.index()] = 0.0;
    heap.push(State { cost: 0.0, node: source });

    while let Some(State { cost, node }) = heap.pop() {
        if node == target {
            return PathOutcome::Found(reconstruct(&prev, source, target));
        }

        // Skip stale heap entries
        if cost > dist[node.index()] {
            continue;
        }

        for edge in nav.graph.edges(node) {
            let weight = model.weight(edge.weight());
            if !weight.is_finite() {
                continue;
            }
            let next = edge.target();
            let next_cost = cost + weight;

            if next_cost < dist[next.index()] {
                dist[next.index()] = next_cost;
                prev[next.index()] = Some(node);
                heap.push(State { cost: next_cost, node: next });
            }
        }
    }

    PathOutcome::Unreachable
}

fn reconstruct(prev: &[Option<NodeIndex>], source: NodeIndex, target: NodeIndex) -> Vec<NodeIndex> {
    let mut path = vec![target];
    let mut current = target;
    while current != source {
        match prev[current.index()] {
            Some(p) => {
                path.push(p);
                current = p;
            }
            None => break,
        }
    }
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{GeoNode, RoadEdge};
    use petgraph::graph::Graph;

    fn single_edge(safety: f64) -> (NavigationGraph, NodeIndex, NodeIndex) {
        let mut g = Graph::new();
        let a = g.add_node(GeoNode { lat: 12.970, lon: 77.590 });
        let b = g.add_node(GeoNode { lat: 12.979, lon: 77.590 });
        g.add_edge(a, b, RoadEdge::new(1000.0, Some(safety)));
        (NavigationGraph::new(g), a, b)
    }

    /// A → B → D is short but unsafe; A → C → D is longer and safe.
    ///
    ///   A --100 (0.0)--> B --100 (0.0)--> D
    ///   A --150 (1.0)--> C --150 (1.0)--> D
    fn diamond() -> (NavigationGraph, [NodeIndex; 4]) {
        let mut g = Graph::new();
        let a = g.add_node(GeoNode { lat: 0.0, lon: 0.0 });
        let b = g.add_node(GeoNode { lat: 0.001, lon: 0.0 });
        let c = g.add_node(GeoNode { lat: 0.0, lon: 0.001 });
        let d = g.add_node(GeoNode { lat: 0.001, lon: 0.001 });
        g.add_edge(a, b, RoadEdge::new(100.0, Some(0.0)));
        g.add_edge(b, d, RoadEdge::new(100.0, Some(0.0)));
        g.add_edge(a, c, RoadEdge::new(150.0, Some(1.0)));
        g.add_edge(c, d, RoadEdge::new(150.0, Some(1.0)));
        (NavigationGraph::new(g), [a, b, c, d])
    }

    #[test]
    fn single_edge_is_both_fastest_and_safest() {
        for safety in [0.0, 1.0] {
            let (nav, a, b) = single_edge(safety);
            assert_eq!(shortest_path(&nav, a, b, CostModel::Fastest), PathOutcome::Found(vec![a, b]));
            assert_eq!(shortest_path(&nav, a, b, CostModel::Safest), PathOutcome::Found(vec![a, b]));
        }
    }

    #[test]
    fn models_pick_different_paths() {
        let (nav, [a, b, c, d]) = diamond();
        assert_eq!(shortest_path(&nav, a, d, CostModel::Fastest), PathOutcome::Found(vec![a, b, d]));
        assert_eq!(shortest_path(&nav, a, d, CostModel::Safest), PathOutcome::Found(vec![a, c, d]));
    }

    #[test]
    fn much_shorter_unsafe_edge_still_wins() {
        let mut g = Graph::new();
        let a = g.add_node(GeoNode { lat: 0.0, lon: 0.0 });
        let b = g.add_node(GeoNode { lat: 0.0, lon: 0.01 });
        g.add_edge(a, b, RoadEdge::new(100.0, Some(0.0))); // risk 600
        g.add_edge(a, b, RoadEdge::new(700.0, Some(1.0))); // risk 700
        let nav = NavigationGraph::new(g);
        assert_eq!(shortest_path(&nav, a, b, CostModel::Safest), PathOutcome::Found(vec![a, b]));
    }

    #[test]
    fn disconnected_nodes_are_unreachable() {
        let (nav, a, b) = single_edge(1.0);
        assert!(shortest_path(&nav, b, a, CostModel::Fastest).is_unreachable());
        assert_eq!(shortest_path(&nav, b, a, CostModel::Safest).nodes(), None);
    }

    #[test]
    fn overflowing_weight_is_impassable() {
        let mut g = Graph::new();
        let a = g.add_node(GeoNode { lat: 0.0, lon: 0.0 });
        let b = g.add_node(GeoNode { lat: 0.0, lon: 0.01 });
        g.add_edge(a, b, RoadEdge::new(1e308, Some(0.0)));
        let nav = NavigationGraph::new(g);
        assert_eq!(shortest_path(&nav, a, b, CostModel::Fastest), PathOutcome::Found(vec![a, b]));
        assert!(shortest_path(&nav, a, b, CostModel::Safest).is_unreachable());
    }

    #[test]
    fn source_equals_target_is_a_single_node_path() {
        let (nav, a, _) = single_edge(1.0);
        assert_eq!(shortest_path(&nav, a, a, CostModel::Safest), PathOutcome::Found(vec![a]));
    }

    #[test]
    fn equal_cost_ties_resolve_the_same_way_every_time() {
        let mut g = Graph::new();
        let a = g.add_node(GeoNode { lat: 0.0, lon: 0.0 });
        let b = g.add_node(GeoNode { lat: 0.001, lon: 0.0 });
        let c = g.add_node(GeoNode { lat: 0.0, lon: 0.001 });
        let d = g.add_node(GeoNode { lat: 0.001, lon: 0.001 });
        for (from, to) in [(a, b), (b, d), (a, c), (c, d)] {
            g.add_edge(from, to, RoadEdge::new(100.0, Some(0.5)));
        }
        let nav = NavigationGraph::new(g);

        let first = shortest_path(&nav, a, d, CostModel::Safest);
        for _ in 0..10 {
            assert_eq!(shortest_path(&nav, a, d, CostModel::Safest), first);
        }
    }
}
