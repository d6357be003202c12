//! Turning a node sequence into geometry, distance and travel time.

use itertools::Itertools;
use petgraph::graph::NodeIndex;

use crate::graph::NavigationGraph;

/// Default average speed; travel time is not derived from speed limits.
pub const AVERAGE_SPEED_KMH: f64 = 30.0;

/// Geometry and measurements of one route. Coordinates are `[lat, lon]`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteGeometry {
    pub coords: Vec<[f64; 2]>,
    pub distance_km: f64,
    pub time_min: f64,
}

impl RouteGeometry {
    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }
}

/// Coordinates and measurements of a node path, timed at `speed_kmh`.
pub fn materialize(nav: &NavigationGraph, nodes: &[NodeIndex], speed_kmh: f64) -> RouteGeometry {
    let coords = normalize_lat_lon(
        nodes
            .iter()
            .map(|&idx| {
                let node = nav.node(idx);
                [node.lat, node.lon]
            })
            .collect(),
    );

    // Parallel edges: only the first-loaded one between a pair is measured.
    let meters: f64 = nodes
        .iter()
        .tuple_windows()
        .filter_map(|(&a, &b)| nav.first_edge(a, b))
        .map(|edge| edge.distance_meters)
        .sum();

    let distance_km = meters / 1000.0;
    let time_min = distance_km / speed_kmh * 60.0;

    RouteGeometry {
        coords,
        distance_km: round_to(distance_km, 2),
        time_min: round_to(time_min, 1),
    }
}

/// Puts every point in `[lat, lon]` order. A point whose first component
/// cannot be a latitude while its second can is taken to be swapped.
pub fn normalize_lat_lon(coords: Vec<[f64; 2]>) -> Vec<[f64; 2]> {
    coords
        .into_iter()
        .map(|[a, b]| if a.abs() > 90.0 && b.abs() <= 90.0 { [b, a] } else { [a, b] })
        .collect()
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{GeoNode, RoadEdge};
    use petgraph::graph::Graph;

    #[test]
    fn one_kilometre_takes_two_minutes() {
        let mut g = Graph::new();
        let a = g.add_node(GeoNode { lat: 12.970, lon: 77.590 });
        let b = g.add_node(GeoNode { lat: 12.979, lon: 77.590 });
        g.add_edge(a, b, RoadEdge::new(1000.0, Some(1.0)));
        let nav = NavigationGraph::new(g);

        let geometry = materialize(&nav, &[a, b], AVERAGE_SPEED_KMH);
        assert_eq!(geometry.coords, vec![[12.970, 77.590], [12.979, 77.590]]);
        assert_eq!(geometry.distance_km, 1.0);
        assert_eq!(geometry.time_min, 2.0);
    }

    #[test]
    fn measures_first_parallel_edge_and_rounds() {
        let mut g = Graph::new();
        let a = g.add_node(GeoNode { lat: 0.0, lon: 0.0 });
        let b = g.add_node(GeoNode { lat: 0.0, lon: 0.01 });
        let c = g.add_node(GeoNode { lat: 0.0, lon: 0.02 });
        g.add_edge(a, b, RoadEdge::new(1234.0, None));
        g.add_edge(a, b, RoadEdge::new(10.0, None));
        g.add_edge(b, c, RoadEdge::new(333.0, None));
        let nav = NavigationGraph::new(g);

        let geometry = materialize(&nav, &[a, b, c], AVERAGE_SPEED_KMH);
        // 1.567 km at 30 km/h = 3.134 min
        assert_eq!(geometry.distance_km, 1.57);
        assert_eq!(geometry.time_min, 3.1);
    }

    #[test]
    fn short_sequences_have_no_length() {
        let mut g = Graph::new();
        let a = g.add_node(GeoNode { lat: 1.0, lon: 2.0 });
        let nav = NavigationGraph::new(g);

        let empty = materialize(&nav, &[], AVERAGE_SPEED_KMH);
        assert!(empty.is_empty());
        assert_eq!((empty.distance_km, empty.time_min), (0.0, 0.0));

        let single = materialize(&nav, &[a], AVERAGE_SPEED_KMH);
        assert_eq!(single.coords, vec![[1.0, 2.0]]);
        assert_eq!((single.distance_km, single.time_min), (0.0, 0.0));
    }

    #[test]
    fn slower_speed_takes_longer() {
        let mut g = Graph::new();
        let a = g.add_node(GeoNode { lat: 12.970, lon: 77.590 });
        let b = g.add_node(GeoNode { lat: 12.979, lon: 77.590 });
        g.add_edge(a, b, RoadEdge::new(1000.0, Some(1.0)));
        let nav = NavigationGraph::new(g);

        let geometry = materialize(&nav, &[a, b], 5.0);
        assert_eq!(geometry.distance_km, 1.0);
        assert_eq!(geometry.time_min, 12.0);
    }

    #[test]
    fn swapped_points_are_corrected() {
        let fixed = normalize_lat_lon(vec![
            [100.0, 12.97],
            [-120.5, 45.0],
            [77.59, 12.97],
            [12.97, 77.59],
            [90.0, 45.0],
            [95.0, 100.0],
        ]);
        assert_eq!(
            fixed,
            vec![
                [12.97, 100.0],
                [45.0, -120.5],
                [77.59, 12.97],
                [12.97, 77.59],
                [90.0, 45.0],
                [95.0, 100.0],
            ]
        );
    }
}
