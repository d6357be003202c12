//! Edge weights for the two route flavours.
//!
//! Weights are pure functions of an edge's immutable length and safety. They
//! are evaluated on demand by the route finder and never written back onto the
//! shared graph, so concurrent requests can route under different models.

use crate::graph::RoadEdge;

/// Multiplier applied to `(1 - safety)`; a fully unsafe edge costs six times
/// its length.
pub const RISK_FACTOR: f64 = 5.0;

pub fn fast_weight(length: f64, _safety: f64) -> f64 {
    length
}

pub fn risk_weight(length: f64, safety: f64) -> f64 {
    length * (1.0 + (1.0 - safety) * RISK_FACTOR)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CostModel {
    Fastest,
    Safest,
}

impl CostModel {
    pub fn weight(self, edge: &RoadEdge) -> f64 {
        match self {
            CostModel::Fastest => fast_weight(edge.distance_meters, edge.safety),
            CostModel::Safest => risk_weight(edge.distance_meters, edge.safety),
        }
    }
}
