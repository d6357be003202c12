//! Safety-aware dual routing: for a start and end point in a city, the
//! fastest and the safest route, each with a 0–100 safety score and a
//! breakdown of nearby hazard reports and safe amenities.
//!
//! | Module       | Contents                                               |
//! |--------------|--------------------------------------------------------|
//! | [`graph`]    | `NavigationGraph`, graph sources, the city graph cache |
//! | [`cost`]     | fastest / risk-weighted edge costs                      |
//! | [`routing`]  | Dijkstra, `PathOutcome`                                 |
//! | [`path`]     | coordinates, distance and time of a node path           |
//! | [`hazard`]   | hazard reports, their store, route matching             |
//! | [`amenity`]  | POI lookup (Overpass) and amenity counts                |
//! | [`score`]    | `SafetyBreakdown` and the 0–100 score                   |
//! | [`safety`]   | H3 hazard cells used when deriving edge safety         |
//! | [`engine`]   | `RouteEngine`, the per-request orchestration            |
//! | [`server`]   | axum HTTP API                                           |

pub mod amenity;
pub mod config;
pub mod cost;
pub mod engine;
pub mod error;
pub mod graph;
pub mod hazard;
pub mod path;
pub mod routing;
pub mod safety;
pub mod score;
pub mod server;

pub use engine::{EngineConfig, RouteEngine, RoutePlan, RouteRequest, RouteResult, SafeZone};
pub use error::{GraphError, PoiError, RouteError, StoreError};
