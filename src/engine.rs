//! Request orchestration: two routes per request, each scored independently.

use std::sync::Arc;

use geo::Point;
use geo::prelude::*;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::amenity::{AMENITY_RADIUS_M, AmenityKind, PoiService, nearby_amenity_counts};
use crate::cost::CostModel;
use crate::error::RouteError;
use crate::graph::cache::GraphCache;
use crate::graph::source::GraphSource;
use crate::hazard::{HAZARD_RADIUS_M, HazardReport, ReportStore, nearby_report_count};
use crate::path::{AVERAGE_SPEED_KMH, RouteGeometry, materialize, round_to};
use crate::routing::shortest_path;
use crate::score::SafetyBreakdown;

pub const DEFAULT_CITY: &str = "bengaluru";

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub hazard_radius_m: f64,
    pub amenity_radius_m: f64,
    /// Search radius for emergency safe zones.
    pub panic_radius_m: f64,
    pub panic_limit: usize,
    /// Travel time is distance at this constant speed.
    pub average_speed_kmh: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            hazard_radius_m: HAZARD_RADIUS_M,
            amenity_radius_m: AMENITY_RADIUS_M,
            panic_radius_m: 2000.0,
            panic_limit: 12,
            average_speed_kmh: AVERAGE_SPEED_KMH,
        }
    }
}

fn default_city() -> String {
    DEFAULT_CITY.to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct RouteRequest {
    #[serde(default = "default_city")]
    pub city: String,
    pub src_lat: f64,
    pub src_lon: f64,
    pub dst_lat: f64,
    pub dst_lon: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteResult {
    pub coords: Vec<[f64; 2]>,
    pub distance_km: f64,
    pub time_min: f64,
    pub safety_score: u8,
    pub breakdown: SafetyBreakdown,
    /// Set on the safest route when it had to reuse the fastest geometry.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub fallback: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutePlan {
    pub fastest: RouteResult,
    pub safest: RouteResult,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SafeZone {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub distance_m: f64,
}

struct Geometries {
    fastest: RouteGeometry,
    safest: RouteGeometry,
    fallback: bool,
}

pub struct RouteEngine<G, P, S> {
    graphs: Arc<GraphCache<G>>,
    poi: P,
    reports: S,
    config: EngineConfig,
}

impl<G, P, S> RouteEngine<G, P, S>
where
    G: GraphSource + 'static,
    P: PoiService,
    S: ReportStore,
{
    pub fn new(graphs: GraphCache<G>, poi: P, reports: S, config: EngineConfig) -> Self {
        Self {
            graphs: Arc::new(graphs),
            poi,
            reports,
            config,
        }
    }

    pub fn cities(&self) -> Vec<String> {
        self.graphs.cities()
    }

    pub fn poi(&self) -> &P {
        &self.poi
    }

    /// Fastest and safest routes for one request.
    ///
    /// Fails only when the city graph or its nodes cannot be resolved. An
    /// unreachable path yields an empty route; an unreachable safest path with
    /// a reachable fastest one reuses the fastest geometry.
    pub async fn plan_routes(&self, request: &RouteRequest) -> Result<RoutePlan, RouteError> {
        let graphs = Arc::clone(&self.graphs);
        let req = request.clone();
        let speed_kmh = self.config.average_speed_kmh;
        let Geometries { fastest, safest, fallback } =
            tokio::task::spawn_blocking(move || compute_geometries(&graphs, &req, speed_kmh)).await??;

        let reports = if fastest.is_empty() && safest.is_empty() {
            Vec::new()
        } else {
            self.read_reports()
        };

        let (fastest, safest) = tokio::join!(
            self.score_route(fastest, &reports, false),
            self.score_route(safest, &reports, fallback),
        );

        tracing::info!(
            city = %request.city,
            fastest_points = fastest.coords.len(),
            fastest_score = fastest.safety_score,
            safest_points = safest.coords.len(),
            safest_score = safest.safety_score,
            fallback,
            "planned routes"
        );
        Ok(RoutePlan { fastest, safest })
    }

    pub fn submit_report(&self, lat: f64, lon: f64, note: &str) -> Result<HazardReport, RouteError> {
        let report = HazardReport { lat, lon, note: note.to_string() };
        self.reports.append(&report)?;
        tracing::info!(lat, lon, "hazard report stored");
        Ok(report)
    }

    /// Nearest police, hospitals and fire stations around a position, closest
    /// first. Without any, the nearest road node of the city graph stands in.
    pub async fn safe_zones(&self, city: &str, lat: f64, lon: f64) -> Vec<SafeZone> {
        let origin = Point::new(lon, lat);
        let points = match self
            .poi
            .query(lat, lon, self.config.panic_radius_m, &AmenityKind::ALL)
            .await
        {
            Ok(points) => points,
            Err(e) => {
                tracing::warn!(error = %e, lat, lon, "safe zone lookup degraded");
                Vec::new()
            }
        };

        if points.is_empty() {
            return self.nearest_road_zone(city, lat, lon).await.into_iter().collect();
        }

        points
            .into_iter()
            .map(|p| {
                let distance = Point::new(p.lon, p.lat).haversine_distance(&origin);
                SafeZone {
                    kind: p.kind.as_tag().to_string(),
                    name: p.name.unwrap_or_else(|| "Unnamed".to_string()),
                    lat: p.lat,
                    lon: p.lon,
                    address: p.address,
                    phone: p.phone,
                    distance_m: distance,
                }
            })
            .sorted_by(|a, b| a.distance_m.total_cmp(&b.distance_m))
            .take(self.config.panic_limit)
            .map(|zone| SafeZone { distance_m: round_to(zone.distance_m, 1), ..zone })
            .collect()
    }

    async fn nearest_road_zone(&self, city: &str, lat: f64, lon: f64) -> Option<SafeZone> {
        let graphs = Arc::clone(&self.graphs);
        let key = city.to_string();
        let nav = match tokio::task::spawn_blocking(move || graphs.load(&key)).await {
            Ok(Ok(nav)) => nav,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, city, "no graph for safe zone fallback");
                return None;
            }
            Err(e) => {
                tracing::warn!(error = %e, city, "safe zone fallback task failed");
                return None;
            }
        };

        let node = nav.node(nav.find_nearest_node(lat, lon)?);
        let distance = Point::new(node.lon, node.lat).haversine_distance(&Point::new(lon, lat));
        Some(SafeZone {
            kind: "road".to_string(),
            name: "Nearest Road Node".to_string(),
            lat: node.lat,
            lon: node.lon,
            address: None,
            phone: None,
            distance_m: round_to(distance, 1),
        })
    }

    fn read_reports(&self) -> Vec<HazardReport> {
        self.reports.read_all().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "report store unreadable, matching no hazards");
            Vec::new()
        })
    }

    async fn score_route(
        &self,
        geometry: RouteGeometry,
        reports: &[HazardReport],
        fallback: bool,
    ) -> RouteResult {
        let reports_nearby = nearby_report_count(&geometry.coords, reports, self.config.hazard_radius_m);
        let amenities =
            nearby_amenity_counts(&self.poi, &geometry.coords, self.config.amenity_radius_m).await;
        let breakdown = SafetyBreakdown::new(reports_nearby, amenities);

        RouteResult {
            coords: geometry.coords,
            distance_km: geometry.distance_km,
            time_min: geometry.time_min,
            safety_score: breakdown.score(),
            breakdown,
            fallback,
        }
    }
}

fn compute_geometries<G: GraphSource>(
    graphs: &GraphCache<G>,
    request: &RouteRequest,
    speed_kmh: f64,
) -> Result<Geometries, RouteError> {
    let nav = graphs.load(&request.city)?;

    let no_nodes = || RouteError::NodeResolutionFailed(format!("graph for `{}` has no nodes", request.city));
    let source = nav.find_nearest_node(request.src_lat, request.src_lon).ok_or_else(no_nodes)?;
    let target = nav.find_nearest_node(request.dst_lat, request.dst_lon).ok_or_else(no_nodes)?;

    let fastest_path = shortest_path(&nav, source, target, CostModel::Fastest);
    let safest_path = shortest_path(&nav, source, target, CostModel::Safest);

    let fastest = fastest_path
        .nodes()
        .map(|nodes| materialize(&nav, nodes, speed_kmh))
        .unwrap_or_default();

    let (safest, fallback) = match safest_path.nodes() {
        Some(nodes) => (materialize(&nav, nodes, speed_kmh), false),
        None if !fastest_path.is_unreachable() => {
            tracing::info!(city = %request.city, "no safest path, falling back to fastest geometry");
            (fastest.clone(), true)
        }
        None => {
            tracing::info!(city = %request.city, "destination unreachable from source");
            (RouteGeometry::default(), false)
        }
    };

    Ok(Geometries { fastest, safest, fallback })
}
