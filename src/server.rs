//! HTTP API over [`RouteEngine`].

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::amenity::PoiService;
use crate::engine::{DEFAULT_CITY, RouteEngine, RoutePlan, RouteRequest, SafeZone};
use crate::error::RouteError;
use crate::graph::source::GraphSource;
use crate::hazard::ReportStore;

pub fn router<G, P, S>(engine: Arc<RouteEngine<G, P, S>>) -> Router
where
    G: GraphSource + 'static,
    P: PoiService + 'static,
    S: ReportStore + 'static,
{
    // Allows a local map page to talk to this API
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/cities", get(list_cities::<G, P, S>))
        .route("/route", get(plan_route::<G, P, S>))
        .route("/report", post(submit_report::<G, P, S>))
        .route("/panic", get(safe_zones::<G, P, S>))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(engine)
}

// --- API DTOs ---

#[derive(Serialize)]
struct CitiesResponse {
    cities: Vec<String>,
}

#[derive(Deserialize)]
struct ReportParams {
    lat: f64,
    lon: f64,
    #[serde(default)]
    note: String,
}

#[derive(Serialize)]
struct ReportResponse {
    status: &'static str,
    lat: f64,
    lon: f64,
    note: String,
}

fn default_city() -> String {
    DEFAULT_CITY.to_string()
}

#[derive(Deserialize)]
struct PanicParams {
    #[serde(default = "default_city")]
    city: String,
    lat: f64,
    lon: f64,
}

#[derive(Serialize)]
struct SafeZonesResponse {
    safe_zones: Vec<SafeZone>,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

pub struct ApiError(RouteError);

impl From<RouteError> for ApiError {
    fn from(err: RouteError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            RouteError::GraphNotFound(_) => StatusCode::NOT_FOUND,
            RouteError::NodeResolutionFailed(_) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        }
        (status, Json(ErrorBody { error: self.0.to_string() })).into_response()
    }
}

// --- Handlers ---

async fn list_cities<G, P, S>(State(engine): State<Arc<RouteEngine<G, P, S>>>) -> Json<CitiesResponse>
where
    G: GraphSource + 'static,
    P: PoiService + 'static,
    S: ReportStore + 'static,
{
    Json(CitiesResponse { cities: engine.cities() })
}

async fn plan_route<G, P, S>(
    State(engine): State<Arc<RouteEngine<G, P, S>>>,
    Query(request): Query<RouteRequest>,
) -> Result<Json<RoutePlan>, ApiError>
where
    G: GraphSource + 'static,
    P: PoiService + 'static,
    S: ReportStore + 'static,
{
    Ok(Json(engine.plan_routes(&request).await?))
}

async fn submit_report<G, P, S>(
    State(engine): State<Arc<RouteEngine<G, P, S>>>,
    Query(params): Query<ReportParams>,
) -> Result<Json<ReportResponse>, ApiError>
where
    G: GraphSource + 'static,
    P: PoiService + 'static,
    S: ReportStore + 'static,
{
    let report = engine.submit_report(params.lat, params.lon, &params.note)?;
    Ok(Json(ReportResponse {
        status: "ok",
        lat: report.lat,
        lon: report.lon,
        note: report.note,
    }))
}

async fn safe_zones<G, P, S>(
    State(engine): State<Arc<RouteEngine<G, P, S>>>,
    Query(params): Query<PanicParams>,
) -> Json<SafeZonesResponse>
where
    G: GraphSource + 'static,
    P: PoiService + 'static,
    S: ReportStore + 'static,
{
    let safe_zones = engine.safe_zones(&params.city, params.lat, params.lon).await;
    Json(SafeZonesResponse { safe_zones })
}
