use thiserror::Error;

/// Failures while resolving a city graph from its source.
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("graph not found for city `{city}`")]
    NotFound { city: String },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed graph file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("OSM PBF error: {0}")]
    Pbf(#[from] osmpbf::Error),
    #[error("invalid graph data: {0}")]
    InvalidData(String),
}

/// Failures of the hazard report store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Failures of the point-of-interest lookup. Never fatal for a route request.
#[derive(Error, Debug)]
pub enum PoiError {
    #[error("POI request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("POI service returned status {0}")]
    Status(u16),
    #[error("malformed POI payload: {0}")]
    Malformed(String),
}

/// Terminal failures of a request. Unreachable paths and degraded external
/// lookups are not represented here.
#[derive(Error, Debug)]
pub enum RouteError {
    #[error("graph not found for city `{0}`")]
    GraphNotFound(String),
    #[error("failed to load graph: {0}")]
    GraphLoad(GraphError),
    #[error("could not resolve a graph node: {0}")]
    NodeResolutionFailed(String),
    #[error("failed to persist report: {0}")]
    Persistence(#[from] StoreError),
    #[error("routing task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl From<GraphError> for RouteError {
    fn from(err: GraphError) -> Self {
        match err {
            GraphError::NotFound { city } => RouteError::GraphNotFound(city),
            other => RouteError::GraphLoad(other),
        }
    }
}
