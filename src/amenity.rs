//! Safety-relevant points of interest near a route.
//!
//! The lookup itself is an external capability ([`PoiService`]); the
//! production implementation talks to an Overpass API endpoint. Payloads are
//! parsed into typed [`AmenityPoint`]s at the boundary, and a failed lookup
//! degrades to "no amenities" instead of failing the request.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::PoiError;

/// Radius around a route's centroid searched for amenities.
pub const AMENITY_RADIUS_M: f64 = 600.0;

pub const OVERPASS_URL: &str = "https://overpass-api.de/api/interpreter";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmenityKind {
    Police,
    Hospital,
    FireStation,
}

impl AmenityKind {
    pub const ALL: [AmenityKind; 3] = [AmenityKind::Police, AmenityKind::Hospital, AmenityKind::FireStation];

    pub fn as_tag(self) -> &'static str {
        match self {
            AmenityKind::Police => "police",
            AmenityKind::Hospital => "hospital",
            AmenityKind::FireStation => "fire_station",
        }
    }

    /// Case-insensitive match of an OSM `amenity` tag value.
    pub fn from_tag(tag: &str) -> Option<Self> {
        let tag = tag.trim();
        Self::ALL.into_iter().find(|kind| kind.as_tag().eq_ignore_ascii_case(tag))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AmenityPoint {
    pub lat: f64,
    pub lon: f64,
    pub kind: AmenityKind,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Nearby point-of-interest lookup.
pub trait PoiService: Send + Sync {
    fn query(
        &self,
        lat: f64,
        lon: f64,
        radius_m: f64,
        categories: &[AmenityKind],
    ) -> impl Future<Output = Result<Vec<AmenityPoint>, PoiError>> + Send;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AmenityCounts {
    pub police: usize,
    pub hospital: usize,
    pub fire_station: usize,
}

impl AmenityCounts {
    pub fn tally(points: &[AmenityPoint]) -> Self {
        points.iter().fold(Self::default(), |mut counts, point| {
            match point.kind {
                AmenityKind::Police => counts.police += 1,
                AmenityKind::Hospital => counts.hospital += 1,
                AmenityKind::FireStation => counts.fire_station += 1,
            }
            counts
        })
    }
}

/// Arithmetic mean of latitudes and of longitudes.
pub fn centroid(coords: &[[f64; 2]]) -> Option<[f64; 2]> {
    if coords.is_empty() {
        return None;
    }
    let n = coords.len() as f64;
    let (lat_sum, lon_sum) = coords
        .iter()
        .fold((0.0, 0.0), |(lat, lon), p| (lat + p[0], lon + p[1]));
    Some([lat_sum / n, lon_sum / n])
}

/// Police, hospitals and fire stations within `radius_m` of the route's
/// centroid. Any lookup failure yields zero counts.
pub async fn nearby_amenity_counts<P: PoiService>(
    poi: &P,
    coords: &[[f64; 2]],
    radius_m: f64,
) -> AmenityCounts {
    let Some([lat, lon]) = centroid(coords) else {
        return AmenityCounts::default();
    };

    match poi.query(lat, lon, radius_m, &AmenityKind::ALL).await {
        Ok(points) => AmenityCounts::tally(&points),
        Err(e) => {
            tracing::warn!(error = %e, lat, lon, "amenity lookup degraded, counting none");
            AmenityCounts::default()
        }
    }
}

// --- Overpass ---

pub struct OverpassClient {
    client: reqwest::Client,
    url: String,
}

impl OverpassClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, PoiError> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .user_agent(concat!("saferoute/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, url: url.into() })
    }
}

pub fn overpass_query(lat: f64, lon: f64, radius_m: f64, categories: &[AmenityKind]) -> String {
    let pattern = categories.iter().map(|k| k.as_tag()).collect::<Vec<_>>().join("|");
    let radius = radius_m.round() as i64;
    format!(
        r#"[out:json][timeout:25];
(
  node(around:{radius},{lat},{lon})["amenity"~"{pattern}"];
  way(around:{radius},{lat},{lon})["amenity"~"{pattern}"];
  relation(around:{radius},{lat},{lon})["amenity"~"{pattern}"];
);
out center tags;"#
    )
}

impl PoiService for OverpassClient {
    async fn query(
        &self,
        lat: f64,
        lon: f64,
        radius_m: f64,
        categories: &[AmenityKind],
    ) -> Result<Vec<AmenityPoint>, PoiError> {
        let query = overpass_query(lat, lon, radius_m, categories);
        tracing::debug!(%query, "overpass query");

        let response = self
            .client
            .post(&self.url)
            .form(&[("data", query)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(PoiError::Status(response.status().as_u16()));
        }

        let body = response.text().await?;
        let points = parse_overpass(&body, categories)?;
        tracing::debug!(count = points.len(), "overpass amenities");
        Ok(points)
    }
}

#[derive(Deserialize)]
struct OverpassResponse {
    #[serde(default)]
    elements: Vec<OverpassElement>,
}

#[derive(Deserialize)]
struct OverpassElement {
    #[serde(rename = "type")]
    element_type: String,
    lat: Option<f64>,
    lon: Option<f64>,
    center: Option<OverpassCenter>,
    #[serde(default)]
    tags: HashMap<String, serde_json::Value>,
}

#[derive(Deserialize)]
struct OverpassCenter {
    lat: f64,
    lon: f64,
}

/// Parses an Overpass JSON payload, keeping only elements with a position and
/// an `amenity` tag among `categories`.
pub fn parse_overpass(body: &str, categories: &[AmenityKind]) -> Result<Vec<AmenityPoint>, PoiError> {
    let response: OverpassResponse =
        serde_json::from_str(body).map_err(|e| PoiError::Malformed(e.to_string()))?;

    Ok(response
        .elements
        .into_iter()
        .filter_map(|element| {
            let (lat, lon) = match (element.element_type.as_str(), element.lat, element.lon) {
                ("node", Some(lat), Some(lon)) => (lat, lon),
                _ => element.center.as_ref().map(|c| (c.lat, c.lon))?,
            };
            if !lat.is_finite() || !lon.is_finite() {
                return None;
            }

            let tags = Tags(&element.tags);
            let kind = AmenityKind::from_tag(tags.get("amenity")?)?;
            if !categories.contains(&kind) {
                return None;
            }

            Some(AmenityPoint {
                lat,
                lon,
                kind,
                name: tags.get("name").map(str::to_string),
                phone: tags
                    .first_of(&["phone", "contact:phone", "phone:mobile"])
                    .map(str::to_string),
                address: tags.address(),
            })
        })
        .collect())
}

// Tag values of unknown shape; only non-empty strings are read.
struct Tags<'a>(&'a HashMap<String, serde_json::Value>);

impl<'a> Tags<'a> {
    fn get(&self, key: &str) -> Option<&'a str> {
        self.0
            .get(key)
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    fn first_of(&self, keys: &[&str]) -> Option<&'a str> {
        keys.iter().find_map(|key| self.get(key))
    }

    fn address(&self) -> Option<String> {
        if let Some(full) = self.get("addr:full") {
            return Some(full.to_string());
        }
        let parts: Vec<&str> = ["addr:housenumber", "addr:street", "addr:city"]
            .iter()
            .filter_map(|key| self.get(key))
            .collect();
        (!parts.is_empty()).then(|| parts.join(", "))
    }
}
