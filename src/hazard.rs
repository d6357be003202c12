//! User-submitted hazard reports and matching them against route geometry.

use std::fs::{self, File, OpenOptions};
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Mutex;

use geo::Point;
use geo::prelude::*;
use rstar::primitives::GeomWithData;
use rstar::{AABB, RTree};

use crate::error::StoreError;

/// Distance within which a report counts against a route.
pub const HAZARD_RADIUS_M: f64 = 150.0;

const METERS_PER_DEGREE_LAT: f64 = 111_320.0;

#[derive(Debug, Clone, PartialEq)]
pub struct HazardReport {
    pub lat: f64,
    pub lon: f64,
    pub note: String,
}

/// Append-only storage of hazard reports. Readers accept whatever snapshot is
/// current when they read.
pub trait ReportStore: Send + Sync {
    fn append(&self, report: &HazardReport) -> Result<(), StoreError>;
    fn read_all(&self) -> Result<Vec<HazardReport>, StoreError>;
}

/// Header-less `lat,lon,note` CSV file.
pub struct CsvReportStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl CsvReportStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }
}

impl ReportStore for CsvReportStore {
    fn append(&self, report: &HazardReport) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        writer.serialize((report.lat, report.lon, &report.note))?;
        writer.flush()?;
        Ok(())
    }

    fn read_all(&self) -> Result<Vec<HazardReport>, StoreError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(file);

        // malformed rows are skipped, not fatal
        Ok(reader
            .records()
            .filter_map(|record| record.ok())
            .filter_map(|record| {
                let lat = record.get(0)?.trim().parse::<f64>().ok()?;
                let lon = record.get(1)?.trim().parse::<f64>().ok()?;
                let note = record.get(2)?.to_string();
                Some(HazardReport { lat, lon, note })
            })
            .collect())
    }
}

/// Number of reports lying within `radius_m` of at least one route point.
/// Each report counts once however many points are near it.
pub fn nearby_report_count(coords: &[[f64; 2]], reports: &[HazardReport], radius_m: f64) -> usize {
    if coords.is_empty() || reports.is_empty() {
        return 0;
    }

    // [lon, lat] so envelopes line up with degree offsets below
    let points: Vec<GeomWithData<[f64; 2], Point>> = coords
        .iter()
        .map(|&[lat, lon]| GeomWithData::new([lon, lat], Point::new(lon, lat)))
        .collect();
    let tree = RTree::bulk_load(points);

    reports
        .iter()
        .filter(|report| {
            let center = Point::new(report.lon, report.lat);
            search_envelopes(report.lat, report.lon, radius_m)
                .iter()
                .flat_map(|envelope| tree.locate_in_envelope(envelope))
                .any(|p| p.data.haversine_distance(&center) <= radius_m)
        })
        .count()
}

// Degree boxes that together contain every point within `radius_m` of the
// centre. A box crossing ±180° longitude is split in two.
fn search_envelopes(lat: f64, lon: f64, radius_m: f64) -> Vec<AABB<[f64; 2]>> {
    let d_lat = radius_m / METERS_PER_DEGREE_LAT * 1.01;
    let cos_lat = lat.to_radians().cos().abs().max(1e-6);
    let d_lon = (radius_m / (METERS_PER_DEGREE_LAT * cos_lat) * 1.01).min(180.0);
    let (south, north) = (lat - d_lat, lat + d_lat);
    let (west, east) = (lon - d_lon, lon + d_lon);

    let mut boxes = vec![AABB::from_corners([west.max(-180.0), south], [east.min(180.0), north])];
    if west < -180.0 {
        boxes.push(AABB::from_corners([west + 360.0, south], [180.0, north]));
    }
    if east > 180.0 {
        boxes.push(AABB::from_corners([-180.0, south], [east - 360.0, north]));
    }
    boxes
}
