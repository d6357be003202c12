use serde::Serialize;

use crate::amenity::AmenityCounts;

const BASELINE: f64 = 70.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SafetyBreakdown {
    pub reports_nearby: usize,
    pub safe_places_nearby: usize,
    pub police: usize,
    pub hospital: usize,
    pub fire_station: usize,
}

impl SafetyBreakdown {
    pub fn new(reports_nearby: usize, amenities: AmenityCounts) -> Self {
        Self {
            reports_nearby,
            safe_places_nearby: amenities.police + amenities.hospital + amenities.fire_station,
            police: amenities.police,
            hospital: amenities.hospital,
            fire_station: amenities.fire_station,
        }
    }

    /// 0–100 score: baseline 70, up to +20 for police and hospitals, up to +6
    /// for fire stations, down to -60 for nearby reports.
    pub fn score(&self) -> u8 {
        let protective = ((self.police + self.hospital) as f64 * 6.0).min(20.0);
        let fire = (self.fire_station as f64 * 3.0).min(6.0);
        let hazards = (self.reports_nearby as f64 * 10.0).min(60.0);

        (BASELINE + protective + fire - hazards).clamp(0.0, 100.0).round() as u8
    }
}
