use h3o::{CellIndex, LatLng, Resolution};
use std::collections::HashMap;

use crate::hazard::HazardReport;

const RESOLUTION: Resolution = Resolution::Nine;
const REPORT_CELL_RISK: f64 = 1.0;
const NEIGHBOUR_RISK: f64 = 0.5;

// 0.0 = no hazard known, 1.0 = reported hazard in this cell
#[derive(Debug, Default, Clone)]
pub struct SafetyMap {
    cells: HashMap<CellIndex, f64>,
}

impl SafetyMap {
    /// Marks each report's cell as risky and its immediate ring as moderate.
    pub fn from_reports(reports: &[HazardReport]) -> Self {
        let mut cells = HashMap::new();

        for report in reports {
            let Ok(center) = LatLng::new(report.lat, report.lon) else {
                continue;
            };
            let center = center.to_cell(RESOLUTION);

            for neighbour in center.grid_disk::<Vec<_>>(1) {
                let risk = if neighbour == center { REPORT_CELL_RISK } else { NEIGHBOUR_RISK };
                let entry = cells.entry(neighbour).or_insert(0.0);
                *entry = f64::max(*entry, risk);
            }
        }

        Self { cells }
    }

    /// Number of cells carrying any risk.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn get_risk_score(&self, lat: f64, lon: f64) -> f64 {
        let Ok(point) = LatLng::new(lat, lon) else {
            return 0.0;
        };
        self.cells
            .get(&point.to_cell(RESOLUTION))
            .copied()
            .unwrap_or(0.0)
    }
}
