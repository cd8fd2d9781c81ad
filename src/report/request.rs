use serde::Serialize;

use crate::models::{Region, RegionId};

/// Where a region's report comes from and what the download is called
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRequest {
    pub region_id: RegionId,
    pub region_name: String,
    /// Fragment address relative to the fragment base, e.g. `data/comuna7.html`
    pub fragment_path: String,
    /// e.g. `Reporte-Villa_Hermosa.pdf`
    pub file_name: String,
}

impl ReportRequest {
    pub fn for_region(region: &Region) -> Self {
        Self {
            region_id: region.id,
            region_name: region.name.clone(),
            fragment_path: fragment_path(region.id),
            file_name: region.report_file_name(),
        }
    }
}

/// Fragment address for a region identifier
pub fn fragment_path(id: RegionId) -> String {
    format!("data/comuna{}.html", id)
}
