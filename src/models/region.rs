//! Administrative region types: comunas (polygons) and corregimientos (points).

use geo::{BoundingRect, Coord, LineString, Rect};
use serde::{Deserialize, Serialize};

/// Identifiers at or above this value are corregimientos.
pub const CORREGIMIENTO_THRESHOLD: u32 = 50;

/// Numeric region identifier (`IDENTIFICADOR` in the dataset)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionId(pub u32);

impl RegionId {
    /// Parse a dataset identifier such as `"07"` or `" 60 "`
    pub fn parse(raw: &str) -> Option<Self> {
        raw.trim().parse().ok().map(RegionId)
    }

    pub fn class(&self) -> RegionClass {
        RegionClass::from_id(*self)
    }
}

impl std::fmt::Display for RegionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Positional id of a feature in the loaded collection.
///
/// Matches the map engine's generated feature ids, so hover state can be
/// addressed with it directly.
pub type FeatureId = usize;

/// Urban vs rural subdivision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionClass {
    /// Urban subdivision, drawn as a polygon (id < 50)
    Comuna,
    /// Rural subdivision, drawn as a marker (id >= 50)
    Corregimiento,
}

impl RegionClass {
    pub fn from_id(id: RegionId) -> Self {
        if id.0 < CORREGIMIENTO_THRESHOLD {
            RegionClass::Comuna
        } else {
            RegionClass::Corregimiento
        }
    }
}

/// Region geometry as published in the dataset
#[derive(Debug, Clone, PartialEq)]
pub enum RegionGeometry {
    /// Outer ring, (lon, lat) vertices. The closing vertex may or may not be repeated.
    Polygon(Vec<Coord<f64>>),
    /// Single (lon, lat) location
    Point(Coord<f64>),
}

impl RegionGeometry {
    pub fn is_polygon(&self) -> bool {
        matches!(self, RegionGeometry::Polygon(_))
    }

    /// Bounding rectangle. `None` for an empty ring.
    pub fn bounding_rect(&self) -> Option<Rect<f64>> {
        match self {
            RegionGeometry::Polygon(ring) => LineString::from(ring.clone()).bounding_rect(),
            RegionGeometry::Point(c) => Some(Rect::new(*c, *c)),
        }
    }
}

/// A single administrative region
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub id: RegionId,
    pub name: String,
    pub geometry: RegionGeometry,
}

impl Region {
    pub fn new(id: RegionId, name: impl Into<String>, geometry: RegionGeometry) -> Self {
        Self {
            id,
            name: name.into(),
            geometry,
        }
    }

    pub fn class(&self) -> RegionClass {
        self.id.class()
    }

    /// Outer ring, if this region is a polygon
    pub fn ring(&self) -> Option<&[Coord<f64>]> {
        match &self.geometry {
            RegionGeometry::Polygon(ring) => Some(ring),
            RegionGeometry::Point(_) => None,
        }
    }

    /// Point location, if this region is a point
    pub fn point(&self) -> Option<Coord<f64>> {
        match self.geometry {
            RegionGeometry::Point(c) => Some(c),
            RegionGeometry::Polygon(_) => None,
        }
    }

    /// File name offered when downloading this region's report
    pub fn report_file_name(&self) -> String {
        format!("Reporte-{}.pdf", self.name.replace(' ', "_"))
    }
}

/// Summary of a region for API responses and menus
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegionSummary {
    pub id: RegionId,
    pub name: String,
    pub class: RegionClass,
    /// [minLon, minLat, maxLon, maxLat]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bbox: Option<[f64; 4]>,
}

impl From<&Region> for RegionSummary {
    fn from(region: &Region) -> Self {
        Self {
            id: region.id,
            name: region.name.clone(),
            class: region.class(),
            bbox: region
                .geometry
                .bounding_rect()
                .map(|r| [r.min().x, r.min().y, r.max().x, r.max().y]),
        }
    }
}
