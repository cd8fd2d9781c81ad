//! Region dataset decoding and loading.
//!
//! The dataset is a GeoJSON FeatureCollection whose features carry an
//! `IDENTIFICADOR` (numeric string) and a `NOMBRE` property. Comunas are
//! Polygons, corregimientos are Points.

use std::path::PathBuf;
use std::str::FromStr;

use geo::Coord;
use hashbrown::HashMap;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

use super::region::{FeatureId, Region, RegionGeometry, RegionId};
use crate::error::DatasetError;

const ID_PROPERTY: &str = "IDENTIFICADOR";
const NAME_PROPERTY: &str = "NOMBRE";

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    geometry: Option<Geometry>,
    #[serde(default)]
    properties: Option<serde_json::Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum Geometry {
    Polygon {
        #[serde(default)]
        coordinates: Value,
    },
    Point {
        #[serde(default)]
        coordinates: Value,
    },
    #[serde(other)]
    Unsupported,
}

/// `[lon, lat, ...]`; any altitude is dropped
fn position(raw: &Value) -> Option<Coord<f64>> {
    match raw.as_array()?.as_slice() {
        [x, y, ..] => Some(Coord {
            x: x.as_f64()?,
            y: y.as_f64()?,
        }),
        _ => None,
    }
}

/// Where the dataset is loaded from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetSource {
    Path(PathBuf),
    Url(Url),
}

impl FromStr for DatasetSource {
    type Err = url::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.starts_with("http://") || s.starts_with("https://") {
            Ok(DatasetSource::Url(Url::parse(s)?))
        } else {
            Ok(DatasetSource::Path(PathBuf::from(s)))
        }
    }
}

impl std::fmt::Display for DatasetSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatasetSource::Path(p) => write!(f, "{}", p.display()),
            DatasetSource::Url(u) => write!(f, "{}", u),
        }
    }
}

/// The immutable region collection for a session.
///
/// Regions keep the order of the source document; that order decides which
/// region wins when polygons overlap.
#[derive(Debug, Clone)]
pub struct RegionCollection {
    regions: Vec<Region>,
    feature_ids: Vec<FeatureId>,
    by_feature: HashMap<FeatureId, usize>,
    by_id: HashMap<RegionId, usize>,
    document: Value,
}

impl RegionCollection {
    /// Build a collection directly from regions. Feature ids are their positions.
    pub fn from_regions(regions: Vec<Region>) -> Self {
        let feature_ids = (0..regions.len()).collect();
        Self::assemble(regions, feature_ids, Value::Null)
    }

    fn assemble(regions: Vec<Region>, feature_ids: Vec<FeatureId>, document: Value) -> Self {
        let mut by_feature = HashMap::with_capacity(regions.len());
        let mut by_id = HashMap::with_capacity(regions.len());
        for (pos, (region, fid)) in regions.iter().zip(&feature_ids).enumerate() {
            by_feature.insert(*fid, pos);
            // Keep the first occurrence of a duplicated identifier
            by_id.entry(region.id).or_insert(pos);
        }
        Self {
            regions,
            feature_ids,
            by_feature,
            by_id,
            document,
        }
    }

    /// Decode a GeoJSON FeatureCollection.
    ///
    /// Features with unsupported geometry or missing identifier/name are
    /// skipped with a warning; only a structurally invalid document is an error.
    pub fn from_geojson_str(raw: &str) -> Result<Self, DatasetError> {
        let document: Value = serde_json::from_str(raw)?;
        let collection = FeatureCollection::deserialize(&document)?;

        let mut regions = Vec::with_capacity(collection.features.len());
        let mut feature_ids = Vec::with_capacity(collection.features.len());

        for (fid, feature) in collection.features.into_iter().enumerate() {
            match decode_feature(feature) {
                Some(region) => {
                    regions.push(region);
                    feature_ids.push(fid);
                }
                None => warn!("Skipping feature {}: unusable geometry or properties", fid),
            }
        }

        debug!("Decoded {} regions", regions.len());
        Ok(Self::assemble(regions, feature_ids, document))
    }

    /// Load the dataset once, from a file or over HTTP.
    pub async fn load(source: &DatasetSource) -> Result<Self, DatasetError> {
        info!("Loading region dataset from {}", source);

        let raw = match source {
            DatasetSource::Path(path) => {
                tokio::fs::read_to_string(path)
                    .await
                    .map_err(|source| DatasetError::Io {
                        path: path.display().to_string(),
                        source,
                    })?
            }
            DatasetSource::Url(url) => {
                let fetch_err = |source| DatasetError::Fetch {
                    url: url.to_string(),
                    source,
                };
                let response = reqwest::get(url.clone()).await.map_err(fetch_err)?;
                if !response.status().is_success() {
                    return Err(DatasetError::Status {
                        url: url.to_string(),
                        status: response.status().as_u16(),
                    });
                }
                response.text().await.map_err(fetch_err)?
            }
        };

        let collection = Self::from_geojson_str(&raw)?;
        info!(
            "Loaded {} regions ({} comunas, {} corregimientos)",
            collection.len(),
            collection.polygon_count(),
            collection.len() - collection.polygon_count()
        );
        Ok(collection)
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Regions in document order
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn get(&self, id: RegionId) -> Option<&Region> {
        self.by_id.get(&id).map(|&pos| &self.regions[pos])
    }

    pub fn by_feature(&self, fid: FeatureId) -> Option<&Region> {
        self.by_feature.get(&fid).map(|&pos| &self.regions[pos])
    }

    /// Feature id of a region, by identifier
    pub fn feature_id(&self, id: RegionId) -> Option<FeatureId> {
        self.by_id.get(&id).map(|&pos| self.feature_ids[pos])
    }

    /// The source GeoJSON document, for handing to the map engine as-is.
    /// `Null` when the collection was built from regions directly.
    pub fn document(&self) -> &Value {
        &self.document
    }

    fn polygon_count(&self) -> usize {
        self.regions
            .iter()
            .filter(|r| r.geometry.is_polygon())
            .count()
    }
}

fn decode_feature(feature: Feature) -> Option<Region> {
    let props = feature.properties?;

    let id = match props.get(ID_PROPERTY)? {
        Value::String(s) => RegionId::parse(s)?,
        Value::Number(n) => RegionId(u32::try_from(n.as_u64()?).ok()?),
        _ => return None,
    };

    let name = props.get(NAME_PROPERTY)?.as_str()?.to_string();

    let geometry = match feature.geometry? {
        Geometry::Polygon { coordinates } => {
            // Outer ring only; holes are not used for lookups
            let outer = coordinates.as_array()?.first()?.as_array()?;
            let ring = outer.iter().map(position).collect::<Option<Vec<_>>>()?;
            RegionGeometry::Polygon(ring)
        }
        Geometry::Point { coordinates } => RegionGeometry::Point(position(&coordinates)?),
        Geometry::Unsupported => return None,
    };

    Some(Region::new(id, name, geometry))
}
