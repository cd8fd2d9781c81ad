//! Spatial index for fast region lookups.

use geo::Coord;
use rstar::primitives::GeomWithData;
use rstar::{PointDistance, RTree, RTreeObject, AABB};
use tracing::info;

use crate::models::{Region, RegionGeometry};

/// Wrapper for R-tree indexing of polygon regions
#[derive(Debug, Clone)]
pub struct IndexedRegion {
    /// Position of the region in its collection
    pub position: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedRegion {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

impl IndexedRegion {
    pub fn new(position: usize, region: &Region) -> Option<Self> {
        if !region.geometry.is_polygon() {
            return None;
        }
        let rect = region.geometry.bounding_rect()?;
        Some(Self {
            position,
            envelope: AABB::from_corners(
                [rect.min().x, rect.min().y],
                [rect.max().x, rect.max().y],
            ),
        })
    }
}

type IndexedPoint = GeomWithData<[f64; 2], usize>;

/// R-trees over polygon envelopes and point locations.
///
/// Only narrows the candidate set; exact containment is left to the caller.
pub struct RegionIndex {
    polygons: RTree<IndexedRegion>,
    points: RTree<IndexedPoint>,
}

impl RegionIndex {
    /// Build spatial index over regions in collection order
    pub fn build(regions: &[Region]) -> Self {
        info!("Building spatial index for {} regions...", regions.len());

        let indexed: Vec<IndexedRegion> = regions
            .iter()
            .enumerate()
            .filter_map(|(pos, region)| IndexedRegion::new(pos, region))
            .collect();

        let points: Vec<IndexedPoint> = regions
            .iter()
            .enumerate()
            .filter_map(|(pos, region)| match region.geometry {
                RegionGeometry::Point(c) => Some(GeomWithData::new([c.x, c.y], pos)),
                RegionGeometry::Polygon(_) => None,
            })
            .collect();

        let polygons = RTree::bulk_load(indexed);
        let points = RTree::bulk_load(points);

        info!(
            "Spatial index built with {} polygons and {} points",
            polygons.size(),
            points.size()
        );

        Self { polygons, points }
    }

    /// Positions of polygon regions whose envelope covers the point, ascending
    pub fn polygon_candidates(&self, point: Coord<f64>) -> Vec<usize> {
        let query_envelope = AABB::from_point([point.x, point.y]);
        let mut positions: Vec<usize> = self
            .polygons
            .locate_in_envelope_intersecting(&query_envelope)
            .map(|ir| ir.position)
            .collect();
        positions.sort_unstable();
        positions
    }

    /// Position of the closest point region and its planar distance in degrees
    pub fn nearest_point(&self, point: Coord<f64>) -> Option<(usize, f64)> {
        let query = [point.x, point.y];
        self.points
            .nearest_neighbor(&query)
            .map(|p| (p.data, p.geom().distance_2(&query).sqrt()))
    }

    pub fn len(&self) -> usize {
        self.polygons.size() + self.points.size()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
