//! Region locator: which region contains a coordinate.

use geo::Coord;
use tracing::debug;

use super::{ring_contains, RegionIndex};
use crate::models::{Region, RegionCollection};

/// Point-in-Polygon lookup over a loaded region collection
pub struct RegionLocator {
    collection: RegionCollection,
    index: RegionIndex,
}

impl RegionLocator {
    /// Create a new locator, indexing the collection
    pub fn new(collection: RegionCollection) -> Self {
        let index = RegionIndex::build(collection.regions());
        Self { collection, index }
    }

    /// First region, in collection order, whose polygon contains the point.
    ///
    /// Point regions never match here; see [`RegionLocator::nearest_point_region`].
    pub fn locate(&self, point: Coord<f64>) -> Option<&Region> {
        if !is_finite(point) {
            return None;
        }
        let regions = self.collection.regions();
        let found = self
            .index
            .polygon_candidates(point)
            .into_iter()
            .map(|pos| &regions[pos])
            .find(|region| region.ring().is_some_and(|ring| ring_contains(ring, point)));

        debug!(
            "PIP lookup at ({}, {}): {}",
            point.x,
            point.y,
            found.map_or("no region".to_string(), |r| format!("region {}", r.id))
        );

        found
    }

    /// Closest point region within `max_distance` degrees, if any
    pub fn nearest_point_region(&self, point: Coord<f64>, max_distance: f64) -> Option<&Region> {
        // rstar cannot order NaN distances
        if !is_finite(point) {
            return None;
        }
        let (pos, distance) = self.index.nearest_point(point)?;
        if distance > max_distance {
            return None;
        }
        self.collection.regions().get(pos)
    }

    pub fn collection(&self) -> &RegionCollection {
        &self.collection
    }

    /// Get the spatial index (for stats/debugging)
    pub fn index(&self) -> &RegionIndex {
        &self.index
    }
}

fn is_finite(point: Coord<f64>) -> bool {
    point.x.is_finite() && point.y.is_finite()
}

/// Linear scan equivalent of [`RegionLocator::locate`], without an index
pub fn locate_in<'a>(regions: &'a [Region], point: Coord<f64>) -> Option<&'a Region> {
    regions
        .iter()
        .find(|region| region.ring().is_some_and(|ring| ring_contains(ring, point)))
}
