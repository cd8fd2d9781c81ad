//! Point-in-Polygon (PIP) region lookup.
//!
//! Ray-casting containment over comuna polygons, with an R-tree to narrow
//! the candidates. Collection order decides overlaps.

mod index;
mod ray;
mod service;

pub use index::{IndexedRegion, RegionIndex};
pub use ray::ring_contains;
pub use service::{locate_in, RegionLocator};
