//! Core data models for the region map.

pub mod dataset;
pub mod region;

pub use dataset::{DatasetSource, RegionCollection};
pub use region::{
    FeatureId, Region, RegionClass, RegionGeometry, RegionId, RegionSummary,
    CORREGIMIENTO_THRESHOLD,
};
