//! Comunas - interactive map backend for a city's comunas and corregimientos
//!
//! This library provides the region model, point-in-polygon lookup, map
//! session state and report generation shared by the server and locate binaries.

pub mod config;
pub mod error;
pub mod models;
pub mod pip;
pub mod report;
pub mod search;
pub mod session;
pub mod style;

pub use models::{Region, RegionClass, RegionCollection, RegionGeometry, RegionId};
pub use pip::RegionLocator;
