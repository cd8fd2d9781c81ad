//! Collaborator interfaces the session drives: the map surface and the UI.

use geo_types::{Coord, Rect};
use serde::Serialize;

use crate::models::{FeatureId, Region};

/// Duration of animated camera moves to a selected region
pub const SELECT_DURATION_MS: u32 = 2000;

/// Zoom used when flying to a corregimiento marker
pub const POINT_ZOOM: f64 = 13.0;

/// Zoom used when flying to a location outside every comuna
pub const USER_LOCATION_ZOOM: f64 = 14.0;

/// Screen padding, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Padding {
    pub top: f64,
    pub bottom: f64,
    pub left: f64,
    pub right: f64,
}

/// Camera change requested from the map surface
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CameraMove {
    FlyTo {
        center: Coord<f64>,
        zoom: f64,
        #[serde(skip_serializing_if = "Option::is_none")]
        pitch: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        bearing: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        duration_ms: Option<u32>,
    },
    FitBounds {
        bounds: Rect<f64>,
        padding: Padding,
        pitch: f64,
        duration_ms: u32,
    },
}

/// Rendering side of the map: feature state, cursor, camera and markers
pub trait MapSurface {
    /// Set or clear the `hover` feature state on a feature of the region source
    fn set_hover(&mut self, feature: FeatureId, hover: bool);

    fn set_pointer_cursor(&mut self, pointer: bool);

    fn remove_popup(&mut self);

    fn move_camera(&mut self, camera: CameraMove);

    /// Create the user-location marker, or move it if it already exists
    fn place_user_marker(&mut self, position: Coord<f64>);
}

/// Notifications for the surrounding UI
pub trait RegionObserver {
    /// Hovered region changed; `None` when the pointer left every region
    fn on_region_hover(&mut self, region: Option<&Region>);

    /// A region was selected (click, search result, menu entry or geolocation)
    fn on_region_selected(&mut self, region: &Region);

    /// The info panel should close
    fn on_selection_cleared(&mut self) {}

    /// User-visible, non-fatal alert
    fn on_alert(&mut self, message: &str);
}
