//! Interactive map session.
//!
//! One controller per session holds the region data, the hovered feature and
//! the user-location marker, and talks to the map and the UI through traits.

mod controller;
mod view;

pub use controller::{LocateOutcome, SessionController, SessionOptions};
pub use view::{
    CameraMove, MapSurface, Padding, RegionObserver, POINT_ZOOM, SELECT_DURATION_MS,
    USER_LOCATION_ZOOM,
};
