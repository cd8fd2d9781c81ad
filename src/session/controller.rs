//! Session controller: pointer/hover synchronisation, selection and geolocation.

use geo::Coord;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::view::{
    CameraMove, MapSurface, Padding, RegionObserver, POINT_ZOOM, SELECT_DURATION_MS,
    USER_LOCATION_ZOOM,
};
use crate::error::GeolocationError;
use crate::models::{FeatureId, Region, RegionGeometry, RegionId};
use crate::pip::RegionLocator;
use crate::report::ReportRequest;
use crate::search::{corregimiento_menu, search_by_name, MenuEntry};
use crate::style::MapStyle;

/// Session tunables
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub style: MapStyle,
    /// Width of the info sidebar, added to the left padding when fitting bounds
    pub sidebar_width: f64,
    /// Fall back to the nearest corregimiento within this many degrees
    /// when a located point is outside every comuna. `None` disables it.
    pub nearest_fallback_deg: Option<f64>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            style: MapStyle::default(),
            sidebar_width: 384.0,
            nearest_fallback_deg: None,
        }
    }
}

/// Result of handling a geolocation response
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LocateOutcome {
    /// Inside a comuna polygon
    Found { id: RegionId },
    /// Outside every comuna; nearest corregimiento within the fallback distance
    Nearby { id: RegionId },
    /// No region; the camera flew to the location instead
    NotFound,
    /// Geolocation failed; the user was alerted
    Failed,
}

/// State of one interactive map session.
///
/// Owns the region data for the session and drives the map surface and the
/// UI observer in response to pointer and geolocation events.
pub struct SessionController<M: MapSurface, O: RegionObserver> {
    locator: RegionLocator,
    options: SessionOptions,
    map: M,
    observer: O,
    hovered: Option<FeatureId>,
    selected: Option<RegionId>,
    user_location: Option<Coord<f64>>,
}

impl<M: MapSurface, O: RegionObserver> SessionController<M, O> {
    pub fn new(locator: RegionLocator, options: SessionOptions, map: M, observer: O) -> Self {
        info!(
            "Session started with {} regions",
            locator.collection().len()
        );
        Self {
            locator,
            options,
            map,
            observer,
            hovered: None,
            selected: None,
            user_location: None,
        }
    }

    /// Pointer moved over one of the interactive layers.
    ///
    /// `features` are the rendered features under the pointer, topmost first.
    pub fn pointer_move(&mut self, features: &[FeatureId]) {
        self.map.set_pointer_cursor(true);

        let Some(&feature) = features.first() else {
            return;
        };
        // Rendered features that were skipped at load time have no region
        let Some(region) = self.locator.collection().by_feature(feature) else {
            debug!("Pointer over unknown feature {}", feature);
            return;
        };

        if let Some(previous) = self.hovered {
            self.map.set_hover(previous, false);
        }
        self.hovered = Some(feature);
        self.map.set_hover(feature, true);
        self.observer.on_region_hover(Some(region));
    }

    /// Pointer left the interactive layers
    pub fn pointer_leave(&mut self) {
        self.map.set_pointer_cursor(false);

        if let Some(previous) = self.hovered.take() {
            self.map.set_hover(previous, false);
        }
        self.map.remove_popup();
        self.observer.on_region_hover(None);
    }

    /// Click on one of the interactive layers
    pub fn click(&mut self, features: &[FeatureId]) -> Option<RegionId> {
        let &feature = features.first()?;
        let id = self.locator.collection().by_feature(feature)?.id;
        self.select(id)
    }

    /// Select a region by identifier: move the camera to it and notify the UI
    pub fn select(&mut self, id: RegionId) -> Option<RegionId> {
        let Some(region) = self.locator.collection().get(id) else {
            warn!("Selected unknown region {}", id);
            return None;
        };

        if let Some(camera) = camera_for(region, &self.options) {
            self.map.move_camera(camera);
        }

        debug!("Selected region {} ({})", region.id, region.name);
        self.observer.on_region_selected(region);
        self.selected = Some(id);
        Some(id)
    }

    /// Handle the response of a geolocation request
    pub fn locate(&mut self, position: Result<Coord<f64>, GeolocationError>) -> LocateOutcome {
        let position = position.and_then(|point| {
            if point.x.is_finite() && point.y.is_finite() {
                Ok(point)
            } else {
                Err(GeolocationError::Failed("non-finite coordinate".to_string()))
            }
        });
        let point = match position {
            Ok(point) => point,
            Err(e) => {
                warn!("Geolocation failed: {}", e);
                self.observer.on_alert(e.user_message());
                return LocateOutcome::Failed;
            }
        };

        self.map.place_user_marker(point);
        self.user_location = Some(point);

        if let Some(id) = self.locator.locate(point).map(|r| r.id) {
            self.select(id);
            return LocateOutcome::Found { id };
        }

        let nearby = self
            .options
            .nearest_fallback_deg
            .and_then(|max| self.locator.nearest_point_region(point, max))
            .map(|r| r.id);
        if let Some(id) = nearby {
            self.select(id);
            return LocateOutcome::Nearby { id };
        }

        info!("Location ({}, {}) is outside every comuna", point.x, point.y);
        self.map.move_camera(CameraMove::FlyTo {
            center: point,
            zoom: USER_LOCATION_ZOOM,
            pitch: None,
            bearing: None,
            duration_ms: None,
        });
        LocateOutcome::NotFound
    }

    /// Fly back to the home camera and close the info panel
    pub fn reset_view(&mut self) {
        let camera = self.options.style.camera;
        self.map.move_camera(CameraMove::FlyTo {
            center: camera.center_coord(),
            zoom: camera.zoom,
            pitch: Some(camera.pitch),
            bearing: Some(camera.bearing),
            duration_ms: None,
        });
        self.close_selection();
    }

    /// Close the info panel
    pub fn close_selection(&mut self) {
        self.selected = None;
        self.observer.on_selection_cleared();
    }

    pub fn search(&self, query: &str) -> Vec<&Region> {
        search_by_name(self.locator.collection(), query)
    }

    pub fn corregimientos(&self) -> Vec<MenuEntry> {
        corregimiento_menu(self.locator.collection())
    }

    /// Report request for a region
    pub fn report_request(&self, id: RegionId) -> Option<ReportRequest> {
        self.locator.collection().get(id).map(ReportRequest::for_region)
    }

    pub fn hovered(&self) -> Option<FeatureId> {
        self.hovered
    }

    pub fn selected(&self) -> Option<RegionId> {
        self.selected
    }

    pub fn user_location(&self) -> Option<Coord<f64>> {
        self.user_location
    }

    pub fn locator(&self) -> &RegionLocator {
        &self.locator
    }

    pub fn map(&self) -> &M {
        &self.map
    }

    pub fn observer(&self) -> &O {
        &self.observer
    }
}

fn camera_for(region: &Region, options: &SessionOptions) -> Option<CameraMove> {
    match &region.geometry {
        RegionGeometry::Point(center) => Some(CameraMove::FlyTo {
            center: *center,
            zoom: POINT_ZOOM,
            pitch: None,
            bearing: None,
            duration_ms: Some(SELECT_DURATION_MS),
        }),
        RegionGeometry::Polygon(_) => {
            let bounds = region.geometry.bounding_rect()?;
            Some(CameraMove::FitBounds {
                bounds,
                padding: Padding {
                    top: 100.0,
                    bottom: 100.0,
                    left: options.sidebar_width + 50.0,
                    right: 50.0,
                },
                pitch: options.style.camera.pitch,
                duration_ms: SELECT_DURATION_MS,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RegionCollection;

    #[derive(Debug, Clone, PartialEq)]
    enum MapCall {
        Hover(FeatureId, bool),
        Cursor(bool),
        RemovePopup,
        Camera(CameraMove),
        Marker(Coord<f64>),
    }

    #[derive(Default)]
    struct RecordingMap {
        calls: Vec<MapCall>,
    }

    impl MapSurface for RecordingMap {
        fn set_hover(&mut self, feature: FeatureId, hover: bool) {
            self.calls.push(MapCall::Hover(feature, hover));
        }
        fn set_pointer_cursor(&mut self, pointer: bool) {
            self.calls.push(MapCall::Cursor(pointer));
        }
        fn remove_popup(&mut self) {
            self.calls.push(MapCall::RemovePopup);
        }
        fn move_camera(&mut self, camera: CameraMove) {
            self.calls.push(MapCall::Camera(camera));
        }
        fn place_user_marker(&mut self, position: Coord<f64>) {
            self.calls.push(MapCall::Marker(position));
        }
    }

    #[derive(Default)]
    struct RecordingUi {
        hovered: Vec<Option<RegionId>>,
        selected: Vec<RegionId>,
        alerts: Vec<String>,
        cleared: usize,
    }

    impl RegionObserver for RecordingUi {
        fn on_region_hover(&mut self, region: Option<&Region>) {
            self.hovered.push(region.map(|r| r.id));
        }
        fn on_region_selected(&mut self, region: &Region) {
            self.selected.push(region.id);
        }
        fn on_selection_cleared(&mut self) {
            self.cleared += 1;
        }
        fn on_alert(&mut self, message: &str) {
            self.alerts.push(message.to_string());
        }
    }

    fn square(id: u32, x0: f64, y0: f64, size: f64) -> Region {
        Region::new(
            RegionId(id),
            format!("Comuna {}", id),
            RegionGeometry::Polygon(vec![
                Coord { x: x0, y: y0 },
                Coord { x: x0, y: y0 + size },
                Coord { x: x0 + size, y: y0 + size },
                Coord { x: x0 + size, y: y0 },
            ]),
        )
    }

    fn session(options: SessionOptions) -> SessionController<RecordingMap, RecordingUi> {
        let collection = RegionCollection::from_regions(vec![
            square(1, 0.0, 0.0, 10.0),
            square(2, 10.0, 0.0, 10.0),
            Region::new(
                RegionId(60),
                "Corregimiento 60 - San Cristóbal",
                RegionGeometry::Point(Coord { x: 30.0, y: 30.0 }),
            ),
        ]);
        SessionController::new(
            RegionLocator::new(collection),
            options,
            RecordingMap::default(),
            RecordingUi::default(),
        )
    }

    #[test]
    fn test_hover_moves_between_features() {
        let mut s = session(SessionOptions::default());
        s.pointer_move(&[0]);
        s.pointer_move(&[1, 0]);

        assert_eq!(
            s.map().calls,
            vec![
                MapCall::Cursor(true),
                MapCall::Hover(0, true),
                MapCall::Cursor(true),
                MapCall::Hover(0, false),
                MapCall::Hover(1, true),
            ]
        );
        assert_eq!(s.hovered(), Some(1));
        assert_eq!(
            s.observer().hovered,
            vec![Some(RegionId(1)), Some(RegionId(2))]
        );
    }

    #[test]
    fn test_pointer_move_without_features_keeps_hover() {
        let mut s = session(SessionOptions::default());
        s.pointer_move(&[0]);
        s.pointer_move(&[]);
        assert_eq!(s.hovered(), Some(0));
        assert_eq!(s.observer().hovered.len(), 1);
    }

    #[test]
    fn test_pointer_over_unknown_feature_keeps_hover() {
        let mut s = session(SessionOptions::default());
        s.pointer_move(&[0]);
        s.pointer_move(&[7]);

        assert_eq!(
            s.map().calls,
            vec![
                MapCall::Cursor(true),
                MapCall::Hover(0, true),
                MapCall::Cursor(true),
            ]
        );
        assert_eq!(s.hovered(), Some(0));
        assert_eq!(s.observer().hovered, vec![Some(RegionId(1))]);
    }

    #[test]
    fn test_leave_clears_hover() {
        let mut s = session(SessionOptions::default());
        s.pointer_move(&[2]);
        s.pointer_leave();

        assert_eq!(s.hovered(), None);
        assert_eq!(
            &s.map().calls[2..],
            &[
                MapCall::Cursor(false),
                MapCall::Hover(2, false),
                MapCall::RemovePopup
            ]
        );
        assert_eq!(s.observer().hovered.last(), Some(&None));
    }

    #[test]
    fn test_leave_without_hover() {
        let mut s = session(SessionOptions::default());
        s.pointer_leave();
        assert_eq!(
            s.map().calls,
            vec![MapCall::Cursor(false), MapCall::RemovePopup]
        );
    }

    #[test]
    fn test_click_polygon_fits_bounds() {
        let mut s = session(SessionOptions::default());
        assert_eq!(s.click(&[1]), Some(RegionId(2)));

        match s.map().calls.last() {
            Some(MapCall::Camera(CameraMove::FitBounds {
                bounds,
                padding,
                pitch,
                duration_ms,
            })) => {
                assert_eq!(bounds.min(), Coord { x: 10.0, y: 0.0 });
                assert_eq!(bounds.max(), Coord { x: 20.0, y: 10.0 });
                assert_eq!(padding.left, 384.0 + 50.0);
                assert_eq!(*pitch, 60.0);
                assert_eq!(*duration_ms, 2000);
            }
            other => panic!("unexpected camera call: {:?}", other),
        }
        assert_eq!(s.observer().selected, vec![RegionId(2)]);
        assert_eq!(s.selected(), Some(RegionId(2)));
    }

    #[test]
    fn test_select_point_flies_to_marker() {
        let mut s = session(SessionOptions::default());
        s.select(RegionId(60));
        assert_eq!(
            s.map().calls.last(),
            Some(&MapCall::Camera(CameraMove::FlyTo {
                center: Coord { x: 30.0, y: 30.0 },
                zoom: 13.0,
                pitch: None,
                bearing: None,
                duration_ms: Some(2000),
            }))
        );
    }

    #[test]
    fn test_select_unknown_region() {
        let mut s = session(SessionOptions::default());
        assert_eq!(s.select(RegionId(99)), None);
        assert!(s.map().calls.is_empty());
        assert!(s.observer().selected.is_empty());
    }

    #[test]
    fn test_locate_inside_comuna_selects_it() {
        let mut s = session(SessionOptions::default());
        let outcome = s.locate(Ok(Coord { x: 15.0, y: 5.0 }));
        assert_eq!(outcome, LocateOutcome::Found { id: RegionId(2) });
        assert_eq!(s.map().calls[0], MapCall::Marker(Coord { x: 15.0, y: 5.0 }));
        assert_eq!(s.observer().selected, vec![RegionId(2)]);
        assert_eq!(s.user_location(), Some(Coord { x: 15.0, y: 5.0 }));
    }

    #[test]
    fn test_locate_outside_flies_to_point() {
        let mut s = session(SessionOptions::default());
        let outcome = s.locate(Ok(Coord { x: 30.5, y: 30.0 }));
        assert_eq!(outcome, LocateOutcome::NotFound);
        assert!(s.observer().selected.is_empty());
        assert_eq!(
            s.map().calls.last(),
            Some(&MapCall::Camera(CameraMove::FlyTo {
                center: Coord { x: 30.5, y: 30.0 },
                zoom: 14.0,
                pitch: None,
                bearing: None,
                duration_ms: None,
            }))
        );
    }

    #[test]
    fn test_locate_nearest_fallback() {
        let mut s = session(SessionOptions {
            nearest_fallback_deg: Some(1.0),
            ..SessionOptions::default()
        });
        let outcome = s.locate(Ok(Coord { x: 30.5, y: 30.0 }));
        assert_eq!(outcome, LocateOutcome::Nearby { id: RegionId(60) });
        assert_eq!(s.observer().selected, vec![RegionId(60)]);
    }

    #[test]
    fn test_repeated_locate_moves_marker() {
        let mut s = session(SessionOptions::default());
        s.locate(Ok(Coord { x: 5.0, y: 5.0 }));
        s.locate(Ok(Coord { x: 15.0, y: 5.0 }));
        let markers: Vec<&MapCall> = s
            .map()
            .calls
            .iter()
            .filter(|c| matches!(c, MapCall::Marker(_)))
            .collect();
        assert_eq!(markers.len(), 2);
        assert_eq!(s.user_location(), Some(Coord { x: 15.0, y: 5.0 }));
    }

    #[test]
    fn test_locate_failure_alerts() {
        let mut s = session(SessionOptions::default());
        assert_eq!(
            s.locate(Err(GeolocationError::Unsupported)),
            LocateOutcome::Failed
        );
        assert_eq!(
            s.locate(Err(GeolocationError::Failed("timeout".into()))),
            LocateOutcome::Failed
        );
        assert_eq!(s.observer().alerts.len(), 2);
        assert!(s.map().calls.is_empty());
    }

    #[test]
    fn test_locate_non_finite_fix_alerts() {
        let mut s = session(SessionOptions {
            nearest_fallback_deg: Some(1.0),
            ..SessionOptions::default()
        });
        assert_eq!(
            s.locate(Ok(Coord { x: f64::NAN, y: 6.0 })),
            LocateOutcome::Failed
        );
        assert_eq!(s.observer().alerts.len(), 1);
        assert!(s.map().calls.is_empty());
        assert_eq!(s.user_location(), None);
    }

    #[test]
    fn test_reset_view_returns_home() {
        let mut s = session(SessionOptions::default());
        s.select(RegionId(1));
        s.reset_view();
        assert_eq!(s.selected(), None);
        assert_eq!(s.observer().cleared, 1);
        match s.map().calls.last() {
            Some(MapCall::Camera(CameraMove::FlyTo {
                center,
                zoom,
                pitch,
                bearing,
                ..
            })) => {
                assert_eq!(*center, Coord { x: -75.5636, y: 6.2518 });
                assert_eq!(*zoom, 11.5);
                assert_eq!(*pitch, Some(60.0));
                assert_eq!(*bearing, Some(-17.6));
            }
            other => panic!("unexpected camera call: {:?}", other),
        }
    }

    #[test]
    fn test_search_and_menu() {
        let s = session(SessionOptions::default());
        assert_eq!(s.search("comuna").len(), 2);
        assert_eq!(s.corregimientos()[0].label, "San Cristóbal");
        let request = s.report_request(RegionId(2)).unwrap();
        assert_eq!(request.fragment_path, "data/comuna2.html");
        assert!(s.report_request(RegionId(42)).is_none());
    }
}
