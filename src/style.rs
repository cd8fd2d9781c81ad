//! Map styling.
//!
//! One configurable style replaces the per-variant copies of the map setup.
//! Layer definitions are emitted as map-engine JSON for the front-end.

use geo::Coord;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::models::CORREGIMIENTO_THRESHOLD;

/// Id of the GeoJSON source every layer draws from
pub const SOURCE_ID: &str = "comunas-source";

/// Layer receiving pointer events for comunas
pub const COMUNAS_FILL_LAYER: &str = "comunas-fill";

/// Layer receiving pointer events for corregimientos
pub const CORREGIMIENTOS_MARKER_LAYER: &str = "corregimientos-markers";

const LABEL_FONT: [&str; 2] = ["DIN Offc Pro Medium", "Arial Unicode MS Bold"];

/// Named style presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StylePreset {
    #[default]
    Satellite,
    Streets,
    Light,
    Dark,
}

impl std::str::FromStr for StylePreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "satellite" => Ok(StylePreset::Satellite),
            "streets" => Ok(StylePreset::Streets),
            "light" => Ok(StylePreset::Light),
            "dark" => Ok(StylePreset::Dark),
            other => Err(format!("unknown style preset: {}", other)),
        }
    }
}

/// Initial/home camera
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraDefaults {
    /// [lon, lat]
    pub center: [f64; 2],
    pub zoom: f64,
    pub pitch: f64,
    pub bearing: f64,
}

impl CameraDefaults {
    pub fn center_coord(&self) -> Coord<f64> {
        Coord {
            x: self.center[0],
            y: self.center[1],
        }
    }
}

impl Default for CameraDefaults {
    fn default() -> Self {
        Self {
            center: [-75.5636, 6.2518],
            zoom: 11.5,
            pitch: 60.0,
            bearing: -17.6,
        }
    }
}

/// Complete visual configuration of the map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapStyle {
    pub preset: StylePreset,
    pub base_style_url: String,
    pub camera: CameraDefaults,
    pub fill_color: String,
    pub fill_hover_color: String,
    pub fill_opacity: f64,
    pub fill_hover_opacity: f64,
    pub border_color: String,
    pub border_width: f64,
    pub comuna_label_color: String,
    pub marker_color: String,
    pub marker_radius: f64,
    pub marker_hover_radius: f64,
    pub corregimiento_label_color: String,
    pub label_halo_color: String,
}

impl Default for MapStyle {
    fn default() -> Self {
        Self::preset(StylePreset::Satellite)
    }
}

impl MapStyle {
    pub fn preset(preset: StylePreset) -> Self {
        let satellite = Self {
            preset,
            base_style_url: "mapbox://styles/mapbox/satellite-streets-v12".to_string(),
            camera: CameraDefaults::default(),
            fill_color: "#42A5F5".to_string(),
            fill_hover_color: "#FF9800".to_string(),
            fill_opacity: 0.3,
            fill_hover_opacity: 0.7,
            border_color: "#FFFFFF".to_string(),
            border_width: 2.0,
            comuna_label_color: "#FFFFFF".to_string(),
            marker_color: "#FF5722".to_string(),
            marker_radius: 10.0,
            marker_hover_radius: 14.0,
            corregimiento_label_color: "#FFCCBC".to_string(),
            label_halo_color: "#000000".to_string(),
        };

        match preset {
            StylePreset::Satellite => satellite,
            StylePreset::Streets => Self {
                base_style_url: "mapbox://styles/mapbox/streets-v12".to_string(),
                fill_opacity: 0.5,
                fill_hover_opacity: 0.8,
                border_color: "#1E3A5F".to_string(),
                comuna_label_color: "#1E3A5F".to_string(),
                corregimiento_label_color: "#BF360C".to_string(),
                label_halo_color: "#FFFFFF".to_string(),
                ..satellite
            },
            StylePreset::Light => Self {
                base_style_url: "mapbox://styles/mapbox/light-v11".to_string(),
                fill_color: "#90CAF9".to_string(),
                fill_opacity: 0.6,
                fill_hover_opacity: 0.9,
                border_color: "#455A64".to_string(),
                border_width: 1.5,
                comuna_label_color: "#263238".to_string(),
                corregimiento_label_color: "#BF360C".to_string(),
                label_halo_color: "#FFFFFF".to_string(),
                ..satellite
            },
            StylePreset::Dark => Self {
                base_style_url: "mapbox://styles/mapbox/dark-v11".to_string(),
                fill_color: "#1565C0".to_string(),
                fill_opacity: 0.4,
                border_color: "#90CAF9".to_string(),
                border_width: 1.0,
                ..satellite
            },
        }
    }

    /// Layer definitions, bottom to top
    pub fn layers(&self) -> Vec<Value> {
        let id_number = json!(["to-number", ["get", "IDENTIFICADOR"]]);
        let comunas = json!(["<", id_number, CORREGIMIENTO_THRESHOLD]);
        let corregimientos = json!([">=", id_number, CORREGIMIENTO_THRESHOLD]);
        let hovered = json!(["boolean", ["feature-state", "hover"], false]);

        vec![
            json!({
                "id": COMUNAS_FILL_LAYER,
                "type": "fill",
                "source": SOURCE_ID,
                "filter": comunas,
                "paint": {
                    "fill-color": ["case", hovered, self.fill_hover_color, self.fill_color],
                    "fill-opacity": ["case", hovered, self.fill_hover_opacity, self.fill_opacity],
                }
            }),
            json!({
                "id": "comunas-borders",
                "type": "line",
                "source": SOURCE_ID,
                "filter": comunas,
                "paint": {
                    "line-color": self.border_color,
                    "line-width": self.border_width,
                }
            }),
            json!({
                "id": "comunas-labels",
                "type": "symbol",
                "source": SOURCE_ID,
                "filter": comunas,
                "layout": {
                    "text-field": ["get", "NOMBRE"],
                    "text-font": LABEL_FONT,
                    "text-size": 12,
                    "text-transform": "uppercase",
                },
                "paint": {
                    "text-color": self.comuna_label_color,
                    "text-halo-color": self.label_halo_color,
                    "text-halo-width": 2,
                }
            }),
            json!({
                "id": CORREGIMIENTOS_MARKER_LAYER,
                "type": "circle",
                "source": SOURCE_ID,
                "filter": corregimientos,
                "paint": {
                    "circle-radius": ["case", hovered, self.marker_hover_radius, self.marker_radius],
                    "circle-color": self.marker_color,
                    "circle-stroke-width": 2,
                    "circle-stroke-color": self.border_color,
                }
            }),
            json!({
                "id": "corregimientos-labels",
                "type": "symbol",
                "source": SOURCE_ID,
                "filter": corregimientos,
                "layout": {
                    "text-field": ["get", "NOMBRE"],
                    "text-font": LABEL_FONT,
                    "text-size": 12,
                    "text-offset": [0, 1.5],
                    "text-anchor": "top",
                },
                "paint": {
                    "text-color": self.corregimiento_label_color,
                    "text-halo-color": self.label_halo_color,
                    "text-halo-width": 2,
                }
            }),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_order_and_ids() {
        let ids: Vec<String> = MapStyle::default()
            .layers()
            .iter()
            .map(|l| l["id"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(
            ids,
            vec![
                "comunas-fill",
                "comunas-borders",
                "comunas-labels",
                "corregimientos-markers",
                "corregimientos-labels"
            ]
        );
    }

    #[test]
    fn test_filters_split_at_threshold() {
        let layers = MapStyle::default().layers();
        assert_eq!(layers[0]["filter"][0], "<");
        assert_eq!(layers[0]["filter"][2], 50);
        assert_eq!(layers[3]["filter"][0], ">=");
        assert_eq!(layers[3]["filter"][2], 50);
    }

    #[test]
    fn test_hover_expression_uses_style_values() {
        let style = MapStyle::preset(StylePreset::Dark);
        let layers = style.layers();
        let fill = &layers[0]["paint"]["fill-color"];
        assert_eq!(fill[0], "case");
        assert_eq!(fill[2], style.fill_hover_color.as_str());
        assert_eq!(fill[3], "#1565C0");
        assert_eq!(layers[3]["paint"]["circle-radius"][2], 14.0);
    }

    #[test]
    fn test_preset_from_str() {
        assert_eq!("Streets".parse::<StylePreset>(), Ok(StylePreset::Streets));
        assert!("neon".parse::<StylePreset>().is_err());
    }
}
