use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::ConfigError;
use crate::style::StylePreset;

/// Optional TOML configuration; command-line flags override it
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub dataset: DatasetConfig,
    pub reports: ReportConfig,
    pub server: ServerConfig,
    pub map: MapConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct DatasetConfig {
    /// File path or http(s) URL of the GeoJSON dataset
    pub source: String,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            source: "comunas.geojson".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ReportConfig {
    /// Directory or http(s) base URL that `data/comunaN.html` is resolved against
    pub fragment_base: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            fragment_base: ".".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub listen: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:3000".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct MapConfig {
    pub style: StylePreset,
    /// Nearest-corregimiento fallback radius in degrees; unset disables it
    pub nearest_fallback_deg: Option<f64>,
    /// Override of the home camera center, [lon, lat]
    pub center: Option<[f64; 2]>,
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }
}
