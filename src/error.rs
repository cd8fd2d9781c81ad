//! Error kinds surfaced by the library.
//!
//! None of these are retried automatically; recovery is always user-initiated.

use thiserror::Error;

/// Failure to load the region dataset. Fatal to map interactivity.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to read dataset file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to fetch dataset from {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("dataset request to {url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("dataset is not a valid feature collection: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Failure of the platform geolocation request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeolocationError {
    #[error("geolocation is not supported by this client")]
    Unsupported,

    #[error("could not obtain the current position: {0}")]
    Failed(String),
}

impl GeolocationError {
    /// Message shown to the user.
    pub fn user_message(&self) -> &'static str {
        match self {
            GeolocationError::Unsupported => {
                "La geolocalización no es soportada por tu navegador."
            }
            GeolocationError::Failed(_) => "No se pudo obtener tu ubicación.",
        }
    }
}

/// Failure while producing a region report.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("report fragment not found: {0}")]
    FragmentNotFound(String),

    #[error("failed to fetch report fragment {resource}: {source}")]
    Fetch {
        resource: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to read report fragment {resource}: {source}")]
    Io {
        resource: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid report fragment address: {0}")]
    Address(#[from] url::ParseError),

    #[error("rasterized fragment has no area ({width}x{height})")]
    EmptyRaster { width: u32, height: u32 },

    #[error("rasterized fragment ({width}x{height}) would need more than {max} pages")]
    TooManyPages { width: u32, height: u32, max: usize },

    #[error("rasterization failed: {0}")]
    Rasterize(String),

    #[error("failed to write report document: {0}")]
    Write(String),

    #[error("a report is already being generated")]
    Busy,
}

impl ReportError {
    /// Message shown to the user. Missing fragments name the resource.
    pub fn user_message(&self) -> String {
        match self {
            ReportError::FragmentNotFound(resource) => {
                format!("Error generando el reporte: no se encontró {}", resource)
            }
            ReportError::Busy => "Ya se está generando un reporte.".to_string(),
            _ => "Error generando el reporte.".to_string(),
        }
    }
}

/// Failure to load the TOML configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fragment_message_names_resource() {
        let err = ReportError::FragmentNotFound("data/comuna7.html".to_string());
        assert!(err.user_message().contains("data/comuna7.html"));
        assert!(err.to_string().contains("data/comuna7.html"));
    }

    #[test]
    fn test_geolocation_messages_differ() {
        assert_ne!(
            GeolocationError::Unsupported.user_message(),
            GeolocationError::Failed("denied".into()).user_message()
        );
    }
}
