//! Report fragment sources.

use std::future::Future;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use tracing::{debug, warn};
use url::Url;

use crate::error::ReportError;

/// Source of pre-rendered HTML report fragments
pub trait FragmentSource {
    /// Fetch the fragment at `path` (relative to the source's base)
    fn fetch(&self, path: &str) -> impl Future<Output = Result<String, ReportError>> + Send;
}

/// Fragments served over HTTP
#[derive(Clone)]
pub struct HttpFragmentSource {
    client: Client,
    base: Url,
}

impl HttpFragmentSource {
    pub fn new(base: Url) -> Result<Self, ReportError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|source| ReportError::Fetch {
                resource: base.to_string(),
                source,
            })?;
        Ok(Self { client, base })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }
}

impl FragmentSource for HttpFragmentSource {
    async fn fetch(&self, path: &str) -> Result<String, ReportError> {
        let url = self.base.join(path)?;
        debug!("Fetching report fragment {}", url);

        let fetch_err = |source| ReportError::Fetch {
            resource: path.to_string(),
            source,
        };

        let response = self.client.get(url).send().await.map_err(fetch_err)?;

        match response.status() {
            status if status.is_success() => response.text().await.map_err(fetch_err),
            StatusCode::NOT_FOUND => Err(ReportError::FragmentNotFound(path.to_string())),
            status => {
                warn!("Report fragment {} returned {}", path, status);
                Err(ReportError::FragmentNotFound(path.to_string()))
            }
        }
    }
}

/// Fragments read from a local directory
#[derive(Debug, Clone)]
pub struct DirFragmentSource {
    root: PathBuf,
}

impl DirFragmentSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl FragmentSource for DirFragmentSource {
    async fn fetch(&self, path: &str) -> Result<String, ReportError> {
        // Fragment paths are relative; refuse anything that climbs out of the root
        if path.split('/').any(|part| part == "..") || path.starts_with('/') {
            return Err(ReportError::FragmentNotFound(path.to_string()));
        }

        let full = self.root.join(path);
        debug!("Reading report fragment {}", full.display());

        match tokio::fs::read_to_string(&full).await {
            Ok(html) => Ok(html),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(ReportError::FragmentNotFound(path.to_string()))
            }
            Err(source) => Err(ReportError::Io {
                resource: path.to_string(),
                source,
            }),
        }
    }
}

/// Fragment source picked from a configured base: http(s) URL or directory
#[derive(Clone)]
pub enum FragmentBase {
    Http(HttpFragmentSource),
    Dir(DirFragmentSource),
}

impl FragmentBase {
    pub fn from_base(base: &str) -> Result<Self, ReportError> {
        if base.starts_with("http://") || base.starts_with("https://") {
            // Without a trailing slash, `join` would replace the last segment
            let base = if base.ends_with('/') {
                Url::parse(base)?
            } else {
                Url::parse(&format!("{}/", base))?
            };
            Ok(FragmentBase::Http(HttpFragmentSource::new(base)?))
        } else {
            Ok(FragmentBase::Dir(DirFragmentSource::new(base)))
        }
    }
}

impl FragmentSource for FragmentBase {
    async fn fetch(&self, path: &str) -> Result<String, ReportError> {
        match self {
            FragmentBase::Http(source) => source.fetch(path).await,
            FragmentBase::Dir(source) => source.fetch(path).await,
        }
    }
}
