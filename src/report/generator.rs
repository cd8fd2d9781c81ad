//! Report generation pipeline: fetch → render off-screen → rasterize → paginate → write.
//!
//! Rendering and document encoding are external collaborators behind
//! [`Rasterizer`] and [`DocumentWriter`].

use std::future::Future;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use serde::Serialize;
use tracing::{error, info};

use super::fragment::FragmentSource;
use super::paginate::{paginate, PageLayout, PageSize};
use super::request::ReportRequest;
use crate::error::ReportError;

/// Rasterized fragment
#[derive(Debug, Clone, PartialEq)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    /// PNG-encoded pixels
    pub png: Vec<u8>,
}

/// Off-screen render settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderOptions {
    /// Width of the off-screen container, in CSS pixels
    pub width_px: u32,
    /// Device pixel ratio used for rasterization
    pub scale: f32,
    /// Wait after mounting the fragment so images and fonts can load
    pub settle: Duration,
    pub page: PageSize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width_px: 800,
            scale: 2.0,
            settle: Duration::from_millis(500),
            page: PageSize::A4,
        }
    }
}

/// Renders an HTML fragment off-screen and rasterizes it
pub trait Rasterizer {
    fn rasterize(
        &self,
        html: &str,
        options: &RenderOptions,
    ) -> impl Future<Output = Result<RasterImage, ReportError>> + Send;
}

/// Encodes the paginated raster into the downloadable document
pub trait DocumentWriter {
    fn write(
        &self,
        file_name: &str,
        image: &RasterImage,
        layout: &PageLayout,
    ) -> Result<(), ReportError>;
}

/// State of the report control; anything but `Idle` means it is disabled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlState {
    Idle,
    Preparing,
    Rendering,
}

impl ControlState {
    /// Label shown on the report control
    pub fn label(&self) -> &'static str {
        match self {
            ControlState::Idle => "Generar Reporte PDF",
            ControlState::Preparing => "Preparando...",
            ControlState::Rendering => "Generando PDF...",
        }
    }

    pub fn is_enabled(&self) -> bool {
        *self == ControlState::Idle
    }
}

/// Summary of a written report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedReport {
    pub file_name: String,
    pub pages: usize,
}

/// Produces region reports, one at a time
pub struct ReportGenerator<S, R, W> {
    source: S,
    rasterizer: R,
    writer: W,
    options: RenderOptions,
    state: Mutex<ControlState>,
}

/// Puts the control back to `Idle` however generation ends
struct InFlight<'a> {
    state: &'a Mutex<ControlState>,
}

impl InFlight<'_> {
    fn set(&self, next: ControlState) {
        *lock(self.state) = next;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        *lock(self.state) = ControlState::Idle;
    }
}

fn lock(state: &Mutex<ControlState>) -> MutexGuard<'_, ControlState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl<S, R, W> ReportGenerator<S, R, W>
where
    S: FragmentSource,
    R: Rasterizer,
    W: DocumentWriter,
{
    pub fn new(source: S, rasterizer: R, writer: W, options: RenderOptions) -> Self {
        Self {
            source,
            rasterizer,
            writer,
            options,
            state: Mutex::new(ControlState::Idle),
        }
    }

    pub fn state(&self) -> ControlState {
        *lock(&self.state)
    }

    fn begin(&self) -> Result<InFlight<'_>, ReportError> {
        let mut state = lock(&self.state);
        if !state.is_enabled() {
            return Err(ReportError::Busy);
        }
        *state = ControlState::Preparing;
        Ok(InFlight { state: &self.state })
    }

    /// Generate the report for `request`.
    ///
    /// Rejected with [`ReportError::Busy`] while another report is in flight.
    /// The control is re-enabled afterwards whether or not generation succeeded.
    pub async fn generate(&self, request: &ReportRequest) -> Result<GeneratedReport, ReportError> {
        let in_flight = self.begin()?;

        let result = self.run(request, &in_flight).await;
        match &result {
            Ok(report) => info!(
                "Generated {} ({} pages) for region {}",
                report.file_name, report.pages, request.region_id
            ),
            Err(e) => error!("Report for region {} failed: {}", request.region_id, e),
        }
        result
    }

    async fn run(
        &self,
        request: &ReportRequest,
        in_flight: &InFlight<'_>,
    ) -> Result<GeneratedReport, ReportError> {
        let html = self.source.fetch(&request.fragment_path).await?;

        in_flight.set(ControlState::Rendering);
        if !self.options.settle.is_zero() {
            tokio::time::sleep(self.options.settle).await;
        }

        let image = self.rasterizer.rasterize(&html, &self.options).await?;
        let layout = paginate(image.width, image.height, self.options.page)?;
        self.writer.write(&request.file_name, &image, &layout)?;

        Ok(GeneratedReport {
            file_name: request.file_name.clone(),
            pages: layout.page_count(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RegionId;
    use crate::report::DirFragmentSource;
    use std::sync::Arc;

    /// Pretends every 100 bytes of HTML render 1000px tall at 800px wide
    struct FixedRasterizer;

    impl Rasterizer for FixedRasterizer {
        async fn rasterize(
            &self,
            html: &str,
            options: &RenderOptions,
        ) -> Result<RasterImage, ReportError> {
            let width = (options.width_px as f32 * options.scale) as u32;
            let height = (html.len() as u32 / 100).max(1) * 1000;
            Ok(RasterImage {
                width,
                height,
                png: Vec::new(),
            })
        }
    }

    #[derive(Default, Clone)]
    struct CollectingWriter {
        written: Arc<Mutex<Vec<(String, usize)>>>,
    }

    impl DocumentWriter for CollectingWriter {
        fn write(
            &self,
            file_name: &str,
            _image: &RasterImage,
            layout: &PageLayout,
        ) -> Result<(), ReportError> {
            self.written
                .lock()
                .unwrap()
                .push((file_name.to_string(), layout.page_count()));
            Ok(())
        }
    }

    fn request(id: u32) -> ReportRequest {
        ReportRequest {
            region_id: RegionId(id),
            region_name: "Aranjuez".to_string(),
            fragment_path: format!("data/comuna{}.html", id),
            file_name: "Reporte-Aranjuez.pdf".to_string(),
        }
    }

    fn options() -> RenderOptions {
        RenderOptions {
            settle: Duration::ZERO,
            ..RenderOptions::default()
        }
    }

    #[tokio::test]
    async fn test_generate_writes_paginated_report() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("data")).unwrap();
        std::fs::write(dir.path().join("data/comuna4.html"), "x".repeat(300)).unwrap();

        let writer = CollectingWriter::default();
        let generator = ReportGenerator::new(
            DirFragmentSource::new(dir.path()),
            FixedRasterizer,
            writer.clone(),
            options(),
        );

        // 1600 x 3000 px → 393.75mm on A4 → 2 pages
        let report = generator.generate(&request(4)).await.unwrap();
        assert_eq!(report.pages, 2);
        assert_eq!(report.file_name, "Reporte-Aranjuez.pdf");
        assert_eq!(
            *writer.written.lock().unwrap(),
            vec![("Reporte-Aranjuez.pdf".to_string(), 2)]
        );
        assert_eq!(generator.state(), ControlState::Idle);
    }

    #[tokio::test]
    async fn test_missing_fragment_reenables_control() {
        let dir = tempfile::tempdir().unwrap();
        let writer = CollectingWriter::default();
        let generator = ReportGenerator::new(
            DirFragmentSource::new(dir.path()),
            FixedRasterizer,
            writer.clone(),
            options(),
        );

        let err = generator.generate(&request(5)).await.unwrap_err();
        assert!(matches!(err, ReportError::FragmentNotFound(ref r) if r == "data/comuna5.html"));
        assert_eq!(generator.state(), ControlState::Idle);
        assert!(generator.state().is_enabled());
        assert!(writer.written.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_busy_generator_rejects_second_request() {
        let dir = tempfile::tempdir().unwrap();
        let generator = ReportGenerator::new(
            DirFragmentSource::new(dir.path()),
            FixedRasterizer,
            CollectingWriter::default(),
            options(),
        );

        let held = generator.begin().unwrap();
        assert_eq!(generator.state(), ControlState::Preparing);
        assert!(matches!(
            generator.generate(&request(1)).await,
            Err(ReportError::Busy)
        ));

        drop(held);
        assert_eq!(generator.state(), ControlState::Idle);
    }

    #[test]
    fn test_control_labels() {
        assert_eq!(ControlState::Idle.label(), "Generar Reporte PDF");
        assert!(!ControlState::Rendering.is_enabled());
    }
}
