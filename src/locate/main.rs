//! Command-line session over a region dataset.
//!
//! Locates coordinates, searches names and checks report fragments without
//! a browser, driving the same session controller the map uses.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use geo::Coord;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use comunas::config::Config;
use comunas::error::GeolocationError;
use comunas::models::{DatasetSource, FeatureId, Region, RegionCollection, RegionId};
use comunas::pip::RegionLocator;
use comunas::report::{FragmentBase, FragmentSource};
use comunas::session::{
    CameraMove, LocateOutcome, MapSurface, RegionObserver, SessionController, SessionOptions,
};
use comunas::style::MapStyle;

#[derive(Parser, Debug)]
#[command(name = "locate")]
#[command(about = "Find the comuna or corregimiento for a coordinate")]
struct Args {
    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// GeoJSON dataset: file path or http(s) URL
    #[arg(short, long)]
    dataset: Option<String>,

    /// Nearest-corregimiento fallback radius, in degrees
    #[arg(long)]
    nearest_fallback: Option<f64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Locate a (lon, lat) coordinate
    Point {
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
    },
    /// Search regions by name
    Search { text: String },
    /// List corregimientos
    Corregimientos,
    /// Check that a region's report fragment is available
    Report {
        id: u32,
        /// Directory or http(s) base URL holding data/comunaN.html fragments
        #[arg(long)]
        fragments: Option<String>,
    },
}

/// Map surface that only logs what the map would do
struct LoggingMap;

impl MapSurface for LoggingMap {
    fn set_hover(&mut self, feature: FeatureId, hover: bool) {
        info!("hover feature {} = {}", feature, hover);
    }

    fn set_pointer_cursor(&mut self, _pointer: bool) {}

    fn remove_popup(&mut self) {}

    fn move_camera(&mut self, camera: CameraMove) {
        match camera {
            CameraMove::FlyTo { center, zoom, .. } => {
                info!("camera: fly to ({}, {}) at zoom {}", center.x, center.y, zoom)
            }
            CameraMove::FitBounds { bounds, .. } => info!(
                "camera: fit bounds ({}, {}) - ({}, {})",
                bounds.min().x,
                bounds.min().y,
                bounds.max().x,
                bounds.max().y
            ),
        }
    }

    fn place_user_marker(&mut self, position: Coord<f64>) {
        info!("user marker at ({}, {})", position.x, position.y);
    }
}

/// Prints selections and alerts to stdout
struct ConsoleObserver;

impl RegionObserver for ConsoleObserver {
    fn on_region_hover(&mut self, _region: Option<&Region>) {}

    fn on_region_selected(&mut self, region: &Region) {
        println!("{}\t{}\t{:?}", region.id, region.name, region.class());
    }

    fn on_alert(&mut self, message: &str) {
        eprintln!("{}", message);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::default(),
    };

    let dataset = args.dataset.unwrap_or(config.dataset.source);
    let source: DatasetSource = dataset.parse().context("Invalid dataset source")?;
    let collection = match RegionCollection::load(&source).await {
        Ok(c) => c,
        Err(e) => {
            error!("Could not load region dataset from {}: {}", source, e);
            return Err(e).context("Region dataset unavailable");
        }
    };

    let options = SessionOptions {
        style: MapStyle::preset(config.map.style),
        nearest_fallback_deg: args.nearest_fallback.or(config.map.nearest_fallback_deg),
        ..SessionOptions::default()
    };
    let mut session = SessionController::new(
        RegionLocator::new(collection),
        options,
        LoggingMap,
        ConsoleObserver,
    );

    match args.command {
        Command::Point { lon, lat } => {
            let position = if lon.is_finite() && lat.is_finite() {
                Ok(Coord { x: lon, y: lat })
            } else {
                Err(GeolocationError::Failed("non-finite coordinate".to_string()))
            };

            match session.locate(position) {
                LocateOutcome::Found { .. } => {}
                LocateOutcome::Nearby { id } => info!("No comuna; nearest corregimiento is {}", id),
                LocateOutcome::NotFound => println!("No region found"),
                LocateOutcome::Failed => anyhow::bail!("Invalid coordinate"),
            }
        }
        Command::Search { text } => {
            for region in session.search(&text) {
                println!("{}\t{}", region.id, region.name);
            }
        }
        Command::Corregimientos => {
            for entry in session.corregimientos() {
                println!("{}\t{}", entry.id, entry.label);
            }
        }
        Command::Report { id, fragments } => {
            let request = session
                .report_request(RegionId(id))
                .with_context(|| format!("Unknown region {}", id))?;
            let base = fragments.unwrap_or(config.reports.fragment_base);
            let source = FragmentBase::from_base(&base)?;

            match source.fetch(&request.fragment_path).await {
                Ok(html) => println!(
                    "{}\t{} bytes\t{}",
                    request.fragment_path,
                    html.len(),
                    request.file_name
                ),
                Err(e) => {
                    eprintln!("{}", e.user_message());
                    return Err(e.into());
                }
            }
        }
    }

    Ok(())
}
