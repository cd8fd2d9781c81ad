//! Map backend server.
//!
//! Serves the region dataset, map layer styling, point-in-polygon lookups,
//! name search and report fragments for the interactive map front-end.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Json, Response},
    routing::get,
    Router,
};
use clap::Parser;
use geo::Coord;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use comunas::config::Config;
use comunas::error::ReportError;
use comunas::models::{DatasetSource, RegionCollection, RegionId, RegionSummary};
use comunas::pip::RegionLocator;
use comunas::report::{paginate, FragmentBase, FragmentSource, PageLayout, PageSize, ReportRequest};
use comunas::search::{corregimiento_menu, search_by_name, MenuEntry};
use comunas::style::{MapStyle, StylePreset};

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser, Debug)]
#[command(name = "server")]
#[command(about = "Comunas map backend server")]
struct Args {
    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address
    #[arg(short, long)]
    listen: Option<String>,

    /// GeoJSON dataset: file path or http(s) URL
    #[arg(long)]
    dataset: Option<String>,

    /// Directory or http(s) base URL holding data/comunaN.html fragments
    #[arg(long)]
    fragments: Option<String>,

    /// Map style preset (satellite, streets, light, dark)
    #[arg(long)]
    style: Option<StylePreset>,

    /// Nearest-corregimiento fallback radius for /v1/locate, in degrees
    #[arg(long)]
    nearest_fallback: Option<f64>,
}

/// Application state shared across handlers
struct AppState {
    locator: RegionLocator,
    style: MapStyle,
    fragments: FragmentBase,
    nearest_fallback_deg: Option<f64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::default(),
    };

    let listen = args.listen.unwrap_or(config.server.listen);
    let dataset = args.dataset.unwrap_or(config.dataset.source);
    let fragments = args.fragments.unwrap_or(config.reports.fragment_base);
    let preset = args.style.unwrap_or(config.map.style);
    let nearest_fallback_deg = args.nearest_fallback.or(config.map.nearest_fallback_deg);

    info!("Comunas Map Server");

    let source: DatasetSource = dataset.parse().context("Invalid dataset source")?;
    let collection = match RegionCollection::load(&source).await {
        Ok(c) => c,
        Err(e) => {
            error!("Could not load region dataset from {}: {}", source, e);
            return Err(e).context("Region dataset unavailable");
        }
    };

    let mut style = MapStyle::preset(preset);
    if let Some(center) = config.map.center {
        style.camera.center = center;
    }

    let state = Arc::new(AppState {
        locator: RegionLocator::new(collection),
        style,
        fragments: FragmentBase::from_base(&fragments).context("Invalid fragment base")?,
        nearest_fallback_deg,
    });

    // Build router
    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/v1/regions", get(regions_handler))
        .route("/v1/regions/{id}", get(region_handler))
        .route("/v1/locate", get(locate_handler))
        .route("/v1/search", get(search_handler))
        .route("/v1/corregimientos", get(corregimientos_handler))
        .route("/v1/style", get(style_handler))
        .route("/v1/report/{id}", get(report_fragment_handler))
        .route("/v1/report/{id}/layout", get(report_layout_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    info!("Starting server on {}", listen);

    let listener = tokio::net::TcpListener::bind(&listen).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint
async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        regions: state.locator.collection().len(),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    regions: usize,
}

/// The dataset as loaded, for the map source
async fn regions_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(state.locator.collection().document().clone())
}

#[derive(Serialize)]
struct RegionDetail {
    #[serde(flatten)]
    summary: RegionSummary,
    report: ReportRequest,
}

async fn region_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u32>,
) -> Result<Json<RegionDetail>, (StatusCode, String)> {
    let region = state
        .locator
        .collection()
        .get(RegionId(id))
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("Unknown region {}", id)))?;

    Ok(Json(RegionDetail {
        summary: RegionSummary::from(region),
        report: ReportRequest::for_region(region),
    }))
}

#[derive(Deserialize)]
struct LocateQueryParams {
    /// Point longitude
    #[serde(rename = "point.lon")]
    point_lon: f64,
    /// Point latitude
    #[serde(rename = "point.lat")]
    point_lat: f64,
}

#[derive(Serialize)]
struct LocateResponse {
    /// Comuna containing the point
    region: Option<RegionSummary>,
    /// Nearest corregimiento, only when no comuna contains the point
    #[serde(skip_serializing_if = "Option::is_none")]
    nearby: Option<RegionSummary>,
}

/// Point-in-polygon lookup
async fn locate_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LocateQueryParams>,
) -> Result<Json<LocateResponse>, (StatusCode, String)> {
    if !params.point_lon.is_finite() || !params.point_lat.is_finite() {
        return Err((
            StatusCode::BAD_REQUEST,
            "point.lon and point.lat must be finite".to_string(),
        ));
    }
    let point = Coord {
        x: params.point_lon,
        y: params.point_lat,
    };

    let region = state.locator.locate(point).map(RegionSummary::from);
    let nearby = match (&region, state.nearest_fallback_deg) {
        (None, Some(max)) => state
            .locator
            .nearest_point_region(point, max)
            .map(RegionSummary::from),
        _ => None,
    };

    Ok(Json(LocateResponse { region, nearby }))
}

#[derive(Deserialize)]
struct SearchQueryParams {
    /// Search text
    #[serde(default)]
    text: String,
}

/// Name search
async fn search_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchQueryParams>,
) -> Json<Vec<RegionSummary>> {
    let results = search_by_name(state.locator.collection(), &params.text)
        .into_iter()
        .map(RegionSummary::from)
        .collect();
    Json(results)
}

async fn corregimientos_handler(State(state): State<Arc<AppState>>) -> Json<Vec<MenuEntry>> {
    Json(corregimiento_menu(state.locator.collection()))
}

#[derive(Deserialize)]
struct StyleQueryParams {
    variant: Option<StylePreset>,
}

#[derive(Serialize)]
struct StyleResponse {
    style: MapStyle,
    source: &'static str,
    layers: Vec<Value>,
}

/// Layer definitions for the configured (or requested) style
async fn style_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<StyleQueryParams>,
) -> Json<StyleResponse> {
    let style = match params.variant {
        Some(preset) => MapStyle {
            camera: state.style.camera,
            ..MapStyle::preset(preset)
        },
        None => state.style.clone(),
    };

    Json(StyleResponse {
        layers: style.layers(),
        source: comunas::style::SOURCE_ID,
        style,
    })
}

/// Raw report fragment for a region
async fn report_fragment_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u32>,
) -> Response {
    let Some(region) = state.locator.collection().get(RegionId(id)) else {
        return (StatusCode::NOT_FOUND, format!("Unknown region {}", id)).into_response();
    };
    let request = ReportRequest::for_region(region);

    match state.fragments.fetch(&request.fragment_path).await {
        Ok(html) => (
            [(
                header::CONTENT_DISPOSITION,
                format!("inline; filename=\"{}\"", request.file_name),
            )],
            Html(html),
        )
            .into_response(),
        Err(e @ ReportError::FragmentNotFound(_)) => {
            (StatusCode::NOT_FOUND, e.user_message()).into_response()
        }
        Err(e) => {
            error!("Report fragment fetch failed: {}", e);
            (StatusCode::BAD_GATEWAY, e.user_message()).into_response()
        }
    }
}

#[derive(Deserialize)]
struct LayoutQueryParams {
    /// Raster width in pixels
    width: u32,
    /// Raster height in pixels
    height: u32,
}

/// Page layout for a rasterized report of the given size
async fn report_layout_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u32>,
    Query(params): Query<LayoutQueryParams>,
) -> Result<Json<PageLayout>, (StatusCode, String)> {
    if state.locator.collection().get(RegionId(id)).is_none() {
        return Err((StatusCode::NOT_FOUND, format!("Unknown region {}", id)));
    }

    paginate(params.width, params.height, PageSize::A4)
        .map(Json)
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))
}
