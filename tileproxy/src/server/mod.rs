//! HTTP surface.
//!
//! Thin axum layer over [`TileService`] and [`AssetService`]. Handlers
//! parse paths, call the service, and map results to status codes; no tile
//! logic lives here.
//!
//! | Method   | Path                                          | Handler                     |
//! |----------|-----------------------------------------------|-----------------------------|
//! | GET/HEAD | `/tiles/{layer}/{timestamp}/{z}/{x}/{y}.png`  | content / existence         |
//! | GET/HEAD | `/tiles/{layer}/{z}/{x}/{y}.png`              | same, timestamp `static`    |
//! | GET/HEAD | `/legends/{filename}`                         | legend passthrough          |
//! | GET/HEAD | `/plots/{filename}`                           | plot passthrough            |
//! | GET      | `/health`                                     | status and counters         |

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{header, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

use crate::assets::{Asset, AssetError, AssetService};
use crate::remote::RemoteSource;
use crate::service::{ServiceError, TileContent, TileService};
use crate::telemetry::{TelemetrySnapshot, TileTelemetry};
use crate::tile::{TileRequest, STATIC_TIMESTAMP};

/// Default Cache-Control for tile responses (7 days).
pub const DEFAULT_TILE_CACHE_CONTROL: &str = "public, max-age=604800";

const TILE_SUFFIX: &str = ".png";

/// Shared state of every handler.
pub struct ServerState<R> {
    pub tiles: TileService<R>,
    pub assets: AssetService<R>,
    pub telemetry: Arc<TileTelemetry>,
    pub tile_cache_control: String,
}

/// Build the router with CORS and request tracing applied.
pub fn router<R: RemoteSource>(state: ServerState<R>) -> Router {
    Router::new()
        .route(
            "/tiles/:layer/:timestamp/:z/:x/:y",
            get(get_tile::<R>).head(head_tile::<R>),
        )
        .route(
            "/tiles/:layer/:z/:x/:y",
            get(get_static_tile::<R>).head(head_static_tile::<R>),
        )
        .route(
            "/legends/:filename",
            get(get_legend::<R>).head(head_legend::<R>),
        )
        .route("/plots/:filename", get(get_plot::<R>).head(head_plot::<R>))
        .route("/health", get(health::<R>))
        .fallback(fallback)
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::HEAD, Method::OPTIONS])
        .allow_headers(Any)
}

// ============================================================================
// Tiles
// ============================================================================

#[derive(Debug, Deserialize)]
struct TilePath {
    layer: String,
    timestamp: String,
    z: String,
    x: String,
    y: String,
}

#[derive(Debug, Deserialize)]
struct StaticTilePath {
    layer: String,
    z: String,
    x: String,
    y: String,
}

impl From<StaticTilePath> for TilePath {
    fn from(path: StaticTilePath) -> Self {
        Self {
            layer: path.layer,
            timestamp: STATIC_TIMESTAMP.to_string(),
            z: path.z,
            x: path.x,
            y: path.y,
        }
    }
}

impl TilePath {
    /// Parse numeric segments; the row must carry the `.png` suffix.
    fn into_request(self) -> Option<TileRequest> {
        let y = self.y.strip_suffix(TILE_SUFFIX)?.parse().ok()?;
        let z = self.z.parse().ok()?;
        let x = self.x.parse().ok()?;
        Some(TileRequest::new(self.layer, self.timestamp, z, x, y))
    }
}

async fn get_tile<R: RemoteSource>(
    State(state): State<Arc<ServerState<R>>>,
    Path(path): Path<TilePath>,
) -> Response {
    serve_tile(&state, path).await
}

async fn get_static_tile<R: RemoteSource>(
    State(state): State<Arc<ServerState<R>>>,
    Path(path): Path<StaticTilePath>,
) -> Response {
    serve_tile(&state, path.into()).await
}

async fn head_tile<R: RemoteSource>(
    State(state): State<Arc<ServerState<R>>>,
    Path(path): Path<TilePath>,
) -> StatusCode {
    check_tile(&state, path).await
}

async fn head_static_tile<R: RemoteSource>(
    State(state): State<Arc<ServerState<R>>>,
    Path(path): Path<StaticTilePath>,
) -> StatusCode {
    check_tile(&state, path.into()).await
}

async fn serve_tile<R: RemoteSource>(state: &ServerState<R>, path: TilePath) -> Response {
    let Some(request) = path.into_request() else {
        return (StatusCode::NOT_FOUND, "Tile not found").into_response();
    };

    match state.tiles.resolve_content(&request).await {
        Ok(content) => tile_response(content, &state.tile_cache_control),
        Err(e) => service_error_response(&e),
    }
}

async fn check_tile<R: RemoteSource>(state: &ServerState<R>, path: TilePath) -> StatusCode {
    let Some(request) = path.into_request() else {
        return StatusCode::NOT_FOUND;
    };

    if state.tiles.resolve_exists(&request).await {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    }
}

fn tile_response(content: TileContent, cache_control: &str) -> Response {
    debug!(source = %content.source, bytes = content.data.len(), "Serving tile");
    (
        [
            (header::CONTENT_TYPE, "image/png"),
            (header::CACHE_CONTROL, cache_control),
        ],
        content.data,
    )
        .into_response()
}

fn service_error_response(e: &ServiceError) -> Response {
    let (status, body) = match e {
        ServiceError::LayerNotFound(_) => (StatusCode::NOT_FOUND, "Layer not found"),
        ServiceError::InvalidRequest(_) => (StatusCode::NOT_FOUND, "Tile not found"),
        ServiceError::PlaceholderUnavailable(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "Tile and fallback missing")
        }
        ServiceError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
    };
    (status, body).into_response()
}

// ============================================================================
// Legends and plots
// ============================================================================

async fn get_legend<R: RemoteSource>(
    State(state): State<Arc<ServerState<R>>>,
    Path(filename): Path<String>,
) -> Response {
    asset_response(state.assets.legend(&filename).await)
}

async fn head_legend<R: RemoteSource>(
    State(state): State<Arc<ServerState<R>>>,
    Path(filename): Path<String>,
) -> StatusCode {
    found_or_not(state.assets.legend_exists(&filename).await)
}

async fn get_plot<R: RemoteSource>(
    State(state): State<Arc<ServerState<R>>>,
    Path(filename): Path<String>,
) -> Response {
    asset_response(state.assets.plot(&filename).await)
}

async fn head_plot<R: RemoteSource>(
    State(state): State<Arc<ServerState<R>>>,
    Path(filename): Path<String>,
) -> StatusCode {
    found_or_not(state.assets.plot_exists(&filename).await)
}

fn asset_response(result: Result<Asset, AssetError>) -> Response {
    match result {
        Ok(asset) => (
            [
                (header::CONTENT_TYPE, asset.content_type),
                (header::CACHE_CONTROL, asset.cache_control),
            ],
            asset.data,
        )
            .into_response(),
        Err(e) => (StatusCode::NOT_FOUND, Json(json!({ "error": e.to_string() }))).into_response(),
    }
}

fn found_or_not(found: bool) -> StatusCode {
    if found {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    }
}

// ============================================================================
// Health and fallback
// ============================================================================

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    #[serde(flatten)]
    telemetry: TelemetrySnapshot,
}

async fn health<R: RemoteSource>(State(state): State<Arc<ServerState<R>>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: crate::VERSION,
        telemetry: state.telemetry.snapshot(),
    })
}

async fn fallback(method: Method, uri: Uri) -> Response {
    warn!(method = %method, uri = %uri, "Unmatched request");
    (StatusCode::NOT_FOUND, "Not found").into_response()
}
