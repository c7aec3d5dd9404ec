//! Integration tests for the HTTP surface.
//!
//! Requests are driven through the axum router with `tower::ServiceExt`,
//! so no socket is opened.
//!
//! Run with: `cargo test --test router_integration`

mod common;

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use tempfile::TempDir;
use tower::ServiceExt;

use common::{start_app, CountingRemote, BLANK};

// ============================================================================
// Helper Functions
// ============================================================================

async fn send(router: &Router, method: Method, uri: &str) -> Response {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    router.clone().oneshot(request).await.unwrap()
}

async fn body_bytes(response: Response) -> Vec<u8> {
    to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

async fn body_json(response: Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

// ============================================================================
// Tiles
// ============================================================================

#[tokio::test]
async fn test_get_tile() {
    let temp_dir = TempDir::new().unwrap();
    let remote = Arc::new(CountingRemote::with_placeholder());
    remote.put("data-layer-tiles/Temp_Tiles/2025070112/3/4/2.png", b"temp");
    let app = start_app(&temp_dir, Arc::clone(&remote)).await;
    let router = app.router();

    let response = send(&router, Method::GET, "/tiles/Temp_Tiles/2025070112/3/4/5.png").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
    assert_eq!(
        response.headers()[header::CACHE_CONTROL],
        "public, max-age=604800"
    );
    assert_eq!(body_bytes(response).await, b"temp");

    app.shutdown().await;
}

#[tokio::test]
async fn test_missing_tile_returns_placeholder_with_ok() {
    let temp_dir = TempDir::new().unwrap();
    let remote = Arc::new(CountingRemote::with_placeholder());
    let app = start_app(&temp_dir, Arc::clone(&remote)).await;
    let router = app.router();

    let response = send(&router, Method::GET, "/tiles/Temp_Tiles/2025070112/3/4/5.png").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, BLANK);

    app.shutdown().await;
}

#[tokio::test]
async fn test_tile_and_fallback_missing() {
    let temp_dir = TempDir::new().unwrap();
    let remote = Arc::new(CountingRemote::new());
    let app = start_app(&temp_dir, Arc::clone(&remote)).await;
    let router = app.router();

    let response = send(&router, Method::GET, "/tiles/Temp_Tiles/2025070112/3/4/5.png").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_bytes(response).await, b"Tile and fallback missing");

    app.shutdown().await;
}

#[tokio::test]
async fn test_unknown_layer() {
    let temp_dir = TempDir::new().unwrap();
    let remote = Arc::new(CountingRemote::with_placeholder());
    let app = start_app(&temp_dir, Arc::clone(&remote)).await;
    let router = app.router();

    let response = send(&router, Method::GET, "/tiles/Nope/2025070112/3/4/5.png").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_bytes(response).await, b"Layer not found");
    assert_eq!(remote.total_calls(), 0);

    app.shutdown().await;
}

#[tokio::test]
async fn test_out_of_range_and_malformed_rows() {
    let temp_dir = TempDir::new().unwrap();
    let remote = Arc::new(CountingRemote::with_placeholder());
    let app = start_app(&temp_dir, Arc::clone(&remote)).await;
    let router = app.router();

    for uri in [
        "/tiles/Temp_Tiles/2025070112/3/4/8.png",
        "/tiles/Temp_Tiles/2025070112/3/4/5.jpg",
        "/tiles/Temp_Tiles/2025070112/3/four/5.png",
    ] {
        let response = send(&router, Method::GET, uri).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{}", uri);
    }
    assert_eq!(remote.total_calls(), 0);

    app.shutdown().await;
}

#[tokio::test]
async fn test_head_tile() {
    let temp_dir = TempDir::new().unwrap();
    let remote = Arc::new(CountingRemote::with_placeholder());
    remote.put("data-layer-tiles/Temp_Tiles/2025070112/3/4/2.png", b"temp");
    let app = start_app(&temp_dir, Arc::clone(&remote)).await;
    let router = app.router();

    let found = send(&router, Method::HEAD, "/tiles/Temp_Tiles/2025070112/3/4/5.png").await;
    assert_eq!(found.status(), StatusCode::OK);

    let missing = send(&router, Method::HEAD, "/tiles/Temp_Tiles/2025070112/3/4/6.png").await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    // HEAD never fills the cache
    assert_eq!(remote.fetches(), 0);

    app.shutdown().await;
}

#[tokio::test]
async fn test_static_route() {
    let temp_dir = TempDir::new().unwrap();
    let remote = Arc::new(CountingRemote::with_placeholder());
    remote.put(
        "light-pollution-data/zenith_ConUSA_colored_tiles/2/1/0.png",
        b"lp",
    );
    let app = start_app(&temp_dir, Arc::clone(&remote)).await;
    let router = app.router();

    let response = send(&router, Method::GET, "/tiles/LightPollution_Tiles/2/1/3.png").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"lp");

    app.shutdown().await;
}

// ============================================================================
// Legends, plots, health
// ============================================================================

#[tokio::test]
async fn test_legend() {
    let temp_dir = TempDir::new().unwrap();
    let remote = Arc::new(CountingRemote::with_placeholder());
    remote.put("plots/LightPollution_Legend_Light.png", b"legend");
    let app = start_app(&temp_dir, Arc::clone(&remote)).await;
    let router = app.router();

    let response = send(&router, Method::GET, "/legends/LightPollution_Light.png").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, b"legend");

    let response = send(&router, Method::GET, "/legends/unknown.png").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        body_json(response).await,
        serde_json::json!({ "error": "Invalid legend" })
    );

    app.shutdown().await;
}

#[tokio::test]
async fn test_plot() {
    let temp_dir = TempDir::new().unwrap();
    let remote = Arc::new(CountingRemote::with_placeholder());
    remote.put("plots/cloud_cover.gif", b"GIF89a");
    let app = start_app(&temp_dir, Arc::clone(&remote)).await;
    let router = app.router();

    let response = send(&router, Method::GET, "/plots/cloud_cover.gif").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/gif");

    let response = send(&router, Method::GET, "/plots/missing.png").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        body_json(response).await,
        serde_json::json!({ "error": "File not found" })
    );

    app.shutdown().await;
}

#[tokio::test]
async fn test_health() {
    let temp_dir = TempDir::new().unwrap();
    let remote = Arc::new(CountingRemote::with_placeholder());
    let app = start_app(&temp_dir, Arc::clone(&remote)).await;
    let router = app.router();

    let response = send(&router, Method::GET, "/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["version"], tileproxy::VERSION);
    assert_eq!(json["cache_hits"], 0);

    app.shutdown().await;
}

#[tokio::test]
async fn test_cors_header_present() {
    let temp_dir = TempDir::new().unwrap();
    let remote = Arc::new(CountingRemote::with_placeholder());
    let app = start_app(&temp_dir, Arc::clone(&remote)).await;
    let router = app.router();

    let request = Request::builder()
        .uri("/health")
        .header(header::ORIGIN, "https://example.org")
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );

    app.shutdown().await;
}

#[tokio::test]
async fn test_unmatched_route() {
    let temp_dir = TempDir::new().unwrap();
    let remote = Arc::new(CountingRemote::with_placeholder());
    let app = start_app(&temp_dir, Arc::clone(&remote)).await;
    let router = app.router();

    let response = send(&router, Method::GET, "/nothing/here").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    app.shutdown().await;
}
