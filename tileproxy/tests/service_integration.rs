//! Integration tests for tile resolution through a started app.
//!
//! These tests verify the read-through flow end to end:
//! - remote fetch → cache write → cache hit without remote traffic
//! - remote miss → placeholder persisted at the tile path
//! - existence checks that never touch the remote for cached tiles
//!
//! Run with: `cargo test --test service_integration`

mod common;

use std::sync::Arc;

use tempfile::TempDir;
use tileproxy::remote::RemoteError;
use tileproxy::service::{ServiceError, TileSource};
use tileproxy::tile::TileRequest;

use common::{start_app, CountingRemote, BLANK};

// ============================================================================
// Helper Functions
// ============================================================================

/// Zoom 4 has 16 rows, so client row 10 is stored as row 5.
fn sky_cover() -> TileRequest {
    TileRequest::new("SkyCover_Tiles", "2025070112", 4, 7, 10)
}

const SKY_COVER_KEY: &str = "data-layer-tiles/SkyCover_Tiles/2025070112/4/7/5.png";
const SKY_COVER_PATH: &str = "cache/SkyCover_Tiles/2025070112/4/7/5.png";

// ============================================================================
// Integration Tests
// ============================================================================

#[tokio::test]
async fn test_read_through_then_local_only() {
    let temp_dir = TempDir::new().unwrap();
    let remote = Arc::new(CountingRemote::with_placeholder());
    remote.put(SKY_COVER_KEY, b"sky");
    let app = start_app(&temp_dir, Arc::clone(&remote)).await;

    let first = app.service().resolve_content(&sky_cover()).await.unwrap();
    assert_eq!(first.source, TileSource::Remote);
    assert_eq!(&first.data[..], b"sky");
    assert_eq!(remote.fetches(), 1);
    assert_eq!(
        std::fs::read(temp_dir.path().join(SKY_COVER_PATH)).unwrap(),
        b"sky"
    );

    // Once cached, the remote copy no longer matters
    remote.put(SKY_COVER_KEY, b"newer");
    let second = app.service().resolve_content(&sky_cover()).await.unwrap();
    assert_eq!(second.source, TileSource::Cache);
    assert_eq!(&second.data[..], b"sky");
    assert_eq!(remote.total_calls(), 1);

    let snapshot = app.telemetry().snapshot();
    assert_eq!(snapshot.remote_fetches, 1);
    assert_eq!(snapshot.cache_hits, 1);

    app.shutdown().await;
}

#[tokio::test]
async fn test_missing_tile_is_cached_as_placeholder() {
    let temp_dir = TempDir::new().unwrap();
    let remote = Arc::new(CountingRemote::with_placeholder());
    let app = start_app(&temp_dir, Arc::clone(&remote)).await;

    let first = app.service().resolve_content(&sky_cover()).await.unwrap();
    assert_eq!(first.source, TileSource::Placeholder);
    assert_eq!(&first.data[..], BLANK);
    assert_eq!(
        std::fs::read(temp_dir.path().join(SKY_COVER_PATH)).unwrap(),
        BLANK
    );

    // The tile appearing remotely later does not replace the cached placeholder
    remote.put(SKY_COVER_KEY, b"late");
    let calls = remote.total_calls();
    let second = app.service().resolve_content(&sky_cover()).await.unwrap();
    assert_eq!(second.source, TileSource::Cache);
    assert_eq!(&second.data[..], BLANK);
    assert_eq!(remote.total_calls(), calls);

    app.shutdown().await;
}

#[tokio::test]
async fn test_transport_fault_serves_placeholder_from_cache() {
    let temp_dir = TempDir::new().unwrap();
    let remote = Arc::new(CountingRemote::with_placeholder());
    let app = start_app(&temp_dir, Arc::clone(&remote)).await;

    // Warm the placeholder, then break the store
    let warm = TileRequest::new("Temp_Tiles", "2025070112", 0, 0, 0);
    app.service().resolve_content(&warm).await.unwrap();
    remote.fail_with(RemoteError::Transport("connection reset".to_string()));

    let content = app.service().resolve_content(&sky_cover()).await.unwrap();
    assert_eq!(content.source, TileSource::Placeholder);
    assert_eq!(&content.data[..], BLANK);
    assert_eq!(app.telemetry().snapshot().remote_errors, 1);

    app.shutdown().await;
}

#[tokio::test]
async fn test_placeholder_unavailable() {
    let temp_dir = TempDir::new().unwrap();
    let remote = Arc::new(CountingRemote::new());
    let app = start_app(&temp_dir, Arc::clone(&remote)).await;

    let err = app
        .service()
        .resolve_content(&sky_cover())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::PlaceholderUnavailable(_)));
    assert!(!temp_dir.path().join(SKY_COVER_PATH).exists());

    app.shutdown().await;
}

#[tokio::test]
async fn test_unknown_layer_never_reaches_remote() {
    let temp_dir = TempDir::new().unwrap();
    let remote = Arc::new(CountingRemote::with_placeholder());
    let app = start_app(&temp_dir, Arc::clone(&remote)).await;

    let request = TileRequest::new("Nope_Tiles", "2025070112", 4, 7, 10);
    let err = app.service().resolve_content(&request).await.unwrap_err();
    assert!(matches!(err, ServiceError::LayerNotFound(ref layer) if layer == "Nope_Tiles"));
    assert!(!app.service().resolve_exists(&request).await);
    assert_eq!(remote.total_calls(), 0);

    app.shutdown().await;
}

#[tokio::test]
async fn test_exists_answers_locally_when_cached() {
    let temp_dir = TempDir::new().unwrap();
    let remote = Arc::new(CountingRemote::with_placeholder());
    remote.put(SKY_COVER_KEY, b"sky");
    let app = start_app(&temp_dir, Arc::clone(&remote)).await;

    // Not cached yet: the remote is asked
    assert!(app.service().resolve_exists(&sky_cover()).await);
    assert_eq!(remote.exists_checks(), 1);

    app.service().resolve_content(&sky_cover()).await.unwrap();
    let calls = remote.total_calls();

    // Cached: no remote traffic, even though the store now errors
    remote.fail_with(RemoteError::Transport("down".to_string()));
    assert!(app.service().resolve_exists(&sky_cover()).await);
    assert_eq!(remote.total_calls(), calls);

    app.shutdown().await;
}

#[tokio::test]
async fn test_static_layer_key_has_no_timestamp() {
    let temp_dir = TempDir::new().unwrap();
    let remote = Arc::new(CountingRemote::with_placeholder());
    remote.put(
        "light-pollution-data/zenith_ConUSA_colored_tiles/2/1/0.png",
        b"lp",
    );
    let app = start_app(&temp_dir, Arc::clone(&remote)).await;

    // Zoom 2: y = 3 flips to row 0
    let request = TileRequest::static_tile("LightPollution_Tiles", 2, 1, 3);
    let content = app.service().resolve_content(&request).await.unwrap();
    assert_eq!(content.source, TileSource::Remote);
    assert_eq!(&content.data[..], b"lp");
    assert!(temp_dir
        .path()
        .join("cache/LightPollution_Tiles/static/2/1/0.png")
        .is_file());

    app.shutdown().await;
}

#[tokio::test]
async fn test_concurrent_misses_all_succeed() {
    let temp_dir = TempDir::new().unwrap();
    let remote = Arc::new(CountingRemote::with_placeholder());
    remote.put(SKY_COVER_KEY, b"sky");
    let app = start_app(&temp_dir, Arc::clone(&remote)).await;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let service = app.service().clone();
        handles.push(tokio::spawn(async move {
            service.resolve_content(&sky_cover()).await
        }));
    }
    for handle in handles {
        let content = handle.await.unwrap().unwrap();
        assert_eq!(&content.data[..], b"sky");
    }

    // Later readers always see a complete file
    assert_eq!(
        std::fs::read(temp_dir.path().join(SKY_COVER_PATH)).unwrap(),
        b"sky"
    );

    app.shutdown().await;
}
