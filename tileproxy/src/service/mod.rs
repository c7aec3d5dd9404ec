//! Tile resolution service.
//!
//! The entry point for everything that serves tiles. It combines the key
//! resolver, the local cache, the remote store and the placeholder into two
//! operations:
//!
//! ```text
//!                  resolve_content(request)
//!                            │
//!                    KeyResolver::resolve ──── unknown layer ──► LayerNotFound
//!                            │
//!                  DiskCache::read(path) ───── hit ────────────► Cache
//!                            │ miss
//!              ┌─────────────┴──── spawned task ───────────────┐
//!              │  RemoteSource::fetch(key) ── ok ──► write ────┼─► Remote
//!              │          │ miss / error / timeout             │
//!              │  PlaceholderProvider::get ── ok ──► write ────┼─► Placeholder
//!              │          │ error                              │
//!              └──────────┴────────────────────────────────────┼─► PlaceholderUnavailable
//!                                                              ┘
//! ```
//!
//! `resolve_exists` follows the same first two steps and then asks the
//! remote store, never fetching bytes.
//!
//! The miss path runs on its own task. If the caller is dropped (client
//! disconnect) the fetch and cache write still complete, so the next
//! request for the same tile is a cache hit.

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::cache::DiskCache;
use crate::placeholder::{PlaceholderError, PlaceholderProvider};
use crate::remote::{bounded, RemoteError, RemoteSource, DEFAULT_REMOTE_TIMEOUT};
use crate::resolver::{KeyResolver, ResolveError, ResolvedTile};
use crate::telemetry::TileTelemetry;
use crate::tile::TileRequest;

/// Errors surfaced to the routing layer.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Requested layer is not registered.
    #[error("Layer not found: {0}")]
    LayerNotFound(String),

    /// Coordinates or timestamp do not address a tile.
    #[error("Invalid tile request: {0}")]
    InvalidRequest(ResolveError),

    /// Tile missing and the fallback image could not be produced.
    #[error("Tile and fallback missing: {0}")]
    PlaceholderUnavailable(#[source] PlaceholderError),

    /// Worker task failed.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ResolveError> for ServiceError {
    fn from(e: ResolveError) -> Self {
        match e {
            ResolveError::UnknownLayer(layer) => ServiceError::LayerNotFound(layer),
            other => ServiceError::InvalidRequest(other),
        }
    }
}

/// Where the returned bytes came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileSource {
    Cache,
    Remote,
    Placeholder,
}

impl fmt::Display for TileSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TileSource::Cache => write!(f, "cache"),
            TileSource::Remote => write!(f, "remote"),
            TileSource::Placeholder => write!(f, "placeholder"),
        }
    }
}

/// Bytes of a resolved tile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileContent {
    pub data: Bytes,
    pub source: TileSource,
}

impl TileContent {
    fn new(data: Vec<u8>, source: TileSource) -> Self {
        Self {
            data: Bytes::from(data),
            source,
        }
    }
}

/// Read-through cache over a remote tile store.
///
/// Cheap to clone; clones share the cache, remote source and telemetry.
pub struct TileService<R> {
    resolver: KeyResolver,
    cache: DiskCache,
    remote: Arc<R>,
    placeholder: Arc<PlaceholderProvider<R>>,
    telemetry: Arc<TileTelemetry>,
    remote_timeout: Duration,
}

impl<R> Clone for TileService<R> {
    fn clone(&self) -> Self {
        Self {
            resolver: self.resolver.clone(),
            cache: self.cache.clone(),
            remote: Arc::clone(&self.remote),
            placeholder: Arc::clone(&self.placeholder),
            telemetry: Arc::clone(&self.telemetry),
            remote_timeout: self.remote_timeout,
        }
    }
}

impl<R: RemoteSource> TileService<R> {
    /// Create a service.
    ///
    /// # Arguments
    ///
    /// * `resolver` - Key resolver over the layer registry
    /// * `cache` - Local tile cache
    /// * `remote` - Remote object store
    /// * `placeholder` - Fallback image provider
    pub fn new(
        resolver: KeyResolver,
        cache: DiskCache,
        remote: Arc<R>,
        placeholder: PlaceholderProvider<R>,
    ) -> Self {
        Self {
            resolver,
            cache,
            remote,
            placeholder: Arc::new(placeholder),
            telemetry: Arc::new(TileTelemetry::new()),
            remote_timeout: DEFAULT_REMOTE_TIMEOUT,
        }
    }

    /// Share telemetry counters with other components.
    pub fn with_telemetry(mut self, telemetry: Arc<TileTelemetry>) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// Bound every remote call made on behalf of a tile.
    pub fn with_remote_timeout(mut self, timeout: Duration) -> Self {
        self.remote_timeout = timeout;
        self
    }

    /// Get the key resolver.
    pub fn resolver(&self) -> &KeyResolver {
        &self.resolver
    }

    /// Get the local cache.
    pub fn cache(&self) -> &DiskCache {
        &self.cache
    }

    /// Get the telemetry counters.
    pub fn telemetry(&self) -> &Arc<TileTelemetry> {
        &self.telemetry
    }

    /// Does this tile exist locally or remotely?
    ///
    /// Never fails: an unknown layer, an invalid request and any remote
    /// fault all answer `false`. A local hit answers without contacting the
    /// remote store.
    pub async fn resolve_exists(&self, request: &TileRequest) -> bool {
        let resolved = match self.resolver.resolve(request) {
            Ok(resolved) => resolved,
            Err(e) => {
                debug!(request = %request, error = %e, "Tile existence check rejected");
                return false;
            }
        };

        if self.cache.exists(&resolved.cache_path).await {
            debug!(path = %resolved.cache_path.display(), "Tile found in local cache");
            self.telemetry.record_cache_hit();
            return true;
        }

        match bounded(self.remote_timeout, self.remote.exists(&resolved.key)).await {
            Ok(found) => found,
            Err(e) => {
                warn!(key = %resolved.key, error = %e, "Remote existence check failed");
                self.telemetry.record_remote_error();
                false
            }
        }
    }

    /// Get the bytes for a tile.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::LayerNotFound`] for an unregistered layer
    /// - [`ServiceError::InvalidRequest`] for coordinates or timestamps
    ///   that cannot address a tile
    /// - [`ServiceError::PlaceholderUnavailable`] when both the tile and
    ///   the placeholder are unavailable
    pub async fn resolve_content(&self, request: &TileRequest) -> Result<TileContent, ServiceError> {
        let resolved = self.resolver.resolve(request).inspect_err(|e| {
            if matches!(e, ResolveError::UnknownLayer(_)) {
                warn!(layer = %request.layer(), "Invalid layer requested");
            }
        })?;

        match self.cache.read(&resolved.cache_path).await {
            Ok(Some(data)) => {
                self.telemetry.record_cache_hit();
                return Ok(TileContent::new(data, TileSource::Cache));
            }
            Ok(None) => {}
            Err(e) => {
                warn!(error = %e, "Local cache read failed, treating as miss");
                self.telemetry.record_local_io_error();
            }
        }

        let service = self.clone();
        tokio::spawn(async move { service.fill_miss(resolved).await })
            .await
            .map_err(|e| ServiceError::Internal(format!("tile fetch task failed: {}", e)))?
    }

    /// Fetch a missed tile, falling back to the placeholder, and persist
    /// whichever bytes are returned at the tile's cache path.
    async fn fill_miss(&self, resolved: ResolvedTile) -> Result<TileContent, ServiceError> {
        match bounded(self.remote_timeout, self.remote.fetch(&resolved.key)).await {
            Ok(data) => {
                self.telemetry.record_remote_fetch();
                self.persist(&resolved.cache_path, &data).await;
                Ok(TileContent::new(data, TileSource::Remote))
            }
            Err(e) => {
                self.log_remote_failure(&resolved.key, &e);

                let data = self.placeholder.get().await.map_err(|e| {
                    error!(key = %resolved.key, error = %e, "Tile and fallback missing");
                    ServiceError::PlaceholderUnavailable(e)
                })?;
                self.telemetry.record_placeholder();
                self.persist(&resolved.cache_path, &data).await;
                Ok(TileContent::new(data, TileSource::Placeholder))
            }
        }
    }

    fn log_remote_failure(&self, key: &str, e: &RemoteError) {
        if e.is_miss() {
            self.telemetry.record_remote_miss();
            warn!(key = %key, "Tile missing from remote store, serving placeholder");
        } else {
            self.telemetry.record_remote_error();
            warn!(key = %key, error = %e, "Remote tile fetch failed, serving placeholder");
        }
    }

    /// Best-effort cache write; failures only affect later requests.
    async fn persist(&self, path: &Path, data: &[u8]) {
        if let Err(e) = self.cache.write(path, data.to_vec()).await {
            warn!(error = %e, "Failed to persist tile to local cache");
            self.telemetry.record_local_io_error();
        }
    }
}
