//! Fallback image for tiles the remote store cannot supply.
//!
//! The placeholder is a single well-known object. It is fetched from the
//! remote store on first use and kept in the local cache as
//! [`PLACEHOLDER_FILE`]; later calls read the local copy.
//!
//! Concurrent first use is tolerated rather than prevented: two callers may
//! both fetch and both write, and the atomic cache write guarantees the
//! file is never torn. The object is immutable, so the last writer's bytes
//! are the same as the first's.
//!
//! The local copy is an ordinary cache entry and expires with everything
//! else. When the janitor removes it the next call simply refetches.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::{error, info, warn};

use crate::cache::DiskCache;
use crate::remote::{bounded, RemoteError, RemoteSource, DEFAULT_REMOTE_TIMEOUT};

/// Remote key of the blank tile.
pub const DEFAULT_PLACEHOLDER_KEY: &str = "data-layer-tiles/blank_tile_256x256.png";

/// Local file name of the cached placeholder, relative to the cache root.
pub const PLACEHOLDER_FILE: &str = "blank_tile.png";

/// The placeholder could not be produced.
#[derive(Debug, Clone, Error)]
#[error("Placeholder {key} unavailable: {source}")]
pub struct PlaceholderError {
    pub key: String,
    #[source]
    pub source: RemoteError,
}

/// Supplies the fallback image, caching it locally after first use.
#[derive(Debug)]
pub struct PlaceholderProvider<R> {
    remote: Arc<R>,
    cache: DiskCache,
    key: String,
    file: PathBuf,
    timeout: Duration,
}

impl<R: RemoteSource> PlaceholderProvider<R> {
    /// Create a provider using the default key and local file name.
    pub fn new(remote: Arc<R>, cache: DiskCache) -> Self {
        Self {
            remote,
            cache,
            key: DEFAULT_PLACEHOLDER_KEY.to_string(),
            file: PathBuf::from(PLACEHOLDER_FILE),
            timeout: DEFAULT_REMOTE_TIMEOUT,
        }
    }

    /// Use a different remote key.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Bound the remote fetch.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Remote key of the placeholder object.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Cache-relative path of the local copy.
    pub fn file(&self) -> &Path {
        &self.file
    }

    /// Get the placeholder bytes.
    ///
    /// # Errors
    ///
    /// Returns [`PlaceholderError`] when there is no local copy and the
    /// remote fetch fails. A failure to persist the fetched bytes is logged
    /// and does not fail the call.
    pub async fn get(&self) -> Result<Vec<u8>, PlaceholderError> {
        match self.cache.read(&self.file).await {
            Ok(Some(data)) => return Ok(data),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Failed to read cached placeholder, refetching"),
        }

        let data = bounded(self.timeout, self.remote.fetch(&self.key))
            .await
            .map_err(|source| {
                error!(key = %self.key, error = %source, "Failed to fetch placeholder tile");
                PlaceholderError {
                    key: self.key.clone(),
                    source,
                }
            })?;

        match self.cache.write(&self.file, data.clone()).await {
            Ok(()) => info!(key = %self.key, "Cached placeholder tile locally"),
            Err(e) => warn!(error = %e, "Failed to cache placeholder tile"),
        }
        Ok(data)
    }
}
