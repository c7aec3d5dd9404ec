//! Remote object store access.
//!
//! The core only needs two operations against the store: fetch the bytes
//! of an object and check whether an object exists. [`RemoteSource`] is that
//! seam; concrete backends are:
//!
//! - [`S3Source`] - S3-compatible bucket (Cloudflare R2 by default) over HTTPS
//! - [`DirectorySource`] - local directory laid out like the bucket
//! - [`StoreSource`] - runtime choice between the two, selected by config
//!
//! Backends do not enforce an overall deadline; callers wrap calls in
//! [`bounded`] so that every backend gets the same timeout behavior.

mod directory;
mod s3;

use std::future::Future;
use std::time::Duration;

use thiserror::Error;

pub use directory::DirectorySource;
pub use s3::{r2_endpoint, Credentials, S3Config, S3Source, DEFAULT_BUCKET, DEFAULT_REGION};

/// Default deadline for a single remote call.
pub const DEFAULT_REMOTE_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors from the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// Object is absent from the store.
    #[error("Object not found: {0}")]
    Miss(String),

    /// Network or server fault.
    #[error("Remote transport error: {0}")]
    Transport(String),

    /// Call did not complete within the deadline.
    #[error("Remote call timed out after {0:?}")]
    Timeout(Duration),

    /// Key cannot be sent to the store.
    #[error("Invalid object key: {0:?}")]
    InvalidKey(String),
}

impl RemoteError {
    /// Returns true if the object is known to be absent.
    pub fn is_miss(&self) -> bool {
        matches!(self, RemoteError::Miss(_))
    }
}

/// Read-only access to an object store.
///
/// Implementations must be cheap to share across tasks.
pub trait RemoteSource: Send + Sync + 'static {
    /// Fetch the bytes stored under `key`.
    ///
    /// # Errors
    ///
    /// [`RemoteError::Miss`] if the object does not exist, any other
    /// variant for faults.
    fn fetch(&self, key: &str) -> impl Future<Output = Result<Vec<u8>, RemoteError>> + Send;

    /// Check whether an object exists under `key`.
    fn exists(&self, key: &str) -> impl Future<Output = Result<bool, RemoteError>> + Send;

    /// Short backend name for logging.
    fn name(&self) -> &str;
}

/// Run a remote call with a deadline; expiry becomes [`RemoteError::Timeout`].
pub async fn bounded<T, F>(timeout: Duration, call: F) -> Result<T, RemoteError>
where
    F: Future<Output = Result<T, RemoteError>>,
{
    tokio::time::timeout(timeout, call)
        .await
        .unwrap_or(Err(RemoteError::Timeout(timeout)))
}

/// Check that `key` is a relative, slash-separated object key.
pub(crate) fn validate_key(key: &str) -> Result<(), RemoteError> {
    let valid = !key.is_empty()
        && key
            .split('/')
            .all(|segment| !segment.is_empty() && segment != "." && segment != "..")
        && !key.contains('\\');
    if valid {
        Ok(())
    } else {
        Err(RemoteError::InvalidKey(key.to_string()))
    }
}

/// Remote backend selected at runtime.
#[derive(Debug)]
pub enum StoreSource {
    S3(S3Source),
    Directory(DirectorySource),
}

// Trait methods return `impl Future`; the bodies are async blocks.
#[allow(clippy::manual_async_fn)]
impl RemoteSource for StoreSource {
    fn fetch(&self, key: &str) -> impl Future<Output = Result<Vec<u8>, RemoteError>> + Send {
        async move {
            match self {
                StoreSource::S3(source) => source.fetch(key).await,
                StoreSource::Directory(source) => source.fetch(key).await,
            }
        }
    }

    fn exists(&self, key: &str) -> impl Future<Output = Result<bool, RemoteError>> + Send {
        async move {
            match self {
                StoreSource::S3(source) => source.exists(key).await,
                StoreSource::Directory(source) => source.exists(key).await,
            }
        }
    }

    fn name(&self) -> &str {
        match self {
            StoreSource::S3(source) => source.name(),
            StoreSource::Directory(source) => source.name(),
        }
    }
}

impl From<S3Source> for StoreSource {
    fn from(source: S3Source) -> Self {
        StoreSource::S3(source)
    }
}

impl From<DirectorySource> for StoreSource {
    fn from(source: DirectorySource) -> Self {
        StoreSource::Directory(source)
    }
}
