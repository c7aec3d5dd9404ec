//! Object store backed by a local directory.
//!
//! Keys map directly to relative paths under the root, so a mirror of the
//! bucket (or a hand-built fixture tree) can stand in for the real store.

use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};

use super::{validate_key, RemoteError, RemoteSource};

/// Directory-backed [`RemoteSource`].
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    /// Create a source serving objects from `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Get the root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, key: &str) -> Result<PathBuf, RemoteError> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }
}

#[allow(clippy::manual_async_fn)]
impl RemoteSource for DirectorySource {
    fn fetch(&self, key: &str) -> impl Future<Output = Result<Vec<u8>, RemoteError>> + Send {
        async move {
            let path = self.object_path(key)?;
            match tokio::fs::read(&path).await {
                Ok(data) => Ok(data),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    Err(RemoteError::Miss(key.to_string()))
                }
                Err(e) => Err(RemoteError::Transport(format!(
                    "failed to read {}: {}",
                    path.display(),
                    e
                ))),
            }
        }
    }

    fn exists(&self, key: &str) -> impl Future<Output = Result<bool, RemoteError>> + Send {
        async move {
            let path = self.object_path(key)?;
            match tokio::fs::metadata(&path).await {
                Ok(metadata) => Ok(metadata.is_file()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
                Err(e) => Err(RemoteError::Transport(format!(
                    "failed to stat {}: {}",
                    path.display(),
                    e
                ))),
            }
        }
    }

    fn name(&self) -> &str {
        "directory"
    }
}
