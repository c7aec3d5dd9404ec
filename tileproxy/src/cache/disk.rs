//! Disk-backed byte store keyed by relative path.
//!
//! Writes go to a temporary file in the destination directory and are
//! renamed into place, so a concurrent reader sees either nothing or the
//! complete file. Concurrent writers to the same path are allowed; the last
//! rename wins.

use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

/// Suffix of temporary files created while writing an entry.
pub const TEMP_SUFFIX: &str = ".part";

const TEMP_PREFIX: &str = ".tile-";

/// Errors from local cache operations.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Filesystem operation failed.
    #[error("Cache I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Relative path would escape the cache root.
    #[error("Invalid cache path: {}", .0.display())]
    InvalidPath(PathBuf),

    /// Blocking worker panicked or was cancelled.
    #[error("Cache task failed: {0}")]
    Task(String),
}

/// Local cache store rooted at a directory.
///
/// Cheap to clone; clones share the same root.
#[derive(Debug, Clone)]
pub struct DiskCache {
    root: Arc<PathBuf>,
}

impl DiskCache {
    /// Create a cache over `root` without touching the filesystem.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Arc::new(root.into()),
        }
    }

    /// Create a cache over `root`, creating the directory if needed.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let cache = Self::new(root);
        tokio::fs::create_dir_all(cache.root())
            .await
            .map_err(|source| CacheError::Io {
                path: cache.root().to_path_buf(),
                source,
            })?;
        Ok(cache)
    }

    /// Get the cache root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Join a relative entry path onto the root.
    ///
    /// Only plain path segments are accepted; absolute paths, `..` and `.`
    /// are rejected.
    pub fn full_path(&self, relative: &Path) -> Result<PathBuf, CacheError> {
        let mut components = relative.components().peekable();
        if components.peek().is_none()
            || !components.all(|c| matches!(c, Component::Normal(_)))
        {
            return Err(CacheError::InvalidPath(relative.to_path_buf()));
        }
        Ok(self.root.join(relative))
    }

    /// Returns true if a regular file exists at `relative`.
    ///
    /// Any failure, including a missing parent directory, counts as absent.
    pub async fn exists(&self, relative: &Path) -> bool {
        let Ok(path) = self.full_path(relative) else {
            return false;
        };
        tokio::fs::metadata(&path)
            .await
            .map(|m| m.is_file())
            .unwrap_or(false)
    }

    /// Read the entry at `relative`.
    ///
    /// Returns `Ok(None)` when the entry does not exist.
    pub async fn read(&self, relative: &Path) -> Result<Option<Vec<u8>>, CacheError> {
        let path = self.full_path(relative)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(CacheError::Io { path, source }),
        }
    }

    /// Atomically write `data` to `relative`, creating parent directories.
    pub async fn write(&self, relative: &Path, data: Vec<u8>) -> Result<(), CacheError> {
        let path = self.full_path(relative)?;
        tokio::task::spawn_blocking(move || {
            write_atomic(&path, &data).map_err(|source| CacheError::Io { path, source })
        })
        .await
        .map_err(|e| CacheError::Task(e.to_string()))?
    }
}

/// Write through a temp file in the target directory, then rename.
///
/// The janitor may prune the (empty) parent directory between creating it
/// and placing the temp file; that case is retried once.
fn write_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
    write_atomic_with(path, data, |_| {})
}

/// [`write_atomic`] with a hook run after the parent directory is created.
fn write_atomic_with(
    path: &Path,
    data: &[u8],
    mut after_create_dir: impl FnMut(&Path),
) -> io::Result<()> {
    let parent = path.parent().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "cache entry has no parent")
    })?;

    match persist_in(parent, path, data, &mut after_create_dir) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "Cache directory vanished during write, retrying");
            persist_in(parent, path, data, &mut after_create_dir)
        }
        other => other,
    }
}

fn persist_in(
    parent: &Path,
    path: &Path,
    data: &[u8],
    after_create_dir: &mut dyn FnMut(&Path),
) -> io::Result<()> {
    std::fs::create_dir_all(parent)?;
    after_create_dir(parent);
    let mut temp = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .suffix(TEMP_SUFFIX)
        .tempfile_in(parent)?;
    temp.write_all(data)?;
    temp.flush()?;
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
