//! Shared test doubles for the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tempfile::TempDir;
use tileproxy::app::{AppConfig, StoreConfig, TileProxyApp};
use tileproxy::remote::{RemoteError, RemoteSource};

pub const BLANK: &[u8] = b"blank-tile";
pub const PLACEHOLDER_KEY: &str = "data-layer-tiles/blank_tile_256x256.png";

/// In-memory object store that counts every call.
#[derive(Default)]
pub struct CountingRemote {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    failure: Mutex<Option<RemoteError>>,
    fetches: AtomicUsize,
    exists_checks: AtomicUsize,
}

impl CountingRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store holding only the placeholder image.
    pub fn with_placeholder() -> Self {
        let remote = Self::new();
        remote.put(PLACEHOLDER_KEY, BLANK);
        remote
    }

    pub fn put(&self, key: &str, data: &[u8]) {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), data.to_vec());
    }

    pub fn remove(&self, key: &str) {
        self.objects.lock().unwrap().remove(key);
    }

    pub fn fail_with(&self, error: RemoteError) {
        *self.failure.lock().unwrap() = Some(error);
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn exists_checks(&self) -> usize {
        self.exists_checks.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.fetches() + self.exists_checks()
    }

    fn failure(&self) -> Option<RemoteError> {
        self.failure.lock().unwrap().clone()
    }
}

#[allow(clippy::manual_async_fn)]
impl RemoteSource for CountingRemote {
    fn fetch(&self, key: &str) -> impl Future<Output = Result<Vec<u8>, RemoteError>> + Send {
        async move {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if let Some(e) = self.failure() {
                return Err(e);
            }
            self.objects
                .lock()
                .unwrap()
                .get(key)
                .cloned()
                .ok_or_else(|| RemoteError::Miss(key.to_string()))
        }
    }

    fn exists(&self, key: &str) -> impl Future<Output = Result<bool, RemoteError>> + Send {
        async move {
            self.exists_checks.fetch_add(1, Ordering::SeqCst);
            if let Some(e) = self.failure() {
                return Err(e);
            }
            Ok(self.objects.lock().unwrap().contains_key(key))
        }
    }

    fn name(&self) -> &str {
        "counting"
    }
}

/// Start an app over `remote` with its cache inside `temp_dir`.
pub async fn start_app(
    temp_dir: &TempDir,
    remote: Arc<CountingRemote>,
) -> TileProxyApp<CountingRemote> {
    let config = AppConfig::new(
        temp_dir.path().join("cache"),
        StoreConfig::Directory(temp_dir.path().join("unused")),
    );
    TileProxyApp::start_with_remote(config, remote)
        .await
        .unwrap()
}
