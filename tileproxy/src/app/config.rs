//! Application configuration for TileProxyApp.
//!
//! `AppConfig` is the resolved form of everything `TileProxyApp::start`
//! needs: durations are `Duration`s, registries are built, and the remote
//! store has been chosen.

use std::path::PathBuf;
use std::time::Duration;

use super::error::AppError;
use crate::cache::{DEFAULT_RETENTION, DEFAULT_SWEEP_INTERVAL};
use crate::config::{ConfigFile, StorageBackend};
use crate::layer::{LayerRegistry, LegendRegistry};
use crate::placeholder::DEFAULT_PLACEHOLDER_KEY;
use crate::remote::{Credentials, S3Config, DEFAULT_REMOTE_TIMEOUT};
use crate::server::DEFAULT_TILE_CACHE_CONTROL;

/// Which remote store to build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    /// S3-compatible bucket over HTTP.
    S3(S3Config),
    /// Local directory laid out like the bucket.
    Directory(PathBuf),
}

/// Application configuration combining all component configs.
///
/// This is the top-level configuration passed to `TileProxyApp::start()`.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Root of the local tile cache.
    pub cache_dir: PathBuf,

    /// Entries older than this are deleted by the janitor.
    pub retention: Duration,

    /// Time between janitor sweeps.
    pub sweep_interval: Duration,

    /// Deadline for one remote call.
    pub remote_timeout: Duration,

    pub layers: LayerRegistry,
    pub legends: LegendRegistry,

    /// Object key of the blank fallback tile.
    pub placeholder_key: String,

    /// `Cache-Control` value sent with tiles.
    pub tile_cache_control: String,

    pub store: StoreConfig,
}

impl AppConfig {
    /// Create a config with default layers, retention and timeouts.
    pub fn new(cache_dir: impl Into<PathBuf>, store: StoreConfig) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            retention: DEFAULT_RETENTION,
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            remote_timeout: DEFAULT_REMOTE_TIMEOUT,
            layers: LayerRegistry::default(),
            legends: LegendRegistry::default(),
            placeholder_key: DEFAULT_PLACEHOLDER_KEY.to_string(),
            tile_cache_control: DEFAULT_TILE_CACHE_CONTROL.to_string(),
            store,
        }
    }

    /// Create application config from the config file.
    ///
    /// For the S3 backend an explicit `endpoint` wins over `account_id`;
    /// credentials are attached only when both keys are present.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the chosen backend is missing the
    /// setting that locates it.
    pub fn from_config_file(config: &ConfigFile) -> Result<Self, AppError> {
        let store = store_config(config)?;

        let layers = LayerRegistry::new(
            config.layers.iter().cloned(),
            config.tiles.static_layer.clone(),
        );
        let legends = LegendRegistry::new(config.legends.iter().cloned());

        Ok(Self::new(config.cache.directory.clone(), store)
            .with_retention(Duration::from_secs(config.cache.retention_secs))
            .with_sweep_interval(Duration::from_secs(config.cache.sweep_interval_secs))
            .with_remote_timeout(Duration::from_secs(config.storage.timeout_secs))
            .with_layers(layers)
            .with_legends(legends)
            .with_placeholder_key(config.tiles.placeholder_key.clone())
            .with_tile_cache_control(config.tiles.cache_control.clone()))
    }

    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    pub fn with_remote_timeout(mut self, timeout: Duration) -> Self {
        self.remote_timeout = timeout;
        self
    }

    pub fn with_layers(mut self, layers: LayerRegistry) -> Self {
        self.layers = layers;
        self
    }

    pub fn with_legends(mut self, legends: LegendRegistry) -> Self {
        self.legends = legends;
        self
    }

    pub fn with_placeholder_key(mut self, key: impl Into<String>) -> Self {
        self.placeholder_key = key.into();
        self
    }

    pub fn with_tile_cache_control(mut self, value: impl Into<String>) -> Self {
        self.tile_cache_control = value.into();
        self
    }
}

fn store_config(config: &ConfigFile) -> Result<StoreConfig, AppError> {
    let storage = &config.storage;
    match storage.backend {
        StorageBackend::Directory => storage
            .directory
            .clone()
            .map(StoreConfig::Directory)
            .ok_or_else(|| {
                AppError::Config("storage.directory is required for the directory backend".into())
            }),
        StorageBackend::S3 => {
            let s3 = match (&storage.endpoint, &storage.account_id) {
                (Some(endpoint), _) => S3Config::new(endpoint.clone(), storage.bucket.clone()),
                (None, Some(account_id)) => S3Config::r2(account_id, storage.bucket.clone()),
                (None, None) => {
                    return Err(AppError::Config(
                        "set storage.endpoint or storage.account_id (env R2_ACCOUNT_ID)".into(),
                    ))
                }
            };
            let s3 = s3.with_region(storage.region.clone());
            let s3 = match (&storage.access_key, &storage.secret_key) {
                (Some(access), Some(secret)) => {
                    s3.with_credentials(Credentials::new(access.clone(), secret.clone()))
                }
                _ => s3,
            };
            Ok(StoreConfig::S3(s3))
        }
    }
}
