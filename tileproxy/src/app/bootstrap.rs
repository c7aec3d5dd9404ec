//! Application bootstrap logic.

use std::future::Future;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::config::{AppConfig, StoreConfig};
use super::error::AppError;
use crate::assets::AssetService;
use crate::cache::{CacheJanitor, DiskCache};
use crate::placeholder::PlaceholderProvider;
use crate::remote::{DirectorySource, RemoteSource, S3Source, StoreSource};
use crate::resolver::KeyResolver;
use crate::server::{self, ServerState};
use crate::service::TileService;
use crate::telemetry::TileTelemetry;

/// Main application type.
///
/// Owns the tile service, the HTTP router and the janitor task. Use
/// `start()` to create and `shutdown()` to stop the background work.
pub struct TileProxyApp<R = StoreSource> {
    config: AppConfig,
    service: TileService<R>,
    router: Router,
    telemetry: Arc<TileTelemetry>,
    cancellation: CancellationToken,
    janitor: JoinHandle<()>,
}

impl TileProxyApp<StoreSource> {
    /// Start the application against the store named in the config.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache directory cannot be created or the
    /// remote client cannot be built.
    pub async fn start(config: AppConfig) -> Result<Self, AppError> {
        let remote = match &config.store {
            StoreConfig::S3(s3) => {
                info!(
                    endpoint = %s3.endpoint,
                    bucket = %s3.bucket,
                    signed = s3.credentials.is_some(),
                    "Using S3 remote store"
                );
                StoreSource::from(S3Source::new(s3.clone())?)
            }
            StoreConfig::Directory(root) => {
                info!(root = %root.display(), "Using directory remote store");
                StoreSource::from(DirectorySource::new(root.clone()))
            }
        };
        Self::start_with_remote(config, Arc::new(remote)).await
    }
}

impl<R: RemoteSource> TileProxyApp<R> {
    /// Start the application with an already constructed remote source.
    ///
    /// Initialization order:
    /// 1. Open the cache directory
    /// 2. Build placeholder, tile and asset services over the shared remote
    /// 3. Spawn the janitor (its first sweep runs immediately)
    pub async fn start_with_remote(config: AppConfig, remote: Arc<R>) -> Result<Self, AppError> {
        info!(cache_dir = %config.cache_dir.display(), "Starting TileProxyApp");

        let cache = DiskCache::open(config.cache_dir.clone()).await?;
        let telemetry = Arc::new(TileTelemetry::new());

        let placeholder = PlaceholderProvider::new(Arc::clone(&remote), cache.clone())
            .with_key(config.placeholder_key.clone())
            .with_timeout(config.remote_timeout);

        let resolver = KeyResolver::new(Arc::new(config.layers.clone()));
        let service = TileService::new(resolver, cache.clone(), Arc::clone(&remote), placeholder)
            .with_telemetry(Arc::clone(&telemetry))
            .with_remote_timeout(config.remote_timeout);

        let assets = AssetService::new(Arc::clone(&remote), Arc::new(config.legends.clone()))
            .with_timeout(config.remote_timeout);

        let router = server::router(ServerState {
            tiles: service.clone(),
            assets,
            telemetry: Arc::clone(&telemetry),
            tile_cache_control: config.tile_cache_control.clone(),
        });

        let cancellation = CancellationToken::new();
        let janitor = CacheJanitor::new(
            cache.root().to_path_buf(),
            config.retention,
            config.sweep_interval,
        )
        .with_telemetry(Arc::clone(&telemetry));
        let janitor = tokio::spawn(janitor.run(cancellation.child_token()));

        info!(
            layers = config.layers.len(),
            remote = remote.name(),
            "TileProxyApp started"
        );

        Ok(Self {
            config,
            service,
            router,
            telemetry,
            cancellation,
            janitor,
        })
    }

    /// Get the configuration the app was started with.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Get the tile service.
    pub fn service(&self) -> &TileService<R> {
        &self.service
    }

    /// Get the shared telemetry counters.
    pub fn telemetry(&self) -> &Arc<TileTelemetry> {
        &self.telemetry
    }

    /// Get a handle to the HTTP router.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve HTTP on `listener` until `shutdown` resolves.
    ///
    /// In-flight requests are allowed to finish before this returns.
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> Result<(), AppError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if let Ok(addr) = listener.local_addr() {
            info!(%addr, "HTTP server listening");
        }
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(AppError::Server)
    }

    /// Shutdown the application gracefully.
    ///
    /// Cancels the janitor and waits for it to finish its current sweep.
    pub async fn shutdown(self) {
        info!("Shutting down TileProxyApp");

        self.cancellation.cancel();
        if let Err(e) = self.janitor.await {
            warn!(error = %e, "Cache janitor task ended abnormally");
        }

        info!("TileProxyApp shutdown complete");
    }
}
