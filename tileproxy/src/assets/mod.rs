//! Legend and plot passthrough.
//!
//! Legends and plots are fetched from the remote store on every request;
//! they are not cached locally and involve no coordinate logic. Legends are
//! addressed through the [`LegendRegistry`]; plots map straight to
//! `plots/{filename}`.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use thiserror::Error;
use tracing::error;

use crate::layer::LegendRegistry;
use crate::remote::{bounded, RemoteSource, DEFAULT_REMOTE_TIMEOUT};

/// Cache-Control sent with legend images.
pub const LEGEND_CACHE_CONTROL: &str = "public, max-age=604800";

/// Cache-Control sent with plot images.
pub const PLOT_CACHE_CONTROL: &str = "public, max-age=1800";

const PLOT_PREFIX: &str = "plots";

/// Errors from asset lookups.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetError {
    /// Legend filename is not registered.
    #[error("Invalid legend")]
    InvalidLegend,

    /// Object could not be fetched.
    #[error("File not found")]
    NotFound,
}

/// An image ready to be returned to a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub data: Bytes,
    pub content_type: &'static str,
    pub cache_control: &'static str,
}

/// Fetches legend and plot images from the remote store.
pub struct AssetService<R> {
    remote: Arc<R>,
    legends: Arc<LegendRegistry>,
    timeout: Duration,
}

impl<R> Clone for AssetService<R> {
    fn clone(&self) -> Self {
        Self {
            remote: Arc::clone(&self.remote),
            legends: Arc::clone(&self.legends),
            timeout: self.timeout,
        }
    }
}

impl<R: RemoteSource> AssetService<R> {
    pub fn new(remote: Arc<R>, legends: Arc<LegendRegistry>) -> Self {
        Self {
            remote,
            legends,
            timeout: DEFAULT_REMOTE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Fetch a legend image.
    pub async fn legend(&self, filename: &str) -> Result<Asset, AssetError> {
        let key = self.legends.key(filename).ok_or(AssetError::InvalidLegend)?;
        let data = self.fetch(key, "Legend").await?;
        Ok(Asset {
            data,
            content_type: "image/png",
            cache_control: LEGEND_CACHE_CONTROL,
        })
    }

    /// Does a legend image exist? Any fault answers `false`.
    pub async fn legend_exists(&self, filename: &str) -> bool {
        match self.legends.key(filename) {
            Some(key) => self.exists(key).await,
            None => false,
        }
    }

    /// Fetch a plot image (`.gif` animations or still images).
    pub async fn plot(&self, filename: &str) -> Result<Asset, AssetError> {
        let key = plot_key(filename).ok_or(AssetError::NotFound)?;
        let data = self.fetch(&key, "Plot").await?;
        Ok(Asset {
            data,
            content_type: plot_content_type(filename),
            cache_control: PLOT_CACHE_CONTROL,
        })
    }

    /// Does a plot exist? Any fault answers `false`.
    pub async fn plot_exists(&self, filename: &str) -> bool {
        match plot_key(filename) {
            Some(key) => self.exists(&key).await,
            None => false,
        }
    }

    async fn fetch(&self, key: &str, kind: &str) -> Result<Bytes, AssetError> {
        bounded(self.timeout, self.remote.fetch(key))
            .await
            .map(Bytes::from)
            .map_err(|e| {
                error!(key = %key, error = %e, "{} fetch error", kind);
                AssetError::NotFound
            })
    }

    async fn exists(&self, key: &str) -> bool {
        bounded(self.timeout, self.remote.exists(key))
            .await
            .unwrap_or(false)
    }
}

/// Object key of a plot, or `None` if the filename is not a single segment.
fn plot_key(filename: &str) -> Option<String> {
    let valid = !filename.is_empty()
        && !filename.contains('/')
        && !filename.contains('\\')
        && !filename.contains("..");
    valid.then(|| format!("{}/{}", PLOT_PREFIX, filename))
}

fn plot_content_type(filename: &str) -> &'static str {
    if filename.to_ascii_lowercase().ends_with(".gif") {
        "image/gif"
    } else {
        "image/png"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::tests::MockRemote;
    use crate::remote::RemoteError;

    fn assets(remote: MockRemote) -> AssetService<MockRemote> {
        AssetService::new(Arc::new(remote), Arc::new(LegendRegistry::default()))
    }

    #[tokio::test]
    async fn test_legend() {
        let assets = assets(MockRemote::new().with_object("plots/Temp_Legend_Dark.png", b"legend"));

        let asset = assets.legend("Temp_Dark.png").await.unwrap();
        assert_eq!(asset.data, Bytes::from_static(b"legend"));
        assert_eq!(asset.content_type, "image/png");
        assert_eq!(asset.cache_control, LEGEND_CACHE_CONTROL);
        assert!(assets.legend_exists("Temp_Dark.png").await);
    }

    #[tokio::test]
    async fn test_unknown_legend() {
        let assets = assets(MockRemote::new());
        assert_eq!(
            assets.legend("Nope.png").await,
            Err(AssetError::InvalidLegend)
        );
        assert!(!assets.legend_exists("Nope.png").await);
    }

    #[tokio::test]
    async fn test_registered_legend_missing_remotely() {
        let assets = assets(MockRemote::new());
        assert_eq!(
            assets.legend("Temp_Light.png").await,
            Err(AssetError::NotFound)
        );
    }

    #[tokio::test]
    async fn test_plot_gif_content_type() {
        let assets = assets(MockRemote::new().with_object("plots/cloud_loop.GIF", b"gif"));

        let asset = assets.plot("cloud_loop.GIF").await.unwrap();
        assert_eq!(asset.content_type, "image/gif");
        assert_eq!(asset.cache_control, PLOT_CACHE_CONTROL);
    }

    #[tokio::test]
    async fn test_plot_png_content_type() {
        let assets = assets(MockRemote::new().with_object("plots/still.png", b"png"));
        assert_eq!(assets.plot("still.png").await.unwrap().content_type, "image/png");
    }

    #[tokio::test]
    async fn test_plot_traversal_rejected() {
        let remote = MockRemote::new();
        let assets = assets(remote);
        assert_eq!(assets.plot("../secret").await, Err(AssetError::NotFound));
        assert!(!assets.plot_exists("a/b.gif").await);
    }

    #[tokio::test]
    async fn test_exists_fault_is_false() {
        let remote = MockRemote::new().with_object("plots/a.gif", b"gif");
        remote.fail_with(RemoteError::Transport("down".to_string()));
        let assets = assets(remote);
        assert!(!assets.plot_exists("a.gif").await);
    }
}
