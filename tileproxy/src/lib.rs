//! TileProxy - read-through cache for pre-rendered map tiles
//!
//! Serves map tiles over HTTP from a local disk cache, filling misses from
//! an S3-compatible object store (Cloudflare R2 by default). Clients address
//! rows in the TMS convention; the store lays tiles out in XYZ order.
//! Tiles the store does not have are answered with a shared blank
//! placeholder image, and a background janitor expires cache entries after
//! a retention period.
//!
//! # High-Level API
//!
//! For most use cases, the [`app`] module wires everything together:
//!
//! ```ignore
//! use tileproxy::app::{AppConfig, TileProxyApp};
//! use tileproxy::config::ConfigFile;
//!
//! let mut file = ConfigFile::load()?;
//! file.apply_env_overrides();
//! let app = TileProxyApp::start(AppConfig::from_config_file(&file)?).await?;
//! let listener = tokio::net::TcpListener::bind(file.server.bind).await?;
//! app.serve(listener, shutdown_signal).await?;
//! app.shutdown().await;
//! ```

pub mod app;
pub mod assets;
pub mod cache;
pub mod config;
pub mod coord;
pub mod layer;
pub mod logging;
pub mod placeholder;
pub mod remote;
pub mod resolver;
pub mod server;
pub mod service;
pub mod telemetry;
pub mod tile;

/// Version of the TileProxy library and CLI.
///
/// This is synchronized across all components in the workspace.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
