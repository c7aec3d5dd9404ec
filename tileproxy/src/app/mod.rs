//! Application bootstrap and lifecycle management.
//!
//! `TileProxyApp` wires the components together in one place, so the CLI
//! only loads config and waits for a shutdown signal.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         TileProxyApp                             │
//! │                                                                  │
//! │  1. DiskCache::open(cache_dir)                                   │
//! │                                                                  │
//! │  2. StoreSource (S3 | Directory) ──┬──► PlaceholderProvider      │
//! │                                    ├──► TileService              │
//! │                                    └──► AssetService             │
//! │                                                                  │
//! │  3. server::router(ServerState) ───────► axum::serve             │
//! │                                                                  │
//! │  4. CacheJanitor::run ◄── CancellationToken (cancelled on        │
//! │                            shutdown)                             │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use tileproxy::app::{AppConfig, TileProxyApp};
//!
//! let app = TileProxyApp::start(config).await?;
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:5000").await?;
//! app.serve(listener, async { let _ = tokio::signal::ctrl_c().await; }).await?;
//! app.shutdown().await;
//! ```

mod bootstrap;
mod config;
mod error;

pub use bootstrap::TileProxyApp;
pub use config::{AppConfig, StoreConfig};
pub use error::AppError;
