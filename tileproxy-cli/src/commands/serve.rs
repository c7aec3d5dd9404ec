//! Serve command - run the HTTP tile server until Ctrl+C.

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use tileproxy::app::{AppConfig, StoreConfig, TileProxyApp};
use tileproxy::logging::LogFileMode;
use tileproxy::telemetry::{TelemetrySnapshot, TileTelemetry};

use crate::error::CliError;
use crate::runner::CliRunner;

/// How often a status line is printed while serving.
const STATUS_INTERVAL: Duration = Duration::from_secs(60);

/// Arguments for the serve command.
#[derive(Debug, Default)]
pub struct ServeArgs {
    pub bind: Option<SocketAddr>,
    pub cache_dir: Option<PathBuf>,
    pub config_path: Option<PathBuf>,
    pub debug: bool,
}

/// Run the serve command.
pub fn run(args: ServeArgs) -> Result<(), CliError> {
    let runner = CliRunner::new(
        args.config_path.as_deref(),
        LogFileMode::Truncate,
        args.debug,
    )?;
    runner.log_startup("serve");

    // CLI takes precedence over config
    let mut config = runner.config().clone();
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }
    if let Some(cache_dir) = args.cache_dir {
        config.cache.directory = cache_dir;
    }
    let bind = config.server.bind;
    let app_config = AppConfig::from_config_file(&config)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;

    runtime.block_on(serve(app_config, bind))
}

async fn serve(app_config: AppConfig, bind: SocketAddr) -> Result<(), CliError> {
    print_banner(&app_config, bind);

    let listener = TcpListener::bind(bind)
        .await
        .map_err(|error| CliError::Bind { addr: bind, error })?;
    let app = TileProxyApp::start(app_config).await?;

    println!("Listening on http://{}", bind);
    println!("Press Ctrl+C to stop");
    println!();

    let status = CancellationToken::new();
    let status_task = tokio::spawn(print_status(
        Arc::clone(app.telemetry()),
        status.clone(),
    ));

    let result = app.serve(listener, shutdown_signal()).await;

    status.cancel();
    let _ = status_task.await;

    let summary = app.telemetry().snapshot();
    app.shutdown().await;
    result?;

    print_summary(&summary);
    Ok(())
}

fn print_banner(config: &AppConfig, bind: SocketAddr) {
    println!("TileProxy v{}", tileproxy::VERSION);
    println!("================================");
    println!();
    match &config.store {
        StoreConfig::S3(s3) => {
            println!("Store:     {} (bucket {})", s3.endpoint, s3.bucket);
            println!(
                "Signing:   {}",
                if s3.credentials.is_some() {
                    "SigV4"
                } else {
                    "anonymous"
                }
            );
        }
        StoreConfig::Directory(root) => println!("Store:     {}", root.display()),
    }
    println!("Cache:     {}", config.cache_dir.display());
    println!(
        "Retention: {}s (sweep every {}s)",
        config.retention.as_secs(),
        config.sweep_interval.as_secs()
    );
    println!("Layers:    {}", config.layers.len());
    println!("Bind:      {}", bind);
    println!();
}

/// Print a status line periodically until cancelled.
async fn print_status(
    telemetry: Arc<TileTelemetry>,
    cancellation: CancellationToken,
) {
    let mut ticker = tokio::time::interval(STATUS_INTERVAL);
    // First tick completes immediately
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = cancellation.cancelled() => break,
            _ = ticker.tick() => {
                let s = telemetry.snapshot();
                println!(
                    "[{}s] Hits: {} | Fetched: {} | Placeholders: {} | Errors: {} | Hit rate: {:.0}%",
                    s.uptime_secs,
                    s.cache_hits,
                    s.remote_fetches,
                    s.placeholders_served,
                    s.remote_errors + s.local_io_errors,
                    s.cache_hit_rate() * 100.0
                );
            }
        }
    }
}

fn print_summary(s: &TelemetrySnapshot) {
    println!();
    println!("Session Summary");
    println!("───────────────");
    println!("  Cache hits:      {}", s.cache_hits);
    println!("  Remote fetches:  {}", s.remote_fetches);
    println!(
        "  Placeholders:    {} ({} remote misses)",
        s.placeholders_served, s.remote_misses
    );
    println!("  Remote errors:   {}", s.remote_errors);
    println!("  Expired entries: {}", s.janitor_deletions);
    println!("  Uptime: {}s", s.uptime_secs);
}

/// Resolves on Ctrl+C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = signal_or_pending(tokio::signal::ctrl_c(), "ctrl-c");

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, signal = "sigterm", "Failed to listen for shutdown signal");
                std::future::pending::<()>().await
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    println!();
    println!("Received shutdown signal, stopping...");
    info!("Shutdown signal received");
}

/// Wait for `signal`; if the listener could not be installed, never resolve.
async fn signal_or_pending(signal: impl Future<Output = io::Result<()>>, name: &str) {
    if let Err(e) = signal.await {
        warn!(error = %e, signal = name, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
