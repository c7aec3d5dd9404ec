//! Cache management CLI commands.

use std::path::Path;
use std::time::{Duration, SystemTime};

use clap::Subcommand;
use tileproxy::cache::{clear_disk_cache, disk_cache_stats, sweep_expired};
use tileproxy::config::format_size;
use tileproxy::logging::LogFileMode;

use crate::error::CliError;
use crate::runner::CliRunner;

/// Cache action subcommands.
#[derive(Debug, Subcommand)]
pub enum CacheAction {
    /// Clear the disk cache, removing all cached tiles
    Clear,
    /// Show disk cache statistics
    Stats,
    /// Delete entries older than the retention period (one janitor pass)
    Sweep,
}

/// Run a cache subcommand.
pub fn run(action: CacheAction, config_path: Option<&Path>, debug: bool) -> Result<(), CliError> {
    let runner = CliRunner::new(config_path, LogFileMode::Append, debug)?;
    runner.log_startup("cache");
    let cache = &runner.config().cache;
    let cache_dir = &cache.directory;

    match action {
        CacheAction::Clear => {
            println!("Clearing disk cache at: {}", cache_dir.display());

            let result =
                clear_disk_cache(cache_dir).map_err(|e| CliError::CacheClear(e.to_string()))?;
            println!(
                "Deleted {} files, freed {}",
                result.files_deleted,
                format_size(result.bytes_freed)
            );
        }
        CacheAction::Stats => {
            println!("Disk cache: {}", cache_dir.display());

            let (files, bytes) =
                disk_cache_stats(cache_dir).map_err(|e| CliError::CacheStats(e.to_string()))?;
            println!("  Files:     {}", files);
            println!("  Size:      {}", format_size(bytes));
            println!("  Retention: {}s", cache.retention_secs);
        }
        CacheAction::Sweep => {
            let retention = Duration::from_secs(cache.retention_secs);
            println!(
                "Sweeping {} (retention {}s)",
                cache_dir.display(),
                retention.as_secs()
            );

            let report = sweep_expired(cache_dir, retention, SystemTime::now());
            println!("{}", report);
            for (path, reason) in &report.skipped {
                println!("  skipped {}: {}", path.display(), reason);
            }
        }
    }
    Ok(())
}
