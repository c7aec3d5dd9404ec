//! Time-based cache expiry.
//!
//! The janitor periodically walks the cache root and deletes every entry
//! whose last-write time is older than the retention threshold. Each entry
//! is handled independently and yields an [`EntryOutcome`]; a failure on one
//! entry is logged and never aborts the sweep.
//!
//! ```text
//!          ┌──── interval tick ◄────┐
//!          ▼                        │
//!   collect *.png / *.part          │
//!          │                        │
//!   per entry: age > retention?     │
//!      yes → remove_file            │
//!      no  → retain                 │
//!          │                        │
//!   prune empty directories ────────┘
//! ```
//!
//! No lock is taken against concurrent readers and writers. A reader that
//! loses the race sees a cache miss and refetches.
//!
//! # Example
//!
//! ```ignore
//! use tileproxy::cache::{CacheJanitor, DEFAULT_RETENTION, DEFAULT_SWEEP_INTERVAL};
//! use tokio_util::sync::CancellationToken;
//!
//! let janitor = CacheJanitor::new("tile_cache", DEFAULT_RETENTION, DEFAULT_SWEEP_INTERVAL);
//! let shutdown = CancellationToken::new();
//! tokio::spawn(janitor.run(shutdown.clone()));
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::disk::TEMP_SUFFIX;
use crate::resolver::TILE_EXTENSION;
use crate::telemetry::TileTelemetry;

/// Default age after which an entry is deleted (12 hours).
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(12 * 60 * 60);

/// Default time between sweeps (1 hour).
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Shortest interval the run loop accepts.
const MIN_SWEEP_INTERVAL: Duration = Duration::from_secs(1);

/// What happened to a single cache entry during a sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryOutcome {
    /// Entry was expired and removed.
    Deleted { bytes: u64 },
    /// Entry is younger than the retention threshold.
    Retained,
    /// Entry could not be inspected or removed.
    Skipped(String),
}

/// Aggregate result of one sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Entries examined
    pub scanned: usize,
    /// Entries deleted
    pub deleted: usize,
    /// Entries kept
    pub retained: usize,
    /// Entries skipped, with the reason
    pub skipped: Vec<(PathBuf, String)>,
    /// Bytes reclaimed by deletions
    pub bytes_freed: u64,
    /// Empty directories removed afterwards
    pub dirs_removed: usize,
    /// Wall time of the sweep in milliseconds
    pub duration_ms: u64,
}

impl SweepReport {
    fn record(&mut self, path: PathBuf, outcome: EntryOutcome) {
        self.scanned += 1;
        match outcome {
            EntryOutcome::Deleted { bytes } => {
                self.deleted += 1;
                self.bytes_freed += bytes;
            }
            EntryOutcome::Retained => self.retained += 1,
            EntryOutcome::Skipped(reason) => {
                warn!(path = %path.display(), reason = %reason, "Skipped cache entry during sweep");
                self.skipped.push((path, reason));
            }
        }
    }
}

impl fmt::Display for SweepReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "scanned {} entries: {} deleted ({} bytes), {} retained, {} skipped, {} directories pruned",
            self.scanned,
            self.deleted,
            self.bytes_freed,
            self.retained,
            self.skipped.len(),
            self.dirs_removed
        )
    }
}

/// Expire a single entry relative to `now`.
///
/// An entry is deleted when `now - mtime` is strictly greater than
/// `retention`. Entries with a modification time in the future are treated
/// as brand new.
pub fn sweep_entry(path: &Path, retention: Duration, now: SystemTime) -> EntryOutcome {
    let metadata = match std::fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(e) => return EntryOutcome::Skipped(format!("metadata unavailable: {}", e)),
    };
    let modified = match metadata.modified() {
        Ok(modified) => modified,
        Err(e) => return EntryOutcome::Skipped(format!("mtime unavailable: {}", e)),
    };

    let age = now.duration_since(modified).unwrap_or(Duration::ZERO);
    if age <= retention {
        return EntryOutcome::Retained;
    }

    match std::fs::remove_file(path) {
        Ok(()) => EntryOutcome::Deleted {
            bytes: metadata.len(),
        },
        Err(e) => EntryOutcome::Skipped(format!("delete failed: {}", e)),
    }
}

/// Sweep every entry under `root` and prune empty directories.
///
/// Blocking; call from a blocking context.
pub fn sweep_expired(root: &Path, retention: Duration, now: SystemTime) -> SweepReport {
    let start = Instant::now();
    let mut report = SweepReport::default();

    let mut entries = Vec::new();
    collect_entries(root, &mut entries);

    for path in entries {
        let outcome = sweep_entry(&path, retention, now);
        report.record(path, outcome);
    }

    report.dirs_removed = prune_empty_dirs(root);
    report.duration_ms = start.elapsed().as_millis() as u64;
    report
}

/// Returns true for files the janitor manages.
fn is_cache_entry(path: &Path) -> bool {
    let is_tile = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(TILE_EXTENSION));
    let is_temp = path
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(TEMP_SUFFIX));
    is_tile || is_temp
}

fn collect_entries(dir: &Path, entries: &mut Vec<PathBuf>) {
    let read_dir = match std::fs::read_dir(dir) {
        Ok(read_dir) => read_dir,
        Err(e) => {
            debug!(dir = %dir.display(), error = %e, "Failed to read directory during sweep");
            return;
        }
    };

    for entry in read_dir.flatten() {
        let Ok(file_type) = entry.file_type() else {
            continue;
        };
        let path = entry.path();
        if file_type.is_dir() {
            collect_entries(&path, entries);
        } else if file_type.is_file() && is_cache_entry(&path) {
            entries.push(path);
        }
    }
}

/// Remove empty directories below `dir`, depth first. `dir` itself stays.
fn prune_empty_dirs(dir: &Path) -> usize {
    let Ok(read_dir) = std::fs::read_dir(dir) else {
        return 0;
    };

    let mut removed = 0;
    for entry in read_dir.flatten() {
        if !entry.file_type().is_ok_and(|t| t.is_dir()) {
            continue;
        }
        let path = entry.path();
        removed += prune_empty_dirs(&path);
        // Fails harmlessly when not empty
        if std::fs::remove_dir(&path).is_ok() {
            removed += 1;
        }
    }
    removed
}

/// Background task expiring old cache entries.
#[derive(Debug, Clone)]
pub struct CacheJanitor {
    root: PathBuf,
    retention: Duration,
    interval: Duration,
    telemetry: Option<Arc<TileTelemetry>>,
}

impl CacheJanitor {
    /// Create a janitor for the cache at `root`.
    ///
    /// # Arguments
    ///
    /// * `root` - Cache root directory
    /// * `retention` - Entries older than this are deleted
    /// * `interval` - Time between sweeps
    pub fn new(root: impl Into<PathBuf>, retention: Duration, interval: Duration) -> Self {
        Self {
            root: root.into(),
            retention,
            interval,
            telemetry: None,
        }
    }

    /// Report deletions to shared telemetry.
    pub fn with_telemetry(mut self, telemetry: Arc<TileTelemetry>) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Get the cache root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the retention threshold.
    pub fn retention(&self) -> Duration {
        self.retention
    }

    /// Get the sweep interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run a single sweep now.
    pub async fn sweep_once(&self) -> SweepReport {
        let root = self.root.clone();
        let retention = self.retention;

        let report = tokio::task::spawn_blocking(move || {
            sweep_expired(&root, retention, SystemTime::now())
        })
        .await
        .unwrap_or_else(|e| {
            warn!(error = %e, "Cache sweep task failed");
            SweepReport::default()
        });

        if let Some(telemetry) = &self.telemetry {
            telemetry.record_janitor_deletions(report.deleted as u64);
        }
        report
    }

    /// Sweep at startup and then once per interval until cancelled.
    pub async fn run(self, cancellation: CancellationToken) {
        let period = self.interval.max(MIN_SWEEP_INTERVAL);
        info!(
            cache_dir = %self.root.display(),
            retention_secs = self.retention.as_secs(),
            interval_secs = period.as_secs(),
            "Starting cache janitor"
        );

        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                _ = cancellation.cancelled() => {
                    info!("Cache janitor shutting down");
                    break;
                }

                _ = ticker.tick() => {
                    let report = self.sweep_once().await;
                    info!(
                        scanned = report.scanned,
                        deleted = report.deleted,
                        retained = report.retained,
                        skipped = report.skipped.len(),
                        bytes_freed = report.bytes_freed,
                        dirs_removed = report.dirs_removed,
                        duration_ms = report.duration_ms,
                        "Cache sweep complete"
                    );
                }
            }
        }
    }
}
