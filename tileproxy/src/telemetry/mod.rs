//! Request and cache telemetry.
//!
//! Lock-free counters updated from the request path and the cache janitor,
//! read through an immutable snapshot:
//!
//! ```text
//! ┌──────────────┐   record_*()   ┌──────────────────┐   snapshot()   ┌───────────────────┐
//! │ TileService  │ ─────────────► │  TileTelemetry   │ ─────────────► │ TelemetrySnapshot │
//! │ CacheJanitor │                │  (AtomicU64 x N) │                │  (serializable)   │
//! └──────────────┘                └──────────────────┘                └───────────────────┘
//! ```
//!
//! Counters are independent measurements, so all updates use `Relaxed`
//! ordering.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use serde::Serialize;

/// Shared counters for the tile pipeline.
#[derive(Debug)]
pub struct TileTelemetry {
    start_time: Instant,
    cache_hits: AtomicU64,
    remote_fetches: AtomicU64,
    remote_misses: AtomicU64,
    remote_errors: AtomicU64,
    placeholders_served: AtomicU64,
    local_io_errors: AtomicU64,
    janitor_deletions: AtomicU64,
}

impl TileTelemetry {
    /// Create a zeroed set of counters.
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            cache_hits: AtomicU64::new(0),
            remote_fetches: AtomicU64::new(0),
            remote_misses: AtomicU64::new(0),
            remote_errors: AtomicU64::new(0),
            placeholders_served: AtomicU64::new(0),
            local_io_errors: AtomicU64::new(0),
            janitor_deletions: AtomicU64::new(0),
        }
    }

    /// A tile was served from the local cache.
    pub fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// A tile was fetched from the remote store.
    pub fn record_remote_fetch(&self) {
        self.remote_fetches.fetch_add(1, Ordering::Relaxed);
    }

    /// The remote store reported the object absent.
    pub fn record_remote_miss(&self) {
        self.remote_misses.fetch_add(1, Ordering::Relaxed);
    }

    /// A remote call failed with a transport fault or timed out.
    pub fn record_remote_error(&self) {
        self.remote_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// The placeholder image was returned instead of a real tile.
    pub fn record_placeholder(&self) {
        self.placeholders_served.fetch_add(1, Ordering::Relaxed);
    }

    /// A local cache read or write failed.
    pub fn record_local_io_error(&self) {
        self.local_io_errors.fetch_add(1, Ordering::Relaxed);
    }

    /// The janitor removed `count` expired entries.
    pub fn record_janitor_deletions(&self, count: u64) {
        self.janitor_deletions.fetch_add(count, Ordering::Relaxed);
    }

    /// Time since the counters were created.
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Take a point-in-time copy of every counter.
    pub fn snapshot(&self) -> TelemetrySnapshot {
        TelemetrySnapshot {
            uptime_secs: self.uptime().as_secs(),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            remote_fetches: self.remote_fetches.load(Ordering::Relaxed),
            remote_misses: self.remote_misses.load(Ordering::Relaxed),
            remote_errors: self.remote_errors.load(Ordering::Relaxed),
            placeholders_served: self.placeholders_served.load(Ordering::Relaxed),
            local_io_errors: self.local_io_errors.load(Ordering::Relaxed),
            janitor_deletions: self.janitor_deletions.load(Ordering::Relaxed),
        }
    }
}

impl Default for TileTelemetry {
    fn default() -> Self {
        Self::new()
    }
}

/// Immutable copy of [`TileTelemetry`] at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TelemetrySnapshot {
    pub uptime_secs: u64,
    pub cache_hits: u64,
    pub remote_fetches: u64,
    pub remote_misses: u64,
    pub remote_errors: u64,
    pub placeholders_served: u64,
    pub local_io_errors: u64,
    pub janitor_deletions: u64,
}

impl TelemetrySnapshot {
    /// Fraction of tile lookups answered from the local cache (0.0 - 1.0).
    pub fn cache_hit_rate(&self) -> f64 {
        let lookups = self.cache_hits + self.remote_fetches + self.remote_misses + self.remote_errors;
        if lookups == 0 {
            0.0
        } else {
            self.cache_hits as f64 / lookups as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_zeroed() {
        let snapshot = TileTelemetry::new().snapshot();
        assert_eq!(snapshot.cache_hits, 0);
        assert_eq!(snapshot.janitor_deletions, 0);
        assert_eq!(snapshot.cache_hit_rate(), 0.0);
    }

    #[test]
    fn test_counters_accumulate() {
        let telemetry = TileTelemetry::new();
        telemetry.record_cache_hit();
        telemetry.record_cache_hit();
        telemetry.record_cache_hit();
        telemetry.record_remote_fetch();
        telemetry.record_placeholder();
        telemetry.record_janitor_deletions(4);

        let snapshot = telemetry.snapshot();
        assert_eq!(snapshot.cache_hits, 3);
        assert_eq!(snapshot.remote_fetches, 1);
        assert_eq!(snapshot.placeholders_served, 1);
        assert_eq!(snapshot.janitor_deletions, 4);
        assert!((snapshot.cache_hit_rate() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_snapshot_serializes() {
        let telemetry = TileTelemetry::new();
        telemetry.record_remote_miss();
        let json = serde_json::to_value(telemetry.snapshot()).unwrap();
        assert_eq!(json["remote_misses"], 1);
        assert!(json.get("uptime_secs").is_some());
    }
}
