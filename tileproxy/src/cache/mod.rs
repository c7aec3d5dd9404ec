//! Local disk cache for tile bytes.
//!
//! ```text
//! cache root/
//! ├── blank_tile.png                        placeholder
//! ├── SkyCover_Tiles/2025062818/3/2/2.png   layer/timestamp/zoom/x/row.png
//! └── .../.tile-XXXXXX.part                 in-flight atomic write
//! ```
//!
//! [`DiskCache`] is the only writer and reader used by the request path.
//! [`CacheJanitor`] is the only component that deletes entries; it runs
//! concurrently with requests and takes no locks, so a reader that loses a
//! race against a deletion simply observes a cache miss.

mod disk;
mod janitor;
mod maintenance;

pub use disk::{CacheError, DiskCache, TEMP_SUFFIX};
pub use janitor::{
    sweep_entry, sweep_expired, CacheJanitor, EntryOutcome, SweepReport, DEFAULT_RETENTION,
    DEFAULT_SWEEP_INTERVAL,
};
pub use maintenance::{clear_disk_cache, disk_cache_stats, ClearResult};
