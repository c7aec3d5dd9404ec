//! Configuration file for the tile proxy (`~/.tileproxy/config.ini`).
//!
//! Settings structs live in [`settings`], parsing in `parser` and
//! serialization in `writer`. Values missing from the file keep their
//! defaults; the R2 credential environment variables override the file.
//!
//! ```ini
//! [server]
//! bind = 0.0.0.0:5000
//!
//! [storage]
//! backend = s3
//! account_id = <cloudflare account>
//! bucket = optimal-stargazing-locator
//!
//! [cache]
//! directory = tile_cache
//! retention_secs = 43200
//! sweep_interval_secs = 3600
//!
//! [layers]
//! SkyCover_Tiles = data-layer-tiles/SkyCover_Tiles
//! ```

mod file;
mod parser;
pub mod settings;
mod size;
mod writer;

pub use file::{
    config_directory, config_file_path, ConfigFileError, ENV_ACCESS_KEY, ENV_ACCOUNT_ID,
    ENV_SECRET_KEY,
};
pub use settings::{
    CacheSettings, ConfigFile, LoggingSettings, ServerSettings, StorageBackend, StorageSettings,
    TileSettings, DEFAULT_BIND, DEFAULT_CACHE_DIR, DEFAULT_LOG_FILE, DEFAULT_REMOTE_TIMEOUT_SECS,
    DEFAULT_RETENTION_SECS, DEFAULT_SWEEP_INTERVAL_SECS,
};
pub use size::format_size;
