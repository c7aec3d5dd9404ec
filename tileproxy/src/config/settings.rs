//! Settings structs, one per `[section]` of the config file.

use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use crate::layer::{DEFAULT_LAYERS, DEFAULT_LEGENDS, DEFAULT_STATIC_LAYER};
use crate::placeholder::DEFAULT_PLACEHOLDER_KEY;
use crate::remote::{DEFAULT_BUCKET, DEFAULT_REGION};
use crate::server::DEFAULT_TILE_CACHE_CONTROL;

/// Default listen address.
pub const DEFAULT_BIND: &str = "0.0.0.0:5000";

/// Default cache root, relative to the working directory.
pub const DEFAULT_CACHE_DIR: &str = "tile_cache";

/// Default cache retention (12 hours).
pub const DEFAULT_RETENTION_SECS: u64 = 12 * 60 * 60;

/// Default janitor interval (1 hour).
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60 * 60;

/// Default deadline for one remote call.
pub const DEFAULT_REMOTE_TIMEOUT_SECS: u64 = 10;

/// Default log file name inside the config directory.
pub const DEFAULT_LOG_FILE: &str = "tileproxy.log";

/// Complete configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    pub server: ServerSettings,
    pub storage: StorageSettings,
    pub cache: CacheSettings,
    pub tiles: TileSettings,
    /// Layer name → remote prefix
    pub layers: Vec<(String, String)>,
    /// Legend filename → object key
    pub legends: Vec<(String, String)>,
    pub logging: LoggingSettings,
}

/// `[server]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerSettings {
    pub bind: SocketAddr,
}

/// Which remote backend serves objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// S3-compatible HTTP API
    S3,
    /// Local directory mirror
    Directory,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "s3" | "r2" => Ok(StorageBackend::S3),
            "directory" | "dir" => Ok(StorageBackend::Directory),
            other => Err(format!("unknown storage backend: {}", other)),
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageBackend::S3 => write!(f, "s3"),
            StorageBackend::Directory => write!(f, "directory"),
        }
    }
}

/// `[storage]`
#[derive(Clone, PartialEq, Eq)]
pub struct StorageSettings {
    pub backend: StorageBackend,
    /// Explicit S3 endpoint; takes precedence over `account_id`
    pub endpoint: Option<String>,
    /// Cloudflare account used to derive the R2 endpoint
    pub account_id: Option<String>,
    pub bucket: String,
    pub region: String,
    /// Root of the directory backend
    pub directory: Option<PathBuf>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub timeout_secs: u64,
}

impl fmt::Debug for StorageSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageSettings")
            .field("backend", &self.backend)
            .field("endpoint", &self.endpoint)
            .field("account_id", &self.account_id)
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("directory", &self.directory)
            .field("access_key", &self.access_key)
            .field("secret_key", &self.secret_key.as_ref().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// `[cache]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSettings {
    pub directory: PathBuf,
    pub retention_secs: u64,
    pub sweep_interval_secs: u64,
}

/// `[tiles]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileSettings {
    /// Layer whose `static` tiles have no timestamp segment in the key
    pub static_layer: Option<String>,
    pub placeholder_key: String,
    pub cache_control: String,
}

/// `[logging]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingSettings {
    pub file: PathBuf,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            storage: StorageSettings::default(),
            cache: CacheSettings::default(),
            tiles: TileSettings::default(),
            layers: to_owned_pairs(DEFAULT_LAYERS),
            legends: to_owned_pairs(DEFAULT_LEGENDS),
            logging: LoggingSettings::default(),
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 5000)),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: StorageBackend::S3,
            endpoint: None,
            account_id: None,
            bucket: DEFAULT_BUCKET.to_string(),
            region: DEFAULT_REGION.to_string(),
            directory: None,
            access_key: None,
            secret_key: None,
            timeout_secs: DEFAULT_REMOTE_TIMEOUT_SECS,
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            directory: PathBuf::from(DEFAULT_CACHE_DIR),
            retention_secs: DEFAULT_RETENTION_SECS,
            sweep_interval_secs: DEFAULT_SWEEP_INTERVAL_SECS,
        }
    }
}

impl Default for TileSettings {
    fn default() -> Self {
        Self {
            static_layer: Some(DEFAULT_STATIC_LAYER.to_string()),
            placeholder_key: DEFAULT_PLACEHOLDER_KEY.to_string(),
            cache_control: DEFAULT_TILE_CACHE_CONTROL.to_string(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            file: super::config_directory().join(DEFAULT_LOG_FILE),
        }
    }
}

fn to_owned_pairs(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(a, b)| (a.to_string(), b.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ConfigFile::default();
        assert_eq!(config.server.bind.to_string(), DEFAULT_BIND);
        assert_eq!(config.storage.backend, StorageBackend::S3);
        assert_eq!(config.storage.bucket, "optimal-stargazing-locator");
        assert_eq!(config.cache.directory, PathBuf::from("tile_cache"));
        assert_eq!(config.cache.retention_secs, 43200);
        assert_eq!(config.cache.sweep_interval_secs, 3600);
        assert_eq!(config.layers.len(), 5);
        assert_eq!(config.legends.len(), 10);
        assert_eq!(
            config.tiles.static_layer.as_deref(),
            Some("LightPollution_Tiles")
        );
    }

    #[test]
    fn test_backend_parse() {
        assert_eq!("S3".parse::<StorageBackend>(), Ok(StorageBackend::S3));
        assert_eq!("r2".parse::<StorageBackend>(), Ok(StorageBackend::S3));
        assert_eq!(
            "directory".parse::<StorageBackend>(),
            Ok(StorageBackend::Directory)
        );
        assert!("ftp".parse::<StorageBackend>().is_err());
    }

    #[test]
    fn test_storage_debug_redacts_secret() {
        let storage = StorageSettings {
            secret_key: Some("hunter2".to_string()),
            ..Default::default()
        };
        assert!(!format!("{:?}", storage).contains("hunter2"));
    }
}
