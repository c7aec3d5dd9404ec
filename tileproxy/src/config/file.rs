//! Loading and saving the config file.

use std::path::{Path, PathBuf};

use ini::Ini;
use thiserror::Error;
use tracing::debug;

use super::settings::ConfigFile;

/// Cloudflare account id.
pub const ENV_ACCOUNT_ID: &str = "R2_ACCOUNT_ID";
/// Access key id for request signing.
pub const ENV_ACCESS_KEY: &str = "R2_ACCESS_KEY";
/// Secret access key for request signing.
pub const ENV_SECRET_KEY: &str = "R2_SECRET_KEY";

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// Failed to write config file
    #[error("Failed to write config file: {0}")]
    WriteError(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    /// Failed to create config directory
    #[error("Failed to create config directory: {0}")]
    DirectoryError(std::io::Error),
}

impl ConfigFile {
    /// Load configuration from the default path (~/.tileproxy/config.ini).
    pub fn load() -> Result<Self, ConfigFileError> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from a specific path.
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        super::parser::parse_ini(&ini)
    }

    /// Save configuration to a specific path, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigFileError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigFileError::DirectoryError)?;
        }

        let content = super::writer::to_config_string(self);
        std::fs::write(path, content).map_err(|e| ConfigFileError::WriteError(e.to_string()))
    }

    /// Overlay the R2 credential environment variables.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|name| std::env::var(name).ok());
    }

    /// Overlay credentials from an arbitrary lookup; empty values are ignored.
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(account_id) = get(ENV_ACCOUNT_ID) {
            self.storage.account_id = Some(account_id);
        }
        if let Some(access_key) = get(ENV_ACCESS_KEY) {
            self.storage.access_key = Some(access_key);
        }
        if let Some(secret_key) = get(ENV_SECRET_KEY) {
            self.storage.secret_key = Some(secret_key);
        }
    }
}

/// Get the path to the config directory (~/.tileproxy).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".tileproxy")
}

/// Get the path to the config file (~/.tileproxy/config.ini).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}
