//! Application error types.

use std::fmt;
use std::io;

use crate::cache::CacheError;
use crate::config::ConfigFileError;
use crate::remote::RemoteError;

/// Errors that can occur during application lifecycle.
#[derive(Debug)]
pub enum AppError {
    /// Failed to open the local tile cache.
    CacheOpen(CacheError),

    /// Failed to construct the remote object store client.
    RemoteCreation(RemoteError),

    /// Configuration error.
    Config(String),

    /// Failed to load the config file.
    ConfigFile(ConfigFileError),

    /// HTTP server failed.
    Server(io::Error),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::CacheOpen(e) => write!(f, "Failed to open tile cache: {}", e),
            AppError::RemoteCreation(e) => write!(f, "Failed to create remote store: {}", e),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
            AppError::ConfigFile(e) => write!(f, "{}", e),
            AppError::Server(e) => write!(f, "HTTP server error: {}", e),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::CacheOpen(e) => Some(e),
            AppError::RemoteCreation(e) => Some(e),
            AppError::ConfigFile(e) => Some(e),
            AppError::Server(e) => Some(e),
            AppError::Config(_) => None,
        }
    }
}

impl From<CacheError> for AppError {
    fn from(e: CacheError) -> Self {
        AppError::CacheOpen(e)
    }
}

impl From<RemoteError> for AppError {
    fn from(e: RemoteError) -> Self {
        AppError::RemoteCreation(e)
    }
}

impl From<ConfigFileError> for AppError {
    fn from(e: ConfigFileError) -> Self {
        AppError::ConfigFile(e)
    }
}
