//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::net::SocketAddr;
use std::process;

use tileproxy::app::AppError;
use tileproxy::config::{ConfigFileError, ENV_ACCESS_KEY, ENV_ACCOUNT_ID, ENV_SECRET_KEY};

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Failed to load or save the config file
    ConfigFile(ConfigFileError),
    /// Failed to start or run the application
    App(AppError),
    /// Failed to bind the listen address
    Bind {
        addr: SocketAddr,
        error: std::io::Error,
    },
    /// Failed to create the Tokio runtime
    Runtime(std::io::Error),
    /// Failed to clear the cache
    CacheClear(String),
    /// Failed to read cache statistics
    CacheStats(String),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        // Print additional help for specific errors
        match self {
            CliError::App(AppError::Config(_)) => {
                eprintln!();
                eprintln!("The S3 backend needs to know which account to use. Either:");
                eprintln!("  1. Set endpoint or account_id in the [storage] section, or");
                eprintln!("  2. Export {}", ENV_ACCOUNT_ID);
                eprintln!(
                    "Private buckets also need {} and {}.",
                    ENV_ACCESS_KEY, ENV_SECRET_KEY
                );
            }
            CliError::Bind { addr, .. } => {
                eprintln!();
                eprintln!("Common issues:");
                eprintln!("  1. Another process is already listening on {}", addr);
                eprintln!("  2. Ports below 1024 need elevated privileges");
                eprintln!("Use --bind or [server] bind in config.ini to pick another address.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::ConfigFile(e) => write!(f, "{}", e),
            CliError::App(e) => write!(f, "{}", e),
            CliError::Bind { addr, error } => {
                write!(f, "Failed to listen on {}: {}", addr, error)
            }
            CliError::Runtime(e) => write!(f, "Failed to create Tokio runtime: {}", e),
            CliError::CacheClear(msg) => write!(f, "Failed to clear cache: {}", msg),
            CliError::CacheStats(msg) => write!(f, "Failed to read cache statistics: {}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::ConfigFile(e) => Some(e),
            CliError::App(e) => Some(e),
            CliError::Bind { error, .. } => Some(error),
            CliError::Runtime(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::ConfigFile(e)
    }
}

impl From<AppError> for CliError {
    fn from(e: AppError) -> Self {
        CliError::App(e)
    }
}
