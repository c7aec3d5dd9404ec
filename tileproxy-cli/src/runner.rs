//! CLI runner for common setup and operations.
//!
//! Encapsulates config loading and logging initialization so command
//! handlers start from a ready `ConfigFile`.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::CliError;
use tileproxy::config::{config_file_path, ConfigFile};
use tileproxy::logging::{init_logging, LogFileMode, LoggingGuard};

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    /// Loaded configuration file, with environment overrides applied
    config: ConfigFile,
    config_path: PathBuf,
}

impl CliRunner {
    /// Create a new CLI runner, loading config and initializing logging.
    ///
    /// Log lines go to stdout only when stdout is not a terminal, so an
    /// interactive session sees the status output and a supervised one
    /// (systemd, docker) gets the structured log stream.
    ///
    /// # Arguments
    ///
    /// * `config_path` - Config file to use instead of `~/.tileproxy/config.ini`
    /// * `log_mode` - Truncate the log file (server) or append to it (maintenance)
    /// * `debug_mode` - When true, enables debug-level logging regardless of RUST_LOG
    pub fn new(
        config_path: Option<&Path>,
        log_mode: LogFileMode,
        debug_mode: bool,
    ) -> Result<Self, CliError> {
        let config_path = config_path
            .map(Path::to_path_buf)
            .unwrap_or_else(config_file_path);

        let mut config = ConfigFile::load_from(&config_path)?;
        config.apply_env_overrides();

        let stdout_enabled = !atty::is(atty::Stream::Stdout);
        let logging_guard = init_logging(&config.logging.file, log_mode, stdout_enabled, debug_mode)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
            config_path,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Get the path the configuration was loaded from.
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("TileProxy v{}", tileproxy::VERSION);
        info!(
            config = %self.config_path.display(),
            "TileProxy CLI: {} command", command
        );
    }
}
