//! Logging setup.
//!
//! Structured `tracing` output to two sinks:
//! - a log file written through a non-blocking appender, truncated or
//!   appended to at startup depending on [`LogFileMode`]
//! - optionally stdout, for running in the foreground
//!
//! The level comes from `RUST_LOG` and defaults to `info`; `debug = true`
//! forces `debug` regardless of the environment.

use std::fs;
use std::io;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// How an existing log file is treated at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFileMode {
    /// Start with an empty file. Used by the long-running server.
    Truncate,
    /// Keep existing lines, so a short command does not wipe the log of a
    /// server sharing the same file.
    Append,
}

/// Guard that must be kept alive for the duration of logging.
///
/// Dropping it flushes and closes the log file writer.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

/// Initialize the global subscriber.
///
/// # Arguments
///
/// * `log_file` - Path of the log file; its directory is created if needed
/// * `mode` - Whether to empty the file first
/// * `stdout` - Also write to stdout
/// * `debug` - Force debug level
///
/// # Errors
///
/// Returns an error if the log directory or file cannot be created, or if
/// a global subscriber is already installed.
pub fn init_logging(
    log_file: &Path,
    mode: LogFileMode,
    stdout: bool,
    debug: bool,
) -> Result<LoggingGuard, io::Error> {
    let (dir, name) = prepare_log_file(log_file, mode)?;

    let file_appender = tracing_appender::rolling::never(dir, name);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false);

    let stdout_layer = stdout.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(io::stdout)
            .with_ansi(true)
    });

    tracing_subscriber::registry()
        .with(env_filter(debug))
        .with(file_layer)
        .with(stdout_layer)
        .try_init()
        .map_err(io::Error::other)?;

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

fn env_filter(debug: bool) -> EnvFilter {
    if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

/// Create the log directory and apply `mode` to the file.
fn prepare_log_file(
    log_file: &Path,
    mode: LogFileMode,
) -> Result<(&Path, &std::ffi::OsStr), io::Error> {
    let (dir, name) = split_log_path(log_file)?;
    fs::create_dir_all(dir)?;
    match mode {
        LogFileMode::Truncate => fs::write(log_file, "")?,
        LogFileMode::Append => {
            fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(log_file)?;
        }
    }
    Ok((dir, name))
}

fn split_log_path(log_file: &Path) -> Result<(&Path, &std::ffi::OsStr), io::Error> {
    let name = log_file.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("log path has no file name: {}", log_file.display()),
        )
    })?;
    let dir = match log_file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    Ok((dir, name))
}
