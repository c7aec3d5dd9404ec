//! CLI command implementations.
//!
//! # Command Modules
//!
//! - [`cache`] - Cache management (stats, clear, sweep)
//! - [`init`] - Configuration initialization
//! - [`serve`] - Run the HTTP tile server

pub mod cache;
pub mod init;
pub mod serve;
