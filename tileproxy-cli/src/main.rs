//! TileProxy CLI - Command-line interface
//!
//! Runs the tile server and provides cache and configuration maintenance
//! commands around the `tileproxy` library.

mod commands;
mod error;
mod runner;

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::cache::CacheAction;
use commands::serve::ServeArgs;
use error::CliError;

#[derive(Parser)]
#[command(name = "tileproxy")]
#[command(version, about = "Read-through cache proxy for pre-rendered map tiles", long_about = None)]
struct Cli {
    /// Config file to use instead of ~/.tileproxy/config.ini
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Enable debug logging regardless of RUST_LOG
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP tile server
    Serve {
        /// Listen address (overrides [server] bind)
        #[arg(long, value_name = "ADDR")]
        bind: Option<SocketAddr>,

        /// Local cache directory (overrides [cache] directory)
        #[arg(long, value_name = "DIR")]
        cache_dir: Option<PathBuf>,
    },

    /// Manage the local tile cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Create or refresh the configuration file
    Init,
}

fn main() {
    let cli = Cli::parse();

    let result: Result<(), CliError> = match cli.command {
        Commands::Serve { bind, cache_dir } => commands::serve::run(ServeArgs {
            bind,
            cache_dir,
            config_path: cli.config,
            debug: cli.debug,
        }),
        Commands::Cache { action } => {
            commands::cache::run(action, cli.config.as_deref(), cli.debug)
        }
        Commands::Init => commands::init::run(cli.config.as_deref()),
    };

    if let Err(e) = result {
        e.exit();
    }
}
