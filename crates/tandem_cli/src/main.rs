//! Tandem CLI
//!
//! Command-line tools for inspecting, editing and synchronizing a pair of
//! file-backed Tandem stores.
//!
//! # Commands
//!
//! - `get` - Print one entry
//! - `set` - Write one entry from a JSON value
//! - `delete` - Remove one entry
//! - `dump` - Print every entry of a store
//! - `authority` - Show which store a sync would copy from
//! - `sync` - Synchronize the two stores

mod commands;

use clap::{Parser, Subcommand};
use commands::{CliError, StoreSide};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Tandem command-line store tools.
#[derive(Parser)]
#[command(name = "tandem")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the local store file
    #[arg(global = true, short, long)]
    local: Option<PathBuf>,

    /// Path to the remote store file
    #[arg(global = true, short, long)]
    remote: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    /// Do not publish the remote store after pushing
    #[arg(global = true, long)]
    no_publish: bool,

    /// Path to a JSON sync configuration file
    #[arg(global = true, short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print one entry
    Get {
        /// Key to read
        key: String,

        /// Store to read from
        #[arg(short, long, value_enum, default_value = "local")]
        store: StoreSide,
    },

    /// Write one entry
    Set {
        /// Key to write
        key: String,

        /// Value as JSON (e.g. 500, "dark", [1, 2])
        value: String,

        /// Store to write to
        #[arg(short, long, value_enum, default_value = "local")]
        store: StoreSide,
    },

    /// Remove one entry
    Delete {
        /// Key to remove
        key: String,

        /// Store to remove from
        #[arg(short, long, value_enum, default_value = "local")]
        store: StoreSide,
    },

    /// Print every entry of a store
    Dump {
        /// Store to dump
        #[arg(short, long, value_enum, default_value = "local")]
        store: StoreSide,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show the sync timestamps and the resulting authority
    Authority,

    /// Synchronize the local and remote stores
    Sync {
        /// Only synchronize these keys
        keys: Vec<String>,
    },

    /// Show version information
    Version,
}

impl Cli {
    fn store_path(&self, side: StoreSide) -> Result<PathBuf, CliError> {
        let path = match side {
            StoreSide::Local => self.local.clone(),
            StoreSide::Remote => self.remote.clone(),
        };
        path.ok_or(CliError::MissingPath(side))
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match &cli.command {
        Commands::Get { key, store } => {
            let path = cli.store_path(*store)?;
            commands::entry::get(&path, key)?;
        }
        Commands::Set { key, value, store } => {
            let path = cli.store_path(*store)?;
            commands::entry::set(&path, key, value)?;
        }
        Commands::Delete { key, store } => {
            let path = cli.store_path(*store)?;
            commands::entry::delete(&path, key)?;
        }
        Commands::Dump { store, format } => {
            let path = cli.store_path(*store)?;
            commands::dump::run(&path, format)?;
        }
        Commands::Authority => {
            let local = cli.store_path(StoreSide::Local)?;
            let remote = cli.store_path(StoreSide::Remote)?;
            commands::authority::run(&local, &remote)?;
        }
        Commands::Sync { keys } => {
            let local = cli.store_path(StoreSide::Local)?;
            let remote = cli.store_path(StoreSide::Remote)?;
            let config = commands::sync::load_config(
                cli.config.as_deref(),
                cli.verbose,
                cli.no_publish,
            )?;
            commands::sync::run(&local, &remote, config, keys)?;
        }
        Commands::Version => {
            println!("Tandem CLI v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
