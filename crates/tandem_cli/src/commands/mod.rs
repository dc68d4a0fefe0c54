//! CLI command implementations.

pub mod authority;
pub mod dump;
pub mod entry;
pub mod json;
pub mod sync;

use std::fmt;
use std::path::Path;
use tandem_store::{FileStore, StoreError};
use tandem_sync::SyncError;
use thiserror::Error;

/// Which of the two stores a command operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum StoreSide {
    /// The local store.
    Local,
    /// The remote store.
    Remote,
}

impl fmt::Display for StoreSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreSide::Local => write!(f, "local"),
            StoreSide::Remote => write!(f, "remote"),
        }
    }
}

/// Errors reported by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// The path for a store was not given.
    #[error("--{0} <path> is required for this command")]
    MissingPath(StoreSide),

    /// A value could not be converted.
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// Unknown output format.
    #[error("unknown format '{0}' (expected text or json)")]
    UnknownFormat(String),

    /// Store failure.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Sync engine failure.
    #[error("sync error: {0}")]
    Sync(#[from] SyncError),

    /// JSON parse or render failure.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Output format for commands that print entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human readable lines.
    Text,
    /// A JSON document.
    Json,
}

impl OutputFormat {
    /// Parses a `--format` argument.
    pub fn parse(format: &str) -> Result<Self, CliError> {
        match format {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(CliError::UnknownFormat(other.to_string())),
        }
    }
}

/// Opens a store file, creating parent directories on first write.
pub fn open_store(path: &Path) -> Result<FileStore, CliError> {
    Ok(FileStore::open_with_create_dirs(path)?)
}
