//! Error types for store operations.

use std::io;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Encoding or decoding the persisted snapshot failed.
    #[error("codec error: {0}")]
    Codec(String),

    /// The persisted snapshot is not a valid store document.
    #[error("store corrupted: {0}")]
    Corrupted(String),

    /// The store is closed.
    #[error("store is closed")]
    Closed,

    /// The store rejects writes.
    #[error("store is read-only")]
    ReadOnly,
}

impl StoreError {
    /// Creates a codec error from any displayable cause.
    pub fn codec(cause: impl std::fmt::Display) -> Self {
        Self::Codec(cause.to_string())
    }
}
