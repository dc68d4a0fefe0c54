//! Error types for the sync engine.

use tandem_store::StoreError;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur while driving the sync engine.
///
/// Individual store failures during a sync pass are not reported here; they
/// are logged and counted in the [`SyncReport`](crate::SyncReport).
#[derive(Error, Debug)]
pub enum SyncError {
    /// A store operation failed outside of a sync pass.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The worker thread is no longer running.
    #[error("sync engine stopped")]
    EngineStopped,

    /// The worker thread could not be started.
    #[error("failed to spawn sync worker: {0}")]
    WorkerSpawn(#[source] std::io::Error),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}
