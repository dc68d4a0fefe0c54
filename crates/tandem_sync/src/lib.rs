//! # Tandem Sync
//!
//! Keeps a fast local key-value store and a slower, eventually-consistent
//! remote store convergent without a central coordinator.
//!
//! This crate provides:
//! - Timestamp-based conflict resolution (whole-store, last writer wins)
//! - Per-key change observation of the local store
//! - A serialized sync engine with a single worker thread
//! - A bridge turning external signals into targeted syncs
//!
//! ## Architecture
//!
//! Every synchronize call picks one **authority** by comparing the reserved
//! sync timestamp held in each store, then copies entries from the authority
//! into the other store:
//! 1. Resolve the authority (later timestamp wins, ties favor local)
//! 2. Copy entries, suspending local observation around each local write
//! 3. Stamp the destination with a fresh timestamp (after a push, local too)
//! 4. Publish the remote store after a push
//!
//! ## Key Invariants
//!
//! - Store mutations only ever happen on the worker thread
//! - No two sync operations interleave their writes
//! - An engine write into the local store never triggers the engine again
//! - Observation membership is unchanged by engine writes
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use tandem_store::{InMemoryStore, KeyValueStore, Value};
//! use tandem_sync::{SyncConfig, SyncEngine};
//!
//! let local = Arc::new(InMemoryStore::with_entries([("budget", 500)]));
//! let remote = Arc::new(InMemoryStore::new());
//! let engine = SyncEngine::new(SyncConfig::default(), local, Arc::clone(&remote)).unwrap();
//!
//! engine.sync().unwrap();
//! assert_eq!(remote.read_one("budget").unwrap(), Some(Value::from(500)));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

/// Emits a `debug!` event only when the given config has `verbose` set.
macro_rules! verbose {
    ($config:expr, $($arg:tt)+) => {
        if $config.verbose {
            tracing::debug!($($arg)+);
        }
    };
}

mod bridge;
mod clock;
mod config;
mod conflict;
mod engine;
mod error;
mod monitor;
mod stats;
mod worker;

pub use bridge::SyncEvent;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::SyncConfig;
pub use conflict::{latest_authority, read_timestamp, resolve_authority, Authority};
pub use engine::SyncEngine;
pub use error::{SyncError, SyncResult};
pub use monitor::{KeyMonitor, Suspension};
pub use stats::{SyncReport, SyncStats};
