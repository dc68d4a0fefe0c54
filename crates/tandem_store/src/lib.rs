//! # Tandem Store
//!
//! Store adapters for Tandem.
//!
//! This crate provides the uniform capability surface the sync engine uses to
//! talk to the two stores it keeps convergent: a fast local store and a slower,
//! eventually-consistent remote store. Stores hold **opaque values** keyed by
//! string; they do not interpret what they store.
//!
//! ## Design Principles
//!
//! - Stores are simple key-value maps (read-all, read-one, write, delete)
//! - `publish` is a best-effort flush/broadcast of pending writes
//! - Local stores additionally support per-key change observation
//! - Observation is handed out as a cancelable [`Subscription`]
//! - Must be `Send + Sync` for use from the sync worker
//!
//! ## Available Stores
//!
//! - [`InMemoryStore`] - For testing and ephemeral state
//! - [`FileStore`] - Snapshot persisted as a CBOR document
//!
//! ## Example
//!
//! ```rust
//! use tandem_store::{InMemoryStore, KeyValueStore, Value};
//!
//! let store = InMemoryStore::new();
//! store.write_one("budget", Value::from(500)).unwrap();
//! assert_eq!(store.read_one("budget").unwrap(), Some(Value::Integer(500)));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod file;
mod memory;
mod observer;
mod store;
mod value;

pub use error::{StoreError, StoreResult};
pub use file::FileStore;
pub use memory::InMemoryStore;
pub use observer::{Observer, ObserverRegistry, Subscription};
pub use store::{KeyValueStore, ObservableStore};
pub use value::{Snapshot, SyncTimestamp, Value, SYNC_TIMESTAMP_KEY};
