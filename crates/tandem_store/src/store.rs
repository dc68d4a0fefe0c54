//! Store adapter trait definitions.

use crate::error::StoreResult;
use crate::observer::{Observer, Subscription};
use crate::value::{Snapshot, Value};

/// A key-value store the sync engine can read from and write into.
///
/// Stores are **opaque value maps**. They provide simple operations for
/// enumerating, reading, writing and deleting entries. The sync engine owns
/// all interpretation of the reserved timestamp entry.
///
/// # Invariants
///
/// - `read_one(k)` after `write_one(k, v)` returns `Some(v)`
/// - `read_one(k)` after `delete_one(k)` returns `None`
/// - `read_all` contains exactly the entries currently held
/// - Stores must be `Send + Sync` for use from the sync worker
///
/// # Implementors
///
/// - [`super::InMemoryStore`] - For testing
/// - [`super::FileStore`] - For persistent storage
pub trait KeyValueStore: Send + Sync {
    /// Returns every entry currently held by the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn read_all(&self) -> StoreResult<Snapshot>;

    /// Returns the value stored under `key`, or `None` if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    fn read_one(&self, key: &str) -> StoreResult<Option<Value>>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the write cannot be applied.
    fn write_one(&self, key: &str, value: Value) -> StoreResult<()>;

    /// Removes `key` from the store. Removing an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete cannot be applied.
    fn delete_one(&self, key: &str) -> StoreResult<()>;

    /// Flushes or broadcasts pending writes.
    ///
    /// For a replicated store this makes recent writes visible to other
    /// replicas promptly. It is best-effort: success does not guarantee
    /// that any other replica has observed the writes yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush cannot be started.
    fn publish(&self) -> StoreResult<()>;
}

/// A store that can report changes to individual keys.
///
/// The local store must implement this so the engine can notice
/// application writes to monitored keys.
pub trait ObservableStore: KeyValueStore {
    /// Installs `observer` for `key`.
    ///
    /// The observer is invoked with the key name after every write or delete
    /// of that key, until the returned [`Subscription`] is cancelled or
    /// dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot accept new observers.
    fn observe(&self, key: &str, observer: Observer) -> StoreResult<Subscription>;
}
