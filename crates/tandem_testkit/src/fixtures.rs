//! Store pair fixtures.
//!
//! Provides convenience functions for setting up a local and a remote store,
//! stamping them, and starting an engine on top with a deterministic clock.

use std::path::PathBuf;
use std::sync::Arc;
use tandem_store::{
    FileStore, InMemoryStore, KeyValueStore, ObservableStore, Snapshot, SyncTimestamp, Value,
    SYNC_TIMESTAMP_KEY,
};
use tandem_sync::{read_timestamp, ManualClock, SyncConfig, SyncEngine};
use tempfile::TempDir;

/// Reading at which fixture clocks start, well above any timestamp the
/// generators produce.
pub const CLOCK_START: SyncTimestamp = SyncTimestamp(2_000_000_000);

/// An engine over two in-memory stores.
pub type MemoryEngine = SyncEngine<InMemoryStore, InMemoryStore>;

/// An engine over two file-backed stores.
pub type FileEngine = SyncEngine<FileStore, FileStore>;

/// Writes `ts` as the sync timestamp of `store`.
pub fn stamp<S: KeyValueStore + ?Sized>(store: &S, ts: SyncTimestamp) {
    store
        .write_one(SYNC_TIMESTAMP_KEY, Value::from(ts))
        .expect("Failed to stamp store");
}

/// Returns the entries of `store` without its sync timestamp.
pub fn user_entries<S: KeyValueStore + ?Sized>(store: &S) -> Snapshot {
    let mut entries = store.read_all().expect("Failed to read store");
    entries.remove(SYNC_TIMESTAMP_KEY);
    entries
}

/// A local and a remote in-memory store sharing a manual clock.
pub struct StorePair {
    /// The local store.
    pub local: Arc<InMemoryStore>,
    /// The remote store.
    pub remote: Arc<InMemoryStore>,
    /// The clock handed to engines built from this pair.
    pub clock: Arc<ManualClock>,
}

impl StorePair {
    /// Creates two empty stores.
    pub fn new() -> Self {
        Self {
            local: Arc::new(InMemoryStore::new()),
            remote: Arc::new(InMemoryStore::new()),
            clock: Arc::new(ManualClock::new(CLOCK_START)),
        }
    }

    /// Fills the local store with `entries`.
    pub fn with_local<K, V>(self, entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        fill(self.local.as_ref(), entries);
        self
    }

    /// Fills the remote store with `entries`.
    pub fn with_remote<K, V>(self, entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        fill(self.remote.as_ref(), entries);
        self
    }

    /// Stamps the local store.
    pub fn with_local_timestamp(self, ts: SyncTimestamp) -> Self {
        stamp(self.local.as_ref(), ts);
        self
    }

    /// Stamps the remote store.
    pub fn with_remote_timestamp(self, ts: SyncTimestamp) -> Self {
        stamp(self.remote.as_ref(), ts);
        self
    }

    /// Starts an engine with the default configuration.
    pub fn engine(&self) -> MemoryEngine {
        self.engine_with(SyncConfig::default())
    }

    /// Starts an engine with `config`.
    pub fn engine_with(&self, config: SyncConfig) -> MemoryEngine {
        start_engine(config, &self.local, &self.remote, &self.clock)
    }

    /// Returns the local sync timestamp.
    pub fn local_timestamp(&self) -> Option<SyncTimestamp> {
        read_timestamp(self.local.as_ref()).expect("Failed to read local timestamp")
    }

    /// Returns the remote sync timestamp.
    pub fn remote_timestamp(&self) -> Option<SyncTimestamp> {
        read_timestamp(self.remote.as_ref()).expect("Failed to read remote timestamp")
    }
}

impl Default for StorePair {
    fn default() -> Self {
        Self::new()
    }
}

/// A local and a remote file store in a temporary directory.
pub struct FileStorePair {
    /// The local store.
    pub local: Arc<FileStore>,
    /// The remote store.
    pub remote: Arc<FileStore>,
    /// The clock handed to engines built from this pair.
    pub clock: Arc<ManualClock>,
    /// The temporary directory (kept alive to prevent cleanup).
    temp_dir: TempDir,
}

impl FileStorePair {
    /// Creates two empty file stores.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let local = FileStore::open(&temp_dir.path().join("local.cbor"))
            .expect("Failed to open local store");
        let remote = FileStore::open(&temp_dir.path().join("remote.cbor"))
            .expect("Failed to open remote store");
        Self {
            local: Arc::new(local),
            remote: Arc::new(remote),
            clock: Arc::new(ManualClock::new(CLOCK_START)),
            temp_dir,
        }
    }

    /// Returns the path of the local store file.
    pub fn local_path(&self) -> PathBuf {
        self.temp_dir.path().join("local.cbor")
    }

    /// Returns the path of the remote store file.
    pub fn remote_path(&self) -> PathBuf {
        self.temp_dir.path().join("remote.cbor")
    }

    /// Starts an engine with the default configuration.
    pub fn engine(&self) -> FileEngine {
        start_engine(SyncConfig::default(), &self.local, &self.remote, &self.clock)
    }
}

impl Default for FileStorePair {
    fn default() -> Self {
        Self::new()
    }
}

fn fill<K, V>(store: &dyn KeyValueStore, entries: impl IntoIterator<Item = (K, V)>)
where
    K: Into<String>,
    V: Into<Value>,
{
    for (key, value) in entries {
        let key: String = key.into();
        store
            .write_one(&key, value.into())
            .expect("Failed to fill store");
    }
}

fn start_engine<L, R>(
    config: SyncConfig,
    local: &Arc<L>,
    remote: &Arc<R>,
    clock: &Arc<ManualClock>,
) -> SyncEngine<L, R>
where
    L: ObservableStore + 'static,
    R: KeyValueStore + 'static,
{
    let clock: Arc<dyn tandem_sync::Clock> = clock.clone();
    SyncEngine::with_clock(config, Arc::clone(local), Arc::clone(remote), clock)
        .expect("Failed to start engine")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_pair_stamps() {
        let pair = StorePair::new()
            .with_local([("budget", 500)])
            .with_local_timestamp(SyncTimestamp(5));
        assert_eq!(pair.local_timestamp(), Some(SyncTimestamp(5)));
        assert_eq!(pair.remote_timestamp(), None);
        assert_eq!(user_entries(pair.local.as_ref()).len(), 1);
    }

    #[test]
    fn file_store_pair_uses_separate_files() {
        let pair = FileStorePair::new();
        pair.local.write_one("a", Value::from(1)).unwrap();
        assert!(pair.local_path().exists());
        assert!(!pair.remote_path().exists());
    }
}
