//! In-memory store for testing.

use crate::error::{StoreError, StoreResult};
use crate::observer::{Observer, ObserverRegistry, Subscription};
use crate::store::{KeyValueStore, ObservableStore};
use crate::value::{Snapshot, Value};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// An in-memory store.
///
/// This store keeps all entries in memory and is suitable for:
/// - Unit tests
/// - Integration tests
/// - Standing in for either the local or the remote store
///
/// `publish` only counts invocations, so tests can assert on it.
///
/// # Thread Safety
///
/// This store is thread-safe and can be shared across threads.
///
/// # Example
///
/// ```rust
/// use tandem_store::{InMemoryStore, KeyValueStore, Value};
///
/// let store = InMemoryStore::new();
/// store.write_one("theme", Value::from("dark")).unwrap();
/// assert_eq!(store.read_all().unwrap().len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStore {
    data: RwLock<Snapshot>,
    observers: ObserverRegistry,
    publishes: AtomicU64,
    closed: AtomicBool,
    read_only: AtomicBool,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store with pre-existing entries.
    #[must_use]
    pub fn with_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let data = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            data: RwLock::new(data),
            ..Self::default()
        }
    }

    /// Returns how many times `publish` has been called.
    #[must_use]
    pub fn publish_count(&self) -> u64 {
        self.publishes.load(Ordering::SeqCst)
    }

    /// Returns the number of installed observers.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Makes every subsequent operation fail with [`StoreError::Closed`].
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    /// Undoes [`close`](Self::close).
    pub fn reopen(&self) {
        self.closed.store(false, Ordering::SeqCst);
    }

    /// Makes writes and deletes fail with [`StoreError::ReadOnly`] while
    /// reads keep working.
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    fn check_writable(&self) -> StoreResult<()> {
        self.check_open()?;
        if self.read_only.load(Ordering::SeqCst) {
            return Err(StoreError::ReadOnly);
        }
        Ok(())
    }

    fn check_open(&self) -> StoreResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            Err(StoreError::Closed)
        } else {
            Ok(())
        }
    }
}

impl KeyValueStore for InMemoryStore {
    fn read_all(&self) -> StoreResult<Snapshot> {
        self.check_open()?;
        Ok(self.data.read().clone())
    }

    fn read_one(&self, key: &str) -> StoreResult<Option<Value>> {
        self.check_open()?;
        Ok(self.data.read().get(key).cloned())
    }

    fn write_one(&self, key: &str, value: Value) -> StoreResult<()> {
        self.check_writable()?;
        self.data.write().insert(key.to_string(), value);
        self.observers.notify(key);
        Ok(())
    }

    fn delete_one(&self, key: &str) -> StoreResult<()> {
        self.check_writable()?;
        let removed = self.data.write().remove(key).is_some();
        if removed {
            self.observers.notify(key);
        }
        Ok(())
    }

    fn publish(&self) -> StoreResult<()> {
        self.check_open()?;
        self.publishes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl ObservableStore for InMemoryStore {
    fn observe(&self, key: &str, observer: Observer) -> StoreResult<Subscription> {
        self.check_open()?;
        Ok(self.observers.register(key, observer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[test]
    fn memory_new_is_empty() {
        let store = InMemoryStore::new();
        assert!(store.read_all().unwrap().is_empty());
        assert_eq!(store.read_one("missing").unwrap(), None);
    }

    #[test]
    fn memory_write_then_read() {
        let store = InMemoryStore::new();
        store.write_one("budget", Value::from(500)).unwrap();
        store.write_one("budget", Value::from(300)).unwrap();

        assert_eq!(store.read_one("budget").unwrap(), Some(Value::from(300)));
        assert_eq!(store.read_all().unwrap().len(), 1);
    }

    #[test]
    fn memory_delete() {
        let store = InMemoryStore::with_entries([("budget", 500)]);
        store.delete_one("budget").unwrap();
        store.delete_one("budget").unwrap();
        assert_eq!(store.read_one("budget").unwrap(), None);
    }

    #[test]
    fn memory_publish_counts() {
        let store = InMemoryStore::new();
        store.publish().unwrap();
        store.publish().unwrap();
        assert_eq!(store.publish_count(), 2);
    }

    #[test]
    fn memory_closed_rejects_operations() {
        let store = InMemoryStore::new();
        store.close();
        assert!(matches!(
            store.write_one("k", Value::from(1)),
            Err(StoreError::Closed)
        ));
        assert!(store.read_all().is_err());
        assert!(store.publish().is_err());

        store.reopen();
        store.write_one("k", Value::from(1)).unwrap();
    }

    #[test]
    fn memory_read_only_rejects_writes() {
        let store = InMemoryStore::with_entries([("k", 1)]);
        store.set_read_only(true);
        assert!(matches!(
            store.write_one("k", Value::from(2)),
            Err(StoreError::ReadOnly)
        ));
        assert!(matches!(store.delete_one("k"), Err(StoreError::ReadOnly)));
        assert_eq!(store.read_one("k").unwrap(), Some(Value::from(1)));
        store.publish().unwrap();

        store.set_read_only(false);
        store.write_one("k", Value::from(2)).unwrap();
    }

    #[test]
    fn memory_observation_fires_on_write_and_delete() {
        let store = InMemoryStore::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let sub = store
            .observe(
                "theme",
                Arc::new(move |key: &str| sink.lock().push(key.to_string())),
            )
            .unwrap();

        store.write_one("theme", Value::from("dark")).unwrap();
        store.write_one("budget", Value::from(1)).unwrap();
        store.delete_one("theme").unwrap();
        assert_eq!(seen.lock().len(), 2);

        sub.cancel();
        store.write_one("theme", Value::from("light")).unwrap();
        assert_eq!(seen.lock().len(), 2);
        assert_eq!(store.observer_count(), 0);
    }

    #[test]
    fn memory_delete_of_absent_key_is_silent() {
        let store = InMemoryStore::new();
        let seen = Arc::new(Mutex::new(0));
        let sink = Arc::clone(&seen);
        let _sub = store
            .observe("theme", Arc::new(move |_key: &str| *sink.lock() += 1))
            .unwrap();

        store.delete_one("theme").unwrap();
        assert_eq!(*seen.lock(), 0);
    }

    #[test]
    fn memory_observer_may_read_store() {
        let store = Arc::new(InMemoryStore::new());
        let reader = Arc::clone(&store);
        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);
        let _sub = store
            .observe(
                "theme",
                Arc::new(move |key: &str| {
                    *sink.lock() = reader.read_one(key).unwrap();
                }),
            )
            .unwrap();

        store.write_one("theme", Value::from("dark")).unwrap();
        assert_eq!(*seen.lock(), Some(Value::from("dark")));
    }
}
