//! Per-key change observation.
//!
//! A store that supports observation keeps an [`ObserverRegistry`]. Each
//! installed callback is represented by a [`Subscription`] handle; the
//! callback stays installed exactly as long as the handle is alive and not
//! cancelled.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// Callback invoked with the name of the key that changed.
pub type Observer = Arc<dyn Fn(&str) + Send + Sync>;

struct RegistryInner {
    next_id: AtomicU64,
    observers: Mutex<HashMap<u64, (String, Observer)>>,
}

/// Registry of per-key observers shared by a store and its subscriptions.
#[derive(Clone)]
pub struct ObserverRegistry {
    inner: Arc<RegistryInner>,
}

impl ObserverRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                next_id: AtomicU64::new(1),
                observers: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Installs `observer` for `key` and returns its handle.
    pub fn register(&self, key: &str, observer: Observer) -> Subscription {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .observers
            .lock()
            .insert(id, (key.to_string(), observer));
        Subscription {
            id,
            key: key.to_string(),
            registry: Arc::downgrade(&self.inner),
        }
    }

    /// Invokes every observer installed for `key`.
    ///
    /// Observers run on the calling thread, after the registry lock has been
    /// released, so they may install or cancel subscriptions themselves.
    pub fn notify(&self, key: &str) {
        let matching: Vec<Observer> = self
            .inner
            .observers
            .lock()
            .values()
            .filter(|(k, _)| k == key)
            .map(|(_, observer)| Arc::clone(observer))
            .collect();

        for observer in matching {
            observer(key);
        }
    }

    /// Returns the number of installed observers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.observers.lock().len()
    }

    /// Returns true if no observers are installed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of observers installed for `key`.
    #[must_use]
    pub fn count_for(&self, key: &str) -> usize {
        self.inner
            .observers
            .lock()
            .values()
            .filter(|(k, _)| k == key)
            .count()
    }
}

impl Default for ObserverRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ObserverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverRegistry")
            .field("observers", &self.len())
            .finish()
    }
}

/// Handle to an installed observer.
///
/// Dropping the handle cancels the observation.
pub struct Subscription {
    id: u64,
    key: String,
    registry: Weak<RegistryInner>,
}

impl Subscription {
    /// Returns the observed key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns true while the observer is still installed.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.registry
            .upgrade()
            .is_some_and(|inner| inner.observers.lock().contains_key(&self.id))
    }

    /// Removes the observer from its store.
    pub fn cancel(self) {
        drop(self);
    }

    fn remove(&self) {
        if let Some(inner) = self.registry.upgrade() {
            inner.observers.lock().remove(&self.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.remove();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("key", &self.key)
            .finish()
    }
}
