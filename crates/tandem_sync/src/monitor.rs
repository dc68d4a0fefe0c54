//! Monitored keys and their live local observations.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tandem_store::{ObservableStore, Observer, StoreResult, Subscription, SYNC_TIMESTAMP_KEY};

/// Tracks which keys the application wants kept convergent, and which of
/// them currently have a change observation installed on the local store.
///
/// The monitor is the only owner of observation [`Subscription`]s: the
/// registered observation set is exactly the set of keys with a live handle.
pub struct KeyMonitor<L: ObservableStore> {
    local: Arc<L>,
    on_change: Observer,
    monitored: BTreeSet<String>,
    subscriptions: HashMap<String, Subscription>,
    verbose: bool,
}

impl<L: ObservableStore> KeyMonitor<L> {
    /// Creates an empty monitor. `on_change` is installed for every observed
    /// key.
    pub fn new(local: Arc<L>, on_change: Observer) -> Self {
        Self {
            local,
            on_change,
            monitored: BTreeSet::new(),
            subscriptions: HashMap::new(),
            verbose: false,
        }
    }

    /// Enables logging of every subscribe/unsubscribe.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Adds `key` to the monitored set. Returns true if it was newly added.
    pub fn add(&mut self, key: &str) -> bool {
        self.monitored.insert(key.to_string())
    }

    /// Removes `key` from the monitored set. Returns true if it was present.
    pub fn remove(&mut self, key: &str) -> bool {
        self.monitored.remove(key)
    }

    /// Returns true if `key` is monitored.
    pub fn is_monitored(&self, key: &str) -> bool {
        self.monitored.contains(key)
    }

    /// Returns true if `key` currently has a live observation.
    pub fn is_observed(&self, key: &str) -> bool {
        self.subscriptions.contains_key(key)
    }

    /// Returns the monitored keys in sorted order.
    pub fn monitored_keys(&self) -> Vec<String> {
        self.monitored.iter().cloned().collect()
    }

    /// Returns the observed keys in sorted order.
    pub fn observed_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.subscriptions.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Installs observation for `key`.
    ///
    /// Does nothing for the reserved timestamp key or a key that is already
    /// observed. Returns true if a new observation was installed.
    pub fn attach(&mut self, key: &str) -> StoreResult<bool> {
        if key == SYNC_TIMESTAMP_KEY || self.subscriptions.contains_key(key) {
            return Ok(false);
        }

        let subscription = self.local.observe(key, Arc::clone(&self.on_change))?;
        self.subscriptions.insert(key.to_string(), subscription);
        verbose!(self, key, "subscribed for observation");
        Ok(true)
    }

    /// Removes observation for `key`. Returns true if one was installed.
    pub fn detach(&mut self, key: &str) -> bool {
        match self.subscriptions.remove(key) {
            Some(subscription) => {
                subscription.cancel();
                verbose!(self, key, "unsubscribed from observation");
                true
            }
            None => false,
        }
    }

    /// Removes every observation.
    pub fn detach_all(&mut self) {
        let keys: Vec<String> = self.subscriptions.keys().cloned().collect();
        for key in keys {
            self.detach(&key);
        }
    }

    /// Suspends observation of `key` until the returned guard is dropped.
    ///
    /// If the key was observed it is detached now and re-attached when the
    /// guard goes out of scope, whichever way the enclosed write ends.
    pub fn suspend(&mut self, key: &str) -> Suspension<'_, L> {
        let was_observed = self.detach(key);
        Suspension {
            monitor: self,
            key: key.to_string(),
            was_observed,
        }
    }
}

/// Guard returned by [`KeyMonitor::suspend`].
pub struct Suspension<'a, L: ObservableStore> {
    monitor: &'a mut KeyMonitor<L>,
    key: String,
    was_observed: bool,
}

impl<L: ObservableStore> Suspension<'_, L> {
    /// Returns true if the key was observed when the suspension began.
    pub fn was_observed(&self) -> bool {
        self.was_observed
    }
}

impl<L: ObservableStore> Drop for Suspension<'_, L> {
    fn drop(&mut self) {
        if !self.was_observed {
            return;
        }
        if let Err(e) = self.monitor.attach(&self.key) {
            tracing::warn!(key = %self.key, error = %e, "failed to resume observation");
        }
    }
}
