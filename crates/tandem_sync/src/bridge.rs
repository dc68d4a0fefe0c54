//! Change notification bridge.
//!
//! External signals reach the engine as typed [`SyncEvent`]s on the same
//! queue as every other command, so reacting to them can never interleave
//! with an explicit sync. Each event produces at most one sync pass.

use crate::conflict::Authority;
use crate::worker::Worker;
use tandem_store::{KeyValueStore, ObservableStore};

/// An inbound signal for the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// Another replica's writes became visible in the remote store.
    RemoteChanged {
        /// Keys that changed remotely.
        keys: Vec<String>,
    },
    /// The host application came back to the foreground.
    ForegroundResumed,
    /// A monitored key changed in the local store.
    LocalChanged {
        /// The key that changed.
        key: String,
    },
}

impl<L, R> Worker<L, R>
where
    L: ObservableStore + 'static,
    R: KeyValueStore + 'static,
{
    pub(crate) fn handle_event(&mut self, event: SyncEvent) {
        match event {
            SyncEvent::RemoteChanged { keys } => self.on_remote_changed(keys),
            SyncEvent::ForegroundResumed => {
                verbose!(self.config, "foreground resumed, publishing remote store");
                self.publish_remote();
            }
            SyncEvent::LocalChanged { key } => self.on_local_changed(key),
        }
    }

    /// Pulls the monitored subset of `keys`, but only when the remote
    /// snapshot is strictly newer than the local one.
    fn on_remote_changed(&mut self, keys: Vec<String>) {
        let mut relevant: Vec<String> = keys
            .into_iter()
            .filter(|key| self.monitor.is_monitored(key))
            .collect();
        relevant.sort();
        relevant.dedup();

        if relevant.is_empty() {
            self.drop_notification("no monitored keys changed remotely");
            return;
        }

        let (local_ts, remote_ts) = match self.read_timestamps() {
            Ok(timestamps) => timestamps,
            Err(e) => {
                self.note_error("remote changed", &e);
                self.drop_notification("sync timestamps could not be read");
                return;
            }
        };
        match (local_ts, remote_ts) {
            (Some(local), Some(remote)) if remote > local => {
                verbose!(
                    self.config,
                    keys = ?relevant,
                    local = %local,
                    remote = %remote,
                    "remote changed externally"
                );
                self.sync_keys(&relevant, Some(Authority::Remote));
            }
            _ => self.drop_notification("remote change is not newer than local state"),
        }
    }

    /// Pushes a locally changed key, if it is still monitored and observed.
    fn on_local_changed(&mut self, key: String) {
        if !self.monitor.is_monitored(&key) || !self.monitor.is_observed(&key) {
            self.drop_notification("local change for a key that is no longer observed");
            return;
        }

        verbose!(self.config, key = %key, "observed local change");
        if let Err(e) = self.restamp_local() {
            self.note_error(&key, &e);
        }
        self.sync_keys(std::slice::from_ref(&key), Some(Authority::Local));
    }

    fn drop_notification(&self, reason: &str) {
        verbose!(self.config, reason, "dropped change notification");
        self.stats.write().notifications_dropped += 1;
    }
}
