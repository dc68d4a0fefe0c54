//! The serialized worker that owns every store mutation.

use crate::bridge::SyncEvent;
use crate::clock::Clock;
use crate::config::SyncConfig;
use crate::conflict::{read_timestamp, resolve_authority, Authority};
use crate::monitor::KeyMonitor;
use crate::stats::{SyncReport, SyncStats};
use parking_lot::RwLock;
use std::sync::mpsc::{Receiver, Sender};
use std::sync::Arc;
use std::time::Instant;
use tandem_store::{
    KeyValueStore, ObservableStore, StoreError, StoreResult, SyncTimestamp, Value,
    SYNC_TIMESTAMP_KEY,
};

/// Work submitted to the worker. Processed strictly in submission order.
pub(crate) enum Command {
    SyncAll {
        reply: Sender<SyncReport>,
    },
    SyncKeys {
        keys: Vec<String>,
        reply: Sender<SyncReport>,
    },
    StartMonitoring {
        keys: Vec<String>,
        reply: Sender<()>,
    },
    StopMonitoring {
        keys: Vec<String>,
        reply: Sender<()>,
    },
    Inspect {
        reply: Sender<MonitorView>,
    },
    Event(SyncEvent),
    Barrier {
        reply: Sender<()>,
    },
    Shutdown,
}

/// Point-in-time copy of the key monitor's two sets.
pub(crate) struct MonitorView {
    pub(crate) monitored: Vec<String>,
    pub(crate) observed: Vec<String>,
}

pub(crate) struct Worker<L: ObservableStore, R: KeyValueStore> {
    pub(crate) local: Arc<L>,
    pub(crate) remote: Arc<R>,
    pub(crate) config: SyncConfig,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) monitor: KeyMonitor<L>,
    pub(crate) stats: Arc<RwLock<SyncStats>>,
}

impl<L, R> Worker<L, R>
where
    L: ObservableStore + 'static,
    R: KeyValueStore + 'static,
{
    /// Drains `commands` until shutdown, then drops every observation.
    pub(crate) fn run(mut self, commands: Receiver<Command>) {
        // Pull in whatever the remote store has pending before the first sync.
        self.publish_remote();

        while let Ok(command) = commands.recv() {
            match command {
                Command::SyncAll { reply } => {
                    let report = self.sync_all();
                    let _ = reply.send(report);
                }
                Command::SyncKeys { keys, reply } => {
                    let report = self.sync_keys(&keys, None);
                    let _ = reply.send(report);
                }
                Command::StartMonitoring { keys, reply } => {
                    self.start_monitoring(&keys);
                    let _ = reply.send(());
                }
                Command::StopMonitoring { keys, reply } => {
                    self.stop_monitoring(&keys);
                    let _ = reply.send(());
                }
                Command::Inspect { reply } => {
                    let _ = reply.send(MonitorView {
                        monitored: self.monitor.monitored_keys(),
                        observed: self.monitor.observed_keys(),
                    });
                }
                Command::Event(event) => self.handle_event(event),
                Command::Barrier { reply } => {
                    let _ = reply.send(());
                }
                Command::Shutdown => break,
            }
        }

        self.monitor.detach_all();
        verbose!(self.config, "sync worker stopped");
    }

    fn store(&self, which: Authority) -> &dyn KeyValueStore {
        match which {
            Authority::Local => self.local.as_ref(),
            Authority::Remote => self.remote.as_ref(),
        }
    }

    /// Reads the local and remote sync timestamps.
    pub(crate) fn read_timestamps(
        &self,
    ) -> StoreResult<(Option<SyncTimestamp>, Option<SyncTimestamp>)> {
        Ok((
            read_timestamp(self.local.as_ref())?,
            read_timestamp(self.remote.as_ref())?,
        ))
    }

    /// Copies every entry of the authoritative store into the other one.
    pub(crate) fn sync_all(&mut self) -> SyncReport {
        let started = Instant::now();
        let (local_ts, remote_ts) = match self.read_timestamps() {
            Ok(timestamps) => timestamps,
            Err(e) => {
                let report = SyncReport::new(Authority::Local);
                return self.abort(report, SYNC_TIMESTAMP_KEY, &e, started);
            }
        };
        let direction = resolve_authority(local_ts, remote_ts);
        let mut report = SyncReport::new(direction);
        verbose!(
            self.config,
            direction = %direction,
            "started synchronization {}",
            direction.direction_label()
        );

        let snapshot = match self.store(direction).read_all() {
            Ok(snapshot) => snapshot,
            Err(e) => return self.abort(report, "*", &e, started),
        };
        for (key, value) in snapshot {
            if key == SYNC_TIMESTAMP_KEY {
                continue;
            }
            self.copy_entry(direction, &key, Some(value), &mut report);
        }

        self.finish(&mut report, local_ts.max(remote_ts), started);
        report
    }

    /// Copies only `keys`. The direction is resolved from the timestamps
    /// unless `forced` names it.
    ///
    /// Every listed key is read from the source before anything is written,
    /// so a failed read leaves both stores untouched.
    pub(crate) fn sync_keys(&mut self, keys: &[String], forced: Option<Authority>) -> SyncReport {
        let started = Instant::now();
        if keys.is_empty() {
            return SyncReport::new(forced.unwrap_or(Authority::Local));
        }

        let (local_ts, remote_ts) = match self.read_timestamps() {
            Ok(timestamps) => timestamps,
            Err(e) => {
                let report = SyncReport::new(forced.unwrap_or(Authority::Local));
                return self.abort(report, SYNC_TIMESTAMP_KEY, &e, started);
            }
        };
        let direction = forced.unwrap_or_else(|| resolve_authority(local_ts, remote_ts));
        let mut report = SyncReport::new(direction);
        verbose!(
            self.config,
            direction = %direction,
            keys = ?keys,
            "started synchronization {}",
            direction.direction_label()
        );

        let mut entries = Vec::with_capacity(keys.len());
        for key in keys {
            if key == SYNC_TIMESTAMP_KEY {
                continue;
            }
            match self.store(direction).read_one(key) {
                Ok(value) => entries.push((key, value)),
                Err(e) => return self.abort(report, key, &e, started),
            }
        }
        for (key, value) in entries {
            self.copy_entry(direction, key, value, &mut report);
        }

        self.finish(&mut report, local_ts.max(remote_ts), started);
        report
    }

    /// Ends a pass that could not read what it needed. Neither store is
    /// written or stamped, so the next pass resolves authority afresh.
    fn abort(
        &mut self,
        mut report: SyncReport,
        key: &str,
        error: &StoreError,
        started: Instant,
    ) -> SyncReport {
        self.record_failure(key, error, &mut report);
        report.aborted = true;
        report.duration = started.elapsed();
        self.stats.write().record(&report);
        verbose!(
            self.config,
            direction = %report.direction,
            "synchronization aborted, stores left unstamped"
        );
        report
    }

    /// Writes one entry into the destination of `direction`.
    ///
    /// Local writes are bracketed by a suspension of the key's observation so
    /// the engine never reacts to its own write.
    fn copy_entry(
        &mut self,
        direction: Authority,
        key: &str,
        value: Option<Value>,
        report: &mut SyncReport,
    ) {
        match direction.destination() {
            Authority::Local => {
                let result = {
                    let _suspended = self.monitor.suspend(key);
                    match &value {
                        Some(v) => self.local.write_one(key, v.clone()),
                        None => self.local.delete_one(key),
                    }
                };
                match (result, value) {
                    (Ok(()), Some(v)) => {
                        report.written += 1;
                        verbose!(self.config, key, value = %v, "synchronized key from remote");
                    }
                    (Ok(()), None) => {
                        report.deleted += 1;
                        verbose!(self.config, key, "removed key absent from remote");
                    }
                    (Err(e), _) => self.record_failure(key, &e, report),
                }
            }
            Authority::Remote => match value {
                Some(v) => {
                    verbose!(self.config, key, value = %v, "synchronizing key to remote");
                    match self.remote.write_one(key, v) {
                        Ok(()) => report.written += 1,
                        Err(e) => self.record_failure(key, &e, report),
                    }
                }
                None => verbose!(self.config, key, "key absent locally, nothing to push"),
            },
        }
    }

    /// Stamps the stores and publishes after a pass.
    ///
    /// Stamping only happens when every copy succeeded: a push stamps remote
    /// and local with the same timestamp, a pull only stamps local. A pass
    /// with failed writes leaves the timestamps as they were so the same
    /// authority is picked again next time. A push publishes the remote
    /// store either way.
    fn finish(
        &mut self,
        report: &mut SyncReport,
        floor: Option<SyncTimestamp>,
        started: Instant,
    ) {
        if report.failed == 0 {
            let now = self.next_stamp(floor);
            let stamp = Value::from(now);

            if report.direction == Authority::Local {
                if let Err(e) = self.remote.write_one(SYNC_TIMESTAMP_KEY, stamp.clone()) {
                    self.record_failure(SYNC_TIMESTAMP_KEY, &e, report);
                }
            }
            if let Err(e) = self.local.write_one(SYNC_TIMESTAMP_KEY, stamp) {
                self.record_failure(SYNC_TIMESTAMP_KEY, &e, report);
            }
            report.timestamp = Some(now);
        } else {
            tracing::warn!(
                failed = report.failed,
                "synchronization incomplete, stores left unstamped"
            );
        }

        if report.direction == Authority::Local && self.config.publish_on_change {
            self.publish_remote();
        }

        report.duration = started.elapsed();
        self.stats.write().record(report);

        verbose!(
            self.config,
            written = report.written,
            deleted = report.deleted,
            failed = report.failed,
            timestamp = ?report.timestamp,
            "finished synchronization {}",
            report.direction.direction_label()
        );
    }

    /// Returns a stamp strictly later than `floor`, even when the clock has
    /// not moved past it.
    fn next_stamp(&self, floor: Option<SyncTimestamp>) -> SyncTimestamp {
        let now = self.clock.now();
        match floor {
            Some(floor) if now <= floor => floor.successor(),
            _ => now,
        }
    }

    fn start_monitoring(&mut self, keys: &[String]) {
        for key in keys {
            if key == SYNC_TIMESTAMP_KEY {
                verbose!(self.config, key = %key, "reserved key cannot be monitored");
                continue;
            }
            if self.monitor.add(key) {
                if let Err(e) = self.monitor.attach(key) {
                    self.note_error(key, &e);
                }
            }
        }
    }

    fn stop_monitoring(&mut self, keys: &[String]) {
        for key in keys {
            self.monitor.remove(key);
            self.monitor.detach(key);
        }
    }

    /// Re-stamps the local store with the current time, never moving its
    /// timestamp backwards.
    pub(crate) fn restamp_local(&mut self) -> StoreResult<()> {
        let previous = read_timestamp(self.local.as_ref())?;
        self.local
            .write_one(SYNC_TIMESTAMP_KEY, Value::from(self.next_stamp(previous)))
    }

    /// Asks the remote store to publish. Failures are logged, not returned.
    pub(crate) fn publish_remote(&mut self) {
        match self.remote.publish() {
            Ok(()) => {
                self.stats.write().publishes += 1;
                verbose!(self.config, "published remote store");
            }
            Err(e) => self.note_error("publish", &e),
        }
    }

    fn record_failure(&self, key: &str, error: &StoreError, report: &mut SyncReport) {
        tracing::warn!(key, error = %error, "store operation failed during sync");
        report.failed += 1;
        self.stats.write().last_error = Some(error.to_string());
    }

    /// Records a failure that happened outside of a sync pass.
    pub(crate) fn note_error(&self, context: &str, error: &StoreError) {
        tracing::warn!(context, error = %error, "store operation failed");
        let mut stats = self.stats.write();
        stats.failed_operations += 1;
        stats.last_error = Some(error.to_string());
    }
}
