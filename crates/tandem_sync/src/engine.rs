//! The public sync engine handle.

use crate::bridge::SyncEvent;
use crate::clock::{Clock, SystemClock};
use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::monitor::KeyMonitor;
use crate::stats::{SyncReport, SyncStats};
use crate::worker::{Command, MonitorView, Worker};
use parking_lot::RwLock;
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tandem_store::{KeyValueStore, ObservableStore, Observer};

/// The sync engine keeps a local and a remote store convergent.
///
/// All synchronization work runs on one dedicated worker thread, in
/// submission order. Explicit calls ([`sync`](Self::sync),
/// [`sync_keys`](Self::sync_keys), monitoring changes) block until the worker
/// has finished them; events ([`notify`](Self::notify)) are queued and return
/// immediately.
///
/// Blocking calls must not be made from inside a store observer, since
/// observers may run on the worker thread.
///
/// Dropping the engine drains queued work, stops the worker and removes every
/// observation it installed.
pub struct SyncEngine<L, R>
where
    L: ObservableStore + 'static,
    R: KeyValueStore + 'static,
{
    config: SyncConfig,
    local: Arc<L>,
    remote: Arc<R>,
    commands: Sender<Command>,
    stats: Arc<RwLock<SyncStats>>,
    worker: Option<JoinHandle<()>>,
}

impl<L, R> SyncEngine<L, R>
where
    L: ObservableStore + 'static,
    R: KeyValueStore + 'static,
{
    /// Creates an engine stamping stores with the system clock.
    pub fn new(config: SyncConfig, local: Arc<L>, remote: Arc<R>) -> SyncResult<Self> {
        Self::with_clock(config, local, remote, Arc::new(SystemClock))
    }

    /// Creates an engine with a custom time source.
    pub fn with_clock(
        config: SyncConfig,
        local: Arc<L>,
        remote: Arc<R>,
        clock: Arc<dyn Clock>,
    ) -> SyncResult<Self> {
        config.validate()?;

        let (commands, receiver) = mpsc::channel();
        let stats = Arc::new(RwLock::new(SyncStats::default()));

        let events = commands.clone();
        let on_change: Observer = Arc::new(move |key: &str| {
            let _ = events.send(Command::Event(SyncEvent::LocalChanged {
                key: key.to_string(),
            }));
        });

        let worker = Worker {
            local: Arc::clone(&local),
            remote: Arc::clone(&remote),
            config: config.clone(),
            clock,
            monitor: KeyMonitor::new(Arc::clone(&local), on_change).with_verbose(config.verbose),
            stats: Arc::clone(&stats),
        };

        let handle = thread::Builder::new()
            .name(config.worker_name.clone())
            .spawn(move || worker.run(receiver))
            .map_err(SyncError::WorkerSpawn)?;

        verbose!(config, worker = %config.worker_name, "sync engine started");

        Ok(Self {
            config,
            local,
            remote,
            commands,
            stats,
            worker: Some(handle),
        })
    }

    fn request<T>(&self, make: impl FnOnce(Sender<T>) -> Command) -> SyncResult<T> {
        let (reply, response) = mpsc::channel();
        self.commands
            .send(make(reply))
            .map_err(|_| SyncError::EngineStopped)?;
        response.recv().map_err(|_| SyncError::EngineStopped)
    }

    /// Synchronizes every entry in the direction the timestamps dictate.
    pub fn sync(&self) -> SyncResult<SyncReport> {
        self.request(|reply| Command::SyncAll { reply })
    }

    /// Synchronizes only `keys`. An empty list does nothing.
    pub fn sync_keys<I, S>(&self, keys: I) -> SyncResult<SyncReport>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keys = keys.into_iter().map(Into::into).collect();
        self.request(|reply| Command::SyncKeys { keys, reply })
    }

    /// Starts keeping `keys` convergent automatically.
    pub fn start_monitoring<I, S>(&self, keys: I) -> SyncResult<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keys = keys.into_iter().map(Into::into).collect();
        self.request(|reply| Command::StartMonitoring { keys, reply })
    }

    /// Stops keeping `keys` convergent automatically.
    pub fn stop_monitoring<I, S>(&self, keys: I) -> SyncResult<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keys = keys.into_iter().map(Into::into).collect();
        self.request(|reply| Command::StopMonitoring { keys, reply })
    }

    /// Returns the monitored keys, sorted.
    pub fn monitored_keys(&self) -> SyncResult<Vec<String>> {
        self.inspect().map(|view| view.monitored)
    }

    /// Returns the keys that currently have a live local observation, sorted.
    pub fn observed_keys(&self) -> SyncResult<Vec<String>> {
        self.inspect().map(|view| view.observed)
    }

    fn inspect(&self) -> SyncResult<MonitorView> {
        self.request(|reply| Command::Inspect { reply })
    }

    /// Queues an event for the worker. Returns false if the worker has stopped.
    pub fn notify(&self, event: SyncEvent) -> bool {
        self.commands.send(Command::Event(event)).is_ok()
    }

    /// Signals that another replica changed `keys` in the remote store.
    pub fn remote_changed<I, S>(&self, keys: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.notify(SyncEvent::RemoteChanged {
            keys: keys.into_iter().map(Into::into).collect(),
        })
    }

    /// Signals that the host application entered the foreground.
    pub fn entered_foreground(&self) -> bool {
        self.notify(SyncEvent::ForegroundResumed)
    }

    /// Blocks until all previously queued work has run.
    pub fn wait_idle(&self) -> SyncResult<()> {
        self.request(|reply| Command::Barrier { reply })
    }

    /// Returns cumulative statistics.
    pub fn stats(&self) -> SyncStats {
        self.stats.read().clone()
    }

    /// Returns the engine configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Returns the local store.
    pub fn local(&self) -> &Arc<L> {
        &self.local
    }

    /// Returns the remote store.
    pub fn remote(&self) -> &Arc<R> {
        &self.remote
    }

    /// Stops the worker after it has drained queued work.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let Some(handle) = self.worker.take() else {
            return;
        };
        let _ = self.commands.send(Command::Shutdown);
        if handle.thread().id() == thread::current().id() {
            return;
        }
        if handle.join().is_err() {
            tracing::warn!("sync worker panicked");
        }
    }
}

impl<L, R> Drop for SyncEngine<L, R>
where
    L: ObservableStore + 'static,
    R: KeyValueStore + 'static,
{
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::conflict::Authority;
    use tandem_store::{InMemoryStore, SyncTimestamp, Value, SYNC_TIMESTAMP_KEY};

    type Engine = SyncEngine<InMemoryStore, InMemoryStore>;

    fn engine_with(local: InMemoryStore, remote: InMemoryStore) -> Engine {
        SyncEngine::with_clock(
            SyncConfig::default(),
            Arc::new(local),
            Arc::new(remote),
            Arc::new(ManualClock::new(SyncTimestamp(1_000))),
        )
        .unwrap()
    }

    fn stamp(store: &InMemoryStore, ts: u64) {
        store
            .write_one(SYNC_TIMESTAMP_KEY, Value::from(SyncTimestamp(ts)))
            .unwrap();
    }

    fn timestamp_of(store: &InMemoryStore) -> Option<SyncTimestamp> {
        crate::conflict::read_timestamp(store).unwrap()
    }

    #[test]
    fn engine_rejects_invalid_config() {
        let result = SyncEngine::new(
            SyncConfig::default().with_worker_name(""),
            Arc::new(InMemoryStore::new()),
            Arc::new(InMemoryStore::new()),
        );
        assert!(matches!(result, Err(SyncError::Config(_))));
    }

    #[test]
    fn engine_primes_remote_on_start() {
        let engine = engine_with(InMemoryStore::new(), InMemoryStore::new());
        engine.wait_idle().unwrap();
        assert_eq!(engine.remote().publish_count(), 1);
        assert_eq!(engine.stats().publishes, 1);
    }

    #[test]
    fn first_sync_pushes_local() {
        let engine = engine_with(
            InMemoryStore::with_entries([("budget", 500)]),
            InMemoryStore::new(),
        );

        let report = engine.sync().unwrap();
        assert_eq!(report.direction, Authority::Local);
        assert_eq!(report.written, 1);
        assert!(report.is_clean());

        let remote = engine.remote();
        assert_eq!(remote.read_one("budget").unwrap(), Some(Value::from(500)));
        let ts = timestamp_of(remote).unwrap();
        assert_eq!(timestamp_of(engine.local()), Some(ts));
        assert_eq!(report.timestamp, Some(ts));
    }

    #[test]
    fn sync_pulls_when_remote_is_newer() {
        let local = InMemoryStore::with_entries([("budget", 300)]);
        stamp(&local, 10);
        let remote = InMemoryStore::with_entries([("budget", 500), ("theme", 1)]);
        stamp(&remote, 20);
        let engine = engine_with(local, remote);

        let report = engine.sync().unwrap();
        assert_eq!(report.direction, Authority::Remote);
        assert_eq!(report.written, 2);
        assert_eq!(
            engine.local().read_one("budget").unwrap(),
            Some(Value::from(500))
        );
        // A pull stamps local only and does not publish.
        assert_eq!(timestamp_of(engine.remote()), Some(SyncTimestamp(20)));
        assert!(timestamp_of(engine.local()).unwrap() > SyncTimestamp(20));
        assert_eq!(engine.remote().publish_count(), 1);
    }

    #[test]
    fn push_publishes_once_per_batch() {
        let engine = engine_with(
            InMemoryStore::with_entries([("a", 1), ("b", 2), ("c", 3)]),
            InMemoryStore::new(),
        );
        engine.sync().unwrap();
        // One priming publish plus one for the batch.
        assert_eq!(engine.remote().publish_count(), 2);
    }

    #[test]
    fn publish_can_be_disabled() {
        let engine = SyncEngine::with_clock(
            SyncConfig::default().with_publish_on_change(false),
            Arc::new(InMemoryStore::with_entries([("a", 1)])),
            Arc::new(InMemoryStore::new()),
            Arc::new(ManualClock::new(SyncTimestamp(1))),
        )
        .unwrap();
        engine.sync().unwrap();
        assert_eq!(engine.remote().publish_count(), 1);
    }

    #[test]
    fn sync_keys_copies_only_listed_keys() {
        let engine = engine_with(
            InMemoryStore::with_entries([("a", 1), ("b", 2)]),
            InMemoryStore::new(),
        );

        let report = engine.sync_keys(["a"]).unwrap();
        assert_eq!(report.written, 1);
        assert_eq!(engine.remote().read_one("a").unwrap(), Some(Value::from(1)));
        assert_eq!(engine.remote().read_one("b").unwrap(), None);
    }

    #[test]
    fn sync_keys_empty_is_noop() {
        let engine = engine_with(
            InMemoryStore::with_entries([("a", 1)]),
            InMemoryStore::new(),
        );
        let report = engine.sync_keys(Vec::<String>::new()).unwrap();
        assert_eq!(report.timestamp, None);
        assert_eq!(timestamp_of(engine.remote()), None);
    }

    #[test]
    fn pull_of_missing_key_deletes_locally() {
        let local = InMemoryStore::with_entries([("theme", "dark")]);
        stamp(&local, 1);
        let remote = InMemoryStore::new();
        stamp(&remote, 2);
        let engine = engine_with(local, remote);

        let report = engine.sync_keys(["theme"]).unwrap();
        assert_eq!(report.deleted, 1);
        assert_eq!(engine.local().read_one("theme").unwrap(), None);
    }

    #[test]
    fn push_of_missing_key_leaves_remote_alone() {
        let remote = InMemoryStore::with_entries([("theme", "dark")]);
        let engine = engine_with(InMemoryStore::new(), remote);

        let report = engine.sync_keys(["theme"]).unwrap();
        assert_eq!(report.direction, Authority::Local);
        assert_eq!(report.written, 0);
        assert_eq!(
            engine.remote().read_one("theme").unwrap(),
            Some(Value::from("dark"))
        );
    }

    #[test]
    fn failed_writes_leave_timestamps_alone() {
        let engine = engine_with(
            InMemoryStore::with_entries([("a", 1), ("b", 2)]),
            InMemoryStore::new(),
        );
        engine.wait_idle().unwrap();
        engine.remote().set_read_only(true);

        let report = engine.sync().unwrap();
        assert_eq!(report.direction, Authority::Local);
        assert_eq!(report.failed, 2);
        assert!(!report.aborted);
        assert_eq!(report.timestamp, None);
        assert_eq!(timestamp_of(engine.local()), None);
        assert_eq!(timestamp_of(engine.remote()), None);

        let stats = engine.stats();
        assert_eq!(stats.failed_operations, 2);
        assert!(stats.last_error.is_some());

        engine.remote().set_read_only(false);
        let report = engine.sync().unwrap();
        assert!(report.is_clean());
        assert_eq!(engine.remote().read_one("b").unwrap(), Some(Value::from(2)));
    }

    #[test]
    fn unreadable_store_aborts_without_stamping() {
        let local = InMemoryStore::with_entries([("budget", 300)]);
        stamp(&local, 10);
        let remote = InMemoryStore::with_entries([("budget", 999)]);
        stamp(&remote, 20);
        let engine = engine_with(local, remote);
        engine.wait_idle().unwrap();

        engine.remote().close();
        let report = engine.sync().unwrap();
        assert!(report.aborted);
        assert_eq!(report.failed, 1);
        assert_eq!(report.timestamp, None);
        assert_eq!(timestamp_of(engine.local()), Some(SyncTimestamp(10)));
        assert_eq!(engine.stats().passes_aborted, 1);
        assert_eq!(engine.stats().cycles_completed, 0);

        let report = engine.sync_keys(["budget"]).unwrap();
        assert!(report.aborted);
        assert_eq!(timestamp_of(engine.local()), Some(SyncTimestamp(10)));

        engine.remote().reopen();
        let report = engine.sync().unwrap();
        assert_eq!(report.direction, Authority::Remote);
        assert_eq!(
            engine.local().read_one("budget").unwrap(),
            Some(Value::from(999))
        );
        assert_eq!(
            engine.remote().read_one("budget").unwrap(),
            Some(Value::from(999))
        );
    }

    #[test]
    fn stamps_move_past_previous_timestamps() {
        let local = InMemoryStore::with_entries([("budget", 300)]);
        stamp(&local, 5_000);
        let remote = InMemoryStore::new();
        stamp(&remote, 4_000);
        let engine = SyncEngine::with_clock(
            SyncConfig::default(),
            Arc::new(local),
            Arc::new(remote),
            Arc::new(ManualClock::frozen(SyncTimestamp(1_000))),
        )
        .unwrap();

        let first = engine.sync().unwrap();
        assert_eq!(first.timestamp, Some(SyncTimestamp(5_001)));
        assert_eq!(timestamp_of(engine.remote()), Some(SyncTimestamp(5_001)));

        let second = engine.sync().unwrap();
        assert_eq!(second.timestamp, Some(SyncTimestamp(5_002)));
        assert_eq!(timestamp_of(engine.local()), Some(SyncTimestamp(5_002)));
    }

    #[test]
    fn monitoring_is_idempotent() {
        let engine = engine_with(InMemoryStore::new(), InMemoryStore::new());
        engine.start_monitoring(["theme", "theme", "budget"]).unwrap();

        assert_eq!(
            engine.monitored_keys().unwrap(),
            vec!["budget".to_string(), "theme".to_string()]
        );
        assert_eq!(engine.observed_keys().unwrap().len(), 2);
        assert_eq!(engine.local().observer_count(), 2);

        engine.stop_monitoring(["theme"]).unwrap();
        assert_eq!(engine.monitored_keys().unwrap(), vec!["budget".to_string()]);
        assert_eq!(engine.local().observer_count(), 1);
    }

    #[test]
    fn reserved_key_cannot_be_monitored() {
        let engine = engine_with(InMemoryStore::new(), InMemoryStore::new());
        engine.start_monitoring([SYNC_TIMESTAMP_KEY]).unwrap();
        assert!(engine.monitored_keys().unwrap().is_empty());
        assert!(engine.observed_keys().unwrap().is_empty());
    }

    #[test]
    fn shutdown_removes_observations() {
        let local = Arc::new(InMemoryStore::new());
        let engine = SyncEngine::new(
            SyncConfig::default(),
            Arc::clone(&local),
            Arc::new(InMemoryStore::new()),
        )
        .unwrap();
        engine.start_monitoring(["theme"]).unwrap();
        assert_eq!(local.observer_count(), 1);

        engine.shutdown();
        assert_eq!(local.observer_count(), 0);

        // Writes after shutdown are not observed by anyone.
        local.write_one("theme", Value::from("dark")).unwrap();
    }
}
