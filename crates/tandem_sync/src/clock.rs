//! Time sources for sync timestamps.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;
use tandem_store::SyncTimestamp;

/// Source of the current time used to stamp stores.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> SyncTimestamp;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SyncTimestamp {
        SyncTimestamp::from_system_time(SystemTime::now())
    }
}

/// A clock driven by hand, for tests and simulations.
///
/// Every call to [`now`](Clock::now) returns the current reading and then
/// advances it by the configured tick, so successive stamps are strictly
/// increasing unless the clock is frozen.
#[derive(Debug)]
pub struct ManualClock {
    now: AtomicU64,
    tick: u64,
}

impl ManualClock {
    /// Creates a clock starting at `start` that advances 1ms per reading.
    pub fn new(start: SyncTimestamp) -> Self {
        Self {
            now: AtomicU64::new(start.as_millis()),
            tick: 1,
        }
    }

    /// Creates a clock that only moves when told to.
    pub fn frozen(start: SyncTimestamp) -> Self {
        Self {
            now: AtomicU64::new(start.as_millis()),
            tick: 0,
        }
    }

    /// Sets the current reading.
    pub fn set(&self, ts: SyncTimestamp) {
        self.now.store(ts.as_millis(), Ordering::SeqCst);
    }

    /// Moves the reading forward by `millis`.
    pub fn advance(&self, millis: u64) {
        self.now.fetch_add(millis, Ordering::SeqCst);
    }

    /// Returns the next reading without consuming a tick.
    pub fn peek(&self) -> SyncTimestamp {
        SyncTimestamp::from_millis(self.now.load(Ordering::SeqCst))
    }
}

impl Clock for ManualClock {
    fn now(&self) -> SyncTimestamp {
        SyncTimestamp::from_millis(self.now.fetch_add(self.tick, Ordering::SeqCst))
    }
}
