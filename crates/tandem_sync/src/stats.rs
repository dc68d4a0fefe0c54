//! Sync reports and cumulative statistics.

use crate::conflict::Authority;
use std::time::Duration;
use tandem_store::SyncTimestamp;

/// Result of one synchronize pass.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncReport {
    /// The store entries were copied from.
    pub direction: Authority,
    /// Number of entries written into the destination.
    pub written: u64,
    /// Number of entries deleted from the destination.
    pub deleted: u64,
    /// Number of store operations that failed.
    pub failed: u64,
    /// Timestamp written into the destination, and after a push into local
    /// as well. `None` when the pass stamped nothing.
    pub timestamp: Option<SyncTimestamp>,
    /// The pass stopped before copying because a timestamp or the source
    /// entries could not be read. Neither store was modified.
    pub aborted: bool,
    /// Time spent on the worker.
    pub duration: Duration,
}

impl SyncReport {
    /// Creates an empty report for a pass in the given direction.
    pub fn new(direction: Authority) -> Self {
        Self {
            direction,
            written: 0,
            deleted: 0,
            failed: 0,
            timestamp: None,
            aborted: false,
            duration: Duration::ZERO,
        }
    }

    /// Returns true if the pass ran to completion and no store operation failed.
    pub fn is_clean(&self) -> bool {
        self.failed == 0 && !self.aborted
    }
}

/// Statistics accumulated over the engine's lifetime.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncStats {
    /// Number of synchronize passes completed.
    pub cycles_completed: u64,
    /// Entries copied from local into remote.
    pub entries_pushed: u64,
    /// Entries copied from remote into local.
    pub entries_pulled: u64,
    /// Local entries deleted because remote no longer had them.
    pub entries_deleted: u64,
    /// Store operations that failed.
    pub failed_operations: u64,
    /// Passes abandoned because a store could not be read.
    pub passes_aborted: u64,
    /// Change notifications dropped as stale or irrelevant.
    pub notifications_dropped: u64,
    /// Calls to the remote store's publish.
    pub publishes: u64,
    /// Direction of the most recent pass.
    pub last_direction: Option<Authority>,
    /// Timestamp of the most recent pass.
    pub last_sync: Option<SyncTimestamp>,
    /// Last store error message.
    pub last_error: Option<String>,
}

impl SyncStats {
    /// Folds a finished pass into the totals.
    pub(crate) fn record(&mut self, report: &SyncReport) {
        self.failed_operations += report.failed;
        if report.aborted {
            self.passes_aborted += 1;
            return;
        }
        self.cycles_completed += 1;
        match report.direction {
            Authority::Local => self.entries_pushed += report.written,
            Authority::Remote => self.entries_pulled += report.written,
        }
        self.entries_deleted += report.deleted;
        self.last_direction = Some(report.direction);
        if report.timestamp.is_some() {
            self.last_sync = report.timestamp;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_splits_by_direction() {
        let mut stats = SyncStats::default();

        let mut push = SyncReport::new(Authority::Local);
        push.written = 3;
        push.timestamp = Some(SyncTimestamp(10));
        stats.record(&push);

        let mut pull = SyncReport::new(Authority::Remote);
        pull.written = 2;
        pull.deleted = 1;
        pull.failed = 2;
        stats.record(&pull);

        assert_eq!(stats.cycles_completed, 2);
        assert_eq!(stats.entries_pushed, 3);
        assert_eq!(stats.entries_pulled, 2);
        assert_eq!(stats.entries_deleted, 1);
        assert_eq!(stats.failed_operations, 2);
        assert_eq!(stats.last_direction, Some(Authority::Remote));
        assert_eq!(stats.last_sync, Some(SyncTimestamp(10)));
    }

    #[test]
    fn aborted_pass_is_not_a_cycle() {
        let mut stats = SyncStats::default();
        let mut report = SyncReport::new(Authority::Local);
        report.failed = 1;
        report.aborted = true;
        stats.record(&report);

        assert_eq!(stats.cycles_completed, 0);
        assert_eq!(stats.passes_aborted, 1);
        assert_eq!(stats.failed_operations, 1);
        assert_eq!(stats.last_direction, None);
        assert!(!report.is_clean());
    }

    #[test]
    fn report_clean() {
        let mut report = SyncReport::new(Authority::Local);
        assert!(report.is_clean());
        report.failed = 1;
        assert!(!report.is_clean());
    }
}
