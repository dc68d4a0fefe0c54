//! Conflict resolution between the two stores.
//!
//! Resolution is whole-store: one store is picked as the authority for an
//! entire synchronize call by comparing the reserved sync timestamp held in
//! each store.

use std::fmt;
use tandem_store::{KeyValueStore, StoreResult, SyncTimestamp, SYNC_TIMESTAMP_KEY};

/// The store designated as source of truth for one synchronize call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Authority {
    /// The fast local store.
    Local,
    /// The shared remote store.
    Remote,
}

impl Authority {
    /// Returns the store that receives the copied entries.
    pub fn destination(&self) -> Authority {
        match self {
            Authority::Local => Authority::Remote,
            Authority::Remote => Authority::Local,
        }
    }

    /// Returns a short direction label for diagnostics.
    pub fn direction_label(&self) -> &'static str {
        match self {
            Authority::Local => "local -> remote",
            Authority::Remote => "remote -> local",
        }
    }
}

impl fmt::Display for Authority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Authority::Local => write!(f, "local"),
            Authority::Remote => write!(f, "remote"),
        }
    }
}

/// Picks the authority from the two stores' sync timestamps.
///
/// - Both present: the strictly later one wins, ties go to local
/// - Only one present: that store wins
/// - Neither present: local (a first sync pushes local state outward)
pub fn resolve_authority(
    local: Option<SyncTimestamp>,
    remote: Option<SyncTimestamp>,
) -> Authority {
    match (local, remote) {
        (Some(l), Some(r)) if r > l => Authority::Remote,
        (Some(_), Some(_)) => Authority::Local,
        (Some(_), None) => Authority::Local,
        (None, Some(_)) => Authority::Remote,
        (None, None) => Authority::Local,
    }
}

/// Reads the sync timestamp of a store.
///
/// A missing entry and a value of the wrong type both mean "never
/// synchronized". A failed read is returned as an error: an unreachable store
/// has an unknown timestamp, not an absent one.
pub fn read_timestamp<S>(store: &S) -> StoreResult<Option<SyncTimestamp>>
where
    S: KeyValueStore + ?Sized,
{
    let value = store.read_one(SYNC_TIMESTAMP_KEY)?;
    Ok(value.and_then(|v| {
        let ts = v.as_timestamp();
        if ts.is_none() {
            tracing::warn!(value = %v, "sync timestamp has the wrong type, treating as absent");
        }
        ts
    }))
}

/// Determines which store holds the most recent snapshot.
///
/// # Errors
///
/// Returns an error if either timestamp cannot be read.
pub fn latest_authority<L, R>(local: &L, remote: &R) -> StoreResult<Authority>
where
    L: KeyValueStore + ?Sized,
    R: KeyValueStore + ?Sized,
{
    Ok(resolve_authority(read_timestamp(local)?, read_timestamp(remote)?))
}
