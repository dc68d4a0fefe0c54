//! Authority command implementation.

use super::{open_store, CliError};
use std::path::Path;
use tandem_store::SyncTimestamp;
use tandem_sync::{read_timestamp, resolve_authority};

/// Prints both sync timestamps and the direction a full sync would take.
pub fn run(local_path: &Path, remote_path: &Path) -> Result<(), CliError> {
    let local = open_store(local_path)?;
    let remote = open_store(remote_path)?;

    let local_ts = read_timestamp(&local)?;
    let remote_ts = read_timestamp(&remote)?;
    let authority = resolve_authority(local_ts, remote_ts);

    let show = |ts: Option<SyncTimestamp>| {
        ts.map_or_else(|| "never synchronized".to_string(), |t| t.to_string())
    };
    println!("Local timestamp:  {}", show(local_ts));
    println!("Remote timestamp: {}", show(remote_ts));
    println!("Authority:        {authority} ({})", authority.direction_label());

    Ok(())
}
