//! Sync command implementation.

use super::{open_store, CliError};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tandem_sync::{SyncConfig, SyncEngine, SyncReport};

/// Builds the engine configuration from an optional JSON file and flags.
pub fn load_config(
    path: Option<&Path>,
    verbose: bool,
    no_publish: bool,
) -> Result<SyncConfig, CliError> {
    let mut config = match path {
        Some(path) => SyncConfig::from_json(&fs::read_to_string(path)?)?,
        None => SyncConfig::default(),
    };
    if verbose {
        config = config.with_verbose(true);
    }
    if no_publish {
        config = config.with_publish_on_change(false);
    }
    Ok(config)
}

/// Runs one sync pass between the two store files.
pub fn run(
    local_path: &Path,
    remote_path: &Path,
    config: SyncConfig,
    keys: &[String],
) -> Result<(), CliError> {
    tracing::debug!(
        local = %local_path.display(),
        remote = %remote_path.display(),
        keys = keys.len(),
        "starting sync"
    );
    let local = Arc::new(open_store(local_path)?);
    let remote = Arc::new(open_store(remote_path)?);
    let engine = SyncEngine::new(config, local, remote)?;

    let report = if keys.is_empty() {
        engine.sync()?
    } else {
        engine.sync_keys(keys.iter().cloned())?
    };
    engine.shutdown();

    print_report(&report);
    Ok(())
}

fn print_report(report: &SyncReport) {
    println!("Synchronized {}", report.direction.direction_label());
    println!("  Written: {}", report.written);
    println!("  Deleted: {}", report.deleted);
    if let Some(ts) = report.timestamp {
        println!("  Stamped: {ts}");
    }
    println!("  Took:    {:?}", report.duration);
    if !report.is_clean() {
        println!("  Failed:  {} (see warnings above)", report.failed);
    }
}
