//! Dump command implementation.

use super::{json, open_store, CliError, OutputFormat};
use std::path::Path;
use tandem_store::{KeyValueStore, SYNC_TIMESTAMP_KEY};

/// Runs the dump command.
pub fn run(path: &Path, format: &str) -> Result<(), CliError> {
    let format = OutputFormat::parse(format)?;
    let store = open_store(path)?;
    let snapshot = store.read_all()?;

    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&json::snapshot_to_json(&snapshot))?
            );
        }
        OutputFormat::Text => {
            println!("Store: {}", path.display());
            let entries = snapshot.keys().filter(|k| *k != SYNC_TIMESTAMP_KEY).count();
            println!("Entries: {entries}");
            match snapshot.get(SYNC_TIMESTAMP_KEY) {
                Some(ts) => println!("Last sync: {ts}"),
                None => println!("Last sync: never"),
            }
            println!();
            for (key, value) in snapshot.iter().filter(|(k, _)| *k != SYNC_TIMESTAMP_KEY) {
                println!("  {key} = {value}");
            }
        }
    }

    Ok(())
}
