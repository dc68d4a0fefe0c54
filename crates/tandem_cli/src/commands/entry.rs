//! Single-entry commands: get, set and delete.

use super::{json, open_store, CliError};
use std::path::Path;
use tandem_store::{KeyValueStore, SYNC_TIMESTAMP_KEY};

/// Prints the value stored under `key` as JSON.
pub fn get(path: &Path, key: &str) -> Result<(), CliError> {
    let store = open_store(path)?;
    match store.read_one(key)? {
        Some(value) => println!("{}", json::to_json(&value)),
        None => println!("'{key}' is not set"),
    }
    Ok(())
}

/// Writes `value` (JSON) under `key`.
pub fn set(path: &Path, key: &str, value: &str) -> Result<(), CliError> {
    reject_reserved(key)?;
    let value = json::parse_value(value)?;
    let store = open_store(path)?;
    store.write_one(key, value)?;
    println!("Set '{key}'");
    Ok(())
}

/// Removes `key`.
pub fn delete(path: &Path, key: &str) -> Result<(), CliError> {
    reject_reserved(key)?;
    let store = open_store(path)?;
    store.delete_one(key)?;
    println!("Deleted '{key}'");
    Ok(())
}

fn reject_reserved(key: &str) -> Result<(), CliError> {
    if key == SYNC_TIMESTAMP_KEY {
        return Err(CliError::InvalidValue(format!(
            "'{key}' is reserved for sync bookkeeping"
        )));
    }
    Ok(())
}
