//! File-backed store for persistent storage.

use crate::error::{StoreError, StoreResult};
use crate::observer::{Observer, ObserverRegistry, Subscription};
use crate::store::{KeyValueStore, ObservableStore};
use crate::value::{Snapshot, Value};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

const FORMAT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct StoreDocument {
    version: u32,
    entries: Snapshot,
}

/// A file-backed store.
///
/// The whole snapshot is kept in memory and written through to a single
/// CBOR document on every mutation. Data survives process restarts.
///
/// # Durability
///
/// - Each write replaces the document via a temp file and rename
/// - `publish()` calls `File::sync_all()` to ensure data is on disk
///
/// # Thread Safety
///
/// This store is thread-safe and can be shared across threads.
/// Mutations are serialized by an internal lock.
///
/// # Example
///
/// ```no_run
/// use tandem_store::{FileStore, KeyValueStore, Value};
/// use std::path::Path;
///
/// let store = FileStore::open(Path::new("settings.cbor")).unwrap();
/// store.write_one("theme", Value::from("dark")).unwrap();
/// store.publish().unwrap();
/// ```
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    data: RwLock<Snapshot>,
    observers: ObserverRegistry,
}

impl FileStore {
    /// Opens the store at `path`, or starts an empty one if the file does not
    /// exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or decoded.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let data = match File::open(path) {
            Ok(file) => Self::decode(BufReader::new(file))?,
            Err(e) if e.kind() == ErrorKind::NotFound => Snapshot::new(),
            Err(e) => return Err(e.into()),
        };

        tracing::debug!(path = %path.display(), entries = data.len(), "opened file store");

        Ok(Self {
            path: path.to_path_buf(),
            data: RwLock::new(data),
            observers: ObserverRegistry::new(),
        })
    }

    /// Opens the store, creating parent directories if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if directories cannot be created or the file cannot
    /// be read.
    pub fn open_with_create_dirs(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Self::open(path)
    }

    /// Returns the path to the underlying file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn decode(reader: impl std::io::Read) -> StoreResult<Snapshot> {
        let document: StoreDocument = ciborium::de::from_reader(reader)
            .map_err(|e| StoreError::Corrupted(e.to_string()))?;
        if document.version != FORMAT_VERSION {
            return Err(StoreError::Corrupted(format!(
                "unsupported format version {}",
                document.version
            )));
        }
        Ok(document.entries)
    }

    /// Writes `entries` to disk. Called with the data lock held.
    fn persist(&self, entries: &Snapshot) -> StoreResult<()> {
        let tmp = self.path.with_extension("tmp");
        {
            let file = File::create(&tmp)?;
            let mut writer = BufWriter::new(file);
            let document = StoreDocument {
                version: FORMAT_VERSION,
                entries: entries.clone(),
            };
            ciborium::ser::into_writer(&document, &mut writer).map_err(StoreError::codec)?;
            writer.flush()?;
        }
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn read_all(&self) -> StoreResult<Snapshot> {
        Ok(self.data.read().clone())
    }

    fn read_one(&self, key: &str) -> StoreResult<Option<Value>> {
        Ok(self.data.read().get(key).cloned())
    }

    fn write_one(&self, key: &str, value: Value) -> StoreResult<()> {
        {
            let mut data = self.data.write();
            let previous = data.insert(key.to_string(), value);
            if let Err(e) = self.persist(&data) {
                match previous {
                    Some(old) => data.insert(key.to_string(), old),
                    None => data.remove(key),
                };
                return Err(e);
            }
        }
        self.observers.notify(key);
        Ok(())
    }

    fn delete_one(&self, key: &str) -> StoreResult<()> {
        {
            let mut data = self.data.write();
            let Some(previous) = data.remove(key) else {
                return Ok(());
            };
            if let Err(e) = self.persist(&data) {
                data.insert(key.to_string(), previous);
                return Err(e);
            }
        }
        self.observers.notify(key);
        Ok(())
    }

    fn publish(&self) -> StoreResult<()> {
        let _guard = self.data.read();
        match File::open(&self.path) {
            Ok(file) => file.sync_all()?,
            // Nothing has been written yet.
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        Ok(())
    }
}

impl ObservableStore for FileStore {
    fn observe(&self, key: &str, observer: Observer) -> StoreResult<Subscription> {
        Ok(self.observers.register(key, observer))
    }
}
