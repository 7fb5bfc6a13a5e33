//! JSON file persistence for the button store
//!
//! The file is a JSON object keyed by button id, each value carrying all six
//! button fields. It is read once at start-up and replaced wholesale on save.

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::constants::storage;
use crate::store::{EntityStore, SharedStore, Snapshot, StoreError, lock_store};
use crate::types::{Button, ButtonId};

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("corrupt button file {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Backing file for the store
pub struct ButtonFile {
    path: PathBuf,
    /// Serializes saves so an older snapshot never lands after a newer one
    write_lock: Mutex<()>,
}

/// Ordered view of a snapshot, serialized as `{ "<id>": {..}, .. }`
struct RecordMap<'a>(&'a [(ButtonId, Button)]);

impl Serialize for RecordMap<'_> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (id, button) in self.0 {
            map.serialize_entry(&id.to_string(), button)?;
        }
        map.end()
    }
}

/// Records as they appear in the file, keys normalised, file order kept
struct LoadedRecords(Vec<(ButtonId, Button)>);

impl<'de> Deserialize<'de> for LoadedRecords {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RecordsVisitor;

        impl<'de> Visitor<'de> for RecordsVisitor {
            type Value = LoadedRecords;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of button id to button record")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<LoadedRecords, A::Error> {
                let mut records = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((id, button)) = access.next_entry::<ButtonId, Button>()? {
                    records.push((id, button));
                }
                Ok(LoadedRecords(records))
            }
        }

        deserializer.deserialize_map(RecordsVisitor)
    }
}

impl ButtonFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Default location: `<data dir>/map-markers/buttons_data.json`
    pub fn default_path() -> PathBuf {
        let mut path = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(storage::APP_DIR);
        path.push(storage::FILENAME);
        path
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every record in file order; a missing file is an empty store
    ///
    /// A legacy key and its canonical form may both appear; the store keeps
    /// the first position and the last value.
    pub fn load(&self) -> Result<Vec<(ButtonId, Button)>, PersistenceError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "No button file found, starting empty");
                return Ok(Vec::new());
            }
            Err(source) => {
                return Err(PersistenceError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let LoadedRecords(records) =
            serde_json::from_str(&contents).map_err(|source| PersistenceError::Corrupt {
                path: self.path.clone(),
                source,
            })?;

        info!(path = %self.path.display(), count = records.len(), "Loaded buttons");
        Ok(records)
    }

    /// Load the store for start-up, degrading to an empty store on failure
    ///
    /// An unreadable file is copied aside first so the next save cannot
    /// destroy the only copy.
    pub fn load_or_empty(&self) -> EntityStore {
        match self.load() {
            Ok(records) => EntityStore::from_records(records),
            Err(e) => {
                error!(error = %e, "Failed to load buttons, starting with an empty store");
                self.backup_unreadable();
                EntityStore::new()
            }
        }
    }

    /// Snapshot `store`, replace the file atomically, and mark the written
    /// revision as saved; returns records written
    pub fn save_store(&self, store: &SharedStore) -> Result<usize, PersistenceError> {
        let _guard = self.write_lock.lock().map_err(|_| StoreError::Poisoned)?;
        let snapshot = lock_store(store)?.snapshot();
        let count = self.write_snapshot(&snapshot)?;
        lock_store(store)?.mark_saved(snapshot.revision);
        Ok(count)
    }

    fn write_snapshot(&self, snapshot: &Snapshot) -> Result<usize, PersistenceError> {
        let io_err = |source: std::io::Error| PersistenceError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let json = serde_json::to_vec_pretty(&RecordMap(&snapshot.records))
            .map_err(|e| io_err(std::io::Error::other(e)))?;

        let temp_path = self.sibling(storage::TEMP_SUFFIX);
        let written = write_synced(&temp_path, &json).and_then(|()| fs::rename(&temp_path, &self.path));
        if let Err(e) = written {
            if let Err(cleanup) = fs::remove_file(&temp_path) {
                debug!(error = ?cleanup, path = %temp_path.display(), "Could not remove temp file");
            }
            return Err(io_err(e));
        }

        info!(path = %self.path.display(), count = snapshot.records.len(), revision = snapshot.revision, "Saved buttons");
        Ok(snapshot.records.len())
    }

    fn backup_unreadable(&self) {
        if !self.path.exists() {
            return;
        }
        let backup = self.sibling(storage::BACKUP_SUFFIX);
        match fs::copy(&self.path, &backup) {
            Ok(_) => warn!(backup = %backup.display(), "Preserved unreadable button file"),
            Err(e) => error!(error = ?e, backup = %backup.display(), "Failed to preserve unreadable button file"),
        }
    }

    /// `<file>.<suffix>` next to the backing file
    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".");
        name.push(suffix);
        PathBuf::from(name)
    }
}

fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}
