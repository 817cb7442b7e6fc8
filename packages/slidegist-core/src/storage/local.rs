/// Draft storage backends.
///
/// `FileDraftStorage` keeps every key in one JSON object on disk:
/// - loaded once when opened (a corrupt file starts empty)
/// - rewritten atomically on every change (write .tmp, fsync, rename)
/// - writes serialized through the map's mutex
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::{DraftStorage, StorageError};

pub struct FileDraftStorage {
    path: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
}

impl FileDraftStorage {
    /// Open (or lazily create) the drafts file at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let values = match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                log::warn!(
                    target: "slidegist.storage",
                    "Ignoring corrupt drafts file {}: {}",
                    path.display(),
                    e
                );
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, values: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let json = serde_json::to_string_pretty(values)?;
        Self::atomic_write(&self.path, &json)?;
        Ok(())
    }

    fn atomic_write(path: &Path, content: &str) -> Result<(), std::io::Error> {
        let tmp_path = path.with_extension("slidegist.tmp");
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
        fs::rename(&tmp_path, path)?;
        Ok(())
    }
}

impl DraftStorage for FileDraftStorage {
    fn get(&self, key: &str) -> Option<String> {
        let values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        if values.get(key).map(String::as_str) == Some(value) {
            return Ok(());
        }
        // The in-memory map only changes once the file write succeeded.
        let mut next = values.clone();
        next.insert(key.to_string(), value.to_string());
        self.persist(&next)?;
        *values = next;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        if !values.contains_key(key) {
            return Ok(());
        }
        let mut next = values.clone();
        next.remove(key);
        self.persist(&next)?;
        *values = next;
        Ok(())
    }
}

/// In-process draft storage.
#[derive(Default)]
pub struct MemoryDraftStorage {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryDraftStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DraftStorage for MemoryDraftStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.values
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(key);
        Ok(())
    }
}
