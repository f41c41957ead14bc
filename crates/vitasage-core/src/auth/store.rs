use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use anyhow::{Context, Result};
use tracing::{debug, warn};

/// Storage file name inside the storage directory
const STORAGE_FILE: &str = "storage.json";

/// Scratch file renamed over the storage file on every write
const STORAGE_TMP_FILE: &str = "storage.json.tmp";

/// Key/value storage for client credentials.
///
/// Mirrors the semantics of browser local storage: string values under
/// string keys, removing a missing key is not an error.
pub trait CredentialStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// In-process store, used by tests and short-lived tools.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .read()
            .map(|entries| entries.contains_key(key))
            .unwrap_or(false)
    }
}

fn poisoned<T>(_: T) -> anyhow::Error {
    anyhow::anyhow!("Credential store lock poisoned")
}

impl CredentialStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        entries.remove(key);
        Ok(())
    }
}

/// Store persisted as a flat JSON object on disk.
///
/// The file is re-read on every access so that a login performed by another
/// process is picked up by the next request. Writes go through a scratch file
/// and a rename. A file that does not parse fails reads, but writes replace
/// it, so a damaged file never blocks the next login.
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    /// Open the store at `<dir>/storage.json`. The file is created lazily.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(STORAGE_FILE),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read storage file: {}", self.path.display()))?;
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse storage file: {}", self.path.display()))
    }

    /// Current entries for a read-modify-write. Returns whether the file had
    /// to be discarded, in which case it must be rewritten.
    fn read_for_update(&self) -> (BTreeMap<String, String>, bool) {
        match self.read_all() {
            Ok(entries) => (entries, false),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Discarding unreadable credential store");
                (BTreeMap::new(), true)
            }
        }
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir)?;
        let tmp_path = dir.join(STORAGE_TMP_FILE);

        let contents = serde_json::to_string_pretty(entries)?;
        std::fs::write(&tmp_path, contents)
            .with_context(|| format!("Failed to write storage file: {}", tmp_path.display()))?;
        std::fs::rename(&tmp_path, &self.path)
            .with_context(|| format!("Failed to replace storage file: {}", self.path.display()))?;
        debug!(path = %self.path.display(), keys = entries.len(), "Saved credential store");
        Ok(())
    }
}

impl CredentialStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.lock.lock().map_err(poisoned)?;
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.lock.lock().map_err(poisoned)?;
        let (mut entries, _) = self.read_for_update();
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let _guard = self.lock.lock().map_err(poisoned)?;
        let (mut entries, discarded) = self.read_for_update();
        if entries.remove(key).is_some() || discarded {
            self.write_all(&entries)?;
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
