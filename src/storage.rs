use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use thiserror::Error;

/// Durable key holding the opaque session credential.
pub const TOKEN_KEY: &str = "auth_token";
/// Durable key holding the session role (`admin` | `normal`).
pub const ROLE_KEY: &str = "auth_role";

/// StorageError
///
/// Failures raised by a `SessionStorage` backend. The session layer never surfaces
/// these to users; they are logged and the session continues in memory.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("session storage unavailable: {0}")]
    Unavailable(String),
    #[error("session storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("session storage file is not a valid key-value document: {0}")]
    Corrupt(#[from] serde_json::Error),
}

// 1. SessionStorage Contract
/// SessionStorage
///
/// The storage port behind the session store: a flat, string-keyed durable store
/// surviving process restarts. Swapping implementations (file-backed in the running
/// portal, in-memory during tests) never touches session logic.
///
/// Implementations are synchronous. The session store calls them while holding its
/// write lock, so individual calls must not block for long.
pub trait SessionStorage: Send + Sync {
    /// Reads a value. `Ok(None)` means the key has never been written (or was removed).
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Writes a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removes a key. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

// 2. The Real Implementation (JSON file on disk)
/// FileStorage
///
/// Persists every key into a single JSON object (`{"auth_token": "...", ...}`).
/// Writes go to a sibling temporary file which is then renamed over the original,
/// so a crash mid-write leaves the previous document intact.
pub struct FileStorage {
    path: PathBuf,
    // Serializes read-modify-write cycles on the document.
    io_lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            io_lock: Mutex::new(()),
        }
    }

    fn read_document(&self) -> Result<HashMap<String, String>, StorageError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(HashMap::new()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_document(&self, document: &HashMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(document)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn modify<F>(&self, change: F) -> Result<(), StorageError>
    where
        F: FnOnce(&mut HashMap<String, String>) -> bool,
    {
        let _guard = self
            .io_lock
            .lock()
            .map_err(|_| StorageError::Unavailable("file storage lock poisoned".to_string()))?;
        let mut document = self.read_document()?;
        if change(&mut document) {
            self.write_document(&document)?;
        }
        Ok(())
    }
}

impl SessionStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self
            .io_lock
            .lock()
            .map_err(|_| StorageError::Unavailable("file storage lock poisoned".to_string()))?;
        Ok(self.read_document()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.modify(|document| {
            document.insert(key.to_string(), value.to_string());
            true
        })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.modify(|document| document.remove(key).is_some())
    }
}

// 3. The Mock Implementation (For Unit Tests)
/// MemoryStorage
///
/// In-memory `SessionStorage` used by tests and as a scratch store. The failing
/// variant rejects every call, simulating durable storage being unavailable
/// (read-only disk, sandboxed profile, ...).
#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
    /// When true, all operations return a simulated failure.
    pub should_fail: bool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self {
            entries: Mutex::default(),
            should_fail: true,
        }
    }

    /// Seeds the store, as if a previous run had persisted these pairs.
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: Mutex::new(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
            should_fail: false,
        }
    }

    fn entries(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, StorageError> {
        if self.should_fail {
            return Err(StorageError::Unavailable(
                "Mock Storage Error: Simulation requested".to_string(),
            ));
        }
        self.entries
            .lock()
            .map_err(|_| StorageError::Unavailable("memory storage lock poisoned".to_string()))
    }
}

impl SessionStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries()?.remove(key);
        Ok(())
    }
}

/// StorageState
///
/// The concrete type used to share the storage port across the application state.
pub type StorageState = Arc<dyn SessionStorage>;

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("insurai-storage-{}", uuid::Uuid::new_v4()))
            .join("session.json")
    }

    #[test]
    fn file_storage_missing_file_reads_as_empty() {
        let storage = FileStorage::new(scratch_path());
        assert!(storage.get(TOKEN_KEY).unwrap().is_none());
    }

    #[test]
    fn file_storage_survives_reopen() {
        let path = scratch_path();
        {
            let storage = FileStorage::new(&path);
            storage.set(TOKEN_KEY, "t1").unwrap();
            storage.set(ROLE_KEY, "admin").unwrap();
        }
        let reopened = FileStorage::new(&path);
        assert_eq!(reopened.get(TOKEN_KEY).unwrap().as_deref(), Some("t1"));
        assert_eq!(reopened.get(ROLE_KEY).unwrap().as_deref(), Some("admin"));

        reopened.remove(TOKEN_KEY).unwrap();
        assert!(FileStorage::new(&path).get(TOKEN_KEY).unwrap().is_none());
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn file_storage_reports_corrupt_document() {
        let path = scratch_path();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "not json").unwrap();

        let storage = FileStorage::new(&path);
        assert!(matches!(storage.get(TOKEN_KEY), Err(StorageError::Corrupt(_))));
        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn failing_memory_storage_rejects_everything() {
        let storage = MemoryStorage::new_failing();
        assert!(storage.get(TOKEN_KEY).is_err());
        assert!(storage.set(TOKEN_KEY, "x").is_err());
        assert!(storage.remove(TOKEN_KEY).is_err());
    }
}
