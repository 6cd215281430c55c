//! Size-bounded string stores used for cache snapshots.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Default quota, in bytes, for a snapshot medium.
pub const DEFAULT_QUOTA_BYTES: usize = 5 * 1024 * 1024;

/// Persistence errors.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("quota exceeded: {needed} bytes needed, {capacity} available")]
    QuotaExceeded { needed: usize, capacity: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Synchronous key-value string store with a byte quota.
pub trait SnapshotMedium: Send + Sync {
    fn get_item(&self, key: &str) -> Result<Option<String>, PersistenceError>;

    /// Store `value` under `key`, replacing any previous value. Fails with
    /// `QuotaExceeded` when the medium would grow past [`capacity`].
    ///
    /// [`capacity`]: SnapshotMedium::capacity
    fn set_item(&self, key: &str, value: &str) -> Result<(), PersistenceError>;

    fn remove_item(&self, key: &str) -> Result<(), PersistenceError>;

    /// Total bytes (keys plus values) the medium accepts.
    fn capacity(&self) -> usize;
}

/// In-process medium.
#[derive(Debug)]
pub struct MemoryMedium {
    items: Mutex<HashMap<String, String>>,
    capacity: usize,
    available: bool,
}

impl MemoryMedium {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_QUOTA_BYTES)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Mutex::new(HashMap::new()),
            capacity,
            available: true,
        }
    }

    /// A medium that refuses every operation, like storage disabled by the
    /// host.
    pub fn unavailable() -> Self {
        Self {
            items: Mutex::new(HashMap::new()),
            capacity: 0,
            available: false,
        }
    }

    fn check_available(&self) -> Result<(), PersistenceError> {
        if self.available {
            Ok(())
        } else {
            Err(PersistenceError::Unavailable("memory medium disabled".into()))
        }
    }
}

impl Default for MemoryMedium {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotMedium for MemoryMedium {
    fn get_item(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        self.check_available()?;
        let items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        self.check_available()?;
        let mut items = self.items.lock().unwrap_or_else(PoisonError::into_inner);

        let others: usize = items
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum();
        let needed = others + key.len() + value.len();
        if needed > self.capacity {
            return Err(PersistenceError::QuotaExceeded {
                needed,
                capacity: self.capacity,
            });
        }

        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), PersistenceError> {
        self.check_available()?;
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }

    fn capacity(&self) -> usize {
        self.capacity
    }
}

/// One JSON file per key inside a directory.
///
/// Writes go to a temp file first and are renamed into place, so a crash
/// mid-write leaves the previous snapshot intact.
#[derive(Debug, Clone)]
pub struct FileMedium {
    base_dir: PathBuf,
    capacity: usize,
}

impl FileMedium {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self::with_capacity(base_dir, DEFAULT_QUOTA_BYTES)
    }

    pub fn with_capacity(base_dir: impl AsRef<Path>, capacity: usize) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
            capacity,
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.base_dir.join(format!("{}.json", file_stem(key)))
    }

    /// Bytes used by every stored item except `key`.
    fn used_excluding(&self, key: &str) -> Result<usize, PersistenceError> {
        if !self.base_dir.exists() {
            return Ok(0);
        }

        let skip = self.path_for(key);
        let mut used = 0usize;
        for entry in fs::read_dir(&self.base_dir)? {
            let path = entry?.path();
            if path == skip || path.extension().is_none_or(|e| e != "json") {
                continue;
            }
            used += fs::metadata(&path)?.len() as usize;
        }
        Ok(used)
    }
}

impl SnapshotMedium for FileMedium {
    fn get_item(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }

        let json = fs::read_to_string(&path)?;
        tracing::debug!("Loaded snapshot from {:?}", path);
        Ok(Some(json))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        let needed = self.used_excluding(key)? + value.len();
        if needed > self.capacity {
            return Err(PersistenceError::QuotaExceeded {
                needed,
                capacity: self.capacity,
            });
        }

        fs::create_dir_all(&self.base_dir)?;

        let path = self.path_for(key);
        let temp_path = self.base_dir.join(format!("{}.json.tmp", file_stem(key)));
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(value.as_bytes())?;
        file.sync_all()?;
        fs::rename(&temp_path, &path)?;

        tracing::debug!("Saved snapshot to {:?}", path);
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), PersistenceError> {
        let path = self.path_for(key);
        if path.exists() {
            fs::remove_file(&path)?;
            tracing::debug!("Deleted snapshot file {:?}", path);
        }
        Ok(())
    }

    fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Keys become file names; anything outside `[A-Za-z0-9_-]` is replaced.
fn file_stem(key: &str) -> String {
    key.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
