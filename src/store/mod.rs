//! File-backed key-by-id upsert stores
//!
//! Each collection is one JSON file under the data directory, holding its
//! records sorted by key. Writes are atomic (temp file + rename, fsynced)
//! and coordinated across processes with an `fd-lock` lock file, so a run
//! killed mid-write never leaves a torn collection behind.

use fd_lock::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::Write;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::{Player, RawPlayer, TeamRecord};

/// Maximum allowed collection file size (64 MB) to prevent memory exhaustion
pub const MAX_STORE_FILE_SIZE: u64 = 64 * 1024 * 1024;

/// Records that can be upserted by a numeric id
pub trait Keyed {
    /// The upsert key
    fn key(&self) -> u64;
}

impl Keyed for TeamRecord {
    fn key(&self) -> u64 {
        u64::from(self.team.id)
    }
}

impl Keyed for RawPlayer {
    fn key(&self) -> u64 {
        u64::from(self.player.id)
    }
}

impl Keyed for Player {
    fn key(&self) -> u64 {
        u64::from(self.id)
    }
}

/// Retry policy applied when opening a store.
///
/// Mirrors a database connect policy: a fixed delay between a bounded number
/// of attempts, decoupled from the orchestrator.
#[derive(Debug, Clone)]
pub struct OpenPolicy {
    /// Total attempts before giving up
    pub max_attempts: u32,
    /// Fixed delay between attempts
    pub retry_delay: Duration,
}

impl Default for OpenPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay: Duration::from_millis(500),
        }
    }
}

/// A named, file-backed collection of keyed records
pub struct Collection<T> {
    path: PathBuf,
    lock_path: PathBuf,
    _marker: PhantomData<T>,
}

impl<T> Collection<T>
where
    T: Serialize + DeserializeOwned + Keyed,
{
    /// Open (and create if needed) the collection `name` under `dir`.
    ///
    /// Directory creation is retried per the policy; runs on startup paths
    /// only, so the fixed delay is a plain blocking sleep.
    pub fn open(dir: &Path, name: &str, policy: &OpenPolicy) -> Result<Self, StoreError> {
        let mut last_error = None;
        for attempt in 1..=policy.max_attempts {
            match std::fs::create_dir_all(dir) {
                Ok(()) => {
                    let path = dir.join(format!("{name}.json"));
                    let lock_path = dir.join(format!("{name}.lock"));
                    debug!(collection = name, path = %path.display(), "collection opened");
                    return Ok(Self {
                        path,
                        lock_path,
                        _marker: PhantomData,
                    });
                }
                Err(e) => {
                    warn!(
                        collection = name,
                        attempt,
                        max_attempts = policy.max_attempts,
                        error = %e,
                        "failed to open collection"
                    );
                    last_error = Some(e);
                    if attempt < policy.max_attempts {
                        std::thread::sleep(policy.retry_delay);
                    }
                }
            }
        }
        Err(StoreError::Open(format!(
            "could not open collection after {} attempts: {}",
            policy.max_attempts,
            last_error.map(|e| e.to_string()).unwrap_or_default()
        )))
    }

    /// Insert or replace records by key, keeping the file sorted by key
    pub fn upsert_all(&self, items: &[T]) -> Result<(), StoreError> {
        if items.is_empty() {
            return Ok(());
        }

        let lock_file = self.open_lock_file()?;
        let mut lock = RwLock::new(lock_file);
        let _guard = lock
            .write()
            .map_err(|e| StoreError::Lock(format!("failed to acquire write lock: {e}")))?;

        let mut records = self.read_all_unlocked()?;
        for item in items {
            match records.iter_mut().find(|r| r.key() == item.key()) {
                Some(existing) => *existing = clone_record(item)?,
                None => records.push(clone_record(item)?),
            }
        }
        records.sort_by_key(Keyed::key);
        self.write_all_unlocked(&records)?;

        info!(
            path = %self.path.display(),
            upserted = items.len(),
            total = records.len(),
            "collection updated"
        );
        Ok(())
    }

    /// Read every record, sorted by key
    pub fn find_all(&self) -> Result<Vec<T>, StoreError> {
        let lock_file = self.open_lock_file()?;
        let lock = RwLock::new(lock_file);
        let _guard = lock
            .read()
            .map_err(|e| StoreError::Lock(format!("failed to acquire read lock: {e}")))?;
        self.read_all_unlocked()
    }

    /// Read a window of records in key order
    pub fn find_range(&self, limit: usize, offset: usize) -> Result<Vec<T>, StoreError> {
        let mut records = self.find_all()?;
        let start = offset.min(records.len());
        let end = (offset + limit).min(records.len());
        Ok(records.drain(start..end).collect())
    }

    /// All record keys in ascending order
    pub fn ids(&self) -> Result<Vec<u64>, StoreError> {
        Ok(self.find_all()?.iter().map(Keyed::key).collect())
    }

    /// Number of stored records
    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.find_all()?.len())
    }

    /// Whether the collection holds no records
    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    fn open_lock_file(&self) -> Result<std::fs::File, StoreError> {
        OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&self.lock_path)
            .map_err(|e| StoreError::Lock(format!("failed to create lock file: {e}")))
    }

    fn read_all_unlocked(&self) -> Result<Vec<T>, StoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let metadata =
            std::fs::metadata(&self.path).map_err(|e| StoreError::Io(e.to_string()))?;
        if metadata.len() > MAX_STORE_FILE_SIZE {
            return Err(StoreError::TooLarge {
                size: metadata.len(),
                max: MAX_STORE_FILE_SIZE,
            });
        }

        let contents =
            std::fs::read_to_string(&self.path).map_err(|e| StoreError::Io(e.to_string()))?;
        serde_json::from_str(&contents).map_err(|e| {
            warn!(path = %self.path.display(), error = %e, "failed to deserialize collection");
            StoreError::Deserialization(e.to_string())
        })
    }

    fn write_all_unlocked(&self, records: &[T]) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(records)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        let parent = self.path.parent().unwrap_or_else(|| Path::new("."));
        let mut temp_file = tempfile::NamedTempFile::new_in(parent)
            .map_err(|e| StoreError::Io(format!("failed to create temp file: {e}")))?;
        temp_file
            .write_all(json.as_bytes())
            .map_err(|e| StoreError::Io(format!("failed to write temp file: {e}")))?;
        temp_file
            .flush()
            .map_err(|e| StoreError::Io(format!("failed to flush temp file: {e}")))?;
        temp_file
            .as_file()
            .sync_all()
            .map_err(|e| StoreError::Io(format!("failed to sync temp file: {e}")))?;
        temp_file
            .persist(&self.path)
            .map_err(|e| StoreError::Io(format!("failed to persist temp file: {e}")))?;

        // Fsync parent directory so the rename is durable
        if let Some(parent) = self.path.parent() {
            if let Ok(dir) = std::fs::File::open(parent) {
                let _ = dir.sync_all();
            }
        }
        Ok(())
    }
}

/// Clone a record through serde.
///
/// Keeps `Collection` free of a `Clone` bound; records pass through serde on
/// every read and write anyway.
fn clone_record<T>(item: &T) -> Result<T, StoreError>
where
    T: Serialize + DeserializeOwned,
{
    let value = serde_json::to_value(item).map_err(|e| StoreError::Serialization(e.to_string()))?;
    serde_json::from_value(value).map_err(|e| StoreError::Deserialization(e.to_string()))
}

/// Storage errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Could not open the collection
    #[error("open error: {0}")]
    Open(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(String),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Deserialization error
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// Lock error
    #[error("lock error: {0}")]
    Lock(String),

    /// Collection file exceeds the size guard
    #[error("collection file too large: {size} bytes (max: {max} bytes)")]
    TooLarge {
        /// Actual file size
        size: u64,
        /// Maximum allowed size
        max: u64,
    },
}
