//! Persistent local cache.
//!
//! One JSON file per collection under the configured cache directory, plus a
//! side file logging mutations applied while the remote store was
//! unreachable. Conflict resolution is last-writer-wins: whatever is written
//! most recently, locally or from a remote mirror, owns the slot.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use repatlas_core::types::{DbId, Timestamp};

// Slot files are `<collection>.json`; pending logs are
// `<collection>.pending.json` alongside them.

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cache entry is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// A collection snapshot as stored on disk.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheSlot<T> {
    pub items: Vec<T>,
    pub last_synced: Timestamp,
}

/// The kind of a mutation deferred while offline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingKind {
    Create,
    Update,
    Delete,
}

/// One offline mutation, recorded in application order for later inspection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingChange {
    pub kind: PendingKind,
    pub id: DbId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<serde_json::Value>,
    pub timestamp: Timestamp,
}

impl PendingChange {
    pub fn new(kind: PendingKind, id: DbId, payload: Option<serde_json::Value>) -> Self {
        Self {
            kind,
            id,
            payload,
            timestamp: Utc::now(),
        }
    }
}

/// File-backed cache store rooted at a directory.
#[derive(Debug, Clone)]
pub struct CacheStore {
    dir: PathBuf,
}

impl CacheStore {
    /// Open the cache, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn slot_path(&self, collection: &str) -> PathBuf {
        self.dir.join(format!("{collection}.json"))
    }

    fn pending_path(&self, collection: &str) -> PathBuf {
        self.dir.join(format!("{collection}.pending.json"))
    }

    /// Load a collection snapshot. `Ok(None)` means no entry has ever been
    /// written, which is distinct from a present-but-empty collection.
    pub fn load<T: DeserializeOwned>(
        &self,
        collection: &str,
    ) -> Result<Option<CacheSlot<T>>, CacheError> {
        read_json(&self.slot_path(collection))
    }

    /// Replace a collection snapshot, stamping the sync time.
    pub fn store<T: Serialize>(&self, collection: &str, items: &[T]) -> Result<(), CacheError> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct SlotRef<'a, T> {
            items: &'a [T],
            last_synced: Timestamp,
        }
        let slot = SlotRef {
            items,
            last_synced: Utc::now(),
        };
        write_json(&self.slot_path(collection), &slot)
    }

    /// Append one mutation to the pending log.
    pub fn append_pending(
        &self,
        collection: &str,
        change: PendingChange,
    ) -> Result<(), CacheError> {
        let mut log = self.pending(collection)?;
        log.push(change);
        write_json(&self.pending_path(collection), &log)
    }

    /// Read the pending log in application order.
    pub fn pending(&self, collection: &str) -> Result<Vec<PendingChange>, CacheError> {
        Ok(read_json(&self.pending_path(collection))?.unwrap_or_default())
    }

    /// Drop the pending log, e.g. after a destructive reset.
    pub fn clear_pending(&self, collection: &str) -> Result<(), CacheError> {
        let path = self.pending_path(collection);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, CacheError> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), CacheError> {
    let bytes = serde_json::to_vec_pretty(value)?;
    fs::write(path, bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_slot_is_distinct_from_empty() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CacheStore::open(dir.path()).unwrap();

        let missing: Option<CacheSlot<serde_json::Value>> = cache.load("reps").unwrap();
        assert!(missing.is_none());

        cache.store::<serde_json::Value>("reps", &[]).unwrap();
        let empty: Option<CacheSlot<serde_json::Value>> = cache.load("reps").unwrap();
        assert!(empty.unwrap().items.is_empty());
    }

    #[test]
    fn store_then_load_round_trips_items() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CacheStore::open(dir.path()).unwrap();

        let items = vec![json!({"id": 1, "name": "North"}), json!({"id": 2, "name": "South"})];
        cache.store("reps", &items).unwrap();

        let slot: CacheSlot<serde_json::Value> = cache.load("reps").unwrap().unwrap();
        assert_eq!(slot.items, items);
    }

    #[test]
    fn later_store_wins() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CacheStore::open(dir.path()).unwrap();

        cache.store("reps", &[json!({"id": 1})]).unwrap();
        cache.store("reps", &[json!({"id": 2})]).unwrap();

        let slot: CacheSlot<serde_json::Value> = cache.load("reps").unwrap().unwrap();
        assert_eq!(slot.items, vec![json!({"id": 2})]);
    }

    #[test]
    fn pending_log_preserves_application_order() {
        let dir = tempfile::tempdir().unwrap();
        let cache = CacheStore::open(dir.path()).unwrap();

        cache
            .append_pending("reps", PendingChange::new(PendingKind::Create, 10, Some(json!({"name": "a"}))))
            .unwrap();
        cache
            .append_pending("reps", PendingChange::new(PendingKind::Delete, 10, None))
            .unwrap();

        let log = cache.pending("reps").unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].kind, PendingKind::Create);
        assert_eq!(log[1].kind, PendingKind::Delete);

        cache.clear_pending("reps").unwrap();
        assert!(cache.pending("reps").unwrap().is_empty());
    }
}
