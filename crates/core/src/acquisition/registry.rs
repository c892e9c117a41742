//! Shared access to the persisted dedup registry.

use std::sync::{Arc, Mutex, MutexGuard};

use super::types::DedupRegistry;
use crate::checkpoint::{keys, CheckpointError, CheckpointStore, CheckpointStoreExt};

/// Serialises read-modify-write cycles on the dedup registry document.
///
/// The acquisition queue and asset deletion both rewrite the document; the
/// lock keeps a deletion from being lost between a load and a save.
pub struct RegistryStore {
    checkpoints: Arc<dyn CheckpointStore>,
    lock: Mutex<()>,
}

impl RegistryStore {
    pub fn new(checkpoints: Arc<dyn CheckpointStore>) -> Self {
        Self {
            checkpoints,
            lock: Mutex::new(()),
        }
    }

    fn guard(&self) -> Result<MutexGuard<'_, ()>, CheckpointError> {
        self.lock
            .lock()
            .map_err(|e| CheckpointError::Database(format!("registry lock poisoned: {}", e)))
    }

    pub fn load(&self) -> Result<DedupRegistry, CheckpointError> {
        let _guard = self.guard()?;
        self.checkpoints.load(keys::DEDUP_REGISTRY)
    }

    /// Fold in IDs forgotten since `registry` was loaded, then save it.
    pub fn merge_and_save(&self, registry: &mut DedupRegistry) -> Result<(), CheckpointError> {
        let _guard = self.guard()?;
        let stored: DedupRegistry = self.checkpoints.load(keys::DEDUP_REGISTRY)?;
        registry.absorb_forgotten(&stored);
        self.checkpoints.save(keys::DEDUP_REGISTRY, registry)
    }

    /// Move a catalog ID to the forgotten set. Returns false if it was
    /// already forgotten.
    pub fn forget(&self, id: &str) -> Result<bool, CheckpointError> {
        let _guard = self.guard()?;
        let mut registry: DedupRegistry = self.checkpoints.load(keys::DEDUP_REGISTRY)?;
        let changed = registry.forget(id);
        if changed {
            self.checkpoints.save(keys::DEDUP_REGISTRY, &registry)?;
        }
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquisition::DownloadRecord;
    use crate::checkpoint::SqliteCheckpointStore;
    use chrono::Utc;

    fn store() -> RegistryStore {
        RegistryStore::new(Arc::new(SqliteCheckpointStore::in_memory().unwrap()))
    }

    #[test]
    fn test_forget_persists() {
        let store = store();
        assert!(store.forget("42").unwrap());
        assert!(!store.forget("42").unwrap());
        assert!(store.load().unwrap().forgotten.contains("42"));
    }

    #[test]
    fn test_merge_keeps_concurrent_forget() {
        let store = store();
        let mut live = store.load().unwrap();
        live.record_acquired(DownloadRecord {
            id: "1".to_string(),
            topic: "Dubai Mall".to_string(),
            category: "shopping".to_string(),
            title: "Dubai Mall atrium".to_string(),
            downloaded_at: Utc::now(),
        });
        store.merge_and_save(&mut live).unwrap();

        // Deleted while a run holds its own copy.
        store.forget("1").unwrap();
        store.merge_and_save(&mut live).unwrap();

        let saved = store.load().unwrap();
        assert!(saved.forgotten.contains("1"));
        assert!(!saved.acquired.contains("1"));
        assert!(saved.downloads.is_empty());
    }
}
