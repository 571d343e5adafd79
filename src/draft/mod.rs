// ABOUTME: Draft persistence - key-value storage of wizard session snapshots
// Filesystem store for production, in-memory store for tests and offline hosts

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::Context;
use thiserror::Error;
use uuid::Uuid;

use crate::wizard::DraftRecord;

mod writer;

pub use writer::DraftWriter;

/// Errors from draft storage and the background writer
#[derive(Debug, Error)]
pub enum DraftError {
    #[error("Draft I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Draft is not valid JSON: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("Draft writer is no longer running")]
    WriterClosed,
}

/// Key-value persistence for in-progress wizard drafts, keyed by draft id
pub trait DraftStore: Send + Sync {
    fn save(&self, record: &DraftRecord) -> Result<(), DraftError>;
    fn load(&self, draft_id: Uuid) -> Result<Option<DraftRecord>, DraftError>;
    fn delete(&self, draft_id: Uuid) -> Result<(), DraftError>;
}

/// Draft store writing one pretty-printed JSON file per draft
#[derive(Debug, Clone)]
pub struct FsDraftStore {
    dir: PathBuf,
}

impl FsDraftStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Store rooted at the default drafts directory under the user's home
    pub fn open_default() -> anyhow::Result<Self> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(Self::new(home.join(".listwise/drafts")))
    }

    fn path_for(&self, draft_id: Uuid) -> PathBuf {
        self.dir.join(format!("{draft_id}.json"))
    }
}

impl DraftStore for FsDraftStore {
    fn save(&self, record: &DraftRecord) -> Result<(), DraftError> {
        fs::create_dir_all(&self.dir)?;
        let content = serde_json::to_string_pretty(record)?;
        fs::write(self.path_for(record.draft_id), content)?;
        Ok(())
    }

    fn load(&self, draft_id: Uuid) -> Result<Option<DraftRecord>, DraftError> {
        let path = self.path_for(draft_id);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    fn delete(&self, draft_id: Uuid) -> Result<(), DraftError> {
        let path = self.path_for(draft_id);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

/// In-memory draft store for tests and offline hosts.
///
/// `set_failing(true)` makes every save fail, exercising the writer's
/// retry-on-next-tick path.
#[derive(Debug, Default)]
pub struct MemoryDraftStore {
    records: Mutex<HashMap<Uuid, DraftRecord>>,
    failing: AtomicBool,
}

impl MemoryDraftStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.records.lock().expect("draft store poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DraftStore for MemoryDraftStore {
    fn save(&self, record: &DraftRecord) -> Result<(), DraftError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DraftError::Io(std::io::Error::other("injected save failure")));
        }
        self.records
            .lock()
            .expect("draft store poisoned")
            .insert(record.draft_id, record.clone());
        Ok(())
    }

    fn load(&self, draft_id: Uuid) -> Result<Option<DraftRecord>, DraftError> {
        Ok(self
            .records
            .lock()
            .expect("draft store poisoned")
            .get(&draft_id)
            .cloned())
    }

    fn delete(&self, draft_id: Uuid) -> Result<(), DraftError> {
        self.records
            .lock()
            .expect("draft store poisoned")
            .remove(&draft_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wizard::WizardSession;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_fs_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsDraftStore::new(dir.path().join("drafts"));

        let mut session = WizardSession::new();
        session.set_field("title", json!("Corner duplex"));
        let record = session.snapshot();

        store.save(&record).unwrap();
        let loaded = store.load(record.draft_id).unwrap().unwrap();
        assert_eq!(loaded.form_data, record.form_data);

        store.delete(record.draft_id).unwrap();
        assert!(store.load(record.draft_id).unwrap().is_none());
    }

    #[test]
    fn test_fs_store_missing_draft_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsDraftStore::new(dir.path().to_path_buf());
        assert!(store.load(Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn test_fs_store_corrupt_draft_errors() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsDraftStore::new(dir.path().to_path_buf());
        let id = Uuid::new_v4();
        std::fs::write(dir.path().join(format!("{id}.json")), "not json").unwrap();

        assert!(matches!(store.load(id), Err(DraftError::Corrupt(_))));
    }

    #[test]
    fn test_memory_store_failure_injection() {
        let store = MemoryDraftStore::new();
        let record = WizardSession::new().snapshot();

        store.set_failing(true);
        assert!(store.save(&record).is_err());

        store.set_failing(false);
        store.save(&record).unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_delete_is_idempotent() {
        let store = MemoryDraftStore::new();
        store.delete(Uuid::new_v4()).unwrap();
    }
}
