//! Status store: latest lifecycle status per job id.

use std::collections::HashMap;
use std::sync::RwLock;

use super::types::JobStatus;

/// Mapping from job id to its latest status.
///
/// `set` overwrites the entry wholesale; nothing from an earlier entry
/// survives a later `set` for the same id.
pub trait StatusStore: Send + Sync {
    fn set(&self, status: JobStatus);

    fn get(&self, id: &str) -> Option<JobStatus>;

    /// Removes the entry. Returns whether one existed.
    fn remove(&self, id: &str) -> bool;
}

/// Process-local status store.
#[derive(Debug, Default)]
pub struct InMemoryStatusStore {
    entries: RwLock<HashMap<String, JobStatus>>,
}

impl InMemoryStatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl StatusStore for InMemoryStatusStore {
    fn set(&self, status: JobStatus) {
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(status.id.clone(), status);
    }

    fn get(&self, id: &str) -> Option<JobStatus> {
        self.entries
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(id)
            .cloned()
    }

    fn remove(&self, id: &str) -> bool {
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(id)
            .is_some()
    }
}
