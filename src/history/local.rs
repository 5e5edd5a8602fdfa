use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tracing::warn;
use uuid::Uuid;

use super::record::{AnalysisRecord, NewAnalysis};
use crate::error::SyncError;

/// The device-local collection: one serialized blob, read-modify-written as a
/// whole on every mutation. Synchronous on purpose; this is the local-tier
/// fast path. Parallel writers are last-write-wins.
pub trait BlobStore: Send + Sync {
    fn load(&self) -> Option<String>;
    fn store(&self, raw: &str) -> Result<(), SyncError>;
    fn clear(&self) -> Result<(), SyncError>;
}

/// Blob persisted as a single JSON file in the device profile.
pub struct FileBlob {
    path: PathBuf,
}

impl FileBlob {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl BlobStore for FileBlob {
    fn load(&self) -> Option<String> {
        std::fs::read_to_string(&self.path).ok()
    }

    fn store(&self, raw: &str) -> Result<(), SyncError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| SyncError::LocalStore(e.to_string()))?;
            }
        }
        std::fs::write(&self.path, raw).map_err(|e| SyncError::LocalStore(e.to_string()))
    }

    fn clear(&self) -> Result<(), SyncError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SyncError::LocalStore(e.to_string())),
        }
    }
}

/// In-memory blob for tests and throwaway sessions.
#[derive(Default)]
pub struct MemoryBlob(Mutex<Option<String>>);

impl BlobStore for MemoryBlob {
    fn load(&self) -> Option<String> {
        self.0.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn store(&self, raw: &str) -> Result<(), SyncError> {
        *self.0.lock().unwrap_or_else(|e| e.into_inner()) = Some(raw.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), SyncError> {
        *self.0.lock().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }
}

/// Ephemeral local history for unauthenticated and free users. Most-recent
/// first, no soft-delete, no owner scoping beyond the device.
pub struct LocalHistory {
    blob: Arc<dyn BlobStore>,
}

impl LocalHistory {
    pub fn new(blob: Arc<dyn BlobStore>) -> Self {
        Self { blob }
    }

    /// An unparsable blob is treated as an empty collection. Losing a corrupt
    /// local cache beats refusing to start.
    fn read_all(&self) -> Vec<AnalysisRecord> {
        let Some(raw) = self.blob.load() else {
            return Vec::new();
        };
        match serde_json::from_str(&raw) {
            Ok(items) => items,
            Err(e) => {
                warn!(error = %e, "local history blob unreadable, starting empty");
                Vec::new()
            }
        }
    }

    pub fn save(
        &self,
        owner_id: Option<Uuid>,
        new: NewAnalysis,
    ) -> Result<AnalysisRecord, SyncError> {
        let record = new.into_local_record(owner_id);
        let mut items = self.read_all();
        items.insert(0, record.clone());
        let raw = serde_json::to_string(&items).map_err(|e| SyncError::LocalStore(e.to_string()))?;
        self.blob.store(&raw)?;
        Ok(record)
    }

    /// Case-insensitive substring match on `name`, applied in memory; stored
    /// order (most-recent-first) is preserved.
    pub fn list(&self, filter: Option<&str>) -> Vec<AnalysisRecord> {
        let items = self.read_all();
        match filter.map(str::trim).filter(|q| !q.is_empty()) {
            Some(query) => {
                let needle = query.to_lowercase();
                items
                    .into_iter()
                    .filter(|item| item.name.to_lowercase().contains(&needle))
                    .collect()
            }
            None => items,
        }
    }

    /// Hard wipe. There is no soft-delete concept locally.
    pub fn wipe(&self) -> Result<(), SyncError> {
        self.blob.clear()
    }
}
