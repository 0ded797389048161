//! In-memory snapshot repository.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use tracing::debug;

use crate::application::ports::{Snapshot, SnapshotId, SnapshotRepository};
use crate::error::{EngineError, EngineResult};

/// In-memory implementation of `SnapshotRepository`.
///
/// Suitable for testing and single-process use. A panic while holding the
/// lock does not make the store unusable.
#[derive(Debug, Default)]
pub struct InMemorySnapshotRepository {
    snapshots: RwLock<HashMap<SnapshotId, Snapshot>>,
}

impl InMemorySnapshotRepository {
    /// Create a new empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored snapshots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the repository is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SnapshotRepository for InMemorySnapshotRepository {
    fn save(&self, snapshot: Snapshot) -> EngineResult<SnapshotId> {
        let id = snapshot.id;
        let mut snapshots = self
            .snapshots
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        if snapshots.contains_key(&id) {
            return Err(EngineError::repository(format!(
                "snapshot {id} already exists"
            )));
        }
        snapshots.insert(id, snapshot);
        drop(snapshots);
        debug!(%id, "Saved snapshot");
        Ok(id)
    }

    fn find(&self, id: &SnapshotId) -> EngineResult<Option<Snapshot>> {
        let snapshots = self
            .snapshots
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(snapshots.get(id).cloned())
    }

    fn list(&self) -> EngineResult<Vec<Snapshot>> {
        let mut all: Vec<Snapshot> = self
            .snapshots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(all)
    }
}
