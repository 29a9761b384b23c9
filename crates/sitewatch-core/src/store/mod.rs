// ── Snapshot store ──
//
// Holds the single current snapshot. Readers see either the old or the
// new value, never a partial one: the slot is an atomic pointer swap and
// the backend is written before the swap.

mod backend;
mod http;

pub use backend::{FileBackend, MemoryBackend, SnapshotBackend};
pub use http::HttpBackend;

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use tracing::{debug, info, warn};

use crate::error::CoreError;
use crate::model::Snapshot;

pub struct SnapshotStore {
    backend: Arc<dyn SnapshotBackend>,
    current: ArcSwapOption<Snapshot>,
}

impl SnapshotStore {
    pub fn new(backend: Arc<dyn SnapshotBackend>) -> Self {
        Self {
            backend,
            current: ArcSwapOption::const_empty(),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Load the last persisted snapshot into the slot.
    ///
    /// A missing snapshot means first run. A load failure is logged and
    /// also treated as first run.
    pub async fn bootstrap(&self) -> Option<Arc<Snapshot>> {
        match self.backend.load().await {
            Ok(Some(snapshot)) => {
                info!(
                    backend = self.backend.name(),
                    taken_at = %snapshot.taken_at,
                    sites = snapshot.total_sites,
                    "restored previous snapshot"
                );
                let snapshot = Arc::new(snapshot);
                self.current.store(Some(Arc::clone(&snapshot)));
                Some(snapshot)
            }
            Ok(None) => {
                debug!(backend = self.backend.name(), "no persisted snapshot, first run");
                None
            }
            Err(e) => {
                warn!(backend = self.backend.name(), error = %e, "snapshot bootstrap failed, treating as first run");
                None
            }
        }
    }

    pub fn current(&self) -> Option<Arc<Snapshot>> {
        self.current.load_full()
    }

    /// Persist `snapshot` and make it current. On failure the previous
    /// snapshot stays current.
    pub async fn replace(&self, snapshot: Snapshot) -> Result<Arc<Snapshot>, CoreError> {
        self.backend.save(&snapshot).await?;
        let snapshot = Arc::new(snapshot);
        self.current.store(Some(Arc::clone(&snapshot)));
        Ok(snapshot)
    }
}

impl std::fmt::Debug for SnapshotStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotStore")
            .field("backend", &self.backend.name())
            .field("has_current", &self.current.load().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::model::SitePoll;

    fn snapshot() -> Snapshot {
        Snapshot::from_polls(Utc::now(), vec![SitePoll::success("s1".into(), "HQ".into(), Vec::new())])
    }

    #[tokio::test]
    async fn bootstrap_restores_persisted_snapshot() {
        let backend = Arc::new(MemoryBackend::with_snapshot(snapshot()));
        let store = SnapshotStore::new(backend.clone());

        assert!(store.current().is_none());
        let restored = store.bootstrap().await.expect("restored");
        assert_eq!(restored.total_sites, 1);
        assert!(store.current().is_some());
        assert_eq!(backend.writes(), 0);
    }

    #[tokio::test]
    async fn bootstrap_failure_is_first_run() {
        let backend = Arc::new(MemoryBackend::new());
        backend.set_failing(true);
        let store = SnapshotStore::new(backend);
        assert!(store.bootstrap().await.is_none());
    }

    #[tokio::test]
    async fn failed_save_keeps_previous_current() {
        let backend = Arc::new(MemoryBackend::new());
        let store = SnapshotStore::new(backend.clone());

        let first = store.replace(snapshot()).await.expect("first save");
        backend.set_failing(true);
        let err = store.replace(snapshot()).await.expect_err("save must fail");

        assert!(matches!(err, CoreError::SnapshotPersistence { .. }));
        assert!(Arc::ptr_eq(&store.current().expect("current"), &first));
        assert_eq!(backend.writes(), 1);
    }
}
