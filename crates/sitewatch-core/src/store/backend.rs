// ── Snapshot backends ──

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use tracing::debug;

use crate::error::CoreError;
use crate::model::Snapshot;

/// Durable home of the current snapshot.
#[async_trait]
pub trait SnapshotBackend: Send + Sync {
    fn name(&self) -> &'static str;

    /// `Ok(None)` when nothing has been persisted yet.
    async fn load(&self) -> Result<Option<Snapshot>, CoreError>;

    async fn save(&self, snapshot: &Snapshot) -> Result<(), CoreError>;
}

// ── Memory ───────────────────────────────────────────────────────

/// In-process backend. Counts writes; can be switched into a failing mode.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    slot: ArcSwapOption<Snapshot>,
    writes: AtomicUsize,
    failing: AtomicBool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        let backend = Self::default();
        backend.slot.store(Some(Arc::new(snapshot)));
        backend
    }

    /// Number of successful saves.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn stored(&self) -> Option<Arc<Snapshot>> {
        self.slot.load_full()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), CoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(CoreError::SnapshotPersistence {
                message: "memory backend unavailable".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl SnapshotBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn load(&self) -> Result<Option<Snapshot>, CoreError> {
        self.check()?;
        Ok(self.slot.load_full().map(|s| (*s).clone()))
    }

    async fn save(&self, snapshot: &Snapshot) -> Result<(), CoreError> {
        self.check()?;
        self.slot.store(Some(Arc::new(snapshot.clone())));
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ── File ─────────────────────────────────────────────────────────

/// JSON file on disk. Writes go to a sibling temp file and are renamed
/// into place.
#[derive(Debug, Clone)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn io_error(action: &str, path: &Path, err: &std::io::Error) -> CoreError {
    CoreError::SnapshotPersistence {
        message: format!("{action} {}: {err}", path.display()),
    }
}

#[async_trait]
impl SnapshotBackend for FileBackend {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn load(&self) -> Result<Option<Snapshot>, CoreError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_error("reading", &self.path, &e)),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    async fn save(&self, snapshot: &Snapshot) -> Result<(), CoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| io_error("creating", parent, &e))?;
            }
        }

        let body = serde_json::to_vec_pretty(snapshot)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, body)
            .await
            .map_err(|e| io_error("writing", &tmp, &e))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| io_error("renaming", &self.path, &e))?;

        debug!(path = %self.path.display(), "snapshot written");
        Ok(())
    }
}
