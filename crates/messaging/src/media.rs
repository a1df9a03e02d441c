//! Best-effort cleanup of externally stored media.

use async_trait::async_trait;
use tracing::warn;

/// Removal hook for media that lives in the external object store.
///
/// Scheduled fire-and-forget after the authoritative message delete
/// succeeds; a failure here never prevents or rolls back the delete.
#[async_trait]
pub trait MediaCleanup: Send + Sync {
    async fn remove(&self, file_name: &str) -> anyhow::Result<()>;
}

/// No-op cleanup for deployments where the object store runs its own
/// garbage collection, and for tests.
pub struct NoopMediaCleanup;

#[async_trait]
impl MediaCleanup for NoopMediaCleanup {
    async fn remove(&self, _file_name: &str) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Spawn the cleanup so the caller's delete path never waits on it.
pub(crate) fn schedule_cleanup(cleanup: std::sync::Arc<dyn MediaCleanup>, file_name: String) {
    tokio::spawn(async move {
        if let Err(error) = cleanup.remove(&file_name).await {
            warn!(%file_name, ?error, "media cleanup failed; object left for storage GC");
        }
    });
}
