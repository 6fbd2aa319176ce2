use common::storage::{BlobKey, BlobStore, StorageError};
use tracing::{error, warn};

/// What happened to a blob during best-effort cleanup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupOutcome {
    Removed,
    /// Already gone. Not an error.
    Missing,
    /// The store failed; the blob may linger as garbage.
    Failed,
}

/// Storage key for a public image URL: the URL's basename under `dir`.
pub fn key_for_url(dir: &str, url: &str) -> Result<BlobKey, StorageError> {
    let name = url.rsplit_once('/').map_or(url, |(_, name)| name);
    BlobKey::new(dir, name)
}

/// Delete the blob behind `url`. Never fails: a missing blob is ignored and a
/// store error is logged and swallowed so row-level work can proceed.
pub async fn remove_blob(blobs: &dyn BlobStore, dir: &str, url: &str) -> CleanupOutcome {
    let key = match key_for_url(dir, url) {
        Ok(key) => key,
        Err(e) => {
            error!(url, error = %e, "Cannot derive blob key from image url");
            return CleanupOutcome::Failed;
        }
    };

    match blobs.delete(&key).await {
        Ok(true) => CleanupOutcome::Removed,
        Ok(false) | Err(StorageError::NotFound(_)) => {
            warn!(blob_key = %key, "Blob already absent");
            CleanupOutcome::Missing
        }
        Err(e) => {
            error!(blob_key = %key, error = %e, "Blob cleanup failed");
            CleanupOutcome::Failed
        }
    }
}
