use async_trait::async_trait;

use super::error::StorageError;
use super::key::BlobKey;

/// Path-keyed blob storage.
///
/// Writes replace whatever is stored under the key. Deletes are idempotent:
/// removing an absent blob reports `false` instead of failing.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store bytes under `key`.
    async fn put(&self, key: &BlobKey, data: &[u8]) -> Result<(), StorageError>;

    /// Check whether a blob exists.
    async fn exists(&self, key: &BlobKey) -> Result<bool, StorageError>;

    /// Delete a blob.
    ///
    /// Returns `true` if the blob was deleted, `false` if it did not exist.
    async fn delete(&self, key: &BlobKey) -> Result<bool, StorageError>;
}
