use std::sync::Arc;

use chrono::{DateTime, Utc};
use common::storage::BlobStore;
use tracing::{info, instrument, warn};

use super::cleanup::{CleanupOutcome, remove_blob};
use super::store::{EntityStore, EntityTxn, StoreError};
use super::touch::{propagate, touch_owner};
use super::{EntityKind, Node, Principal};

#[derive(Debug, thiserror::Error)]
pub enum CascadeError {
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: i32 },
    #[error("{0} rows cannot be deleted")]
    NotDeletable(EntityKind),
    /// Lost a lock or serialization race. Nothing was changed; retry.
    #[error("concurrent modification: {0}")]
    Conflict(String),
    #[error("storage failure: {0}")]
    Storage(String),
}

impl From<StoreError> for CascadeError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { kind, id } => CascadeError::NotFound { kind, id },
            StoreError::Conflict(msg) => CascadeError::Conflict(msg),
            StoreError::Unexpected(msg) => CascadeError::Storage(msg),
        }
    }
}

/// Summary of one committed subtree deletion.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DeletionReport {
    pub rows_deleted: usize,
    pub blobs_removed: usize,
    pub blobs_missing: usize,
    pub blob_failures: usize,
    /// Aggregate whose audit fields were bumped, if the root had one above it.
    pub touched: Option<(EntityKind, i32)>,
}

impl DeletionReport {
    fn record(&mut self, outcome: CleanupOutcome) {
        match outcome {
            CleanupOutcome::Removed => self.blobs_removed += 1,
            CleanupOutcome::Missing => self.blobs_missing += 1,
            CleanupOutcome::Failed => self.blob_failures += 1,
        }
    }
}

/// Result of swapping an aggregate's thumbnail or logo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetReplacement {
    pub previous_url: Option<String>,
    pub previous_blob: Option<CleanupOutcome>,
}

/// Runs subtree deletions and asset swaps, one store transaction per call.
pub struct DeletionCoordinator<S> {
    store: S,
    blobs: Arc<dyn BlobStore>,
}

impl<S: EntityStore> DeletionCoordinator<S> {
    pub fn new(store: S, blobs: Arc<dyn BlobStore>) -> Self {
        Self { store, blobs }
    }

    /// Soft-delete `id` and every live descendant, children before parents,
    /// removing image blobs on the way, then touch the nearest surviving
    /// aggregate above the root. Either every row is deleted or none is.
    #[instrument(skip(self, principal), fields(principal_id = principal.id))]
    pub async fn delete_subtree(
        &self,
        kind: EntityKind,
        id: i32,
        principal: &Principal,
    ) -> Result<DeletionReport, CascadeError> {
        if !kind.is_soft_deletable() {
            return Err(CascadeError::NotDeletable(kind));
        }
        if self.store.find_live(kind, id).await?.is_none() {
            return Err(CascadeError::NotFound { kind, id });
        }

        let mut txn = self.store.begin().await?;
        match self.delete_in(&mut txn, kind, id, principal).await {
            Ok(report) => {
                txn.commit().await?;
                info!(
                    rows = report.rows_deleted,
                    blobs_removed = report.blobs_removed,
                    blobs_missing = report.blobs_missing,
                    blob_failures = report.blob_failures,
                    "Subtree deleted"
                );
                Ok(report)
            }
            Err(e) => {
                abort(txn).await;
                Err(e.into())
            }
        }
    }

    async fn delete_in(
        &self,
        txn: &mut S::Txn,
        kind: EntityKind,
        id: i32,
        principal: &Principal,
    ) -> Result<DeletionReport, StoreError> {
        let now = Utc::now();
        // Re-read under the transaction; the row may have gone since the pre-check.
        let root = txn
            .find_live(kind, id)
            .await?
            .ok_or(StoreError::NotFound { kind, id })?;

        let mut report = DeletionReport::default();
        for node in post_order(txn, root.clone()).await? {
            if let (Some(dir), Some(url)) = (node.kind.image_dir(), node.image_url.as_deref()) {
                report.record(remove_blob(self.blobs.as_ref(), dir, url).await);
            }
            txn.soft_delete(&node, now).await?;
            report.rows_deleted += 1;
        }

        report.touched = touch_owner(txn, &root, principal, now)
            .await?
            .map(|owner| (owner.kind, owner.id));
        Ok(report)
    }

    /// Point an aggregate's thumbnail/logo at `new_url`, whose blob the caller
    /// has already stored. The previous blob is removed best-effort before the
    /// row is rewritten and the aggregate touched. On error nothing is
    /// committed and the caller owns cleanup of the new blob.
    #[instrument(skip(self, new_url, principal), fields(principal_id = principal.id))]
    pub async fn replace_asset(
        &self,
        kind: EntityKind,
        id: i32,
        new_url: &str,
        principal: &Principal,
    ) -> Result<AssetReplacement, CascadeError> {
        let Some(dir) = kind.asset_dir() else {
            return Err(CascadeError::Storage(format!("{kind} has no replaceable asset")));
        };
        if self.store.find_live(kind, id).await?.is_none() {
            return Err(CascadeError::NotFound { kind, id });
        }

        let mut txn = self.store.begin().await?;
        match self
            .replace_in(&mut txn, kind, id, dir, new_url, principal, Utc::now())
            .await
        {
            Ok(replacement) => {
                txn.commit().await?;
                Ok(replacement)
            }
            Err(e) => {
                abort(txn).await;
                Err(e.into())
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn replace_in(
        &self,
        txn: &mut S::Txn,
        kind: EntityKind,
        id: i32,
        dir: &str,
        new_url: &str,
        principal: &Principal,
        now: DateTime<Utc>,
    ) -> Result<AssetReplacement, StoreError> {
        let node: Node = txn
            .find_live(kind, id)
            .await?
            .ok_or(StoreError::NotFound { kind, id })?;

        let previous_blob = match node.image_url.as_deref() {
            Some(old) if !old.is_empty() && old != new_url => {
                Some(remove_blob(self.blobs.as_ref(), dir, old).await)
            }
            _ => None,
        };

        txn.set_asset_url(kind, id, new_url).await?;
        propagate(txn, &node, principal, now).await?;

        Ok(AssetReplacement {
            previous_url: node.image_url,
            previous_blob,
        })
    }
}

async fn abort<T: EntityTxn>(txn: T) {
    if let Err(e) = txn.rollback().await {
        warn!(error = %e, "Rollback failed");
    }
}

/// Collect the subtree rooted at `root`, every node after all of its
/// descendants. Sibling order is unspecified.
async fn post_order<T: EntityTxn>(txn: &mut T, root: Node) -> Result<Vec<Node>, StoreError> {
    let mut order = Vec::new();
    let mut stack = vec![(root, false)];

    while let Some((node, expanded)) = stack.pop() {
        if expanded {
            order.push(node);
            continue;
        }

        let mut children = Vec::new();
        for &child_kind in node.kind.children() {
            children.extend(txn.live_children(&node, child_kind).await?);
        }
        stack.push((node, true));
        stack.extend(children.into_iter().map(|child| (child, false)));
    }

    Ok(order)
}
