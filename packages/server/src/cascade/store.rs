use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::DbErr;

use super::{EntityKind, Node};

/// Failure reported by the transactional entity store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: i32 },
    /// Lock contention or serialization failure. Safe to retry.
    #[error("storage conflict: {0}")]
    Conflict(String),
    #[error("storage failure: {0}")]
    Unexpected(String),
}

impl From<DbErr> for StoreError {
    fn from(err: DbErr) -> Self {
        let message = err.to_string();
        if is_conflict_message(&message) {
            StoreError::Conflict(message)
        } else {
            StoreError::Unexpected(message)
        }
    }
}

/// Postgres serialization/deadlock/lock-timeout codes and SQLite busy/locked
/// messages.
fn is_conflict_message(message: &str) -> bool {
    const MARKERS: &[&str] = &[
        "40001",
        "40P01",
        "55P03",
        "could not serialize access",
        "deadlock detected",
        "lock timeout",
        "database is locked",
        "database table is locked",
        "SQLITE_BUSY",
    ];
    let lower = message.to_ascii_lowercase();
    MARKERS
        .iter()
        .any(|m| message.contains(m) || lower.contains(&m.to_ascii_lowercase()))
}

/// Entry point to the relational store used by the coordinator.
#[async_trait]
pub trait EntityStore: Send + Sync {
    type Txn: EntityTxn;

    /// Look up a live row outside of any transaction.
    async fn find_live(&self, kind: EntityKind, id: i32) -> Result<Option<Node>, StoreError>;

    async fn begin(&self) -> Result<Self::Txn, StoreError>;
}

/// Operations available inside one store transaction.
///
/// Dropping a transaction without committing discards its changes.
#[async_trait]
pub trait EntityTxn: Send + Sized {
    async fn find_live(&mut self, kind: EntityKind, id: i32) -> Result<Option<Node>, StoreError>;

    async fn live_children(
        &mut self,
        parent: &Node,
        child: EntityKind,
    ) -> Result<Vec<Node>, StoreError>;

    /// Mark a live row deleted. Fails with `NotFound` if it is already gone.
    async fn soft_delete(&mut self, node: &Node, at: DateTime<Utc>) -> Result<(), StoreError>;

    /// Reassign an aggregate's updater and bump its `updated_at`.
    async fn touch(
        &mut self,
        kind: EntityKind,
        id: i32,
        principal_id: i32,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Point an aggregate's single asset (logo, thumbnail) at a new URL.
    async fn set_asset_url(
        &mut self,
        kind: EntityKind,
        id: i32,
        url: &str,
    ) -> Result<(), StoreError>;

    async fn commit(self) -> Result<(), StoreError>;

    async fn rollback(self) -> Result<(), StoreError>;
}
