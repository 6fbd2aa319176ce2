pub mod auth;
pub mod blog;
pub mod company;
pub mod customer;
pub mod project;
pub mod project_type;
pub mod users;

use crate::cascade::{CascadeError, EntityKind, EntityStore, EntityTxn, Node, SeaOrmTxn};
use crate::error::AppError;
use crate::state::AppState;

pub(crate) fn not_found(kind: EntityKind, id: i32) -> AppError {
    CascadeError::NotFound { kind, id }.into()
}

/// 404 early, before any blob is written for a row that is already gone.
pub(crate) async fn ensure_live(state: &AppState, kind: EntityKind, id: i32) -> Result<(), AppError> {
    match state.store().find_live(kind, id).await? {
        Some(_) => Ok(()),
        None => Err(not_found(kind, id)),
    }
}

/// Lock a live row inside `txn`.
pub(crate) async fn lock_live(txn: &mut SeaOrmTxn, kind: EntityKind, id: i32) -> Result<Node, AppError> {
    txn.find_live(kind, id)
        .await?
        .ok_or_else(|| not_found(kind, id))
}
