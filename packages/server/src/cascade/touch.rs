use chrono::{DateTime, Utc};

use super::store::{EntityTxn, StoreError};
use super::{Node, Principal};

/// Touch the nearest aggregate at or above `from`, walking parent links.
///
/// Returns the touched aggregate, or `None` when the chain ends without one
/// (e.g. a project type). Runs inside the caller's transaction.
pub async fn propagate<T: EntityTxn>(
    txn: &mut T,
    from: &Node,
    principal: &Principal,
    at: DateTime<Utc>,
) -> Result<Option<Node>, StoreError> {
    let mut current = from.clone();
    loop {
        if current.kind.is_aggregate() {
            txn.touch(current.kind, current.id, principal.id, at).await?;
            return Ok(Some(current));
        }
        let (Some(kind), Some(id)) = (current.kind.parent(), current.parent_id) else {
            return Ok(None);
        };
        current = txn
            .find_live(kind, id)
            .await?
            .ok_or(StoreError::NotFound { kind, id })?;
    }
}

/// Touch the nearest aggregate strictly above `child`.
pub async fn touch_owner<T: EntityTxn>(
    txn: &mut T,
    child: &Node,
    principal: &Principal,
    at: DateTime<Utc>,
) -> Result<Option<Node>, StoreError> {
    let (Some(kind), Some(id)) = (child.kind.parent(), child.parent_id) else {
        return Ok(None);
    };
    let parent = txn
        .find_live(kind, id)
        .await?
        .ok_or(StoreError::NotFound { kind, id })?;
    propagate(txn, &parent, principal, at).await
}
