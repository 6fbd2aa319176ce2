use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    QueryFilter, QuerySelect, Select, TransactionTrait,
};

use super::store::{EntityStore, EntityTxn, StoreError};
use super::{EntityKind, Node};
use crate::entity::{
    blog, blog_image, company, company_contact, company_project, company_social_media,
    feature_image, project_feature, project_type,
};

/// [`EntityStore`] backed by the application database.
#[derive(Clone)]
pub struct SeaOrmStore {
    db: DatabaseConnection,
}

impl SeaOrmStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

/// An open database transaction. Handlers that insert or update rows before
/// propagating a touch run their statements through [`SeaOrmTxn::conn`].
pub struct SeaOrmTxn {
    txn: DatabaseTransaction,
}

impl SeaOrmTxn {
    pub fn conn(&self) -> &DatabaseTransaction {
        &self.txn
    }
}

#[async_trait]
impl EntityStore for SeaOrmStore {
    type Txn = SeaOrmTxn;

    async fn find_live(&self, kind: EntityKind, id: i32) -> Result<Option<Node>, StoreError> {
        Ok(load(&self.db, kind, id, false).await?)
    }

    async fn begin(&self) -> Result<SeaOrmTxn, StoreError> {
        let txn = self.db.begin().await?;
        Ok(SeaOrmTxn { txn })
    }
}

#[async_trait]
impl EntityTxn for SeaOrmTxn {
    async fn find_live(&mut self, kind: EntityKind, id: i32) -> Result<Option<Node>, StoreError> {
        Ok(load(&self.txn, kind, id, true).await?)
    }

    async fn live_children(
        &mut self,
        parent: &Node,
        child: EntityKind,
    ) -> Result<Vec<Node>, StoreError> {
        let conn = &self.txn;
        let pid = Some(parent.id);
        let nodes = match child {
            EntityKind::CompanyProject => locked(
                company_project::live()
                    .filter(company_project::Column::ProjectTypeId.eq(parent.id)),
            )
            .all(conn)
            .await?
            .into_iter()
            .map(|m| Node::new(child, m.id, pid).with_image_url(m.thumbnail_url))
            .collect(),
            EntityKind::ProjectFeature => locked(
                project_feature::live().filter(project_feature::Column::ProjectId.eq(parent.id)),
            )
            .all(conn)
            .await?
            .into_iter()
            .map(|m| Node::new(child, m.id, pid))
            .collect(),
            EntityKind::FeatureImage => locked(
                feature_image::live()
                    .filter(feature_image::Column::ProjectFeatureId.eq(parent.id)),
            )
            .all(conn)
            .await?
            .into_iter()
            .map(|m| Node::new(child, m.id, pid).with_image_url(m.image_url))
            .collect(),
            EntityKind::BlogImage => {
                locked(blog_image::live().filter(blog_image::Column::BlogId.eq(parent.id)))
                    .all(conn)
                    .await?
                    .into_iter()
                    .map(|m| Node::new(child, m.id, pid).with_image_url(m.image_url))
                    .collect()
            }
            EntityKind::CompanySocialMedia => locked(
                company_social_media::live()
                    .filter(company_social_media::Column::CompanyId.eq(parent.id)),
            )
            .all(conn)
            .await?
            .into_iter()
            .map(|m| Node::new(child, m.id, pid))
            .collect(),
            EntityKind::CompanyContact => locked(
                company_contact::live().filter(company_contact::Column::CompanyId.eq(parent.id)),
            )
            .all(conn)
            .await?
            .into_iter()
            .map(|m| Node::new(child, m.id, pid))
            .collect(),
            EntityKind::ProjectType | EntityKind::Blog | EntityKind::Company => Vec::new(),
        };
        Ok(nodes)
    }

    async fn soft_delete(&mut self, node: &Node, at: DateTime<Utc>) -> Result<(), StoreError> {
        let conn = &self.txn;
        let id = node.id;
        let affected = match node.kind {
            EntityKind::ProjectType => {
                use project_type::{Column, Entity};
                mark_deleted::<Entity, _>(
                    conn,
                    Column::Id,
                    Column::DeletedAt,
                    Column::UpdatedAt,
                    id,
                    at,
                )
                .await?
            }
            EntityKind::CompanyProject => {
                use company_project::{Column, Entity};
                mark_deleted::<Entity, _>(
                    conn,
                    Column::Id,
                    Column::DeletedAt,
                    Column::UpdatedAt,
                    id,
                    at,
                )
                .await?
            }
            EntityKind::ProjectFeature => {
                use project_feature::{Column, Entity};
                mark_deleted::<Entity, _>(
                    conn,
                    Column::Id,
                    Column::DeletedAt,
                    Column::UpdatedAt,
                    id,
                    at,
                )
                .await?
            }
            EntityKind::FeatureImage => {
                use feature_image::{Column, Entity};
                mark_deleted::<Entity, _>(
                    conn,
                    Column::Id,
                    Column::DeletedAt,
                    Column::UpdatedAt,
                    id,
                    at,
                )
                .await?
            }
            EntityKind::Blog => {
                use blog::{Column, Entity};
                mark_deleted::<Entity, _>(
                    conn,
                    Column::Id,
                    Column::DeletedAt,
                    Column::UpdatedAt,
                    id,
                    at,
                )
                .await?
            }
            EntityKind::BlogImage => {
                use blog_image::{Column, Entity};
                mark_deleted::<Entity, _>(
                    conn,
                    Column::Id,
                    Column::DeletedAt,
                    Column::UpdatedAt,
                    id,
                    at,
                )
                .await?
            }
            EntityKind::CompanySocialMedia => {
                use company_social_media::{Column, Entity};
                mark_deleted::<Entity, _>(
                    conn,
                    Column::Id,
                    Column::DeletedAt,
                    Column::UpdatedAt,
                    id,
                    at,
                )
                .await?
            }
            EntityKind::CompanyContact => {
                use company_contact::{Column, Entity};
                mark_deleted::<Entity, _>(
                    conn,
                    Column::Id,
                    Column::DeletedAt,
                    Column::UpdatedAt,
                    id,
                    at,
                )
                .await?
            }
            EntityKind::Company => {
                return Err(StoreError::Unexpected(
                    "company rows cannot be deleted".into(),
                ));
            }
        };

        if affected == 0 {
            return Err(StoreError::NotFound {
                kind: node.kind,
                id,
            });
        }
        tracing::debug!(kind = %node.kind, id, "Soft-deleted row");
        Ok(())
    }

    async fn touch(
        &mut self,
        kind: EntityKind,
        id: i32,
        principal_id: i32,
        at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let conn = &self.txn;
        let result = match kind {
            EntityKind::Blog => {
                blog::Entity::update_many()
                    .col_expr(blog::Column::UpdatedUserId, Expr::value(principal_id))
                    .col_expr(blog::Column::UpdatedAt, Expr::value(at))
                    .filter(blog::Column::Id.eq(id))
                    .filter(blog::Column::DeletedAt.is_null())
                    .exec(conn)
                    .await?
            }
            EntityKind::CompanyProject => {
                company_project::Entity::update_many()
                    .col_expr(company_project::Column::UpdatedUserId, Expr::value(principal_id))
                    .col_expr(company_project::Column::UpdatedAt, Expr::value(at))
                    .filter(company_project::Column::Id.eq(id))
                    .filter(company_project::Column::DeletedAt.is_null())
                    .exec(conn)
                    .await?
            }
            EntityKind::Company => {
                company::Entity::update_many()
                    .col_expr(company::Column::UpdatedUserId, Expr::value(principal_id))
                    .col_expr(company::Column::UpdatedAt, Expr::value(at))
                    .filter(company::Column::Id.eq(id))
                    .exec(conn)
                    .await?
            }
            other => {
                return Err(StoreError::Unexpected(format!(
                    "{other} does not carry audit fields"
                )));
            }
        };

        if result.rows_affected == 0 {
            return Err(StoreError::NotFound { kind, id });
        }
        Ok(())
    }

    async fn set_asset_url(
        &mut self,
        kind: EntityKind,
        id: i32,
        url: &str,
    ) -> Result<(), StoreError> {
        let conn = &self.txn;
        let result = match kind {
            EntityKind::CompanyProject => {
                company_project::Entity::update_many()
                    .col_expr(company_project::Column::ThumbnailUrl, Expr::value(url))
                    .filter(company_project::Column::Id.eq(id))
                    .filter(company_project::Column::DeletedAt.is_null())
                    .exec(conn)
                    .await?
            }
            EntityKind::Company => {
                company::Entity::update_many()
                    .col_expr(company::Column::LogoUrl, Expr::value(url))
                    .filter(company::Column::Id.eq(id))
                    .exec(conn)
                    .await?
            }
            other => {
                return Err(StoreError::Unexpected(format!("{other} has no asset url")));
            }
        };

        if result.rows_affected == 0 {
            return Err(StoreError::NotFound { kind, id });
        }
        Ok(())
    }

    async fn commit(self) -> Result<(), StoreError> {
        Ok(self.txn.commit().await?)
    }

    async fn rollback(self) -> Result<(), StoreError> {
        Ok(self.txn.rollback().await?)
    }
}

fn locked<E: EntityTrait>(select: Select<E>) -> Select<E> {
    select.lock(LockType::Update)
}

async fn first<E, C>(conn: &C, select: Select<E>, lock: bool) -> Result<Option<E::Model>, DbErr>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    let select = if lock { locked(select) } else { select };
    select.one(conn).await
}

async fn mark_deleted<E, C>(
    conn: &C,
    id_col: E::Column,
    deleted_col: E::Column,
    updated_col: E::Column,
    id: i32,
    at: DateTime<Utc>,
) -> Result<u64, DbErr>
where
    E: EntityTrait,
    C: ConnectionTrait,
{
    let result = E::update_many()
        .col_expr(deleted_col, Expr::value(at))
        .col_expr(updated_col, Expr::value(at))
        .filter(id_col.eq(id))
        .filter(deleted_col.is_null())
        .exec(conn)
        .await?;
    Ok(result.rows_affected)
}

/// Load one live row as a [`Node`], optionally taking a row lock.
async fn load<C: ConnectionTrait>(
    conn: &C,
    kind: EntityKind,
    id: i32,
    lock: bool,
) -> Result<Option<Node>, DbErr> {
    let node = match kind {
        EntityKind::ProjectType => {
            first(conn, project_type::live().filter(project_type::Column::Id.eq(id)), lock)
                .await?
                .map(|m| Node::new(kind, m.id, None))
        }
        EntityKind::CompanyProject => first(
            conn,
            company_project::live().filter(company_project::Column::Id.eq(id)),
            lock,
        )
        .await?
        .map(|m| Node::new(kind, m.id, Some(m.project_type_id)).with_image_url(m.thumbnail_url)),
        EntityKind::ProjectFeature => first(
            conn,
            project_feature::live().filter(project_feature::Column::Id.eq(id)),
            lock,
        )
        .await?
        .map(|m| Node::new(kind, m.id, Some(m.project_id))),
        EntityKind::FeatureImage => first(
            conn,
            feature_image::live().filter(feature_image::Column::Id.eq(id)),
            lock,
        )
        .await?
        .map(|m| Node::new(kind, m.id, Some(m.project_feature_id)).with_image_url(m.image_url)),
        EntityKind::Blog => first(conn, blog::live().filter(blog::Column::Id.eq(id)), lock)
            .await?
            .map(|m| Node::new(kind, m.id, None)),
        EntityKind::BlogImage => first(
            conn,
            blog_image::live().filter(blog_image::Column::Id.eq(id)),
            lock,
        )
        .await?
        .map(|m| Node::new(kind, m.id, Some(m.blog_id)).with_image_url(m.image_url)),
        EntityKind::Company => first(conn, company::Entity::find_by_id(id), lock)
            .await?
            .map(|m| Node::new(kind, m.id, None).with_image_url(m.logo_url)),
        EntityKind::CompanySocialMedia => first(
            conn,
            company_social_media::live().filter(company_social_media::Column::Id.eq(id)),
            lock,
        )
        .await?
        .map(|m| Node::new(kind, m.id, Some(m.company_id))),
        EntityKind::CompanyContact => first(
            conn,
            company_contact::live().filter(company_contact::Column::Id.eq(id)),
            lock,
        )
        .await?
        .map(|m| Node::new(kind, m.id, Some(m.company_id))),
    };
    Ok(node)
}
