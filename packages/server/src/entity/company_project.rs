use sea_orm::entity::prelude::*;
use sea_orm::{QueryFilter, Select};
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "company_project")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub name: String,

    pub project_type_id: i32,
    #[sea_orm(belongs_to, from = "project_type_id", to = "id")]
    pub project_type: HasOne<super::project_type::Entity>,

    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub demo_url: String,
    /// Public URL; its basename is the blob filename under `projects/`.
    pub thumbnail_url: String,

    #[sea_orm(has_many)]
    pub features: HasMany<super::project_feature::Entity>,

    pub creator_user_id: i32,
    pub updated_user_id: i32,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
    pub deleted_at: Option<DateTimeUtc>,
}

impl ActiveModelBehavior for ActiveModel {}

pub fn live() -> Select<Entity> {
    Entity::find().filter(Column::DeletedAt.is_null())
}
