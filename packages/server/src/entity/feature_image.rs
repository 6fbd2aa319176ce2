use sea_orm::entity::prelude::*;
use sea_orm::{QueryFilter, Select};
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "feature_image")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub project_feature_id: i32,
    #[sea_orm(belongs_to, from = "project_feature_id", to = "id")]
    pub feature: HasOne<super::project_feature::Entity>,

    pub image_name: String,
    pub image_url: String,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
    pub deleted_at: Option<DateTimeUtc>,
}

impl ActiveModelBehavior for ActiveModel {}

pub fn live() -> Select<Entity> {
    Entity::find().filter(Column::DeletedAt.is_null())
}
