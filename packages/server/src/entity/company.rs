use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Primary key of the one company row.
pub const SINGLETON_ID: i32 = 1;

/// The single company profile row, always stored under [`SINGLETON_ID`].
/// Never deleted.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "company")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub name: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    #[sea_orm(column_type = "Text")]
    pub vision: String,
    #[sea_orm(column_type = "Text")]
    pub goal: String,
    pub logo_url: String,
    pub founded_date: Date,
    pub address: String,

    #[sea_orm(has_many)]
    pub social_media: HasMany<super::company_social_media::Entity>,

    #[sea_orm(has_many)]
    pub contacts: HasMany<super::company_contact::Entity>,

    pub creator_user_id: i32,
    pub updated_user_id: i32,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
