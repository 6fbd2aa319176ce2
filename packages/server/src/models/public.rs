//! Read-only shapes served to site visitors.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use super::blog::BlogImageResponse;

#[derive(Serialize, utoipa::ToSchema)]
pub struct PublicSocialMedia {
    pub platform_name: String,
    pub page_url: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct PublicContact {
    pub department: String,
    pub phone_number: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct CompanyDetails {
    pub name: String,
    pub about_us: String,
    pub vision: String,
    pub goal: String,
    pub logo_url: String,
    #[schema(value_type = String, example = "2019-04-01")]
    pub founded_date: NaiveDate,
    pub address: String,
    pub social_media: Vec<PublicSocialMedia>,
    pub contacts: Vec<PublicContact>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct PublicBlogListItem {
    pub id: i32,
    pub title: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    /// URL of the blog's first live image.
    pub thumbnail_image: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct PublicBlog {
    pub id: i32,
    pub title: String,
    pub content: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub images: Vec<BlogImageResponse>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct PublicProjectType {
    pub id: i32,
    pub type_name: String,
    pub description: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct PublicProjectListItem {
    pub id: i32,
    pub name: String,
    /// Type name.
    pub project_type: String,
    pub description: String,
    pub thumbnail_url: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct PublicFeatureImage {
    pub image_name: String,
    pub image_url: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct HighlightFeature {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub images: Vec<PublicFeatureImage>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct PublicProject {
    pub id: i32,
    pub name: String,
    pub project_type: String,
    pub description: String,
    pub demo_url: String,
    pub thumbnail_url: String,
    pub highlight_features: Vec<HighlightFeature>,
}
