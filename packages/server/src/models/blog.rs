use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::shared::{Validate, name_of, required_max};
use crate::entity::{blog, blog_image};
use crate::error::AppError;

/// JSON body for editing a blog's text. Images are managed separately.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdateBlogRequest {
    #[schema(example = "Launching our new site")]
    pub title: String,
    pub content: String,
}

impl Validate for UpdateBlogRequest {
    fn validate(&self) -> Result<(), AppError> {
        validate_blog_fields(&self.title, &self.content)
    }
}

pub fn validate_blog_fields(title: &str, content: &str) -> Result<(), AppError> {
    required_max("title", title, 255)?;
    super::shared::required("content", content)?;
    Ok(())
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct BlogImageResponse {
    pub id: i32,
    #[schema(example = "cover.png")]
    pub image_name: String,
    #[schema(example = "http://127.0.0.1:8000/images/blogs/0190c1d2e3f4_cover.png")]
    pub image_url: String,
}

impl From<blog_image::Model> for BlogImageResponse {
    fn from(image: blog_image::Model) -> Self {
        Self {
            id: image.id,
            image_name: image.image_name,
            image_url: image.image_url,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct BlogResponse {
    pub id: i32,
    pub title: String,
    pub content: String,
    pub images: Vec<BlogImageResponse>,
    /// Name of the creating user.
    pub created_by: String,
    /// Name of the user who last changed the blog or one of its images.
    pub updated_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BlogResponse {
    pub fn build(
        blog: blog::Model,
        images: Vec<blog_image::Model>,
        names: &HashMap<i32, String>,
    ) -> Self {
        Self {
            id: blog.id,
            created_by: name_of(names, blog.creator_user_id),
            updated_by: name_of(names, blog.updated_user_id),
            title: blog.title,
            content: blog.content,
            images: images.into_iter().map(Into::into).collect(),
            created_at: blog.created_at,
            updated_at: blog.updated_at,
        }
    }
}
