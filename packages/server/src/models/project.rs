use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::shared::{Validate, name_of, required, required_max, validate_url};
use crate::entity::{company_project, feature_image, project_feature, project_type};
use crate::error::AppError;

/// JSON body for editing a project's details (everything but the thumbnail).
#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdateProjectRequest {
    pub name: String,
    pub project_type_id: i32,
    pub description: String,
    #[schema(example = "https://demo.example.com")]
    pub demo_url: String,
}

impl Validate for UpdateProjectRequest {
    fn validate(&self) -> Result<(), AppError> {
        validate_project_fields(&self.name, &self.description, &self.demo_url)
    }
}

pub fn validate_project_fields(name: &str, description: &str, demo_url: &str) -> Result<(), AppError> {
    required_max("name", name, 255)?;
    required("description", description)?;
    validate_url("demo_url", demo_url)?;
    Ok(())
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdateFeatureRequest {
    #[schema(example = "Hero section")]
    pub title: String,
    pub description: String,
}

impl Validate for UpdateFeatureRequest {
    fn validate(&self) -> Result<(), AppError> {
        validate_feature_fields(&self.title, &self.description)
    }
}

pub fn validate_feature_fields(title: &str, description: &str) -> Result<(), AppError> {
    required_max("title", title, 255)?;
    required("description", description)?;
    Ok(())
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct FeatureImageResponse {
    pub id: i32,
    pub image_name: String,
    pub image_url: String,
}

impl From<feature_image::Model> for FeatureImageResponse {
    fn from(image: feature_image::Model) -> Self {
        Self {
            id: image.id,
            image_name: image.image_name,
            image_url: image.image_url,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct FeatureResponse {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub images: Vec<FeatureImageResponse>,
}

impl FeatureResponse {
    pub fn build(feature: project_feature::Model, images: Vec<feature_image::Model>) -> Self {
        Self {
            id: feature.id,
            title: feature.title,
            description: feature.description,
            images: images.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ProjectTypeSummary {
    pub id: i32,
    pub type_name: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ProjectResponse {
    pub id: i32,
    pub name: String,
    pub project_type: ProjectTypeSummary,
    pub description: String,
    pub demo_url: String,
    pub thumbnail_url: String,
    pub features: Vec<FeatureResponse>,
    pub created_by: String,
    pub updated_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProjectResponse {
    pub fn build(
        project: company_project::Model,
        project_type: &project_type::Model,
        features: Vec<FeatureResponse>,
        names: &HashMap<i32, String>,
    ) -> Self {
        Self {
            id: project.id,
            created_by: name_of(names, project.creator_user_id),
            updated_by: name_of(names, project.updated_user_id),
            name: project.name,
            project_type: ProjectTypeSummary {
                id: project_type.id,
                type_name: project_type.type_name.clone(),
            },
            description: project.description,
            demo_url: project.demo_url,
            thumbnail_url: project.thumbnail_url,
            features,
            created_at: project.created_at,
            updated_at: project.updated_at,
        }
    }
}
