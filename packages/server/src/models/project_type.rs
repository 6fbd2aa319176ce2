use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::shared::{Validate, name_of, required, required_max};
use crate::entity::project_type;
use crate::error::AppError;

/// Body for both creating and editing a project type.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct ProjectTypeRequest {
    /// Unique among live project types.
    #[schema(example = "Web")]
    pub type_name: String,
    #[schema(example = "Websites and web applications")]
    pub description: String,
}

impl Validate for ProjectTypeRequest {
    fn validate(&self) -> Result<(), AppError> {
        required_max("type_name", &self.type_name, 255)?;
        required("description", &self.description)?;
        Ok(())
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ProjectTypeResponse {
    pub id: i32,
    pub type_name: String,
    pub description: String,
    pub created_by: String,
    pub updated_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProjectTypeResponse {
    pub fn build(model: project_type::Model, names: &HashMap<i32, String>) -> Self {
        Self {
            id: model.id,
            created_by: name_of(names, model.creator_user_id),
            updated_by: name_of(names, model.updated_user_id),
            type_name: model.type_name,
            description: model.description,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
