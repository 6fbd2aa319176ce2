use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::shared::{Validate, required, validate_email, validate_password};
use crate::entity::user;
use crate::error::AppError;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct RegisterUserRequest {
    #[schema(example = "Jane Admin")]
    pub name: String,
    #[schema(example = "jane@example.com")]
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
    #[schema(example = "+95 9 123 456 789")]
    pub phone_number: String,
    pub address: String,
}

impl Validate for RegisterUserRequest {
    fn validate(&self) -> Result<(), AppError> {
        required("name", &self.name)?;
        validate_email(&self.email)?;
        validate_password(&self.password, Some(&self.password_confirmation))?;
        required("phone_number", &self.phone_number)?;
        required("address", &self.address)?;
        Ok(())
    }
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdateUserRequest {
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub address: String,
}

impl Validate for UpdateUserRequest {
    fn validate(&self) -> Result<(), AppError> {
        required("name", &self.name)?;
        validate_email(&self.email)?;
        required("phone_number", &self.phone_number)?;
        required("address", &self.address)?;
        Ok(())
    }
}

/// Administrative password reset for another user.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct SetPasswordRequest {
    pub password: String,
    pub password_confirmation: String,
}

impl Validate for SetPasswordRequest {
    fn validate(&self) -> Result<(), AppError> {
        validate_password(&self.password, Some(&self.password_confirmation))
    }
}

/// A user as shown to admins. Never includes the password hash.
#[derive(Serialize, utoipa::ToSchema)]
pub struct UserResponse {
    #[schema(example = 1)]
    pub id: i32,
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub address: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<user::Model> for UserResponse {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            phone_number: user.phone_number,
            address: user.address,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}
