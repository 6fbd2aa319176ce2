use serde::{Deserialize, Serialize};

use super::shared::{Validate, required, validate_email, validate_password};
use crate::error::AppError;

/// Request body for admin login.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    #[schema(example = "admin@example.com")]
    pub email: String,
    #[schema(example = "s3cure_P@ss!")]
    pub password: String,
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<(), AppError> {
        required("email", &self.email)?;
        if self.password.is_empty() {
            return Err(AppError::Validation("password is required".into()));
        }
        Ok(())
    }
}

/// Successful login response.
#[derive(Serialize, utoipa::ToSchema)]
pub struct LoginResponse {
    /// JWT bearer token.
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub access_token: String,
    #[schema(example = "bearer")]
    pub token_type: &'static str,
    /// Token lifetime in seconds.
    #[schema(example = 3600)]
    pub expires_in: i64,
}

/// Request body for editing the caller's own profile.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct EditProfileRequest {
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub address: String,
}

impl Validate for EditProfileRequest {
    fn validate(&self) -> Result<(), AppError> {
        required("name", &self.name)?;
        validate_email(&self.email)?;
        required("phone_number", &self.phone_number)?;
        required("address", &self.address)?;
        Ok(())
    }
}

/// Request body for changing the caller's own password.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct ChangeOwnPasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

impl Validate for ChangeOwnPasswordRequest {
    fn validate(&self) -> Result<(), AppError> {
        if self.old_password.is_empty() {
            return Err(AppError::Validation("old_password is required".into()));
        }
        validate_password(&self.new_password, None)
    }
}
