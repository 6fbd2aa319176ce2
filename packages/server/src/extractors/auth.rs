use axum::{extract::FromRequestParts, http::request::Parts};
use sea_orm::{ColumnTrait, QueryFilter};

use crate::cascade::Principal;
use crate::entity::user;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::jwt;

/// Authenticated admin extracted from the `Authorization: Bearer <token>` header.
///
/// The token's user must still be live; a soft-deleted account is rejected
/// even while its token has not expired.
pub struct AuthUser {
    pub user_id: i32,
    pub name: String,
    pub email: String,
}

impl AuthUser {
    /// The acting principal passed into mutating cascade operations.
    pub fn principal(&self) -> Principal {
        Principal {
            id: self.user_id,
            name: self.name.clone(),
        }
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::TokenMissing)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AppError::TokenInvalid)?;

        let claims =
            jwt::verify(token, &state.config.auth.jwt_secret).map_err(|_| AppError::TokenInvalid)?;

        let user = user::live()
            .filter(user::Column::Id.eq(claims.uid))
            .one(&state.db)
            .await?
            .ok_or(AppError::TokenInvalid)?;

        Ok(AuthUser {
            user_id: user.id,
            name: user.name,
            email: user.email,
        })
    }
}
