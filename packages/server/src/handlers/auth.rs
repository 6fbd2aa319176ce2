use axum::{Json, extract::State};
use sea_orm::*;
use tracing::instrument;

use crate::entity::user;
use crate::error::{AppError, ErrorBody, unique_violation};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::auth::{
    ChangeOwnPasswordRequest, EditProfileRequest, LoginRequest, LoginResponse,
};
use crate::models::user::UserResponse;
use crate::state::AppState;
use crate::utils::{hash, jwt};

#[utoipa::path(
    post,
    path = "/login",
    tag = "Auth",
    operation_id = "login",
    summary = "Log in as an administrator",
    description = "Checks the email and password against live users and returns a bearer token. Soft-deleted users cannot log in.",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Wrong email or password (INVALID_CREDENTIALS)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(email = %payload.email))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let user = user::live()
        .filter(user::Column::Email.eq(payload.email.trim()))
        .one(&state.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let is_valid = hash::verify_password(&payload.password, &user.password)
        .map_err(|e| AppError::Internal(format!("Password verify error: {}", e)))?;
    if !is_valid {
        return Err(AppError::InvalidCredentials);
    }

    let ttl = chrono::Duration::minutes(state.config.auth.token_ttl_minutes);
    let token = jwt::sign(user.id, &user.email, &state.config.auth.jwt_secret, ttl)
        .map_err(|e| AppError::Internal(format!("JWT sign error: {}", e)))?;

    Ok(Json(LoginResponse {
        access_token: token,
        token_type: "bearer",
        expires_in: ttl.num_seconds(),
    }))
}

#[utoipa::path(
    get,
    path = "/profile",
    tag = "Auth",
    operation_id = "getProfile",
    summary = "Current administrator's profile",
    responses(
        (status = 200, description = "Profile", body = UserResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn profile(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<UserResponse>, AppError> {
    let user = find_live_user(&state.db, auth_user.user_id).await?;
    Ok(Json(user.into()))
}

#[utoipa::path(
    put,
    path = "/edit-profile",
    tag = "Auth",
    operation_id = "editProfile",
    summary = "Edit the current administrator's profile",
    request_body = EditProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = UserResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 409, description = "Email used by another live user (EMAIL_TAKEN)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn edit_profile(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<EditProfileRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let txn = state.db.begin().await?;
    let user = find_live_user(&txn, auth_user.user_id).await?;
    ensure_email_free(&txn, payload.email.trim(), Some(user.id)).await?;

    let mut active: user::ActiveModel = user.into();
    active.name = Set(payload.name.trim().to_string());
    active.email = Set(payload.email.trim().to_string());
    active.phone_number = Set(payload.phone_number.trim().to_string());
    active.address = Set(payload.address.trim().to_string());
    active.updated_at = Set(chrono::Utc::now());
    let model = active
        .update(&txn)
        .await
        .map_err(|e| unique_violation(e, || AppError::EmailTaken))?;
    txn.commit().await?;

    Ok(Json(model.into()))
}

#[utoipa::path(
    post,
    path = "/change-password",
    tag = "Auth",
    operation_id = "changeOwnPassword",
    summary = "Change the current administrator's password",
    request_body = ChangeOwnPasswordRequest,
    responses(
        (status = 204, description = "Password changed"),
        (status = 400, description = "Validation error or wrong old password (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn change_password(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<ChangeOwnPasswordRequest>,
) -> Result<axum::http::StatusCode, AppError> {
    let user = find_live_user(&state.db, auth_user.user_id).await?;

    let old_ok = hash::verify_password(&payload.old_password, &user.password)
        .map_err(|e| AppError::Internal(format!("Password verify error: {}", e)))?;
    if !old_ok {
        return Err(AppError::Validation("Old password is incorrect".into()));
    }

    set_password(&state.db, user, &payload.new_password).await?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}

pub(crate) async fn find_live_user<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<user::Model, AppError> {
    user::live()
        .filter(user::Column::Id.eq(id))
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {id} not found")))
}

/// Emails are unique among live users only.
pub(crate) async fn ensure_email_free<C: ConnectionTrait>(
    db: &C,
    email: &str,
    except: Option<i32>,
) -> Result<(), AppError> {
    let mut query = user::live().filter(user::Column::Email.eq(email));
    if let Some(id) = except {
        query = query.filter(user::Column::Id.ne(id));
    }
    if query.count(db).await? > 0 {
        return Err(AppError::EmailTaken);
    }
    Ok(())
}

pub(crate) async fn set_password<C: ConnectionTrait>(
    db: &C,
    user: user::Model,
    password: &str,
) -> Result<user::Model, AppError> {
    let hash = hash::hash_password(password)
        .map_err(|e| AppError::Internal(format!("Password hash error: {}", e)))?;
    let mut active: user::ActiveModel = user.into();
    active.password = Set(hash);
    active.updated_at = Set(chrono::Utc::now());
    Ok(active.update(db).await?)
}
