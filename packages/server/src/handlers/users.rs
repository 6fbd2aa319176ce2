use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::*;
use tracing::instrument;

use super::auth::{ensure_email_free, find_live_user, set_password};
use crate::entity::user;
use crate::error::{AppError, ErrorBody, unique_violation};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::user::{
    RegisterUserRequest, SetPasswordRequest, UpdateUserRequest, UserResponse,
};
use crate::state::AppState;
use crate::utils::hash;

#[utoipa::path(
    get,
    path = "/users",
    tag = "Users",
    operation_id = "listUsers",
    summary = "List live users",
    responses(
        (status = 200, description = "Users ordered by id", body = Vec<UserResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user))]
pub async fn list_users(
    _auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    let users = user::live()
        .order_by_asc(user::Column::Id)
        .all(&state.db)
        .await?;
    Ok(Json(users.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/users",
    tag = "Users",
    operation_id = "registerUser",
    summary = "Register a new administrator",
    description = "Creates a user that can log in. The email must not be used by another live user.",
    request_body = RegisterUserRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 409, description = "Email already taken (EMAIL_TAKEN)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(by = auth_user.user_id, email = %payload.email))]
pub async fn register_user(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    let email = payload.email.trim().to_string();
    let password_hash = hash::hash_password(&payload.password)
        .map_err(|e| AppError::Internal(format!("Password hash error: {}", e)))?;

    let txn = state.db.begin().await?;
    ensure_email_free(&txn, &email, None).await?;

    let now = Utc::now();
    let new_user = user::ActiveModel {
        name: Set(payload.name.trim().to_string()),
        email: Set(email),
        password: Set(password_hash),
        phone_number: Set(payload.phone_number.trim().to_string()),
        address: Set(payload.address.trim().to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        deleted_at: Set(None),
        ..Default::default()
    };
    let model = new_user
        .insert(&txn)
        .await
        .map_err(|e| unique_violation(e, || AppError::EmailTaken))?;
    txn.commit().await?;

    Ok((StatusCode::CREATED, Json(model.into())))
}

#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "Users",
    operation_id = "getUser",
    summary = "Get a user",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 200, description = "User", body = UserResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user), fields(user_id = id))]
pub async fn get_user(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<UserResponse>, AppError> {
    Ok(Json(find_live_user(&state.db, id).await?.into()))
}

#[utoipa::path(
    put,
    path = "/users/{id}",
    tag = "Users",
    operation_id = "updateUser",
    summary = "Update a user's profile fields",
    params(("id" = i32, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Email already taken (EMAIL_TAKEN)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user, payload), fields(user_id = id))]
pub async fn update_user(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateUserRequest>,
) -> Result<Json<UserResponse>, AppError> {
    let txn = state.db.begin().await?;
    let existing = find_live_user(&txn, id).await?;
    ensure_email_free(&txn, payload.email.trim(), Some(id)).await?;

    let mut active: user::ActiveModel = existing.into();
    active.name = Set(payload.name.trim().to_string());
    active.email = Set(payload.email.trim().to_string());
    active.phone_number = Set(payload.phone_number.trim().to_string());
    active.address = Set(payload.address.trim().to_string());
    active.updated_at = Set(Utc::now());
    let model = active
        .update(&txn)
        .await
        .map_err(|e| unique_violation(e, || AppError::EmailTaken))?;
    txn.commit().await?;

    Ok(Json(model.into()))
}

#[utoipa::path(
    post,
    path = "/users/{id}/change-password",
    tag = "Users",
    operation_id = "setUserPassword",
    summary = "Set another user's password",
    params(("id" = i32, Path, description = "User ID")),
    request_body = SetPasswordRequest,
    responses(
        (status = 204, description = "Password changed"),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user, payload), fields(user_id = id))]
pub async fn set_user_password(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<SetPasswordRequest>,
) -> Result<StatusCode, AppError> {
    let user = find_live_user(&state.db, id).await?;
    set_password(&state.db, user, &payload.password).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "Users",
    operation_id = "deleteUser",
    summary = "Soft-delete a user",
    description = "The user can no longer log in and existing tokens stop working. Content they authored keeps their name.",
    params(("id" = i32, Path, description = "User ID")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(by = auth_user.user_id, user_id = id))]
pub async fn delete_user(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    let now = Utc::now();
    let result = user::Entity::update_many()
        .col_expr(user::Column::DeletedAt, Expr::value(Some(now)))
        .col_expr(user::Column::UpdatedAt, Expr::value(now))
        .filter(user::Column::Id.eq(id))
        .filter(user::Column::DeletedAt.is_null())
        .exec(&state.db)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound(format!("User {id} not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}
