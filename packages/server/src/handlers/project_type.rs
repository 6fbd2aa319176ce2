use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use sea_orm::*;
use tracing::instrument;

use super::not_found;
use crate::cascade::EntityKind;
use crate::entity::project_type;
use crate::error::{AppError, ErrorBody, unique_violation};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::project_type::{ProjectTypeRequest, ProjectTypeResponse};
use crate::models::shared::user_names;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/project-types",
    tag = "Project Types",
    operation_id = "listProjectTypes",
    summary = "List live project types",
    responses(
        (status = 200, description = "Project types", body = Vec<ProjectTypeResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user))]
pub async fn list_project_types(
    _auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<ProjectTypeResponse>>, AppError> {
    let types = project_type::live()
        .order_by_asc(project_type::Column::Id)
        .all(&state.db)
        .await?;
    let names = user_names(
        &state.db,
        types.iter().flat_map(|t| [t.creator_user_id, t.updated_user_id]),
    )
    .await?;

    Ok(Json(
        types
            .into_iter()
            .map(|t| ProjectTypeResponse::build(t, &names))
            .collect(),
    ))
}

#[utoipa::path(
    get,
    path = "/project-types/{id}",
    tag = "Project Types",
    operation_id = "getProjectType",
    summary = "Get a project type",
    params(("id" = i32, Path, description = "Project type ID")),
    responses(
        (status = 200, description = "Project type", body = ProjectTypeResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Project type not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user), fields(project_type_id = id))]
pub async fn get_project_type(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ProjectTypeResponse>, AppError> {
    let model = find_live(&state.db, id).await?;
    let names = user_names(&state.db, [model.creator_user_id, model.updated_user_id]).await?;
    Ok(Json(ProjectTypeResponse::build(model, &names)))
}

#[utoipa::path(
    post,
    path = "/project-types",
    tag = "Project Types",
    operation_id = "createProjectType",
    summary = "Create a project type",
    description = "`type_name` must be unique among live project types.",
    request_body = ProjectTypeRequest,
    responses(
        (status = 201, description = "Project type created", body = ProjectTypeResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id, type_name = %payload.type_name))]
pub async fn create_project_type(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<ProjectTypeRequest>,
) -> Result<(StatusCode, Json<ProjectTypeResponse>), AppError> {
    let type_name = payload.type_name.trim().to_string();
    let txn = state.db.begin().await?;
    ensure_name_free(&txn, &type_name, None).await?;
    let taken = name_taken(&type_name);

    let now = Utc::now();
    let model = project_type::ActiveModel {
        type_name: Set(type_name),
        description: Set(payload.description.trim().to_string()),
        creator_user_id: Set(auth_user.user_id),
        updated_user_id: Set(auth_user.user_id),
        created_at: Set(now),
        updated_at: Set(now),
        deleted_at: Set(None),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(|e| unique_violation(e, || taken))?;
    txn.commit().await?;

    let names = user_names(&state.db, [auth_user.user_id]).await?;
    Ok((
        StatusCode::CREATED,
        Json(ProjectTypeResponse::build(model, &names)),
    ))
}

#[utoipa::path(
    put,
    path = "/project-types/{id}",
    tag = "Project Types",
    operation_id = "updateProjectType",
    summary = "Update a project type",
    params(("id" = i32, Path, description = "Project type ID")),
    request_body = ProjectTypeRequest,
    responses(
        (status = 200, description = "Project type updated", body = ProjectTypeResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Project type not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(project_type_id = id, user_id = auth_user.user_id))]
pub async fn update_project_type(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<ProjectTypeRequest>,
) -> Result<Json<ProjectTypeResponse>, AppError> {
    let type_name = payload.type_name.trim().to_string();
    let txn = state.db.begin().await?;
    let existing = find_live(&txn, id).await?;
    ensure_name_free(&txn, &type_name, Some(id)).await?;
    let taken = name_taken(&type_name);

    let mut active: project_type::ActiveModel = existing.into();
    active.type_name = Set(type_name);
    active.description = Set(payload.description.trim().to_string());
    active.updated_user_id = Set(auth_user.user_id);
    active.updated_at = Set(Utc::now());
    let model = active
        .update(&txn)
        .await
        .map_err(|e| unique_violation(e, || taken))?;
    txn.commit().await?;

    let names = user_names(&state.db, [model.creator_user_id, model.updated_user_id]).await?;
    Ok(Json(ProjectTypeResponse::build(model, &names)))
}

#[utoipa::path(
    delete,
    path = "/project-types/{id}",
    tag = "Project Types",
    operation_id = "deleteProjectType",
    summary = "Delete a project type with all of its projects",
    description = "Cascades to every live project of this type, their features and feature images. Feature image files are removed.",
    params(("id" = i32, Path, description = "Project type ID")),
    responses(
        (status = 204, description = "Project type deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Project type not found (NOT_FOUND)", body = ErrorBody),
        (status = 503, description = "Concurrent modification, retry (RETRYABLE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(project_type_id = id, user_id = auth_user.user_id))]
pub async fn delete_project_type(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    state
        .coordinator()
        .delete_subtree(EntityKind::ProjectType, id, &auth_user.principal())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn find_live<C: ConnectionTrait>(db: &C, id: i32) -> Result<project_type::Model, AppError> {
    project_type::live()
        .filter(project_type::Column::Id.eq(id))
        .one(db)
        .await?
        .ok_or_else(|| not_found(EntityKind::ProjectType, id))
}

async fn ensure_name_free<C: ConnectionTrait>(
    db: &C,
    type_name: &str,
    except: Option<i32>,
) -> Result<(), AppError> {
    let mut query = project_type::live().filter(project_type::Column::TypeName.eq(type_name));
    if let Some(id) = except {
        query = query.filter(project_type::Column::Id.ne(id));
    }
    if query.count(db).await? > 0 {
        return Err(name_taken(type_name));
    }
    Ok(())
}

fn name_taken(type_name: &str) -> AppError {
    AppError::Validation(format!("type_name '{type_name}' is already taken"))
}
