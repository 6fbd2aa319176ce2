use std::collections::HashMap;

use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
};
use chrono::Utc;
use sea_orm::*;
use tracing::instrument;

use super::{ensure_live, lock_live, not_found};
use crate::cascade::{self, EntityKind, EntityStore, EntityTxn};
use crate::entity::{company_project, feature_image, project_feature, project_type};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::project::{
    FeatureResponse, ProjectResponse, UpdateFeatureRequest, UpdateProjectRequest,
    validate_feature_fields, validate_project_fields,
};
use crate::models::shared::user_names;
use crate::state::AppState;
use crate::utils::upload::{self, MultipartForm, StoredImage};

const PROJECT_DIR: &str = "projects";

#[utoipa::path(
    get,
    path = "/projects",
    tag = "Projects",
    operation_id = "listProjects",
    summary = "List live projects",
    description = "Each project carries its live features and their live images.",
    responses(
        (status = 200, description = "Projects", body = Vec<ProjectResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user))]
pub async fn list_projects(
    _auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<ProjectResponse>>, AppError> {
    let projects = company_project::live()
        .order_by_desc(company_project::Column::CreatedAt)
        .order_by_desc(company_project::Column::Id)
        .all(&state.db)
        .await?;
    Ok(Json(build_projects(&state.db, projects).await?))
}

#[utoipa::path(
    get,
    path = "/projects/{id}",
    tag = "Projects",
    operation_id = "getProject",
    summary = "Get a project with its features",
    params(("id" = i32, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Project", body = ProjectResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Project not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user), fields(project_id = id))]
pub async fn get_project(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ProjectResponse>, AppError> {
    Ok(Json(load_project(&state.db, id).await?))
}

#[utoipa::path(
    post,
    path = "/projects",
    tag = "Projects",
    operation_id = "createProject",
    summary = "Create a project",
    description = "Multipart fields `name`, `project_type_id`, `description`, `demo_url` and a single `thumbnail` image. The project type must be live.",
    request_body(content_type = "multipart/form-data", description = "name, project_type_id, description, demo_url, thumbnail"),
    responses(
        (status = 201, description = "Project created", body = ProjectResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Project type not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(user_id = auth_user.user_id))]
pub async fn create_project(
    auth_user: AuthUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ProjectResponse>), AppError> {
    let mut form = MultipartForm::parse(multipart).await?;
    let name = form.text("name")?;
    let project_type_id = parse_id("project_type_id", &form.text("project_type_id")?)?;
    let description = form.text("description")?;
    let demo_url = form.text("demo_url")?;
    validate_project_fields(&name, &description, &demo_url)?;
    let thumbnail = form.take_file("thumbnail")?;
    ensure_live(&state, EntityKind::ProjectType, project_type_id).await?;

    let stored = upload::store_image(
        state.blobs.as_ref(),
        &state.config.storage,
        PROJECT_DIR,
        &thumbnail,
    )
    .await?;

    let now = Utc::now();
    let inserted = async {
        let txn = state.db.begin().await?;
        // The type may have been deleted since the pre-check.
        live_type_for_update(project_type_id)
            .one(&txn)
            .await?
            .ok_or_else(|| not_found(EntityKind::ProjectType, project_type_id))?;

        let model = company_project::ActiveModel {
            name: Set(name),
            project_type_id: Set(project_type_id),
            description: Set(description),
            demo_url: Set(demo_url),
            thumbnail_url: Set(stored.url.clone()),
            creator_user_id: Set(auth_user.user_id),
            updated_user_id: Set(auth_user.user_id),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
            ..Default::default()
        }
        .insert(&txn)
        .await?;
        txn.commit().await?;
        Ok::<_, AppError>(model.id)
    }
    .await;

    let id = match inserted {
        Ok(id) => id,
        Err(e) => {
            upload::discard(state.blobs.as_ref(), std::slice::from_ref(&stored)).await;
            return Err(e);
        }
    };

    Ok((StatusCode::CREATED, Json(load_project(&state.db, id).await?)))
}

#[utoipa::path(
    put,
    path = "/projects/{id}/details",
    tag = "Projects",
    operation_id = "updateProjectDetails",
    summary = "Update a project's fields",
    description = "Everything except the thumbnail, which has its own endpoint.",
    params(("id" = i32, Path, description = "Project ID")),
    request_body = UpdateProjectRequest,
    responses(
        (status = 200, description = "Project updated", body = ProjectResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Project or project type not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(project_id = id, user_id = auth_user.user_id))]
pub async fn update_project(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateProjectRequest>,
) -> Result<Json<ProjectResponse>, AppError> {
    // Type before project, the same order a type deletion locks them in.
    let txn = state.db.begin().await?;
    live_type_for_update(payload.project_type_id)
        .one(&txn)
        .await?
        .ok_or_else(|| not_found(EntityKind::ProjectType, payload.project_type_id))?;
    let existing = live_project_for_update(id)
        .one(&txn)
        .await?
        .ok_or_else(|| not_found(EntityKind::CompanyProject, id))?;

    let mut active: company_project::ActiveModel = existing.into();
    active.name = Set(payload.name.trim().to_string());
    active.project_type_id = Set(payload.project_type_id);
    active.description = Set(payload.description.trim().to_string());
    active.demo_url = Set(payload.demo_url.trim().to_string());
    active.updated_user_id = Set(auth_user.user_id);
    active.updated_at = Set(Utc::now());
    active.update(&txn).await?;
    txn.commit().await?;

    Ok(Json(load_project(&state.db, id).await?))
}

#[utoipa::path(
    post,
    path = "/projects/{id}/new-thumbnail",
    tag = "Projects",
    operation_id = "replaceProjectThumbnail",
    summary = "Replace a project's thumbnail",
    description = "Stores the new image, removes the previous file and marks the project as updated.",
    params(("id" = i32, Path, description = "Project ID")),
    request_body(content_type = "multipart/form-data", description = "thumbnail"),
    responses(
        (status = 200, description = "Thumbnail replaced", body = ProjectResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Project not found (NOT_FOUND)", body = ErrorBody),
        (status = 503, description = "Concurrent modification, retry (RETRYABLE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(project_id = id, user_id = auth_user.user_id))]
pub async fn replace_thumbnail(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    multipart: Multipart,
) -> Result<Json<ProjectResponse>, AppError> {
    let mut form = MultipartForm::parse(multipart).await?;
    let thumbnail = form.take_file("thumbnail")?;
    ensure_live(&state, EntityKind::CompanyProject, id).await?;

    let stored = upload::store_image(
        state.blobs.as_ref(),
        &state.config.storage,
        PROJECT_DIR,
        &thumbnail,
    )
    .await?;

    if let Err(e) = state
        .coordinator()
        .replace_asset(EntityKind::CompanyProject, id, &stored.url, &auth_user.principal())
        .await
    {
        upload::discard(state.blobs.as_ref(), std::slice::from_ref(&stored)).await;
        return Err(e.into());
    }

    Ok(Json(load_project(&state.db, id).await?))
}

#[utoipa::path(
    delete,
    path = "/projects/{id}",
    tag = "Projects",
    operation_id = "deleteProject",
    summary = "Delete a project with its features",
    description = "Soft-deletes the project, its features and their images, and removes the feature image files.",
    params(("id" = i32, Path, description = "Project ID")),
    responses(
        (status = 204, description = "Project deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Project not found (NOT_FOUND)", body = ErrorBody),
        (status = 503, description = "Concurrent modification, retry (RETRYABLE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(project_id = id, user_id = auth_user.user_id))]
pub async fn delete_project(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    state
        .coordinator()
        .delete_subtree(EntityKind::CompanyProject, id, &auth_user.principal())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/projects/{id}/features",
    tag = "Projects",
    operation_id = "addProjectFeature",
    summary = "Add a highlight feature to a project",
    params(("id" = i32, Path, description = "Project ID")),
    request_body(content_type = "multipart/form-data", description = "title, description, images[]"),
    responses(
        (status = 201, description = "Feature created", body = FeatureResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Project not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(project_id = id, user_id = auth_user.user_id))]
pub async fn add_feature(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<FeatureResponse>), AppError> {
    let mut form = MultipartForm::parse(multipart).await?;
    let title = form.text("title")?;
    let description = form.text("description")?;
    validate_feature_fields(&title, &description)?;
    let parts = form.take_files("images")?;
    ensure_live(&state, EntityKind::CompanyProject, id).await?;

    let stored =
        upload::store_images(state.blobs.as_ref(), &state.config.storage, PROJECT_DIR, &parts)
            .await?;

    let inserted = async {
        let mut txn = state.store().begin().await?;
        let project = lock_live(&mut txn, EntityKind::CompanyProject, id).await?;
        let now = Utc::now();
        let feature = project_feature::ActiveModel {
            project_id: Set(id),
            title: Set(title),
            description: Set(description),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
            ..Default::default()
        }
        .insert(txn.conn())
        .await?;
        insert_images(txn.conn(), feature.id, &stored).await?;
        cascade::propagate(&mut txn, &project, &auth_user.principal(), now).await?;
        txn.commit().await?;
        Ok::<_, AppError>(feature.id)
    }
    .await;

    let feature_id = match inserted {
        Ok(feature_id) => feature_id,
        Err(e) => {
            upload::discard(state.blobs.as_ref(), &stored).await;
            return Err(e);
        }
    };

    Ok((
        StatusCode::CREATED,
        Json(load_feature(&state.db, feature_id).await?),
    ))
}

#[utoipa::path(
    put,
    path = "/project-features/{id}/details",
    tag = "Projects",
    operation_id = "updateProjectFeature",
    summary = "Update a feature's title and description",
    params(("id" = i32, Path, description = "Feature ID")),
    request_body = UpdateFeatureRequest,
    responses(
        (status = 200, description = "Feature updated", body = FeatureResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Feature not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(feature_id = id, user_id = auth_user.user_id))]
pub async fn update_feature(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateFeatureRequest>,
) -> Result<Json<FeatureResponse>, AppError> {
    let mut txn = state.store().begin().await?;
    let feature = lock_live(&mut txn, EntityKind::ProjectFeature, id).await?;
    let now = Utc::now();

    project_feature::ActiveModel {
        id: Unchanged(id),
        title: Set(payload.title.trim().to_string()),
        description: Set(payload.description.trim().to_string()),
        updated_at: Set(now),
        ..Default::default()
    }
    .update(txn.conn())
    .await?;
    cascade::touch_owner(&mut txn, &feature, &auth_user.principal(), now).await?;
    txn.commit().await?;

    Ok(Json(load_feature(&state.db, id).await?))
}

#[utoipa::path(
    delete,
    path = "/project-features/{id}",
    tag = "Projects",
    operation_id = "deleteProjectFeature",
    summary = "Delete a feature with its images",
    params(("id" = i32, Path, description = "Feature ID")),
    responses(
        (status = 204, description = "Feature deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Feature not found (NOT_FOUND)", body = ErrorBody),
        (status = 503, description = "Concurrent modification, retry (RETRYABLE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(feature_id = id, user_id = auth_user.user_id))]
pub async fn delete_feature(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    state
        .coordinator()
        .delete_subtree(EntityKind::ProjectFeature, id, &auth_user.principal())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/project-features/{id}/images",
    tag = "Projects",
    operation_id = "addFeatureImages",
    summary = "Add images to a feature",
    params(("id" = i32, Path, description = "Feature ID")),
    request_body(content_type = "multipart/form-data", description = "images[]"),
    responses(
        (status = 201, description = "Images added", body = FeatureResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Feature not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(feature_id = id, user_id = auth_user.user_id))]
pub async fn add_feature_images(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<FeatureResponse>), AppError> {
    let mut form = MultipartForm::parse(multipart).await?;
    let parts = form.take_files("images")?;
    ensure_live(&state, EntityKind::ProjectFeature, id).await?;

    let stored =
        upload::store_images(state.blobs.as_ref(), &state.config.storage, PROJECT_DIR, &parts)
            .await?;

    let attached = async {
        let mut txn = state.store().begin().await?;
        let feature = lock_live(&mut txn, EntityKind::ProjectFeature, id).await?;
        insert_images(txn.conn(), id, &stored).await?;
        cascade::touch_owner(&mut txn, &feature, &auth_user.principal(), Utc::now()).await?;
        txn.commit().await?;
        Ok::<_, AppError>(())
    }
    .await;

    if let Err(e) = attached {
        upload::discard(state.blobs.as_ref(), &stored).await;
        return Err(e);
    }

    Ok((StatusCode::CREATED, Json(load_feature(&state.db, id).await?)))
}

#[utoipa::path(
    delete,
    path = "/project-feature-images/{id}",
    tag = "Projects",
    operation_id = "deleteFeatureImage",
    summary = "Delete one feature image",
    description = "Soft-deletes the image row, removes the file and marks the owning project as updated.",
    params(("id" = i32, Path, description = "Feature image ID")),
    responses(
        (status = 204, description = "Image deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Image not found (NOT_FOUND)", body = ErrorBody),
        (status = 503, description = "Concurrent modification, retry (RETRYABLE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(image_id = id, user_id = auth_user.user_id))]
pub async fn delete_feature_image(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    state
        .coordinator()
        .delete_subtree(EntityKind::FeatureImage, id, &auth_user.principal())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

fn live_type_for_update(id: i32) -> Select<project_type::Entity> {
    project_type::live()
        .filter(project_type::Column::Id.eq(id))
        .lock(sea_orm::sea_query::LockType::Update)
}

fn live_project_for_update(id: i32) -> Select<company_project::Entity> {
    company_project::live()
        .filter(company_project::Column::Id.eq(id))
        .lock(sea_orm::sea_query::LockType::Update)
}

fn parse_id(field: &str, value: &str) -> Result<i32, AppError> {
    value
        .parse()
        .map_err(|_| AppError::Validation(format!("{field} must be an integer")))
}

async fn insert_images<C: ConnectionTrait>(
    conn: &C,
    feature_id: i32,
    stored: &[StoredImage],
) -> Result<(), AppError> {
    let now = Utc::now();
    let rows = stored.iter().map(|image| feature_image::ActiveModel {
        project_feature_id: Set(feature_id),
        image_name: Set(image.original_name.clone()),
        image_url: Set(image.url.clone()),
        created_at: Set(now),
        updated_at: Set(now),
        deleted_at: Set(None),
        ..Default::default()
    });
    feature_image::Entity::insert_many(rows)
        .exec_without_returning(conn)
        .await?;
    Ok(())
}

/// Live features of `project_ids` with their live images, grouped by project.
async fn features_by_project<C: ConnectionTrait>(
    db: &C,
    project_ids: Vec<i32>,
) -> Result<HashMap<i32, Vec<FeatureResponse>>, DbErr> {
    let features = project_feature::live()
        .filter(project_feature::Column::ProjectId.is_in(project_ids))
        .order_by_asc(project_feature::Column::Id)
        .all(db)
        .await?;
    let mut images = images_by_feature(db, features.iter().map(|f| f.id).collect()).await?;

    let mut grouped: HashMap<i32, Vec<FeatureResponse>> = HashMap::new();
    for feature in features {
        let feature_images = images.remove(&feature.id).unwrap_or_default();
        grouped
            .entry(feature.project_id)
            .or_default()
            .push(FeatureResponse::build(feature, feature_images));
    }
    Ok(grouped)
}

pub(crate) async fn images_by_feature<C: ConnectionTrait>(
    db: &C,
    feature_ids: Vec<i32>,
) -> Result<HashMap<i32, Vec<feature_image::Model>>, DbErr> {
    let images = feature_image::live()
        .filter(feature_image::Column::ProjectFeatureId.is_in(feature_ids))
        .order_by_asc(feature_image::Column::Id)
        .all(db)
        .await?;
    let mut grouped: HashMap<i32, Vec<feature_image::Model>> = HashMap::new();
    for image in images {
        grouped.entry(image.project_feature_id).or_default().push(image);
    }
    Ok(grouped)
}

async fn build_projects<C: ConnectionTrait>(
    db: &C,
    projects: Vec<company_project::Model>,
) -> Result<Vec<ProjectResponse>, AppError> {
    let type_ids: Vec<i32> = projects.iter().map(|p| p.project_type_id).collect();
    let types: HashMap<i32, project_type::Model> = project_type::Entity::find()
        .filter(project_type::Column::Id.is_in(type_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|t| (t.id, t))
        .collect();
    let mut features = features_by_project(db, projects.iter().map(|p| p.id).collect()).await?;
    let names = user_names(
        db,
        projects
            .iter()
            .flat_map(|p| [p.creator_user_id, p.updated_user_id]),
    )
    .await?;

    projects
        .into_iter()
        .map(|project| {
            let project_type = types
                .get(&project.project_type_id)
                .ok_or_else(|| not_found(EntityKind::ProjectType, project.project_type_id))?;
            let project_features = features.remove(&project.id).unwrap_or_default();
            Ok(ProjectResponse::build(
                project,
                project_type,
                project_features,
                &names,
            ))
        })
        .collect()
}

async fn load_project<C: ConnectionTrait>(db: &C, id: i32) -> Result<ProjectResponse, AppError> {
    let project = company_project::live()
        .filter(company_project::Column::Id.eq(id))
        .one(db)
        .await?
        .ok_or_else(|| not_found(EntityKind::CompanyProject, id))?;
    build_projects(db, vec![project])
        .await?
        .pop()
        .ok_or_else(|| not_found(EntityKind::CompanyProject, id))
}

async fn load_feature<C: ConnectionTrait>(db: &C, id: i32) -> Result<FeatureResponse, AppError> {
    let feature = project_feature::live()
        .filter(project_feature::Column::Id.eq(id))
        .one(db)
        .await?
        .ok_or_else(|| not_found(EntityKind::ProjectFeature, id))?;
    let mut images = images_by_feature(db, vec![id]).await?;
    Ok(FeatureResponse::build(
        feature,
        images.remove(&id).unwrap_or_default(),
    ))
}
