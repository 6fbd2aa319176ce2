use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
};
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::*;
use tracing::instrument;

use super::{ensure_live, lock_live, not_found};
use crate::cascade::{self, EntityKind, EntityStore, EntityTxn};
use crate::entity::{blog, blog_image};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::blog::{BlogImageResponse, BlogResponse, UpdateBlogRequest, validate_blog_fields};
use crate::models::shared::user_names;
use crate::state::AppState;
use crate::utils::upload::{self, MultipartForm, StoredImage};

const BLOG_DIR: &str = "blogs";

#[utoipa::path(
    get,
    path = "/blogs",
    tag = "Blogs",
    operation_id = "listBlogs",
    summary = "List live blogs",
    description = "Newest first, each with its live images.",
    responses(
        (status = 200, description = "Blogs", body = Vec<BlogResponse>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user))]
pub async fn list_blogs(
    _auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<BlogResponse>>, AppError> {
    let blogs = blog::live()
        .order_by_desc(blog::Column::CreatedAt)
        .order_by_desc(blog::Column::Id)
        .all(&state.db)
        .await?;

    let images = blog_image::live()
        .filter(blog_image::Column::BlogId.is_in(blogs.iter().map(|b| b.id)))
        .order_by_asc(blog_image::Column::Id)
        .all(&state.db)
        .await?;
    let names = user_names(
        &state.db,
        blogs.iter().flat_map(|b| [b.creator_user_id, b.updated_user_id]),
    )
    .await?;

    let mut by_blog: std::collections::HashMap<i32, Vec<blog_image::Model>> =
        std::collections::HashMap::new();
    for image in images {
        by_blog.entry(image.blog_id).or_default().push(image);
    }

    let data = blogs
        .into_iter()
        .map(|b| {
            let images = by_blog.remove(&b.id).unwrap_or_default();
            BlogResponse::build(b, images, &names)
        })
        .collect();
    Ok(Json(data))
}

#[utoipa::path(
    get,
    path = "/blogs/{id}",
    tag = "Blogs",
    operation_id = "getBlog",
    summary = "Get a blog with its images",
    params(("id" = i32, Path, description = "Blog ID")),
    responses(
        (status = 200, description = "Blog", body = BlogResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Blog not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user), fields(blog_id = id))]
pub async fn get_blog(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<BlogResponse>, AppError> {
    Ok(Json(load_blog(&state.db, id).await?))
}

#[utoipa::path(
    post,
    path = "/blogs",
    tag = "Blogs",
    operation_id = "createBlog",
    summary = "Create a blog with images",
    description = "Multipart fields `title`, `content` and one or more `images`. The blog, its image rows and the stored files are created together.",
    request_body(content_type = "multipart/form-data", description = "title, content, images[]"),
    responses(
        (status = 201, description = "Blog created", body = BlogResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(user_id = auth_user.user_id))]
pub async fn create_blog(
    auth_user: AuthUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<BlogResponse>), AppError> {
    let mut form = MultipartForm::parse(multipart).await?;
    let title = form.text("title")?;
    let content = form.text("content")?;
    validate_blog_fields(&title, &content)?;
    let parts = form.take_files("images")?;

    let stored =
        upload::store_images(state.blobs.as_ref(), &state.config.storage, BLOG_DIR, &parts)
            .await?;

    let id = match insert_blog(&state.db, &auth_user, title, content, &stored).await {
        Ok(id) => id,
        Err(e) => {
            upload::discard(state.blobs.as_ref(), &stored).await;
            return Err(e);
        }
    };

    Ok((StatusCode::CREATED, Json(load_blog(&state.db, id).await?)))
}

async fn insert_blog(
    db: &DatabaseConnection,
    auth_user: &AuthUser,
    title: String,
    content: String,
    stored: &[StoredImage],
) -> Result<i32, AppError> {
    let now = Utc::now();
    let txn = db.begin().await?;

    let model = blog::ActiveModel {
        title: Set(title),
        content: Set(content),
        creator_user_id: Set(auth_user.user_id),
        updated_user_id: Set(auth_user.user_id),
        created_at: Set(now),
        updated_at: Set(now),
        deleted_at: Set(None),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    insert_images(&txn, model.id, stored).await?;
    txn.commit().await?;
    Ok(model.id)
}

async fn insert_images<C: ConnectionTrait>(
    conn: &C,
    blog_id: i32,
    stored: &[StoredImage],
) -> Result<(), AppError> {
    let now = Utc::now();
    let rows = stored.iter().map(|image| blog_image::ActiveModel {
        blog_id: Set(blog_id),
        image_name: Set(image.original_name.clone()),
        image_url: Set(image.url.clone()),
        created_at: Set(now),
        updated_at: Set(now),
        deleted_at: Set(None),
        ..Default::default()
    });
    blog_image::Entity::insert_many(rows)
        .exec_without_returning(conn)
        .await?;
    Ok(())
}

#[utoipa::path(
    put,
    path = "/blogs/{id}",
    tag = "Blogs",
    operation_id = "updateBlog",
    summary = "Update a blog's title and content",
    params(("id" = i32, Path, description = "Blog ID")),
    request_body = UpdateBlogRequest,
    responses(
        (status = 200, description = "Blog updated", body = BlogResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Blog not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(blog_id = id, user_id = auth_user.user_id))]
pub async fn update_blog(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<UpdateBlogRequest>,
) -> Result<Json<BlogResponse>, AppError> {
    let result = blog::Entity::update_many()
        .col_expr(blog::Column::Title, Expr::value(payload.title.trim()))
        .col_expr(blog::Column::Content, Expr::value(payload.content.trim()))
        .col_expr(blog::Column::UpdatedUserId, Expr::value(auth_user.user_id))
        .col_expr(blog::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(blog::Column::Id.eq(id))
        .filter(blog::Column::DeletedAt.is_null())
        .exec(&state.db)
        .await?;
    if result.rows_affected == 0 {
        return Err(not_found(EntityKind::Blog, id));
    }

    Ok(Json(load_blog(&state.db, id).await?))
}

#[utoipa::path(
    delete,
    path = "/blogs/{id}",
    tag = "Blogs",
    operation_id = "deleteBlog",
    summary = "Delete a blog and its images",
    description = "Soft-deletes the blog and every live image row and removes the image files.",
    params(("id" = i32, Path, description = "Blog ID")),
    responses(
        (status = 204, description = "Blog deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Blog not found (NOT_FOUND)", body = ErrorBody),
        (status = 503, description = "Concurrent modification, retry (RETRYABLE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(blog_id = id, user_id = auth_user.user_id))]
pub async fn delete_blog(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    state
        .coordinator()
        .delete_subtree(EntityKind::Blog, id, &auth_user.principal())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/blogs/{id}/images",
    tag = "Blogs",
    operation_id = "addBlogImages",
    summary = "Add images to a blog",
    params(("id" = i32, Path, description = "Blog ID")),
    request_body(content_type = "multipart/form-data", description = "images[]"),
    responses(
        (status = 201, description = "Images added", body = Vec<BlogImageResponse>),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Blog not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(blog_id = id, user_id = auth_user.user_id))]
pub async fn add_blog_images(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Vec<BlogImageResponse>>), AppError> {
    let mut form = MultipartForm::parse(multipart).await?;
    let parts = form.take_files("images")?;
    ensure_live(&state, EntityKind::Blog, id).await?;

    let stored =
        upload::store_images(state.blobs.as_ref(), &state.config.storage, BLOG_DIR, &parts)
            .await?;

    if let Err(e) = attach_images(&state, &auth_user, id, &stored).await {
        upload::discard(state.blobs.as_ref(), &stored).await;
        return Err(e);
    }

    let urls: Vec<&str> = stored.iter().map(|s| s.url.as_str()).collect();
    let images = blog_image::live()
        .filter(blog_image::Column::BlogId.eq(id))
        .filter(blog_image::Column::ImageUrl.is_in(urls))
        .order_by_asc(blog_image::Column::Id)
        .all(&state.db)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(images.into_iter().map(Into::into).collect()),
    ))
}

async fn attach_images(
    state: &AppState,
    auth_user: &AuthUser,
    blog_id: i32,
    stored: &[StoredImage],
) -> Result<(), AppError> {
    let mut txn = state.store().begin().await?;
    let blog = lock_live(&mut txn, EntityKind::Blog, blog_id).await?;
    insert_images(txn.conn(), blog_id, stored).await?;
    cascade::propagate(&mut txn, &blog, &auth_user.principal(), Utc::now()).await?;
    txn.commit().await?;
    Ok(())
}

#[utoipa::path(
    delete,
    path = "/blog-images/{id}",
    tag = "Blogs",
    operation_id = "deleteBlogImage",
    summary = "Delete one blog image",
    description = "Soft-deletes the image row, removes the file and marks the blog as updated.",
    params(("id" = i32, Path, description = "Blog image ID")),
    responses(
        (status = 204, description = "Image deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Image not found (NOT_FOUND)", body = ErrorBody),
        (status = 503, description = "Concurrent modification, retry (RETRYABLE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(image_id = id, user_id = auth_user.user_id))]
pub async fn delete_blog_image(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    state
        .coordinator()
        .delete_subtree(EntityKind::BlogImage, id, &auth_user.principal())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn load_blog<C: ConnectionTrait>(db: &C, id: i32) -> Result<BlogResponse, AppError> {
    let blog = blog::live()
        .filter(blog::Column::Id.eq(id))
        .one(db)
        .await?
        .ok_or_else(|| not_found(EntityKind::Blog, id))?;
    let images = blog_image::live()
        .filter(blog_image::Column::BlogId.eq(id))
        .order_by_asc(blog_image::Column::Id)
        .all(db)
        .await?;
    let names = user_names(db, [blog.creator_user_id, blog.updated_user_id]).await?;
    Ok(BlogResponse::build(blog, images, &names))
}
