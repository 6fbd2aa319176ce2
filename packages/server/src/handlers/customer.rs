//! Read-only endpoints for site visitors. Only live rows are ever returned.

use std::collections::HashMap;

use axum::{
    Json,
    extract::{Path, State},
};
use sea_orm::*;
use tracing::instrument;

use super::company::find_company;
use super::not_found;
use super::project::images_by_feature;
use crate::cascade::EntityKind;
use crate::entity::{
    blog, blog_image, company_contact, company_project, company_social_media, project_feature,
    project_type,
};
use crate::error::{AppError, ErrorBody};
use crate::models::public::{
    CompanyDetails, HighlightFeature, PublicBlog, PublicBlogListItem, PublicContact,
    PublicFeatureImage, PublicProject, PublicProjectListItem, PublicProjectType,
    PublicSocialMedia,
};
use crate::models::shared::{name_of, user_names};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/company-details",
    tag = "Public",
    operation_id = "publicCompanyDetails",
    summary = "Company profile with social links and contacts",
    responses(
        (status = 200, description = "Company details", body = CompanyDetails),
        (status = 404, description = "No company has been created yet (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn company_details(
    State(state): State<AppState>,
) -> Result<Json<CompanyDetails>, AppError> {
    let company = find_company(&state.db).await?;
    let social_media = company_social_media::live()
        .filter(company_social_media::Column::CompanyId.eq(company.id))
        .order_by_asc(company_social_media::Column::Id)
        .all(&state.db)
        .await?;
    let contacts = company_contact::live()
        .filter(company_contact::Column::CompanyId.eq(company.id))
        .order_by_asc(company_contact::Column::Id)
        .all(&state.db)
        .await?;

    Ok(Json(CompanyDetails {
        name: company.name,
        about_us: company.description,
        vision: company.vision,
        goal: company.goal,
        logo_url: company.logo_url,
        founded_date: company.founded_date,
        address: company.address,
        social_media: social_media
            .into_iter()
            .map(|s| PublicSocialMedia {
                platform_name: s.platform_name,
                page_url: s.page_url,
            })
            .collect(),
        contacts: contacts
            .into_iter()
            .map(|c| PublicContact {
                department: c.department,
                phone_number: c.phone_number,
            })
            .collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/blogs",
    tag = "Public",
    operation_id = "publicListBlogs",
    summary = "Published blogs, newest first",
    responses((status = 200, description = "Blogs", body = Vec<PublicBlogListItem>)),
)]
#[instrument(skip(state))]
pub async fn list_blogs(
    State(state): State<AppState>,
) -> Result<Json<Vec<PublicBlogListItem>>, AppError> {
    let blogs = blog::live()
        .order_by_desc(blog::Column::CreatedAt)
        .order_by_desc(blog::Column::Id)
        .all(&state.db)
        .await?;

    let mut thumbnails: HashMap<i32, String> = HashMap::new();
    let images = blog_image::live()
        .filter(blog_image::Column::BlogId.is_in(blogs.iter().map(|b| b.id)))
        .order_by_asc(blog_image::Column::Id)
        .all(&state.db)
        .await?;
    for image in images {
        thumbnails.entry(image.blog_id).or_insert(image.image_url);
    }
    let names = user_names(&state.db, blogs.iter().map(|b| b.creator_user_id)).await?;

    Ok(Json(
        blogs
            .into_iter()
            .map(|b| PublicBlogListItem {
                created_by: name_of(&names, b.creator_user_id),
                thumbnail_image: thumbnails.remove(&b.id),
                id: b.id,
                title: b.title,
                created_at: b.created_at,
            })
            .collect(),
    ))
}

#[utoipa::path(
    get,
    path = "/blogs/{id}",
    tag = "Public",
    operation_id = "publicGetBlog",
    summary = "A published blog with its images",
    params(("id" = i32, Path, description = "Blog ID")),
    responses(
        (status = 200, description = "Blog", body = PublicBlog),
        (status = 404, description = "Blog not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(blog_id = id))]
pub async fn get_blog(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<PublicBlog>, AppError> {
    let blog = blog::live()
        .filter(blog::Column::Id.eq(id))
        .one(&state.db)
        .await?
        .ok_or_else(|| not_found(EntityKind::Blog, id))?;
    let images = blog_image::live()
        .filter(blog_image::Column::BlogId.eq(id))
        .order_by_asc(blog_image::Column::Id)
        .all(&state.db)
        .await?;
    let names = user_names(&state.db, [blog.creator_user_id]).await?;

    Ok(Json(PublicBlog {
        created_by: name_of(&names, blog.creator_user_id),
        id: blog.id,
        title: blog.title,
        content: blog.content,
        created_at: blog.created_at,
        images: images.into_iter().map(Into::into).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/project-types",
    tag = "Public",
    operation_id = "publicListProjectTypes",
    summary = "Project categories",
    responses((status = 200, description = "Project types", body = Vec<PublicProjectType>)),
)]
#[instrument(skip(state))]
pub async fn list_project_types(
    State(state): State<AppState>,
) -> Result<Json<Vec<PublicProjectType>>, AppError> {
    let types = project_type::live()
        .order_by_asc(project_type::Column::Id)
        .all(&state.db)
        .await?;
    Ok(Json(
        types
            .into_iter()
            .map(|t| PublicProjectType {
                id: t.id,
                type_name: t.type_name,
                description: t.description,
            })
            .collect(),
    ))
}

#[utoipa::path(
    get,
    path = "/projects",
    tag = "Public",
    operation_id = "publicListProjects",
    summary = "Portfolio projects, newest first",
    responses((status = 200, description = "Projects", body = Vec<PublicProjectListItem>)),
)]
#[instrument(skip(state))]
pub async fn list_projects(
    State(state): State<AppState>,
) -> Result<Json<Vec<PublicProjectListItem>>, AppError> {
    let projects = company_project::live()
        .order_by_desc(company_project::Column::CreatedAt)
        .order_by_desc(company_project::Column::Id)
        .all(&state.db)
        .await?;
    let type_names = type_names(&state.db, projects.iter().map(|p| p.project_type_id)).await?;

    Ok(Json(
        projects
            .into_iter()
            .map(|p| PublicProjectListItem {
                project_type: type_names
                    .get(&p.project_type_id)
                    .cloned()
                    .unwrap_or_default(),
                id: p.id,
                name: p.name,
                description: p.description,
                thumbnail_url: p.thumbnail_url,
            })
            .collect(),
    ))
}

#[utoipa::path(
    get,
    path = "/projects/{id}",
    tag = "Public",
    operation_id = "publicGetProject",
    summary = "A project with its highlight features",
    params(("id" = i32, Path, description = "Project ID")),
    responses(
        (status = 200, description = "Project", body = PublicProject),
        (status = 404, description = "Project not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(project_id = id))]
pub async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<PublicProject>, AppError> {
    let project = company_project::live()
        .filter(company_project::Column::Id.eq(id))
        .one(&state.db)
        .await?
        .ok_or_else(|| not_found(EntityKind::CompanyProject, id))?;
    let type_names = type_names(&state.db, [project.project_type_id]).await?;

    let features = project_feature::live()
        .filter(project_feature::Column::ProjectId.eq(id))
        .order_by_asc(project_feature::Column::Id)
        .all(&state.db)
        .await?;
    let mut images = images_by_feature(&state.db, features.iter().map(|f| f.id).collect()).await?;

    let highlight_features = features
        .into_iter()
        .map(|f| HighlightFeature {
            images: images
                .remove(&f.id)
                .unwrap_or_default()
                .into_iter()
                .map(|i| PublicFeatureImage {
                    image_name: i.image_name,
                    image_url: i.image_url,
                })
                .collect(),
            id: f.id,
            title: f.title,
            description: f.description,
        })
        .collect();

    Ok(Json(PublicProject {
        project_type: type_names
            .get(&project.project_type_id)
            .cloned()
            .unwrap_or_default(),
        id: project.id,
        name: project.name,
        description: project.description,
        demo_url: project.demo_url,
        thumbnail_url: project.thumbnail_url,
        highlight_features,
    }))
}

async fn type_names<C: ConnectionTrait>(
    db: &C,
    ids: impl IntoIterator<Item = i32>,
) -> Result<HashMap<i32, String>, DbErr> {
    let types = project_type::Entity::find()
        .filter(project_type::Column::Id.is_in(ids.into_iter().collect::<Vec<_>>()))
        .all(db)
        .await?;
    Ok(types.into_iter().map(|t| (t.id, t.type_name)).collect())
}
