use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
};
use chrono::Utc;
use sea_orm::*;
use tracing::instrument;

use super::lock_live;
use crate::cascade::{self, EntityKind, EntityStore, EntityTxn, Node, SeaOrmTxn};
use crate::entity::{company, company_contact, company_social_media};
use crate::error::{AppError, ErrorBody, unique_violation};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::company::{
    CompanyResponse, ContactRequest, ContactResponse, SocialMediaRequest, SocialMediaResponse,
    UpdateCompanyRequest, parse_founded_date, validate_company_fields,
};
use crate::models::shared::user_names;
use crate::state::AppState;
use crate::utils::upload::{self, MultipartForm};

const COMPANY_DIR: &str = "company";

#[utoipa::path(
    get,
    path = "/company",
    tag = "Company",
    operation_id = "getCompany",
    summary = "Get the company profile",
    responses(
        (status = 200, description = "Company with its live social links and contacts", body = CompanyResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "No company has been created yet (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user))]
pub async fn get_company(
    _auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<CompanyResponse>, AppError> {
    let company = find_company(&state.db).await?;
    Ok(Json(build_company(&state.db, company).await?))
}

#[utoipa::path(
    post,
    path = "/company",
    tag = "Company",
    operation_id = "createCompany",
    summary = "Create the company profile",
    description = "Multipart fields `name`, `description`, `vision`, `goal`, `founded_date` (YYYY-MM-DD), `address` and a single `logo` image. Only one company can exist.",
    request_body(content_type = "multipart/form-data", description = "name, description, vision, goal, founded_date, address, logo"),
    responses(
        (status = 201, description = "Company created", body = CompanyResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 409, description = "Company already exists (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(user_id = auth_user.user_id))]
pub async fn create_company(
    auth_user: AuthUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<CompanyResponse>), AppError> {
    let mut form = MultipartForm::parse(multipart).await?;
    let name = form.text("name")?;
    let description = form.text("description")?;
    let vision = form.text("vision")?;
    let goal = form.text("goal")?;
    let address = form.text("address")?;
    validate_company_fields(&name, &description, &vision, &goal, &address)?;
    let founded_date = parse_founded_date(&form.text("founded_date")?)?;
    let logo = form.take_file("logo")?;

    if company::Entity::find().count(&state.db).await? > 0 {
        return Err(company_exists());
    }

    let stored =
        upload::store_image(state.blobs.as_ref(), &state.config.storage, COMPANY_DIR, &logo)
            .await?;

    let now = Utc::now();
    let inserted = async {
        let txn = state.db.begin().await?;
        if company::Entity::find().count(&txn).await? > 0 {
            return Err(company_exists());
        }
        // The fixed key makes a racing second insert fail on the primary key.
        let model = company::ActiveModel {
            id: Set(company::SINGLETON_ID),
            name: Set(name),
            description: Set(description),
            vision: Set(vision),
            goal: Set(goal),
            logo_url: Set(stored.url.clone()),
            founded_date: Set(founded_date),
            address: Set(address),
            creator_user_id: Set(auth_user.user_id),
            updated_user_id: Set(auth_user.user_id),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| unique_violation(e, company_exists))?;
        txn.commit().await?;
        Ok(model)
    }
    .await;

    let model = match inserted {
        Ok(model) => model,
        Err(e) => {
            upload::discard(state.blobs.as_ref(), std::slice::from_ref(&stored)).await;
            return Err(e);
        }
    };

    Ok((
        StatusCode::CREATED,
        Json(build_company(&state.db, model).await?),
    ))
}

#[utoipa::path(
    put,
    path = "/company",
    tag = "Company",
    operation_id = "updateCompany",
    summary = "Update the company profile",
    request_body = UpdateCompanyRequest,
    responses(
        (status = 200, description = "Company updated", body = CompanyResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "No company has been created yet (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn update_company(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<UpdateCompanyRequest>,
) -> Result<Json<CompanyResponse>, AppError> {
    let company = find_company(&state.db).await?;

    let mut active: company::ActiveModel = company.into();
    active.name = Set(payload.name.trim().to_string());
    active.description = Set(payload.description.trim().to_string());
    active.vision = Set(payload.vision.trim().to_string());
    active.goal = Set(payload.goal.trim().to_string());
    active.founded_date = Set(payload.founded_date);
    active.address = Set(payload.address.trim().to_string());
    active.updated_user_id = Set(auth_user.user_id);
    active.updated_at = Set(Utc::now());
    let model = active.update(&state.db).await?;

    Ok(Json(build_company(&state.db, model).await?))
}

#[utoipa::path(
    post,
    path = "/company/logo",
    tag = "Company",
    operation_id = "replaceCompanyLogo",
    summary = "Replace the company logo",
    description = "Stores the new logo, removes the previous file and marks the company as updated.",
    request_body(content_type = "multipart/form-data", description = "logo"),
    responses(
        (status = 200, description = "Logo replaced", body = CompanyResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "No company has been created yet (NOT_FOUND)", body = ErrorBody),
        (status = 503, description = "Concurrent modification, retry (RETRYABLE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(user_id = auth_user.user_id))]
pub async fn replace_logo(
    auth_user: AuthUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<CompanyResponse>, AppError> {
    let mut form = MultipartForm::parse(multipart).await?;
    let logo = form.take_file("logo")?;
    let company = find_company(&state.db).await?;

    let stored =
        upload::store_image(state.blobs.as_ref(), &state.config.storage, COMPANY_DIR, &logo)
            .await?;

    if let Err(e) = state
        .coordinator()
        .replace_asset(EntityKind::Company, company.id, &stored.url, &auth_user.principal())
        .await
    {
        upload::discard(state.blobs.as_ref(), std::slice::from_ref(&stored)).await;
        return Err(e.into());
    }

    let company = find_company(&state.db).await?;
    Ok(Json(build_company(&state.db, company).await?))
}

#[utoipa::path(
    post,
    path = "/company/social-media",
    tag = "Company",
    operation_id = "addSocialMedia",
    summary = "Add a social media link",
    request_body = SocialMediaRequest,
    responses(
        (status = 201, description = "Link created", body = SocialMediaResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "No company has been created yet (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn add_social_media(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<SocialMediaRequest>,
) -> Result<(StatusCode, Json<SocialMediaResponse>), AppError> {
    let company_id = find_company(&state.db).await?.id;
    let mut txn = state.store().begin().await?;
    let company = lock_live(&mut txn, EntityKind::Company, company_id).await?;
    let now = Utc::now();

    let model = company_social_media::ActiveModel {
        company_id: Set(company_id),
        platform_name: Set(payload.platform_name.trim().to_string()),
        page_url: Set(payload.page_url.trim().to_string()),
        creator_user_id: Set(auth_user.user_id),
        created_at: Set(now),
        updated_at: Set(now),
        deleted_at: Set(None),
        ..Default::default()
    }
    .insert(txn.conn())
    .await?;
    cascade::propagate(&mut txn, &company, &auth_user.principal(), now).await?;
    txn.commit().await?;

    Ok((StatusCode::CREATED, Json(model.into())))
}

#[utoipa::path(
    put,
    path = "/company/social-media/{id}",
    tag = "Company",
    operation_id = "updateSocialMedia",
    summary = "Update a social media link",
    params(("id" = i32, Path, description = "Social media link ID")),
    request_body = SocialMediaRequest,
    responses(
        (status = 200, description = "Link updated", body = SocialMediaResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Link not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(social_media_id = id, user_id = auth_user.user_id))]
pub async fn update_social_media(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<SocialMediaRequest>,
) -> Result<Json<SocialMediaResponse>, AppError> {
    let mut txn = state.store().begin().await?;
    let link = lock_live(&mut txn, EntityKind::CompanySocialMedia, id).await?;
    let now = Utc::now();

    let model = company_social_media::ActiveModel {
        id: Unchanged(id),
        platform_name: Set(payload.platform_name.trim().to_string()),
        page_url: Set(payload.page_url.trim().to_string()),
        updated_at: Set(now),
        ..Default::default()
    }
    .update(txn.conn())
    .await?;
    touch_company(&mut txn, &link, &auth_user, now).await?;
    txn.commit().await?;

    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/company/social-media/{id}",
    tag = "Company",
    operation_id = "deleteSocialMedia",
    summary = "Delete a social media link",
    params(("id" = i32, Path, description = "Social media link ID")),
    responses(
        (status = 204, description = "Link deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Link not found (NOT_FOUND)", body = ErrorBody),
        (status = 503, description = "Concurrent modification, retry (RETRYABLE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(social_media_id = id, user_id = auth_user.user_id))]
pub async fn delete_social_media(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    state
        .coordinator()
        .delete_subtree(EntityKind::CompanySocialMedia, id, &auth_user.principal())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/company/contacts",
    tag = "Company",
    operation_id = "addContact",
    summary = "Add a department contact",
    request_body = ContactRequest,
    responses(
        (status = 201, description = "Contact created", body = ContactResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "No company has been created yet (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn add_contact(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<ContactRequest>,
) -> Result<(StatusCode, Json<ContactResponse>), AppError> {
    let company_id = find_company(&state.db).await?.id;
    let mut txn = state.store().begin().await?;
    let company = lock_live(&mut txn, EntityKind::Company, company_id).await?;
    let now = Utc::now();

    let model = company_contact::ActiveModel {
        company_id: Set(company_id),
        department: Set(payload.department.trim().to_string()),
        phone_number: Set(payload.phone_number.trim().to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        deleted_at: Set(None),
        ..Default::default()
    }
    .insert(txn.conn())
    .await?;
    cascade::propagate(&mut txn, &company, &auth_user.principal(), now).await?;
    txn.commit().await?;

    Ok((StatusCode::CREATED, Json(model.into())))
}

#[utoipa::path(
    put,
    path = "/company/contacts/{id}",
    tag = "Company",
    operation_id = "updateContact",
    summary = "Update a department contact",
    params(("id" = i32, Path, description = "Contact ID")),
    request_body = ContactRequest,
    responses(
        (status = 200, description = "Contact updated", body = ContactResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Contact not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(contact_id = id, user_id = auth_user.user_id))]
pub async fn update_contact(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<ContactRequest>,
) -> Result<Json<ContactResponse>, AppError> {
    let mut txn = state.store().begin().await?;
    let contact = lock_live(&mut txn, EntityKind::CompanyContact, id).await?;
    let now = Utc::now();

    let model = company_contact::ActiveModel {
        id: Unchanged(id),
        department: Set(payload.department.trim().to_string()),
        phone_number: Set(payload.phone_number.trim().to_string()),
        updated_at: Set(now),
        ..Default::default()
    }
    .update(txn.conn())
    .await?;
    touch_company(&mut txn, &contact, &auth_user, now).await?;
    txn.commit().await?;

    Ok(Json(model.into()))
}

#[utoipa::path(
    delete,
    path = "/company/contacts/{id}",
    tag = "Company",
    operation_id = "deleteContact",
    summary = "Delete a department contact",
    params(("id" = i32, Path, description = "Contact ID")),
    responses(
        (status = 204, description = "Contact deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Contact not found (NOT_FOUND)", body = ErrorBody),
        (status = 503, description = "Concurrent modification, retry (RETRYABLE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(contact_id = id, user_id = auth_user.user_id))]
pub async fn delete_contact(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    state
        .coordinator()
        .delete_subtree(EntityKind::CompanyContact, id, &auth_user.principal())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn touch_company(
    txn: &mut SeaOrmTxn,
    child: &Node,
    auth_user: &AuthUser,
    at: chrono::DateTime<Utc>,
) -> Result<(), AppError> {
    cascade::touch_owner(txn, child, &auth_user.principal(), at).await?;
    Ok(())
}

fn company_exists() -> AppError {
    AppError::Conflict("Company already exists".into())
}

pub(crate) async fn find_company<C: ConnectionTrait>(db: &C) -> Result<company::Model, AppError> {
    company::Entity::find()
        .order_by_asc(company::Column::Id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Company has not been created yet".into()))
}

async fn build_company<C: ConnectionTrait>(
    db: &C,
    company: company::Model,
) -> Result<CompanyResponse, AppError> {
    let social_media = company_social_media::live()
        .filter(company_social_media::Column::CompanyId.eq(company.id))
        .order_by_asc(company_social_media::Column::Id)
        .all(db)
        .await?;
    let contacts = company_contact::live()
        .filter(company_contact::Column::CompanyId.eq(company.id))
        .order_by_asc(company_contact::Column::Id)
        .all(db)
        .await?;
    let names = user_names(db, [company.creator_user_id, company.updated_user_id]).await?;
    Ok(CompanyResponse::build(company, social_media, contacts, &names))
}

