use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::shared::{Validate, name_of, required, required_max, validate_url};
use crate::entity::{company, company_contact, company_social_media};
use crate::error::AppError;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdateCompanyRequest {
    pub name: String,
    pub description: String,
    pub vision: String,
    pub goal: String,
    /// `YYYY-MM-DD`.
    #[schema(value_type = String, example = "2019-04-01")]
    pub founded_date: NaiveDate,
    pub address: String,
}

impl Validate for UpdateCompanyRequest {
    fn validate(&self) -> Result<(), AppError> {
        validate_company_fields(
            &self.name,
            &self.description,
            &self.vision,
            &self.goal,
            &self.address,
        )
    }
}

pub fn validate_company_fields(
    name: &str,
    description: &str,
    vision: &str,
    goal: &str,
    address: &str,
) -> Result<(), AppError> {
    required_max("name", name, 255)?;
    required("description", description)?;
    required("vision", vision)?;
    required("goal", goal)?;
    required("address", address)?;
    Ok(())
}

pub fn parse_founded_date(value: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::Validation("founded_date must be YYYY-MM-DD".into()))
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct SocialMediaRequest {
    #[schema(example = "Facebook")]
    pub platform_name: String,
    #[schema(example = "https://facebook.com/example")]
    pub page_url: String,
}

impl Validate for SocialMediaRequest {
    fn validate(&self) -> Result<(), AppError> {
        required_max("platform_name", &self.platform_name, 255)?;
        validate_url("page_url", &self.page_url)
    }
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct ContactRequest {
    #[schema(example = "Sales")]
    pub department: String,
    #[schema(example = "+95 9 123 456 789")]
    pub phone_number: String,
}

impl Validate for ContactRequest {
    fn validate(&self) -> Result<(), AppError> {
        required_max("department", &self.department, 255)?;
        required_max("phone_number", &self.phone_number, 64)?;
        Ok(())
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct SocialMediaResponse {
    pub id: i32,
    pub platform_name: String,
    pub page_url: String,
}

impl From<company_social_media::Model> for SocialMediaResponse {
    fn from(m: company_social_media::Model) -> Self {
        Self {
            id: m.id,
            platform_name: m.platform_name,
            page_url: m.page_url,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ContactResponse {
    pub id: i32,
    pub department: String,
    pub phone_number: String,
}

impl From<company_contact::Model> for ContactResponse {
    fn from(m: company_contact::Model) -> Self {
        Self {
            id: m.id,
            department: m.department,
            phone_number: m.phone_number,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct CompanyResponse {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub vision: String,
    pub goal: String,
    pub logo_url: String,
    #[schema(value_type = String, example = "2019-04-01")]
    pub founded_date: NaiveDate,
    pub address: String,
    pub social_media: Vec<SocialMediaResponse>,
    pub contacts: Vec<ContactResponse>,
    pub created_by: String,
    pub updated_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CompanyResponse {
    pub fn build(
        company: company::Model,
        social_media: Vec<company_social_media::Model>,
        contacts: Vec<company_contact::Model>,
        names: &HashMap<i32, String>,
    ) -> Self {
        Self {
            id: company.id,
            created_by: name_of(names, company.creator_user_id),
            updated_by: name_of(names, company.updated_user_id),
            name: company.name,
            description: company.description,
            vision: company.vision,
            goal: company.goal,
            logo_url: company.logo_url,
            founded_date: company.founded_date,
            address: company.address,
            social_media: social_media.into_iter().map(Into::into).collect(),
            contacts: contacts.into_iter().map(Into::into).collect(),
            created_at: company.created_at,
            updated_at: company.updated_at,
        }
    }
}
