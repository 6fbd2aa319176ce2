use std::collections::HashMap;

use sea_orm::{ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter};

use crate::entity::user;
use crate::error::AppError;

/// Request bodies check themselves before a handler sees them; see
/// [`AppJson`](crate::extractors::json::AppJson).
pub trait Validate {
    fn validate(&self) -> Result<(), AppError>;
}

/// Trimmed value of a required text field.
pub fn required<'a>(field: &str, value: &'a str) -> Result<&'a str, AppError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::Validation(format!("{field} is required")));
    }
    Ok(value)
}

/// Required field with a maximum length in characters.
pub fn required_max<'a>(field: &str, value: &'a str, max: usize) -> Result<&'a str, AppError> {
    let value = required(field, value)?;
    if value.chars().count() > max {
        return Err(AppError::Validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(value)
}

/// Absolute http(s) URL.
pub fn validate_url(field: &str, value: &str) -> Result<(), AppError> {
    let value = required(field, value)?;
    let rest = value
        .strip_prefix("https://")
        .or_else(|| value.strip_prefix("http://"));
    match rest {
        Some(host) if !host.is_empty() && !host.starts_with('/') && !value.contains(' ') => Ok(()),
        _ => Err(AppError::Validation(format!(
            "{field} must be a valid http(s) URL"
        ))),
    }
}

pub fn validate_email(value: &str) -> Result<(), AppError> {
    let value = required("email", value)?;
    let valid = value.len() <= 255
        && !value.contains(char::is_whitespace)
        && value
            .split_once('@')
            .is_some_and(|(local, domain)| {
                !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
            });
    if !valid {
        return Err(AppError::Validation("email must be a valid address".into()));
    }
    Ok(())
}

/// Passwords: 8-128 bytes, matching their confirmation when one is given.
pub fn validate_password(password: &str, confirmation: Option<&str>) -> Result<(), AppError> {
    if password.len() < 8 || password.len() > 128 {
        return Err(AppError::Validation(
            "Password must be 8-128 characters".into(),
        ));
    }
    if let Some(confirmation) = confirmation
        && confirmation != password
    {
        return Err(AppError::Validation(
            "Password confirmation does not match".into(),
        ));
    }
    Ok(())
}

/// Display names for audit columns. Soft-deleted users are included so past
/// authors keep their name.
pub async fn user_names<C: ConnectionTrait>(
    db: &C,
    ids: impl IntoIterator<Item = i32>,
) -> Result<HashMap<i32, String>, DbErr> {
    let mut ids: Vec<i32> = ids.into_iter().collect();
    ids.sort_unstable();
    ids.dedup();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let users = user::Entity::find()
        .filter(user::Column::Id.is_in(ids))
        .all(db)
        .await?;
    Ok(users.into_iter().map(|u| (u.id, u.name)).collect())
}

/// Look up a name from [`user_names`], empty when the user row is gone.
pub fn name_of(names: &HashMap<i32, String>, id: i32) -> String {
    names.get(&id).cloned().unwrap_or_default()
}
