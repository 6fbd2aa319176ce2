use chrono::Utc;
use sea_orm::*;
use tracing::{info, warn};

use crate::config::BootstrapConfig;
use crate::entity::user;
use crate::utils::hash;

/// Create the configured bootstrap administrator unless a live user already
/// owns that email. Does nothing when the bootstrap section is incomplete.
pub async fn ensure_bootstrap_admin(
    db: &DatabaseConnection,
    bootstrap: &BootstrapConfig,
) -> anyhow::Result<()> {
    let (Some(email), Some(password)) = (
        bootstrap.admin_email.as_deref(),
        bootstrap.admin_password.as_deref(),
    ) else {
        if bootstrap.admin_email.is_some() || bootstrap.admin_password.is_some() {
            warn!("bootstrap.admin_email and bootstrap.admin_password must both be set");
        }
        return Ok(());
    };
    let email = email.trim();

    let exists = user::live()
        .filter(user::Column::Email.eq(email))
        .count(db)
        .await?
        > 0;
    if exists {
        return Ok(());
    }

    let password_hash = hash::hash_password(password)
        .map_err(|e| anyhow::anyhow!("Password hash error: {}", e))?;
    let now = Utc::now();
    user::ActiveModel {
        name: Set(bootstrap
            .admin_name
            .clone()
            .unwrap_or_else(|| "Administrator".into())),
        email: Set(email.to_string()),
        password: Set(password_hash),
        phone_number: Set(String::new()),
        address: Set(String::new()),
        created_at: Set(now),
        updated_at: Set(now),
        deleted_at: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(email = %email, "Bootstrap admin created");
    Ok(())
}
