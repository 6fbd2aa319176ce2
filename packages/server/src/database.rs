use std::time::Duration;

use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr};
use tracing::info;

/// Uniqueness among live rows. Schema sync cannot express partial indexes, so
/// they are created by hand; the statement is the same on Postgres and SQLite.
const LIVE_UNIQUE_INDEXES: &[(&str, &str)] = &[
    (
        "idx_user_live_email",
        r#"CREATE UNIQUE INDEX IF NOT EXISTS idx_user_live_email ON "user" (email) WHERE deleted_at IS NULL"#,
    ),
    (
        "idx_project_type_live_name",
        r#"CREATE UNIQUE INDEX IF NOT EXISTS idx_project_type_live_name ON "project_type" (type_name) WHERE deleted_at IS NULL"#,
    ),
];

pub async fn init_db(db_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(db_url.to_owned());

    opt.max_connections(32)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(60))
        .sqlx_logging(true);

    let db = Database::connect(opt).await?;
    db.get_schema_registry("cms_server::entity::*")
        .sync(&db)
        .await?;
    ensure_indexes(&db).await?;

    Ok(db)
}

/// Create the partial unique indexes that back the live-row uniqueness checks.
pub async fn ensure_indexes<C: ConnectionTrait>(db: &C) -> Result<(), DbErr> {
    for (name, sql) in LIVE_UNIQUE_INDEXES {
        db.execute_unprepared(sql).await?;
        info!("Ensured index {} exists", name);
    }
    Ok(())
}
