use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use common::storage::FilesystemBlobStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cms_server::config::AppConfig;
use cms_server::database::init_db;
use cms_server::seed::ensure_bootstrap_admin;
use cms_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::load().context("Failed to load configuration")?;

    let db = init_db(&config.database.url)
        .await
        .context("Failed to connect to the database")?;
    ensure_bootstrap_admin(&db, &config.bootstrap)
        .await
        .context("Failed to seed the bootstrap admin")?;

    let blobs = FilesystemBlobStore::new(
        config.storage.public_dir.clone(),
        config.storage.max_image_size,
    )
    .await
    .context("Failed to open the public image directory")?;

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server.host/server.port")?;

    let state = AppState {
        db,
        config,
        blobs: Arc::new(blobs),
    };
    let app = cms_server::build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server running at http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
