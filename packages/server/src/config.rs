use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    /// Empty means any origin (development).
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_minutes: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Root directory of the public blob tree (`blogs/`, `company/`, `projects/`).
    pub public_dir: PathBuf,
    /// URL prefix under which `public_dir` is served.
    pub public_base_url: String,
    /// Per-file upload limit in bytes.
    pub max_image_size: u64,
}

/// Optional first administrator created at startup.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct BootstrapConfig {
    pub admin_name: Option<String>,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("CMS_CONFIG").unwrap_or_else(|_| "config/config".into());

        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8000)?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 86400)?
            .set_default("database.url", "sqlite://data/cms.db?mode=rwc")?
            .set_default("auth.token_ttl_minutes", 60)?
            .set_default("storage.public_dir", "./public/images")?
            .set_default("storage.public_base_url", "http://127.0.0.1:8000/images")?
            .set_default("storage.max_image_size", 5 * 1024 * 1024)?
            .add_source(File::with_name(&path).required(false))
            // Override from environment (e.g., CMS__AUTH__JWT_SECRET)
            .add_source(Environment::with_prefix("CMS").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
