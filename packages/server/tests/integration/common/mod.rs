use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use reqwest::Client;
use reqwest::multipart::{Form, Part};
use sea_orm::DatabaseConnection;
use serde_json::{Value, json};
use tempfile::TempDir;

use cms_server::config::{
    AppConfig, AuthConfig, BootstrapConfig, CorsConfig, DatabaseConfig, ServerConfig,
    StorageConfig,
};
use cms_server::state::AppState;
use ::common::storage::FilesystemBlobStore;

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "admin-password";

/// A tiny valid PNG.
pub const PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
    0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0xF8,
    0xCF, 0xC0, 0xF0, 0x1F, 0x00, 0x05, 0x00, 0x01, 0xFF, 0x89, 0x99, 0x3D, 0x1D, 0x00, 0x00,
    0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

pub mod routes {
    pub const LOGIN: &str = "/api/admin/login";
    pub const PROFILE: &str = "/api/admin/profile";
    pub const EDIT_PROFILE: &str = "/api/admin/edit-profile";
    pub const CHANGE_PASSWORD: &str = "/api/admin/change-password";
    pub const USERS: &str = "/api/admin/users";
    pub const BLOGS: &str = "/api/admin/blogs";
    pub const PROJECT_TYPES: &str = "/api/admin/project-types";
    pub const PROJECTS: &str = "/api/admin/projects";
    pub const COMPANY: &str = "/api/admin/company";
    pub const COMPANY_LOGO: &str = "/api/admin/company/logo";
    pub const SOCIAL_MEDIA: &str = "/api/admin/company/social-media";
    pub const CONTACTS: &str = "/api/admin/company/contacts";

    pub const PUBLIC_COMPANY: &str = "/api/customer/company-details";
    pub const PUBLIC_BLOGS: &str = "/api/customer/blogs";
    pub const PUBLIC_PROJECT_TYPES: &str = "/api/customer/project-types";
    pub const PUBLIC_PROJECTS: &str = "/api/customer/projects";

    pub fn user(id: i32) -> String {
        format!("/api/admin/users/{id}")
    }

    pub fn user_password(id: i32) -> String {
        format!("/api/admin/users/{id}/change-password")
    }

    pub fn blog(id: i32) -> String {
        format!("/api/admin/blogs/{id}")
    }

    pub fn blog_images(id: i32) -> String {
        format!("/api/admin/blogs/{id}/images")
    }

    pub fn blog_image(id: i32) -> String {
        format!("/api/admin/blog-images/{id}")
    }

    pub fn project_type(id: i32) -> String {
        format!("/api/admin/project-types/{id}")
    }

    pub fn project(id: i32) -> String {
        format!("/api/admin/projects/{id}")
    }

    pub fn project_details(id: i32) -> String {
        format!("/api/admin/projects/{id}/details")
    }

    pub fn project_thumbnail(id: i32) -> String {
        format!("/api/admin/projects/{id}/new-thumbnail")
    }

    pub fn project_features(id: i32) -> String {
        format!("/api/admin/projects/{id}/features")
    }

    pub fn feature(id: i32) -> String {
        format!("/api/admin/project-features/{id}")
    }

    pub fn feature_details(id: i32) -> String {
        format!("/api/admin/project-features/{id}/details")
    }

    pub fn feature_images(id: i32) -> String {
        format!("/api/admin/project-features/{id}/images")
    }

    pub fn feature_image(id: i32) -> String {
        format!("/api/admin/project-feature-images/{id}")
    }

    pub fn social_media(id: i32) -> String {
        format!("/api/admin/company/social-media/{id}")
    }

    pub fn contact(id: i32) -> String {
        format!("/api/admin/company/contacts/{id}")
    }

    pub fn public_blog(id: i32) -> String {
        format!("/api/customer/blogs/{id}")
    }

    pub fn public_project(id: i32) -> String {
        format!("/api/customer/projects/{id}")
    }
}

/// A running test server backed by a throwaway SQLite file and image tree.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub db: DatabaseConnection,
    pub public_dir: PathBuf,
    pub public_base_url: String,
    _tmp: TempDir,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    /// Raw response body as text.
    pub text: String,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let tmp = tempfile::tempdir().expect("Failed to create temp dir");
        let public_dir = tmp.path().join("images");
        let db_url = format!("sqlite://{}?mode=rwc", tmp.path().join("cms.db").display());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();
        let public_base_url = format!("http://{addr}/images");

        let app_config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors: CorsConfig {
                    allow_origins: vec![],
                    max_age: 3600,
                },
            },
            database: DatabaseConfig {
                url: db_url.clone(),
            },
            auth: AuthConfig {
                jwt_secret: "test-secret-for-integration-tests".to_string(),
                token_ttl_minutes: 60,
            },
            storage: StorageConfig {
                public_dir: public_dir.clone(),
                public_base_url: public_base_url.clone(),
                max_image_size: 1024 * 1024,
            },
            bootstrap: BootstrapConfig {
                admin_name: Some("Site Admin".to_string()),
                admin_email: Some(ADMIN_EMAIL.to_string()),
                admin_password: Some(ADMIN_PASSWORD.to_string()),
            },
        };

        let db = cms_server::database::init_db(&db_url)
            .await
            .expect("Failed to initialize database");
        cms_server::seed::ensure_bootstrap_admin(&db, &app_config.bootstrap)
            .await
            .expect("Failed to seed admin");
        let blobs = FilesystemBlobStore::new(public_dir.clone(), app_config.storage.max_image_size)
            .await
            .expect("Failed to open blob store");

        let state = AppState {
            db: db.clone(),
            config: app_config,
            blobs: Arc::new(blobs),
        };
        let app = cms_server::build_router(state);

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            client: Client::new(),
            db,
            public_dir,
            public_base_url,
            _tmp: tmp,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn post_with_token(&self, path: &str, body: &Value, token: &str) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .json(body)
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn post_without_token(&self, path: &str, body: &Value) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    pub async fn get_with_token(&self, path: &str, token: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn get_without_token(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn put_with_token(&self, path: &str, body: &Value, token: &str) -> TestResponse {
        let res = self
            .client
            .put(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .json(body)
            .send()
            .await
            .expect("Failed to send PUT request");

        TestResponse::from_response(res).await
    }

    pub async fn delete_with_token(&self, path: &str, token: &str) -> TestResponse {
        let res = self
            .client
            .delete(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await
            .expect("Failed to send DELETE request");

        TestResponse::from_response(res).await
    }

    pub async fn multipart_with_token(&self, path: &str, form: Form, token: &str) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .header("Authorization", format!("Bearer {token}"))
            .multipart(form)
            .send()
            .await
            .expect("Failed to send multipart request");

        TestResponse::from_response(res).await
    }

    /// Log in as the seeded administrator.
    pub async fn admin_token(&self) -> String {
        self.login(ADMIN_EMAIL, ADMIN_PASSWORD).await
    }

    pub async fn login(&self, email: &str, password: &str) -> String {
        let res = self
            .post_without_token(
                routes::LOGIN,
                &json!({"email": email, "password": password}),
            )
            .await;
        assert_eq!(res.status, 200, "Login failed: {}", res.text);

        res.body["access_token"]
            .as_str()
            .expect("Login response should contain an access_token")
            .to_string()
    }

    /// Register another administrator and return their id.
    pub async fn create_user(&self, token: &str, name: &str, email: &str, password: &str) -> i32 {
        let res = self
            .post_with_token(
                routes::USERS,
                &json!({
                    "name": name,
                    "email": email,
                    "password": password,
                    "password_confirmation": password,
                    "phone_number": "+95 9 000 000",
                    "address": "Yangon",
                }),
                token,
            )
            .await;
        assert_eq!(res.status, 201, "create_user failed: {}", res.text);
        res.id()
    }

    /// Create a blog with one image per file name.
    pub async fn create_blog(&self, token: &str, title: &str, files: &[&str]) -> TestResponse {
        let mut form = Form::new()
            .text("title", title.to_string())
            .text("content", "Some words about the launch.");
        for file in files {
            form = form.part("images[]", image(file));
        }
        let res = self.multipart_with_token(routes::BLOGS, form, token).await;
        assert_eq!(res.status, 201, "create_blog failed: {}", res.text);
        res
    }

    pub async fn create_project_type(&self, token: &str, type_name: &str) -> i32 {
        let res = self
            .post_with_token(
                routes::PROJECT_TYPES,
                &json!({"type_name": type_name, "description": "Things we build"}),
                token,
            )
            .await;
        assert_eq!(res.status, 201, "create_project_type failed: {}", res.text);
        res.id()
    }

    pub async fn create_project(&self, token: &str, type_id: i32, name: &str) -> TestResponse {
        let form = Form::new()
            .text("name", name.to_string())
            .text("project_type_id", type_id.to_string())
            .text("description", "A project")
            .text("demo_url", "https://demo.example.com")
            .part("thumbnail", image("thumb.png"));
        let res = self.multipart_with_token(routes::PROJECTS, form, token).await;
        assert_eq!(res.status, 201, "create_project failed: {}", res.text);
        res
    }

    pub async fn add_feature(
        &self,
        token: &str,
        project_id: i32,
        title: &str,
        files: &[&str],
    ) -> TestResponse {
        let mut form = Form::new()
            .text("title", title.to_string())
            .text("description", "Feature description");
        for file in files {
            form = form.part("images", image(file));
        }
        let res = self
            .multipart_with_token(&routes::project_features(project_id), form, token)
            .await;
        assert_eq!(res.status, 201, "add_feature failed: {}", res.text);
        res
    }

    pub async fn create_company(&self, token: &str) -> TestResponse {
        let form = Form::new()
            .text("name", "Acme Studio")
            .text("description", "We build things")
            .text("vision", "Everywhere")
            .text("goal", "Ship")
            .text("founded_date", "2019-04-01")
            .text("address", "1 Main Street")
            .part("logo", image("logo.png"));
        let res = self.multipart_with_token(routes::COMPANY, form, token).await;
        assert_eq!(res.status, 201, "create_company failed: {}", res.text);
        res
    }

    /// On-disk location of the blob behind a public image URL.
    pub fn blob_path(&self, url: &str) -> PathBuf {
        let relative = url
            .strip_prefix(&self.public_base_url)
            .unwrap_or_else(|| panic!("{url} is not under {}", self.public_base_url))
            .trim_start_matches('/');
        self.public_dir.join(relative)
    }

    pub fn blob_exists(&self, url: &str) -> bool {
        self.blob_path(url).exists()
    }

    /// Number of stored blobs under `dir`.
    pub fn blob_count(&self, dir: &str) -> usize {
        std::fs::read_dir(self.public_dir.join(dir))
            .map(|entries| entries.count())
            .unwrap_or(0)
    }
}

/// A PNG file part with the given file name.
pub fn image(file_name: &str) -> Part {
    Part::bytes(PNG.to_vec())
        .file_name(file_name.to_string())
        .mime_str("image/png")
        .expect("Failed to set MIME type")
}

impl TestResponse {
    pub async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let text = res.text().await.unwrap_or_default();
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Self { status, text, body }
    }

    pub fn id(&self) -> i32 {
        self.body["id"]
            .as_i64()
            .expect("response body should contain 'id'") as i32
    }

    pub fn str(&self, pointer: &str) -> String {
        self.body
            .pointer(pointer)
            .and_then(Value::as_str)
            .unwrap_or_else(|| panic!("missing string at {pointer}: {}", self.text))
            .to_string()
    }
}
