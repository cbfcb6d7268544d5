pub mod auth;
pub mod fixtures;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum_test::TestServer;
use bookshelf_api::setup::routes::setup_routes;
use bookshelf_api::state::AppState;
use bookshelf_api::auth::JwtService;
use bookshelf_core::config::{BaseConfig, BookshelfConfig, SignatureAlgorithm};
use bookshelf_core::{AppError, AssetKind, Config, RemoteStoreBackend};
use bookshelf_db::test_helpers::{InMemoryBookStore, InMemoryUserStore};
use bookshelf_services::test_helpers::MockRemoteStore;
use bookshelf_services::{
    DescriptionPolisher, GenerationParams, StagingArea, TextGenerator, UploadCoordinator,
};
use tempfile::TempDir;

pub const TEST_JWT_SECRET: &str = "test-jwt-secret-at-least-32-characters-long";
pub const MAX_UPLOAD_BYTES: usize = 64 * 1024;

/// Test application state
pub struct TestApp {
    pub server: TestServer,
    pub users: InMemoryUserStore,
    pub books: InMemoryBookStore,
    pub remote: Arc<MockRemoteStore>,
    pub staging_dir: TempDir,
}

impl TestApp {
    /// Get the HTTP test client
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    /// Files left behind in the staging directory
    pub fn staged_files(&self) -> Vec<PathBuf> {
        std::fs::read_dir(self.staging_dir.path())
            .map(|entries| entries.filter_map(|e| e.ok()).map(|e| e.path()).collect())
            .unwrap_or_default()
    }
}

/// Text generator answering with a fixed string
pub struct CannedGenerator(pub String);

#[async_trait]
impl TextGenerator for CannedGenerator {
    async fn generate(&self, _prompt: &str, _params: &GenerationParams) -> Result<String, AppError> {
        Ok(self.0.clone())
    }
}

pub fn create_test_config(staging_dir: PathBuf) -> Config {
    Config(Box::new(BookshelfConfig {
        base: BaseConfig {
            server_port: 0,
            cors_origins: vec!["*".to_string()],
            db_max_connections: 1,
            db_timeout_seconds: 1,
            jwt_secret: TEST_JWT_SECRET.to_string(),
            jwt_expiry_hours: 1,
            environment: "test".to_string(),
        },
        database_url: "postgres://unused@localhost/bookshelf".to_string(),
        staging_dir,
        max_upload_size_bytes: MAX_UPLOAD_BYTES,
        cover_allowed_content_types: vec!["image/jpeg".to_string(), "image/png".to_string()],
        book_file_allowed_content_types: vec![
            "application/pdf".to_string(),
            "application/epub+zip".to_string(),
        ],
        profile_photo_allowed_content_types: vec![
            "image/jpeg".to_string(),
            "image/png".to_string(),
        ],
        remote_store: RemoteStoreBackend::Cloudinary,
        remote_upload_timeout_secs: 2,
        cloudinary_cloud_name: Some("demo".to_string()),
        cloudinary_api_key: Some("key".to_string()),
        cloudinary_api_secret: Some("secret".to_string()),
        cloudinary_api_base: "http://localhost".to_string(),
        cloudinary_signature_algorithm: SignatureAlgorithm::Sha1,
        local_store_path: None,
        local_store_base_url: None,
        nlp_cloud_api_key: None,
        nlp_cloud_api_base: "http://localhost".to_string(),
        nlp_cloud_model: "test-model".to_string(),
        nlp_cloud_gpu: false,
        nlp_cloud_timeout_secs: 1,
    }))
}

pub async fn setup_test_app() -> TestApp {
    setup_test_app_with_polisher(None).await
}

/// Setup a test application backed by in-memory stores and a mock remote store
pub async fn setup_test_app_with_polisher(polisher: Option<DescriptionPolisher>) -> TestApp {
    let staging_dir = tempfile::tempdir().expect("Failed to create staging directory");
    let config = create_test_config(staging_dir.path().to_path_buf());

    let allowed = HashMap::from([
        (
            AssetKind::CoverImage,
            config.cover_allowed_content_types().to_vec(),
        ),
        (
            AssetKind::BookFile,
            config.book_file_allowed_content_types().to_vec(),
        ),
        (
            AssetKind::ProfilePhoto,
            config.profile_photo_allowed_content_types().to_vec(),
        ),
    ]);
    let staging = StagingArea::new(staging_dir.path(), MAX_UPLOAD_BYTES, allowed)
        .await
        .expect("Failed to create staging area");

    let users = InMemoryUserStore::new();
    let books = InMemoryBookStore::new(users.clone());
    let remote = MockRemoteStore::shared();

    let state = Arc::new(AppState {
        config: config.clone(),
        users: Arc::new(users.clone()),
        books: Arc::new(books.clone()),
        staging,
        uploads: UploadCoordinator::new(remote.clone(), Duration::from_secs(2)),
        jwt: Arc::new(JwtService::new(TEST_JWT_SECRET, 1)),
        polisher,
    });

    let router = setup_routes(&config, state).expect("Failed to build routes");
    let server = TestServer::new(router).expect("Failed to create test server");

    TestApp {
        server,
        users,
        books,
        remote,
        staging_dir,
    }
}
