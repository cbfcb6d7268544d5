//! Configuration module
//!
//! This module provides configuration structures for the API and services,
//! including database, remote store, authentication, upload staging and
//! text generation settings.

use std::env;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::PathBuf;
use std::str::FromStr;

// Common constants
const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const JWT_EXPIRY_HOURS: i64 = 168;
const MAX_UPLOAD_SIZE_MB: usize = 30;
const REMOTE_UPLOAD_TIMEOUT_SECS: u64 = 60;
const NLP_CLOUD_TIMEOUT_SECS: u64 = 60;
const CLOUDINARY_API_BASE: &str = "https://api.cloudinary.com";
const NLP_CLOUD_API_BASE: &str = "https://api.nlpcloud.io";
const NLP_CLOUD_MODEL: &str = "finetuned-llama-3-70b";

const IMAGE_CONTENT_TYPES: &str = "image/jpeg,image/jpg,image/png";
const BOOK_FILE_CONTENT_TYPES: &str = "application/pdf,application/epub+zip";

/// Remote object store backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RemoteStoreBackend {
    Cloudinary,
    Local,
}

impl FromStr for RemoteStoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cloudinary" => Ok(RemoteStoreBackend::Cloudinary),
            "local" => Ok(RemoteStoreBackend::Local),
            _ => Err(anyhow::anyhow!("Invalid remote store backend: {}", s)),
        }
    }
}

impl Display for RemoteStoreBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            RemoteStoreBackend::Cloudinary => write!(f, "cloudinary"),
            RemoteStoreBackend::Local => write!(f, "local"),
        }
    }
}

/// Digest used to sign Cloudinary requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignatureAlgorithm {
    #[default]
    Sha1,
    Sha256,
}

impl FromStr for SignatureAlgorithm {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "").as_str() {
            "sha1" => Ok(SignatureAlgorithm::Sha1),
            "sha256" => Ok(SignatureAlgorithm::Sha256),
            _ => Err(anyhow::anyhow!("Invalid signature algorithm: {}", s)),
        }
    }
}

/// Base configuration for the HTTP service
#[derive(Clone, Debug)]
pub struct BaseConfig {
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub jwt_secret: String,
    pub jwt_expiry_hours: i64,
    pub environment: String,
}

#[derive(Clone, Debug)]
pub struct BookshelfConfig {
    pub base: BaseConfig,
    pub database_url: String,
    // Upload staging
    pub staging_dir: PathBuf,
    pub max_upload_size_bytes: usize,
    pub cover_allowed_content_types: Vec<String>,
    pub book_file_allowed_content_types: Vec<String>,
    pub profile_photo_allowed_content_types: Vec<String>,
    // Remote store
    pub remote_store: RemoteStoreBackend,
    pub remote_upload_timeout_secs: u64,
    pub cloudinary_cloud_name: Option<String>,
    pub cloudinary_api_key: Option<String>,
    pub cloudinary_api_secret: Option<String>,
    pub cloudinary_api_base: String,
    pub cloudinary_signature_algorithm: SignatureAlgorithm,
    pub local_store_path: Option<String>,
    pub local_store_base_url: Option<String>,
    // Text generation
    pub nlp_cloud_api_key: Option<String>,
    pub nlp_cloud_api_base: String,
    pub nlp_cloud_model: String,
    pub nlp_cloud_gpu: bool,
    pub nlp_cloud_timeout_secs: u64,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<BookshelfConfig>);

impl Config {
    fn inner(&self) -> &BookshelfConfig {
        &self.0
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.inner().base.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let config = BookshelfConfig::from_env()?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.inner().validate()
    }

    pub fn server_port(&self) -> u16 {
        self.inner().base.server_port
    }

    pub fn environment(&self) -> &str {
        &self.inner().base.environment
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.inner().base.cors_origins
    }

    pub fn database_url(&self) -> &str {
        &self.inner().database_url
    }

    pub fn db_max_connections(&self) -> u32 {
        self.inner().base.db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.inner().base.db_timeout_seconds
    }

    pub fn jwt_secret(&self) -> &str {
        &self.inner().base.jwt_secret
    }

    pub fn jwt_expiry_hours(&self) -> i64 {
        self.inner().base.jwt_expiry_hours
    }

    pub fn staging_dir(&self) -> &PathBuf {
        &self.inner().staging_dir
    }

    pub fn max_upload_size_bytes(&self) -> usize {
        self.inner().max_upload_size_bytes
    }

    pub fn cover_allowed_content_types(&self) -> &[String] {
        &self.inner().cover_allowed_content_types
    }

    pub fn book_file_allowed_content_types(&self) -> &[String] {
        &self.inner().book_file_allowed_content_types
    }

    pub fn profile_photo_allowed_content_types(&self) -> &[String] {
        &self.inner().profile_photo_allowed_content_types
    }

    pub fn remote_store(&self) -> RemoteStoreBackend {
        self.inner().remote_store
    }

    pub fn remote_upload_timeout_secs(&self) -> u64 {
        self.inner().remote_upload_timeout_secs
    }

    pub fn cloudinary_cloud_name(&self) -> Option<&str> {
        self.inner().cloudinary_cloud_name.as_deref()
    }

    pub fn cloudinary_api_key(&self) -> Option<&str> {
        self.inner().cloudinary_api_key.as_deref()
    }

    pub fn cloudinary_api_secret(&self) -> Option<&str> {
        self.inner().cloudinary_api_secret.as_deref()
    }

    pub fn cloudinary_api_base(&self) -> &str {
        &self.inner().cloudinary_api_base
    }

    pub fn cloudinary_signature_algorithm(&self) -> SignatureAlgorithm {
        self.inner().cloudinary_signature_algorithm
    }

    pub fn local_store_path(&self) -> Option<&str> {
        self.inner().local_store_path.as_deref()
    }

    pub fn local_store_base_url(&self) -> Option<&str> {
        self.inner().local_store_base_url.as_deref()
    }

    pub fn nlp_cloud_api_key(&self) -> Option<&str> {
        self.inner().nlp_cloud_api_key.as_deref()
    }

    pub fn nlp_cloud_api_base(&self) -> &str {
        &self.inner().nlp_cloud_api_base
    }

    pub fn nlp_cloud_model(&self) -> &str {
        &self.inner().nlp_cloud_model
    }

    pub fn nlp_cloud_gpu(&self) -> bool {
        self.inner().nlp_cloud_gpu
    }

    pub fn nlp_cloud_timeout_secs(&self) -> u64 {
        self.inner().nlp_cloud_timeout_secs
    }
}

fn content_type_list(var: &str, default: &str) -> Vec<String> {
    env::var(var)
        .unwrap_or_else(|_| default.to_string())
        .split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn optional_var(var: &str) -> Option<String> {
    env::var(var).ok().filter(|s| !s.trim().is_empty())
}

impl BookshelfConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        let is_production =
            environment.to_lowercase() == "production" || environment.to_lowercase() == "prod";
        if is_production && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        let max_upload_size_mb = env::var("MAX_UPLOAD_SIZE_MB")
            .unwrap_or_else(|_| MAX_UPLOAD_SIZE_MB.to_string())
            .parse::<usize>()
            .unwrap_or(MAX_UPLOAD_SIZE_MB);

        let base = BaseConfig {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            cors_origins,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| CONNECTION_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            jwt_secret: env::var("JWT_SECRET")
                .map_err(|_| anyhow::anyhow!("JWT_SECRET must be set for authentication"))?,
            jwt_expiry_hours: env::var("JWT_EXPIRY_HOURS")
                .unwrap_or_else(|_| JWT_EXPIRY_HOURS.to_string())
                .parse()
                .unwrap_or(JWT_EXPIRY_HOURS),
            environment,
        };

        let remote_store = env::var("REMOTE_STORE")
            .unwrap_or_else(|_| "cloudinary".to_string())
            .parse::<RemoteStoreBackend>()?;

        let cloudinary_signature_algorithm = match optional_var("CLOUDINARY_SIGNATURE_ALGORITHM") {
            Some(value) => value.parse()?,
            None => SignatureAlgorithm::default(),
        };

        let config = BookshelfConfig {
            base,
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            staging_dir: optional_var("STAGING_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| env::temp_dir().join("bookshelf-uploads")),
            max_upload_size_bytes: max_upload_size_mb * 1024 * 1024,
            cover_allowed_content_types: content_type_list(
                "COVER_ALLOWED_CONTENT_TYPES",
                IMAGE_CONTENT_TYPES,
            ),
            book_file_allowed_content_types: content_type_list(
                "BOOK_FILE_ALLOWED_CONTENT_TYPES",
                BOOK_FILE_CONTENT_TYPES,
            ),
            profile_photo_allowed_content_types: content_type_list(
                "PROFILE_PHOTO_ALLOWED_CONTENT_TYPES",
                IMAGE_CONTENT_TYPES,
            ),
            remote_store,
            remote_upload_timeout_secs: env::var("REMOTE_UPLOAD_TIMEOUT_SECS")
                .unwrap_or_else(|_| REMOTE_UPLOAD_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(REMOTE_UPLOAD_TIMEOUT_SECS),
            cloudinary_cloud_name: optional_var("CLOUDINARY_CLOUD_NAME"),
            cloudinary_api_key: optional_var("CLOUDINARY_API_KEY"),
            cloudinary_api_secret: optional_var("CLOUDINARY_API_SECRET"),
            cloudinary_api_base: optional_var("CLOUDINARY_API_BASE")
                .unwrap_or_else(|| CLOUDINARY_API_BASE.to_string()),
            cloudinary_signature_algorithm,
            local_store_path: optional_var("LOCAL_STORE_PATH"),
            local_store_base_url: optional_var("LOCAL_STORE_BASE_URL"),
            nlp_cloud_api_key: optional_var("NLP_CLOUD_API_KEY"),
            nlp_cloud_api_base: optional_var("NLP_CLOUD_API_BASE")
                .unwrap_or_else(|| NLP_CLOUD_API_BASE.to_string()),
            nlp_cloud_model: optional_var("NLP_CLOUD_MODEL")
                .unwrap_or_else(|| NLP_CLOUD_MODEL.to_string()),
            nlp_cloud_gpu: env::var("NLP_CLOUD_GPU")
                .unwrap_or_else(|_| "true".to_string())
                .to_lowercase()
                .parse()
                .unwrap_or(true),
            nlp_cloud_timeout_secs: env::var("NLP_CLOUD_TIMEOUT_SECS")
                .unwrap_or_else(|_| NLP_CLOUD_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(NLP_CLOUD_TIMEOUT_SECS),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.base.jwt_secret.len() < 32 {
            return Err(anyhow::anyhow!(
                "JWT_SECRET must be at least 32 characters long"
            ));
        }

        if !self.database_url.starts_with("postgresql://")
            && !self.database_url.starts_with("postgres://")
        {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a valid PostgreSQL connection string"
            ));
        }

        if self.max_upload_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_UPLOAD_SIZE_MB must be greater than 0"));
        }

        match self.remote_store {
            RemoteStoreBackend::Cloudinary => {
                if self.cloudinary_cloud_name.is_none()
                    || self.cloudinary_api_key.is_none()
                    || self.cloudinary_api_secret.is_none()
                {
                    return Err(anyhow::anyhow!(
                        "CLOUDINARY_CLOUD_NAME, CLOUDINARY_API_KEY and CLOUDINARY_API_SECRET must be set when using the cloudinary remote store"
                    ));
                }
            }
            RemoteStoreBackend::Local => {
                if self.local_store_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORE_PATH must be set when using the local remote store"
                    ));
                }
                if self.local_store_base_url.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORE_BASE_URL must be set when using the local remote store"
                    ));
                }
            }
        }

        Ok(())
    }
}
