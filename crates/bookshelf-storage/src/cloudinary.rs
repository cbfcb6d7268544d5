use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use bookshelf_core::config::SignatureAlgorithm;
use bookshelf_core::{RemoteStoreBackend, ResourceClassification};
use serde::Deserialize;
use sha2::Digest;

use crate::traits::{RemoteStore, RemoteUpload, StorageError, StorageResult, UploadOptions};

/// Cloudinary-compatible remote store using the signed REST upload API
pub struct CloudinaryStore {
    http_client: reqwest::Client,
    api_base: String,
    cloud_name: String,
    api_key: String,
    api_secret: String,
    algorithm: SignatureAlgorithm,
}

impl Debug for CloudinaryStore {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("CloudinaryStore")
            .field("api_base", &self.api_base)
            .field("cloud_name", &self.cloud_name)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Sign request parameters: sorted `key=value` pairs joined by `&`, followed
/// by the API secret, hashed and hex encoded.
pub fn sign_params(
    params: &BTreeMap<&str, String>,
    api_secret: &str,
    algorithm: SignatureAlgorithm,
) -> String {
    let to_sign = params
        .iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("&");
    let payload = format!("{}{}", to_sign, api_secret);

    match algorithm {
        SignatureAlgorithm::Sha1 => hex::encode(sha1::Sha1::digest(payload.as_bytes())),
        SignatureAlgorithm::Sha256 => hex::encode(sha2::Sha256::digest(payload.as_bytes())),
    }
}

impl CloudinaryStore {
    pub fn new(
        api_base: impl Into<String>,
        cloud_name: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
        algorithm: SignatureAlgorithm,
        timeout: Duration,
    ) -> StorageResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                StorageError::ConfigError(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            http_client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            cloud_name: cloud_name.into(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            algorithm,
        })
    }

    fn endpoint(&self, classification: ResourceClassification, action: &str) -> String {
        format!(
            "{}/v1_1/{}/{}/{}",
            self.api_base,
            self.cloud_name,
            classification.as_str(),
            action
        )
    }

    /// Add timestamp, api key and signature to a parameter set
    fn signed(&self, mut params: BTreeMap<&'static str, String>) -> BTreeMap<&'static str, String> {
        params.insert("timestamp", chrono::Utc::now().timestamp().to_string());
        let signature = sign_params(&params, &self.api_secret, self.algorithm);
        params.insert("api_key", self.api_key.clone());
        params.insert("signature", signature);
        params
    }

    async fn error_text(response: reqwest::Response) -> String {
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        let message = serde_json::from_str::<ErrorResponse>(&body)
            .map(|e| e.error.message)
            .unwrap_or(body);
        format!("{} - {}", status, message)
    }
}

#[async_trait]
impl RemoteStore for CloudinaryStore {
    async fn upload(
        &self,
        local_path: &Path,
        options: &UploadOptions,
    ) -> StorageResult<RemoteUpload> {
        let start = std::time::Instant::now();
        let data = tokio::fs::read(local_path).await.map_err(|e| {
            StorageError::UploadFailed(format!(
                "Failed to read staged file {}: {}",
                local_path.display(),
                e
            ))
        })?;
        let size = data.len();

        let mut params = BTreeMap::new();
        params.insert("folder", options.folder.clone());
        params.insert("public_id", options.object_name());
        if options.classification == ResourceClassification::Image {
            if let Some(format) = &options.format {
                params.insert("format", format.clone());
            }
        }
        let params = self.signed(params);

        let file_name = local_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| options.object_name());
        let mut form = reqwest::multipart::Form::new()
            .part("file", reqwest::multipart::Part::bytes(data).file_name(file_name));
        for (key, value) in params {
            form = form.text(key, value);
        }

        let response = self
            .http_client
            .post(self.endpoint(options.classification, "upload"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| StorageError::UploadFailed(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(StorageError::UploadFailed(Self::error_text(response).await));
        }

        let parsed: UploadResponse = response.json().await.map_err(|e| {
            StorageError::BackendError(format!("Failed to parse upload response: {}", e))
        })?;

        tracing::info!(
            folder = %options.folder,
            public_id = %parsed.public_id,
            classification = %options.classification,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Cloudinary upload successful"
        );

        Ok(RemoteUpload {
            secure_url: parsed.secure_url,
            public_id: parsed.public_id,
        })
    }

    async fn destroy(
        &self,
        public_id: &str,
        classification: ResourceClassification,
    ) -> StorageResult<()> {
        let mut params = BTreeMap::new();
        params.insert("public_id", public_id.to_string());
        let params = self.signed(params);

        let response = self
            .http_client
            .post(self.endpoint(classification, "destroy"))
            .form(&params)
            .send()
            .await
            .map_err(|e| StorageError::DeleteFailed(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(StorageError::DeleteFailed(Self::error_text(response).await));
        }

        let parsed: DestroyResponse = response.json().await.map_err(|e| {
            StorageError::BackendError(format!("Failed to parse destroy response: {}", e))
        })?;

        match parsed.result.as_str() {
            "ok" => {
                tracing::info!(
                    public_id = %public_id,
                    classification = %classification,
                    "Cloudinary object destroyed"
                );
                Ok(())
            }
            "not found" => Err(StorageError::NotFound(public_id.to_string())),
            other => Err(StorageError::DeleteFailed(format!(
                "Unexpected destroy result '{}' for {}",
                other, public_id
            ))),
        }
    }

    fn backend_type(&self) -> RemoteStoreBackend {
        RemoteStoreBackend::Cloudinary
    }
}
