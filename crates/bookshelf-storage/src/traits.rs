//! Remote store abstraction trait
//!
//! This module defines the RemoteStore trait that all remote object store
//! backends must implement.

use std::path::Path;

use async_trait::async_trait;
use bookshelf_core::{AppError, RemoteStoreBackend, ResourceClassification};
use thiserror::Error;

/// Remote store operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid object identifier: {0}")]
    InvalidKey(String),

    #[error("Remote store backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for remote store operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(msg) => AppError::NotFound(msg),
            StorageError::InvalidKey(msg) => AppError::InvalidInput(msg),
            StorageError::ConfigError(msg) => AppError::Internal(msg),
            other => AppError::RemoteStore(other.to_string()),
        }
    }
}

/// Where and how an upload is placed on the remote store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOptions {
    /// Unique name of the object within its folder, without extension
    pub remote_name: String,
    pub folder: String,
    pub classification: ResourceClassification,
    /// File extension of the object. Images use it as their delivery format;
    /// raw objects only carry it in their identifier.
    pub format: Option<String>,
}

impl UploadOptions {
    /// Identifier the remote store will assign, relative to the folder
    pub fn object_name(&self) -> String {
        match (&self.classification, &self.format) {
            (ResourceClassification::Raw, Some(ext)) => format!("{}.{}", self.remote_name, ext),
            _ => self.remote_name.clone(),
        }
    }
}

/// Outcome of a successful upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteUpload {
    /// Publicly resolvable URL of the stored object
    pub secure_url: String,
    pub public_id: String,
}

/// Remote object store abstraction
///
/// Implementations forward staged local files to the store and remove objects
/// by the identifier derived from their public URL.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Upload the file at `local_path` and return its public URL
    async fn upload(
        &self,
        local_path: &Path,
        options: &UploadOptions,
    ) -> StorageResult<RemoteUpload>;

    /// Delete an object. Returns `StorageError::NotFound` when the store does
    /// not know the identifier.
    async fn destroy(
        &self,
        public_id: &str,
        classification: ResourceClassification,
    ) -> StorageResult<()>;

    /// Get the backend type
    fn backend_type(&self) -> RemoteStoreBackend;
}
