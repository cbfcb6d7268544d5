#[cfg(feature = "storage-cloudinary")]
use crate::CloudinaryStore;
#[cfg(feature = "storage-local")]
use crate::LocalStore;
use crate::{RemoteStore, RemoteStoreBackend, StorageError, StorageResult};
use bookshelf_core::Config;
use std::sync::Arc;
#[cfg(feature = "storage-cloudinary")]
use std::time::Duration;

/// Create a remote store backend based on configuration
pub async fn create_remote_store(config: &Config) -> StorageResult<Arc<dyn RemoteStore>> {
    match config.remote_store() {
        #[cfg(feature = "storage-cloudinary")]
        RemoteStoreBackend::Cloudinary => {
            let cloud_name = config.cloudinary_cloud_name().ok_or_else(|| {
                StorageError::ConfigError("CLOUDINARY_CLOUD_NAME not configured".to_string())
            })?;
            let api_key = config.cloudinary_api_key().ok_or_else(|| {
                StorageError::ConfigError("CLOUDINARY_API_KEY not configured".to_string())
            })?;
            let api_secret = config.cloudinary_api_secret().ok_or_else(|| {
                StorageError::ConfigError("CLOUDINARY_API_SECRET not configured".to_string())
            })?;

            let store = CloudinaryStore::new(
                config.cloudinary_api_base(),
                cloud_name,
                api_key,
                api_secret,
                config.cloudinary_signature_algorithm(),
                Duration::from_secs(config.remote_upload_timeout_secs()),
            )?;
            Ok(Arc::new(store))
        }

        #[cfg(not(feature = "storage-cloudinary"))]
        RemoteStoreBackend::Cloudinary => Err(StorageError::ConfigError(
            "Cloudinary remote store not available (storage-cloudinary feature not enabled)"
                .to_string(),
        )),

        #[cfg(feature = "storage-local")]
        RemoteStoreBackend::Local => {
            let base_path = config.local_store_path().ok_or_else(|| {
                StorageError::ConfigError("LOCAL_STORE_PATH not configured".to_string())
            })?;
            let base_url = config.local_store_base_url().ok_or_else(|| {
                StorageError::ConfigError("LOCAL_STORE_BASE_URL not configured".to_string())
            })?;

            let store = LocalStore::new(base_path, base_url.to_string()).await?;
            Ok(Arc::new(store))
        }

        #[cfg(not(feature = "storage-local"))]
        RemoteStoreBackend::Local => Err(StorageError::ConfigError(
            "Local remote store not available (storage-local feature not enabled)".to_string(),
        )),
    }
}
