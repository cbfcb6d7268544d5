use crate::traits::{RemoteStore, RemoteUpload, StorageError, StorageResult, UploadOptions};
use async_trait::async_trait;
use bookshelf_core::{RemoteStoreBackend, ResourceClassification};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Local filesystem remote store
///
/// Objects live under `{base_path}/{image|raw}/{folder}/{file}` and are served
/// from `{base_url}/{image|raw}/{folder}/{file}`.
#[derive(Clone, Debug)]
pub struct LocalStore {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStore {
    /// Create a new LocalStore instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for stored objects (e.g., "/var/lib/bookshelf/files")
    /// * `base_url` - Base URL the objects are served from (e.g., "http://localhost:3000/files")
    pub async fn new(base_path: impl Into<PathBuf>, base_url: String) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStore {
            base_path,
            base_url,
        })
    }

    /// Convert a relative object key to a filesystem path, rejecting keys that
    /// could escape the base directory.
    fn key_to_path(&self, key: &str) -> StorageResult<PathBuf> {
        if key.contains("..") || key.starts_with('/') || key.contains('\\') {
            return Err(StorageError::InvalidKey(
                "Object identifier contains invalid characters".to_string(),
            ));
        }

        Ok(self.base_path.join(key))
    }

    fn object_key(classification: ResourceClassification, folder: &str, file: &str) -> String {
        format!("{}/{}/{}", classification.as_str(), folder, file)
    }

    fn generate_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), key)
    }

    /// Locate the stored file of an image identifier (`folder/name`), whose
    /// extension is not part of the identifier.
    async fn find_image(&self, public_id: &str) -> StorageResult<Option<PathBuf>> {
        let (folder, stem) = public_id
            .rsplit_once('/')
            .ok_or_else(|| StorageError::InvalidKey(public_id.to_string()))?;
        let dir = self.key_to_path(&format!(
            "{}/{}",
            ResourceClassification::Image.as_str(),
            folder
        ))?;

        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.file_stem().and_then(|s| s.to_str()) == Some(stem) {
                return Ok(Some(path));
            }
        }

        Ok(None)
    }

    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for LocalStore {
    async fn upload(
        &self,
        local_path: &Path,
        options: &UploadOptions,
    ) -> StorageResult<RemoteUpload> {
        let file_name = match &options.format {
            Some(ext) => format!("{}.{}", options.remote_name, ext),
            None => options.remote_name.clone(),
        };
        let key = Self::object_key(options.classification, &options.folder, &file_name);
        let path = self.key_to_path(&key)?;

        self.ensure_parent_dir(&path).await?;

        let start = std::time::Instant::now();

        let size = fs::copy(local_path, &path).await.map_err(|e| {
            StorageError::UploadFailed(format!(
                "Failed to copy {} to {}: {}",
                local_path.display(),
                path.display(),
                e
            ))
        })?;

        let url = self.generate_url(&key);

        tracing::info!(
            path = %path.display(),
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local store upload successful"
        );

        Ok(RemoteUpload {
            secure_url: url,
            public_id: format!("{}/{}", options.folder, options.object_name()),
        })
    }

    async fn destroy(
        &self,
        public_id: &str,
        classification: ResourceClassification,
    ) -> StorageResult<()> {
        let path = match classification {
            ResourceClassification::Image => self.find_image(public_id).await?,
            ResourceClassification::Raw => {
                let path = self.key_to_path(&format!("{}/{}", classification.as_str(), public_id))?;
                if fs::try_exists(&path).await.unwrap_or(false) {
                    Some(path)
                } else {
                    None
                }
            }
        };

        let path = path.ok_or_else(|| StorageError::NotFound(public_id.to_string()))?;

        fs::remove_file(&path).await.map_err(|e| {
            StorageError::DeleteFailed(format!("Failed to delete file {}: {}", path.display(), e))
        })?;

        tracing::info!(
            path = %path.display(),
            public_id = %public_id,
            "Local store delete successful"
        );

        Ok(())
    }

    fn backend_type(&self) -> RemoteStoreBackend {
        RemoteStoreBackend::Local
    }
}
