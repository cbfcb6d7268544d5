//! Test doubles for the upload workflow
//!
//! A recording remote store with injectable failures and a cleanup observer
//! that keeps every reported event.

use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bookshelf_core::{RemoteStoreBackend, ResourceClassification};
use bookshelf_storage::{RemoteStore, RemoteUpload, StorageError, StorageResult, UploadOptions};

use crate::upload::{CleanupEvent, CleanupObserver, CleanupOutcome, CleanupTarget};

/// How [`MockRemoteStore::destroy`] answers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestroyBehavior {
    Ok,
    NotFound,
    Fail,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedUpload {
    pub options: UploadOptions,
    pub size: u64,
    pub secure_url: String,
}

/// In-memory remote store that records every call
pub struct MockRemoteStore {
    base_url: String,
    uploads: Mutex<Vec<RecordedUpload>>,
    destroys: Mutex<Vec<(String, ResourceClassification)>>,
    failing_folders: Mutex<HashSet<String>>,
    destroy_behavior: Mutex<DestroyBehavior>,
    upload_delay: Mutex<Option<Duration>>,
}

impl Default for MockRemoteStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRemoteStore {
    pub fn new() -> Self {
        Self {
            base_url: "https://res.cloudinary.com/demo".to_string(),
            uploads: Mutex::new(Vec::new()),
            destroys: Mutex::new(Vec::new()),
            failing_folders: Mutex::new(HashSet::new()),
            destroy_behavior: Mutex::new(DestroyBehavior::Ok),
            upload_delay: Mutex::new(None),
        }
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Make uploads into `folder` fail
    pub fn fail_uploads_to(&self, folder: &str) {
        self.failing_folders
            .lock()
            .unwrap()
            .insert(folder.to_string());
    }

    pub fn set_destroy_behavior(&self, behavior: DestroyBehavior) {
        *self.destroy_behavior.lock().unwrap() = behavior;
    }

    pub fn set_upload_delay(&self, delay: Duration) {
        *self.upload_delay.lock().unwrap() = Some(delay);
    }

    pub fn uploads(&self) -> Vec<RecordedUpload> {
        self.uploads.lock().unwrap().clone()
    }

    pub fn destroys(&self) -> Vec<(String, ResourceClassification)> {
        self.destroys.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteStore for MockRemoteStore {
    async fn upload(
        &self,
        local_path: &Path,
        options: &UploadOptions,
    ) -> StorageResult<RemoteUpload> {
        let delay = *self.upload_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let size = std::fs::metadata(local_path)
            .map_err(|e| StorageError::UploadFailed(format!("staged file unreadable: {}", e)))?
            .len();

        if self.failing_folders.lock().unwrap().contains(&options.folder) {
            return Err(StorageError::UploadFailed(format!(
                "simulated failure for folder {}",
                options.folder
            )));
        }

        let file = match (&options.classification, &options.format) {
            (ResourceClassification::Image, Some(ext)) => {
                format!("{}.{}", options.remote_name, ext)
            }
            _ => options.object_name(),
        };
        let secure_url = format!(
            "{}/{}/upload/v1/{}/{}",
            self.base_url, options.classification, options.folder, file
        );

        self.uploads.lock().unwrap().push(RecordedUpload {
            options: options.clone(),
            size,
            secure_url: secure_url.clone(),
        });

        Ok(RemoteUpload {
            secure_url,
            public_id: format!("{}/{}", options.folder, options.object_name()),
        })
    }

    async fn destroy(
        &self,
        public_id: &str,
        classification: ResourceClassification,
    ) -> StorageResult<()> {
        self.destroys
            .lock()
            .unwrap()
            .push((public_id.to_string(), classification));

        match *self.destroy_behavior.lock().unwrap() {
            DestroyBehavior::Ok => Ok(()),
            DestroyBehavior::NotFound => Err(StorageError::NotFound(public_id.to_string())),
            DestroyBehavior::Fail => Err(StorageError::DeleteFailed(
                "simulated destroy failure".to_string(),
            )),
        }
    }

    fn backend_type(&self) -> RemoteStoreBackend {
        RemoteStoreBackend::Cloudinary
    }
}

/// Cleanup observer that keeps every event
#[derive(Default)]
pub struct RecordingCleanupObserver {
    events: Mutex<Vec<CleanupEvent>>,
}

impl RecordingCleanupObserver {
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<CleanupEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn temp_file_events(&self) -> Vec<CleanupEvent> {
        self.events()
            .into_iter()
            .filter(|e| matches!(e.target, CleanupTarget::TempFile { .. }))
            .collect()
    }

    pub fn remote_events(&self) -> Vec<CleanupEvent> {
        self.events()
            .into_iter()
            .filter(|e| matches!(e.target, CleanupTarget::RemoteObject { .. }))
            .collect()
    }

    pub fn failures(&self) -> Vec<CleanupEvent> {
        self.events()
            .into_iter()
            .filter(|e| matches!(e.outcome, CleanupOutcome::Failed(_)))
            .collect()
    }
}

impl CleanupObserver for RecordingCleanupObserver {
    fn record(&self, event: CleanupEvent) {
        self.events.lock().unwrap().push(event);
    }
}
