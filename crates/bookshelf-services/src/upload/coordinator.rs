//! Upload coordinator
//!
//! Orchestrates the upload-and-associate workflow:
//! forward staged files → persist the returned references → delete the staged
//! files → (on replace) delete the superseded remote objects.
//!
//! Ordering guarantees:
//! - every remote upload of a call completes before the record is written
//! - the record write completes before staged files are deleted
//! - superseded objects are destroyed only after the record points at the
//!   new ones
//!
//! Deletions that happen after the outcome is decided are best-effort and go
//! to the [`CleanupObserver`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bookshelf_core::{AppError, AssetKind, AssetReference};
use bookshelf_storage::{derive_public_id, RemoteStore, StorageError, UploadOptions};
use uuid::Uuid;

use super::cleanup::{CleanupEvent, CleanupObserver, CleanupOutcome, CleanupTarget, TracingCleanupObserver};
use super::error::UploadError;
use super::staging::StagedFile;
use super::types::{UploadAttempt, UploadStatus};

/// A staged file that reached the remote store
struct Uploaded {
    attempt: UploadAttempt,
    staged: StagedFile,
    reference: AssetReference,
}

pub struct UploadCoordinator {
    remote: Arc<dyn RemoteStore>,
    upload_timeout: Duration,
    cleanup: Arc<dyn CleanupObserver>,
}

impl UploadCoordinator {
    pub fn new(remote: Arc<dyn RemoteStore>, upload_timeout: Duration) -> Self {
        Self {
            remote,
            upload_timeout,
            cleanup: Arc::new(TracingCleanupObserver),
        }
    }

    pub fn with_cleanup_observer(mut self, observer: Arc<dyn CleanupObserver>) -> Self {
        self.cleanup = observer;
        self
    }

    /// `{prefix}_{owner}_{microseconds since epoch}`. Client filenames never
    /// become remote identities.
    pub fn unique_remote_name(kind: AssetKind, owner_id: Uuid) -> String {
        format!(
            "{}_{}_{}",
            kind.name_prefix(),
            owner_id,
            chrono::Utc::now().timestamp_micros()
        )
    }

    /// Upload one staged file and hand its reference to `persist`.
    ///
    /// If `persist` fails, the new remote object is destroyed best-effort and
    /// the persistence error is returned. The staged file is always deleted.
    pub async fn ingest<T, F, Fut>(
        &self,
        staged: StagedFile,
        owner_id: Uuid,
        persist: F,
    ) -> Result<T, UploadError>
    where
        F: FnOnce(AssetReference) -> Fut,
        Fut: Future<Output = Result<T, AppError>>,
    {
        let uploaded = self.upload_one(staged, owner_id).await?;
        let reference = uploaded.reference.clone();
        let persisted = persist(reference).await;
        self.settle(vec![uploaded], owner_id, persisted).await
    }

    /// Upload several staged files (one record carrying several assets).
    ///
    /// Uploads run sequentially. If any fails, the objects already uploaded
    /// by this call are destroyed, all staged files are deleted and `persist`
    /// is never called.
    pub async fn ingest_all<T, F, Fut>(
        &self,
        staged: Vec<StagedFile>,
        owner_id: Uuid,
        persist: F,
    ) -> Result<T, UploadError>
    where
        F: FnOnce(Vec<AssetReference>) -> Fut,
        Fut: Future<Output = Result<T, AppError>>,
    {
        let (value, _) = self.ingest_many(staged, owner_id, persist).await?;
        Ok(value)
    }

    /// Replace the asset of a record.
    ///
    /// The new file is ingested first; the record and its current reference
    /// stay untouched if that fails. On success, exactly one best-effort
    /// destroy is issued for `existing`.
    pub async fn replace<T, F, Fut>(
        &self,
        existing: Option<AssetReference>,
        staged: StagedFile,
        owner_id: Uuid,
        persist: F,
    ) -> Result<T, UploadError>
    where
        F: FnOnce(AssetReference) -> Fut,
        Fut: Future<Output = Result<T, AppError>>,
    {
        let uploaded = self.upload_one(staged, owner_id).await?;
        let reference = uploaded.reference.clone();
        let persisted = persist(reference.clone()).await;
        let value = self.settle(vec![uploaded], owner_id, persisted).await?;

        if let Some(previous) = existing {
            self.destroy_superseded(&previous, &[reference]).await;
        }

        Ok(value)
    }

    /// Replace several assets of one record at once.
    ///
    /// `previous` holds the record's current references; only those whose
    /// kind is being replaced are destroyed, at most one per kind.
    pub async fn replace_all<T, F, Fut>(
        &self,
        previous: Vec<AssetReference>,
        staged: Vec<StagedFile>,
        owner_id: Uuid,
        persist: F,
    ) -> Result<T, UploadError>
    where
        F: FnOnce(Vec<AssetReference>) -> Fut,
        Fut: Future<Output = Result<T, AppError>>,
    {
        let (value, references) = self.ingest_many(staged, owner_id, persist).await?;

        let mut handled: Vec<AssetKind> = Vec::new();
        for old in previous {
            let kind = old.kind();
            if handled.contains(&kind) || !references.iter().any(|r| r.kind() == kind) {
                continue;
            }
            handled.push(kind);
            self.destroy_superseded(&old, &references).await;
        }

        Ok(value)
    }

    /// Destroy the remote objects of a record, then delete the record.
    ///
    /// Destroy failures (including "not found") are reported and tolerated;
    /// `delete_record` runs regardless.
    pub async fn remove<T, F, Fut>(
        &self,
        references: Vec<AssetReference>,
        delete_record: F,
    ) -> Result<T, UploadError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, AppError>>,
    {
        for reference in &references {
            self.destroy_best_effort(reference).await;
        }

        delete_record().await.map_err(UploadError::Persistence)
    }

    async fn ingest_many<T, F, Fut>(
        &self,
        staged: Vec<StagedFile>,
        owner_id: Uuid,
        persist: F,
    ) -> Result<(T, Vec<AssetReference>), UploadError>
    where
        F: FnOnce(Vec<AssetReference>) -> Fut,
        Fut: Future<Output = Result<T, AppError>>,
    {
        let mut uploaded: Vec<Uploaded> = Vec::with_capacity(staged.len());
        let mut pending = staged.into_iter();

        while let Some(file) = pending.next() {
            match self.upload_one(file, owner_id).await {
                Ok(done) => uploaded.push(done),
                Err(err) => {
                    tracing::warn!(
                        owner_id = %owner_id,
                        already_uploaded = uploaded.len(),
                        "Rolling back uploads after remote failure"
                    );
                    for done in uploaded {
                        self.destroy_best_effort(&done.reference).await;
                        let mut attempt = done.attempt;
                        self.cleanup_temp(&mut attempt, done.staged).await;
                    }
                    for rest in pending {
                        let mut attempt = UploadAttempt::new(
                            rest.kind(),
                            rest.path().to_path_buf(),
                            String::new(),
                        );
                        attempt.advance(UploadStatus::RemoteUploadFailed);
                        self.cleanup_temp(&mut attempt, rest).await;
                    }
                    return Err(err);
                }
            }
        }

        let references: Vec<AssetReference> =
            uploaded.iter().map(|u| u.reference.clone()).collect();
        let persisted = persist(references.clone()).await;
        let value = self.settle(uploaded, owner_id, persisted).await?;
        Ok((value, references))
    }

    /// Forward one staged file. On failure the staged file is deleted here.
    async fn upload_one(&self, staged: StagedFile, owner_id: Uuid) -> Result<Uploaded, UploadError> {
        let kind = staged.kind();
        let mut attempt = UploadAttempt::new(
            kind,
            staged.path().to_path_buf(),
            Self::unique_remote_name(kind, owner_id),
        );

        let options = UploadOptions {
            remote_name: attempt.unique_remote_name.clone(),
            folder: kind.folder().to_string(),
            classification: kind.classification(),
            format: staged.extension(),
        };

        let start = std::time::Instant::now();
        let result =
            tokio::time::timeout(self.upload_timeout, self.remote.upload(staged.path(), &options))
                .await;

        let failure = match result {
            Ok(Ok(upload)) => match AssetReference::new(upload.secure_url, kind) {
                Ok(reference) => {
                    attempt.advance(UploadStatus::RemoteUploadSucceeded);
                    tracing::info!(
                        owner_id = %owner_id,
                        asset_kind = %kind,
                        remote_name = %attempt.unique_remote_name,
                        remote_url = %reference.remote_url(),
                        size_bytes = staged.size(),
                        duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                        "Remote upload succeeded"
                    );
                    return Ok(Uploaded {
                        attempt,
                        staged,
                        reference,
                    });
                }
                Err(e) => e.to_string(),
            },
            Ok(Err(e)) => e.to_string(),
            Err(_) => format!(
                "remote store did not answer within {}s",
                self.upload_timeout.as_secs()
            ),
        };

        attempt.advance(UploadStatus::RemoteUploadFailed);
        tracing::error!(
            owner_id = %owner_id,
            asset_kind = %kind,
            remote_name = %attempt.unique_remote_name,
            error = %failure,
            "Remote upload failed"
        );
        self.cleanup_temp(&mut attempt, staged).await;

        Err(UploadError::RemoteUploadFailed(failure))
    }

    /// Finish a call after the record write: delete staged files and, if the
    /// write failed, the objects it would have referenced.
    async fn settle<T>(
        &self,
        uploaded: Vec<Uploaded>,
        owner_id: Uuid,
        persisted: Result<T, AppError>,
    ) -> Result<T, UploadError> {
        match persisted {
            Ok(value) => {
                for done in uploaded {
                    let mut attempt = done.attempt;
                    attempt.advance(UploadStatus::RecordPersisted);
                    self.cleanup_temp(&mut attempt, done.staged).await;
                }
                Ok(value)
            }
            Err(err) => {
                tracing::error!(
                    owner_id = %owner_id,
                    error = %err,
                    "Record write failed after remote upload, destroying new objects"
                );
                for done in uploaded {
                    self.destroy_best_effort(&done.reference).await;
                    let mut attempt = done.attempt;
                    self.cleanup_temp(&mut attempt, done.staged).await;
                }
                Err(UploadError::Persistence(err))
            }
        }
    }

    async fn destroy_superseded(&self, previous: &AssetReference, current: &[AssetReference]) {
        if current
            .iter()
            .any(|r| r.remote_url() == previous.remote_url())
        {
            return;
        }
        self.destroy_best_effort(previous).await;
    }

    async fn destroy_best_effort(&self, reference: &AssetReference) {
        let kind = reference.kind();
        let classification = kind.classification();

        let public_id = match derive_public_id(reference.remote_url(), classification) {
            Ok(id) => id,
            Err(e) => {
                self.cleanup.record(CleanupEvent {
                    kind,
                    target: CleanupTarget::RemoteObject {
                        public_id: reference.remote_url().to_string(),
                        classification,
                    },
                    outcome: CleanupOutcome::Failed(e.to_string()),
                });
                return;
            }
        };

        let outcome = match tokio::time::timeout(
            self.upload_timeout,
            self.remote.destroy(&public_id, classification),
        )
        .await
        {
            Ok(Ok(())) => CleanupOutcome::Done,
            Ok(Err(StorageError::NotFound(_))) => CleanupOutcome::NotFound,
            Ok(Err(e)) => CleanupOutcome::Failed(e.to_string()),
            Err(_) => CleanupOutcome::Failed("destroy timed out".to_string()),
        };

        self.cleanup.record(CleanupEvent {
            kind,
            target: CleanupTarget::RemoteObject {
                public_id,
                classification,
            },
            outcome,
        });
    }

    async fn cleanup_temp(&self, attempt: &mut UploadAttempt, staged: StagedFile) {
        let kind = staged.kind();
        let path = staged.path().to_path_buf();

        let outcome = match staged.cleanup().await {
            Ok(()) => CleanupOutcome::Done,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => CleanupOutcome::NotFound,
            Err(e) => CleanupOutcome::Failed(e.to_string()),
        };

        if !matches!(outcome, CleanupOutcome::Failed(_)) {
            attempt.advance(UploadStatus::TempCleaned);
        }

        self.cleanup.record(CleanupEvent {
            kind,
            target: CleanupTarget::TempFile { path },
            outcome,
        });
    }
}
