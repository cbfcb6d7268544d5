//! Types used by the upload coordinator

use std::path::PathBuf;

use bookshelf_core::AssetKind;

/// Progress of a single upload attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStatus {
    Staged,
    RemoteUploadSucceeded,
    RemoteUploadFailed,
    RecordPersisted,
    TempCleaned,
}

impl UploadStatus {
    /// Whether the state machine allows moving from `self` to `next`
    pub fn can_transition_to(self, next: UploadStatus) -> bool {
        use UploadStatus::*;
        matches!(
            (self, next),
            (Staged, RemoteUploadSucceeded)
                | (Staged, RemoteUploadFailed)
                | (RemoteUploadSucceeded, RecordPersisted)
                | (RemoteUploadSucceeded, TempCleaned)
                | (RemoteUploadFailed, TempCleaned)
                | (RecordPersisted, TempCleaned)
        )
    }
}

impl std::fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            UploadStatus::Staged => "staged",
            UploadStatus::RemoteUploadSucceeded => "remote_upload_succeeded",
            UploadStatus::RemoteUploadFailed => "remote_upload_failed",
            UploadStatus::RecordPersisted => "record_persisted",
            UploadStatus::TempCleaned => "temp_cleaned",
        };
        f.write_str(s)
    }
}

/// Ephemeral record of one staged file moving through the workflow
#[derive(Debug, Clone)]
pub struct UploadAttempt {
    pub kind: AssetKind,
    pub local_temp_path: PathBuf,
    pub unique_remote_name: String,
    status: UploadStatus,
}

impl UploadAttempt {
    pub fn new(kind: AssetKind, local_temp_path: PathBuf, unique_remote_name: String) -> Self {
        Self {
            kind,
            local_temp_path,
            unique_remote_name,
            status: UploadStatus::Staged,
        }
    }

    pub fn status(&self) -> UploadStatus {
        self.status
    }

    /// Move forward. Illegal transitions are logged and ignored.
    pub fn advance(&mut self, next: UploadStatus) {
        if !self.status.can_transition_to(next) {
            tracing::warn!(
                asset_kind = %self.kind,
                remote_name = %self.unique_remote_name,
                from = %self.status,
                to = %next,
                "Ignoring invalid upload status transition"
            );
            return;
        }
        tracing::debug!(
            asset_kind = %self.kind,
            remote_name = %self.unique_remote_name,
            from = %self.status,
            to = %next,
            "Upload status changed"
        );
        self.status = next;
    }
}
