//! Best-effort cleanup reporting
//!
//! Deleting staged files and superseded remote objects never fails a request.
//! Each attempt is reported to a [`CleanupObserver`] instead.

use std::path::PathBuf;

use bookshelf_core::{AssetKind, ResourceClassification};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupTarget {
    TempFile {
        path: PathBuf,
    },
    RemoteObject {
        public_id: String,
        classification: ResourceClassification,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupOutcome {
    Done,
    /// Already gone
    NotFound,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupEvent {
    pub kind: AssetKind,
    pub target: CleanupTarget,
    pub outcome: CleanupOutcome,
}

/// Receives the outcome of every cleanup attempt
pub trait CleanupObserver: Send + Sync {
    fn record(&self, event: CleanupEvent);
}

/// Default observer: structured log events
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingCleanupObserver;

impl CleanupObserver for TracingCleanupObserver {
    fn record(&self, event: CleanupEvent) {
        let target = match &event.target {
            CleanupTarget::TempFile { path } => format!("temp file {}", path.display()),
            CleanupTarget::RemoteObject {
                public_id,
                classification,
            } => format!("{} object {}", classification, public_id),
        };

        match &event.outcome {
            CleanupOutcome::Done => {
                tracing::debug!(asset_kind = %event.kind, target = %target, "Cleanup completed");
            }
            CleanupOutcome::NotFound => {
                tracing::info!(
                    asset_kind = %event.kind,
                    target = %target,
                    "Cleanup target already removed"
                );
            }
            CleanupOutcome::Failed(error) => {
                tracing::warn!(
                    asset_kind = %event.kind,
                    target = %target,
                    error = %error,
                    "Cleanup failed, leaving orphan"
                );
            }
        }
    }
}
