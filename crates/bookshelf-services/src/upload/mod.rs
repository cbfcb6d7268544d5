//! Upload workflow
//!
//! stage → forward to the remote store → persist the reference → delete the
//! staged file → (on replace) delete the superseded remote object.

pub mod cleanup;
pub mod coordinator;
pub mod error;
pub mod staging;
pub mod types;

pub use cleanup::{CleanupEvent, CleanupObserver, CleanupOutcome, CleanupTarget, TracingCleanupObserver};
pub use coordinator::UploadCoordinator;
pub use error::UploadError;
pub use staging::{StagedFile, StagingArea, StagingWriter};
pub use types::{UploadAttempt, UploadStatus};
