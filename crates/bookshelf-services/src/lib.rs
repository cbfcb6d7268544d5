//! Bookshelf services
//!
//! Upload staging and coordination between the staging area, the remote
//! object store and the record stores, plus the text generation client used
//! to polish book descriptions.

pub mod text;
pub mod upload;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use text::{DescriptionPolisher, GenerationParams, NlpCloudClient, TextGenerator};
pub use upload::{
    CleanupEvent, CleanupObserver, CleanupOutcome, StagedFile, StagingArea, StagingWriter,
    TracingCleanupObserver, UploadCoordinator, UploadError,
};
