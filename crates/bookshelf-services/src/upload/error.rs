use bookshelf_core::AppError;
use thiserror::Error;

/// Failures of the upload workflow
#[derive(Debug, Error)]
pub enum UploadError {
    /// Content type or size not acceptable for the asset kind
    #[error("{0}")]
    ValidationRejected(String),

    /// The remote store refused the upload or did not answer in time
    #[error("Remote upload failed: {0}")]
    RemoteUploadFailed(String),

    #[error("{0}")]
    RecordNotFound(String),

    #[error("{0}")]
    AccessDenied(String),

    /// The record store failed after the remote side was handled
    #[error(transparent)]
    Persistence(AppError),

    #[error("Staging failed: {0}")]
    Staging(#[from] std::io::Error),
}

impl From<AppError> for UploadError {
    fn from(err: AppError) -> Self {
        UploadError::Persistence(err)
    }
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::ValidationRejected(msg) => AppError::BadRequest(msg),
            UploadError::RemoteUploadFailed(msg) => AppError::RemoteStore(msg),
            UploadError::RecordNotFound(msg) => AppError::NotFound(msg),
            UploadError::AccessDenied(msg) => AppError::Forbidden(msg),
            UploadError::Persistence(err) => err,
            UploadError::Staging(err) => AppError::Internal(format!("Staging failed: {}", err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookshelf_core::ErrorMetadata;

    #[test]
    fn test_upload_error_status_codes() {
        let cases = [
            (UploadError::ValidationRejected("bad".into()), 400),
            (UploadError::RemoteUploadFailed("down".into()), 500),
            (UploadError::RecordNotFound("Book not found".into()), 404),
            (UploadError::AccessDenied("no".into()), 403),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).http_status_code(), status);
        }
    }

    #[test]
    fn test_remote_failure_is_retryable() {
        let err = AppError::from(UploadError::RemoteUploadFailed("timeout".into()));
        assert!(err.is_recoverable());
    }
}
