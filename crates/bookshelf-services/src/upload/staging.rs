//! Local staging of uploaded files
//!
//! Incoming file fields are validated and written chunk by chunk into a
//! uniquely named temp file. The temp file is removed when its handle is
//! dropped, so an aborted request never leaves a staged file behind.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use bookshelf_core::models::extension_for_content_type;
use bookshelf_core::{AssetKind, Config};
use tempfile::TempPath;
use tokio::io::AsyncWriteExt;

use super::error::UploadError;

/// Normalize MIME type by stripping parameters (e.g. "image/jpeg; charset=utf-8" -> "image/jpeg").
fn normalize_mime_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .map(|s| s.trim())
        .unwrap_or(content_type)
        .to_lowercase()
}

/// Keep only the final path component and safe characters of a client filename
fn sanitize_filename(filename: &str) -> String {
    const MAX_FILENAME_LENGTH: usize = 255;

    let filename_only = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(filename);

    let sanitized: String = filename_only
        .chars()
        .take(MAX_FILENAME_LENGTH)
        .map(|c| {
            if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.trim_matches(['.', '_']).is_empty() {
        return "file".to_string();
    }

    sanitized
}

/// Directory where uploads are staged before being forwarded
#[derive(Debug, Clone)]
pub struct StagingArea {
    dir: PathBuf,
    max_size: usize,
    allowed_content_types: HashMap<AssetKind, Vec<String>>,
}

impl StagingArea {
    pub async fn new(
        dir: impl Into<PathBuf>,
        max_size: usize,
        allowed_content_types: HashMap<AssetKind, Vec<String>>,
    ) -> Result<Self, UploadError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;

        let allowed_content_types = allowed_content_types
            .into_iter()
            .map(|(kind, types)| (kind, types.iter().map(|t| normalize_mime_type(t)).collect()))
            .collect();

        Ok(Self {
            dir,
            max_size,
            allowed_content_types,
        })
    }

    pub async fn from_config(config: &Config) -> Result<Self, UploadError> {
        let allowed = HashMap::from([
            (
                AssetKind::CoverImage,
                config.cover_allowed_content_types().to_vec(),
            ),
            (
                AssetKind::BookFile,
                config.book_file_allowed_content_types().to_vec(),
            ),
            (
                AssetKind::ProfilePhoto,
                config.profile_photo_allowed_content_types().to_vec(),
            ),
        ]);
        Self::new(config.staging_dir(), config.max_upload_size_bytes(), allowed).await
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Check a declared content type against the allow-list of `kind`.
    /// Returns the normalized MIME type.
    pub fn validate_content_type(
        &self,
        kind: AssetKind,
        content_type: Option<&str>,
    ) -> Result<String, UploadError> {
        let normalized = content_type.map(normalize_mime_type).unwrap_or_default();
        let allowed = self
            .allowed_content_types
            .get(&kind)
            .map(|types| types.iter().any(|t| *t == normalized))
            .unwrap_or(false);

        if !allowed {
            tracing::debug!(
                asset_kind = %kind,
                content_type = %normalized,
                "Rejected upload content type"
            );
            return Err(UploadError::ValidationRejected(
                kind.rejection_message().to_string(),
            ));
        }

        Ok(normalized)
    }

    /// Validate the field metadata and open a temp file for its contents
    pub fn begin(
        &self,
        kind: AssetKind,
        original_filename: Option<&str>,
        content_type: Option<&str>,
    ) -> Result<StagingWriter, UploadError> {
        let content_type = self.validate_content_type(kind, content_type)?;
        let original_filename = sanitize_filename(original_filename.unwrap_or("file"));

        let suffix = extension_for_content_type(&content_type)
            .map(|ext| format!(".{}", ext))
            .unwrap_or_default();
        let named = tempfile::Builder::new()
            .prefix(&format!("{}-", kind.field_name()))
            .suffix(&suffix)
            .tempfile_in(&self.dir)?;
        let (file, path) = named.into_parts();

        tracing::debug!(
            asset_kind = %kind,
            path = %path.display(),
            original_filename = %original_filename,
            "Staging upload"
        );

        Ok(StagingWriter {
            file: tokio::fs::File::from_std(file),
            path,
            kind,
            original_filename,
            content_type,
            written: 0,
            max_size: self.max_size,
        })
    }

    /// Stage a complete in-memory file
    pub async fn stage_bytes(
        &self,
        kind: AssetKind,
        original_filename: Option<&str>,
        content_type: Option<&str>,
        data: &[u8],
    ) -> Result<StagedFile, UploadError> {
        let mut writer = self.begin(kind, original_filename, content_type)?;
        writer.write_chunk(data).await?;
        writer.finish().await
    }
}

/// Open temp file receiving one file field
#[derive(Debug)]
pub struct StagingWriter {
    file: tokio::fs::File,
    path: TempPath,
    kind: AssetKind,
    original_filename: String,
    content_type: String,
    written: usize,
    max_size: usize,
}

impl StagingWriter {
    pub fn kind(&self) -> AssetKind {
        self.kind
    }

    /// Append a chunk, enforcing the size ceiling
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), UploadError> {
        if self.written + chunk.len() > self.max_size {
            tracing::debug!(
                asset_kind = %self.kind,
                max_size = self.max_size,
                "Rejected upload exceeding size ceiling"
            );
            return Err(UploadError::ValidationRejected(format!(
                "File size exceeds maximum allowed size of {} MB",
                self.max_size / 1024 / 1024
            )));
        }

        self.file.write_all(chunk).await?;
        self.written += chunk.len();
        Ok(())
    }

    pub async fn finish(mut self) -> Result<StagedFile, UploadError> {
        self.file.flush().await?;
        self.file.sync_all().await?;

        if self.written == 0 {
            return Err(UploadError::ValidationRejected(format!(
                "Uploaded file for {} is empty",
                self.kind.field_name()
            )));
        }

        Ok(StagedFile {
            path: self.path,
            kind: self.kind,
            original_filename: self.original_filename,
            content_type: self.content_type,
            size: self.written,
        })
    }
}

/// A validated file on local disk, removed on drop
#[derive(Debug)]
pub struct StagedFile {
    path: TempPath,
    kind: AssetKind,
    original_filename: String,
    content_type: String,
    size: usize,
}

impl StagedFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> AssetKind {
        self.kind
    }

    pub fn original_filename(&self) -> &str {
        &self.original_filename
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Extension of the stored object, from the content type or else the
    /// original filename
    pub fn extension(&self) -> Option<String> {
        extension_for_content_type(&self.content_type)
            .map(str::to_string)
            .or_else(|| {
                Path::new(&self.original_filename)
                    .extension()
                    .and_then(|e| e.to_str())
                    .filter(|e| e.chars().all(|c| c.is_ascii_alphanumeric()))
                    .map(str::to_lowercase)
            })
    }

    /// Delete the staged file, reporting the error instead of swallowing it
    pub async fn cleanup(self) -> io::Result<()> {
        let path = self.path.keep().map_err(|e| e.error)?;
        tokio::fs::remove_file(&path).await
    }
}
