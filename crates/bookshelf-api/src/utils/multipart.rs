//! Multipart adapter: streams file parts into the staging area and collects
//! the accepted text parts.

use std::collections::HashMap;

use axum::extract::multipart::{Field, MultipartError};
use axum::extract::Multipart;
use bookshelf_core::{AppError, AssetKind};
use bookshelf_services::{StagedFile, StagingArea};

use crate::error::HttpAppError;

/// Parsed multipart body. Dropping it deletes any staged file not yet handed
/// to the upload coordinator.
#[derive(Debug, Default)]
pub struct UploadForm {
    fields: HashMap<String, String>,
    files: Vec<StagedFile>,
}

impl UploadForm {
    /// Take a text part, treating blank values as absent
    pub fn take_text(&mut self, name: &str) -> Option<String> {
        self.fields
            .remove(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    pub fn has_file(&self, kind: AssetKind) -> bool {
        self.files.iter().any(|f| f.kind() == kind)
    }

    pub fn take_file(&mut self, kind: AssetKind) -> Option<StagedFile> {
        let index = self.files.iter().position(|f| f.kind() == kind)?;
        Some(self.files.remove(index))
    }

    pub fn take_files(&mut self) -> Vec<StagedFile> {
        std::mem::take(&mut self.files)
    }
}

fn multipart_error(err: MultipartError) -> HttpAppError {
    HttpAppError(AppError::BadRequest(format!(
        "Invalid multipart body: {}",
        err.body_text()
    )))
}

/// Read the whole body.
///
/// File parts are accepted only under the field names of `file_kinds`, at
/// most once each; anything else carrying a filename is rejected. Text parts
/// outside `text_fields` are ignored.
pub async fn read_upload_form(
    mut multipart: Multipart,
    staging: &StagingArea,
    file_kinds: &[AssetKind],
    text_fields: &[&str],
) -> Result<UploadForm, HttpAppError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();

        let kind = AssetKind::from_field_name(&name).filter(|k| file_kinds.contains(k));
        if let Some(kind) = kind {
            if form.has_file(kind) {
                return Err(HttpAppError(AppError::BadRequest(format!(
                    "Only one file is allowed for field {}",
                    name
                ))));
            }
            let staged = stage_field(field, staging, kind).await?;
            form.files.push(staged);
            continue;
        }

        if field.file_name().is_some() {
            return Err(HttpAppError(AppError::BadRequest(format!(
                "Unexpected file field: {}",
                name
            ))));
        }

        if text_fields.contains(&name.as_str()) {
            let value = field.text().await.map_err(multipart_error)?;
            form.fields.insert(name, value);
        } else {
            tracing::debug!(field = %name, "Ignoring unknown multipart field");
        }
    }

    Ok(form)
}

async fn stage_field(
    mut field: Field<'_>,
    staging: &StagingArea,
    kind: AssetKind,
) -> Result<StagedFile, HttpAppError> {
    let mut writer = staging.begin(kind, field.file_name(), field.content_type())?;

    while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
        writer.write_chunk(&chunk).await?;
    }

    let staged = writer.finish().await?;
    tracing::debug!(
        asset_kind = %kind,
        size_bytes = staged.size(),
        original_filename = %staged.original_filename(),
        "Staged multipart file"
    );
    Ok(staged)
}
