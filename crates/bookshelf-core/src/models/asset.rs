use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;

/// How the remote store treats an object.
///
/// Images may be transformed when served; raw objects are opaque bytes and
/// must never be transcoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ResourceClassification {
    Image,
    Raw,
}

impl ResourceClassification {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceClassification::Image => "image",
            ResourceClassification::Raw => "raw",
        }
    }
}

impl std::fmt::Display for ResourceClassification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The role an uploaded file plays on its owning record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    CoverImage,
    BookFile,
    ProfilePhoto,
}

impl AssetKind {
    pub const ALL: [AssetKind; 3] = [
        AssetKind::CoverImage,
        AssetKind::BookFile,
        AssetKind::ProfilePhoto,
    ];

    /// Remote folder the kind is stored under
    pub fn folder(&self) -> &'static str {
        match self {
            AssetKind::CoverImage => "book-covers",
            AssetKind::BookFile => "book-pdfs",
            AssetKind::ProfilePhoto => "profile-photos",
        }
    }

    pub fn classification(&self) -> ResourceClassification {
        match self {
            AssetKind::CoverImage | AssetKind::ProfilePhoto => ResourceClassification::Image,
            AssetKind::BookFile => ResourceClassification::Raw,
        }
    }

    /// Prefix of generated remote names
    pub fn name_prefix(&self) -> &'static str {
        match self {
            AssetKind::CoverImage => "cover",
            AssetKind::BookFile => "book",
            AssetKind::ProfilePhoto => "profile",
        }
    }

    /// Multipart field that carries this kind
    pub fn field_name(&self) -> &'static str {
        match self {
            AssetKind::CoverImage => "coverImage",
            AssetKind::BookFile => "file",
            AssetKind::ProfilePhoto => "profilePhoto",
        }
    }

    pub fn from_field_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.field_name() == name)
    }

    pub fn rejection_message(&self) -> &'static str {
        match self {
            AssetKind::CoverImage => "Only image files are allowed for cover images",
            AssetKind::BookFile => "Only PDF and EPUB files are allowed for books",
            AssetKind::ProfilePhoto => "Only image files are allowed for profile photos",
        }
    }
}

impl std::fmt::Display for AssetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetKind::CoverImage => f.write_str("cover_image"),
            AssetKind::BookFile => f.write_str("book_file"),
            AssetKind::ProfilePhoto => f.write_str("profile_photo"),
        }
    }
}

/// File extension the remote object gets for a given (normalized) content type.
pub fn extension_for_content_type(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "application/pdf" => Some("pdf"),
        "application/epub+zip" => Some("epub"),
        _ => None,
    }
}

/// Reference to an object successfully stored remotely.
///
/// Only fully-qualified `http(s)` URLs are accepted so a local staging path
/// can never end up persisted on a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetReference {
    remote_url: String,
    kind: AssetKind,
}

impl AssetReference {
    pub fn new(remote_url: impl Into<String>, kind: AssetKind) -> Result<Self, AppError> {
        let remote_url = remote_url.into();
        if !(remote_url.starts_with("https://") || remote_url.starts_with("http://")) {
            return Err(AppError::Internal(format!(
                "Asset reference for {} must be a remote URL, got '{}'",
                kind, remote_url
            )));
        }
        Ok(Self { remote_url, kind })
    }

    pub fn remote_url(&self) -> &str {
        &self.remote_url
    }

    pub fn kind(&self) -> AssetKind {
        self.kind
    }

    pub fn into_url(self) -> String {
        self.remote_url
    }
}
