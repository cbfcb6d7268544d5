//! Deletion identifier derivation
//!
//! Stored references are public URLs. The remote store deletes by identifier,
//! which is recovered from the last two path segments of the URL:
//!
//! - image: `{folder}/{basename without extension}`
//! - raw: `{folder}/{filename}`
//!
//! This is the only place that knows the URL shape of the remote store.

use bookshelf_core::ResourceClassification;

use crate::traits::{StorageError, StorageResult};

/// Derive the remote deletion identifier of a stored URL
pub fn derive_public_id(url: &str, classification: ResourceClassification) -> StorageResult<String> {
    let path = url
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .trim_end_matches('/');

    let mut segments = path.rsplit('/');
    let filename = segments.next().filter(|s| !s.is_empty());
    let folder = segments.next().filter(|s| !s.is_empty() && !s.contains(':'));

    let (folder, filename) = match (folder, filename) {
        (Some(folder), Some(filename)) => (folder, filename),
        _ => {
            return Err(StorageError::InvalidKey(format!(
                "Cannot derive an object identifier from '{}'",
                url
            )))
        }
    };

    let name = match classification {
        ResourceClassification::Image => filename
            .rsplit_once('.')
            .map(|(stem, _)| stem)
            .unwrap_or(filename),
        ResourceClassification::Raw => filename,
    };

    if name.is_empty() {
        return Err(StorageError::InvalidKey(format!(
            "Cannot derive an object identifier from '{}'",
            url
        )));
    }

    Ok(format!("{}/{}", folder, name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_identifier_drops_extension() {
        let url = "https://res.cloudinary.com/demo/image/upload/v1712345678/book-covers/cover_u1_1712345678000000.jpg";
        assert_eq!(
            derive_public_id(url, ResourceClassification::Image).unwrap(),
            "book-covers/cover_u1_1712345678000000"
        );
    }

    #[test]
    fn test_raw_identifier_keeps_extension() {
        let url = "https://res.cloudinary.com/demo/raw/upload/v1712345678/book-pdfs/book_u1_1712345678000000.pdf";
        assert_eq!(
            derive_public_id(url, ResourceClassification::Raw).unwrap(),
            "book-pdfs/book_u1_1712345678000000.pdf"
        );
    }

    #[test]
    fn test_query_string_is_ignored() {
        let url = "http://localhost:3000/files/image/profile-photos/profile_u2_1.png?v=3";
        assert_eq!(
            derive_public_id(url, ResourceClassification::Image).unwrap(),
            "profile-photos/profile_u2_1"
        );
    }

    #[test]
    fn test_url_without_folder_is_rejected() {
        assert!(derive_public_id("https://cdn.example.com", ResourceClassification::Raw).is_err());
        assert!(derive_public_id("", ResourceClassification::Image).is_err());
    }
}
