use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::asset::AssetKind;

/// Book row
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub genre: String,
    pub description: Option<String>,
    pub author_id: Uuid,
    pub cover_image: String,
    pub file: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Book {
    /// Stored URL for an asset kind carried by books
    pub fn asset_url(&self, kind: AssetKind) -> Option<&str> {
        match kind {
            AssetKind::CoverImage => Some(&self.cover_image),
            AssetKind::BookFile => Some(&self.file),
            AssetKind::ProfilePhoto => None,
        }
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.author_id == user_id
    }
}

/// Book joined with its author's display name
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct BookWithAuthor {
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub book: Book,
    pub author_name: String,
}

/// Values for a book about to be inserted
#[derive(Debug, Clone)]
pub struct NewBook {
    pub id: Uuid,
    pub title: String,
    pub genre: String,
    pub description: Option<String>,
    pub author_id: Uuid,
    pub cover_image: String,
    pub file: String,
}

/// Partial update of a book. `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct BookUpdate {
    pub title: Option<String>,
    pub genre: Option<String>,
    pub description: Option<String>,
    pub cover_image: Option<String>,
    pub file: Option<String>,
}

impl BookUpdate {
    pub fn set_asset(&mut self, kind: AssetKind, url: String) {
        match kind {
            AssetKind::CoverImage => self.cover_image = Some(url),
            AssetKind::BookFile => self.file = Some(url),
            AssetKind::ProfilePhoto => {}
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthorSummary {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookResponse {
    pub id: Uuid,
    pub title: String,
    pub genre: String,
    pub description: Option<String>,
    pub author: AuthorSummary,
    pub cover_image: String,
    pub file: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<BookWithAuthor> for BookResponse {
    fn from(row: BookWithAuthor) -> Self {
        let BookWithAuthor { book, author_name } = row;
        Self {
            id: book.id,
            title: book.title,
            genre: book.genre,
            description: book.description,
            author: AuthorSummary {
                id: book.author_id,
                name: author_name,
            },
            cover_image: book.cover_image,
            file: book.file,
            created_at: book.created_at,
            updated_at: book.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreatedBookResponse {
    pub id: Uuid,
}
