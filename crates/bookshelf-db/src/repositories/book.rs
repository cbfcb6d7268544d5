use async_trait::async_trait;
use bookshelf_core::models::{Book, BookUpdate, BookWithAuthor, NewBook};
use bookshelf_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

const BOOK_COLUMNS: &str =
    "id, title, genre, description, author_id, cover_image, file, created_at, updated_at";

const BOOK_WITH_AUTHOR_COLUMNS: &str = "b.id, b.title, b.genre, b.description, b.author_id, \
     b.cover_image, b.file, b.created_at, b.updated_at, u.name AS author_name";

/// Persistence operations on books
#[async_trait]
pub trait BookStore: Send + Sync {
    async fn create(&self, book: NewBook) -> Result<Book, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Book>, AppError>;

    /// Fetch a book together with its author's name
    async fn find_with_author(&self, id: Uuid) -> Result<Option<BookWithAuthor>, AppError>;

    async fn list_by_author(&self, author_id: Uuid) -> Result<Vec<BookWithAuthor>, AppError>;

    /// Apply a partial update. Returns `None` when the book does not exist.
    async fn update(
        &self,
        id: Uuid,
        update: BookUpdate,
    ) -> Result<Option<BookWithAuthor>, AppError>;

    /// Returns whether a row was deleted
    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;
}

/// Repository for the `books` table
#[derive(Clone)]
pub struct BookRepository {
    pool: PgPool,
}

impl BookRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookStore for BookRepository {
    #[tracing::instrument(skip(self, book), fields(db.table = "books", db.operation = "insert", db.record_id = %book.id))]
    async fn create(&self, book: NewBook) -> Result<Book, AppError> {
        let query = format!(
            r#"
            INSERT INTO books (id, title, genre, description, author_id, cover_image, file)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            BOOK_COLUMNS
        );

        let created = sqlx::query_as::<Postgres, Book>(&query)
            .bind(book.id)
            .bind(&book.title)
            .bind(&book.genre)
            .bind(&book.description)
            .bind(book.author_id)
            .bind(&book.cover_image)
            .bind(&book.file)
            .fetch_one(&self.pool)
            .await?;

        Ok(created)
    }

    #[tracing::instrument(skip(self), fields(db.table = "books", db.operation = "select", db.record_id = %id))]
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Book>, AppError> {
        let query = format!("SELECT {} FROM books WHERE id = $1", BOOK_COLUMNS);

        let book = sqlx::query_as::<Postgres, Book>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(book)
    }

    #[tracing::instrument(skip(self), fields(db.table = "books", db.operation = "select", db.record_id = %id))]
    async fn find_with_author(&self, id: Uuid) -> Result<Option<BookWithAuthor>, AppError> {
        let query = format!(
            "SELECT {} FROM books b JOIN users u ON u.id = b.author_id WHERE b.id = $1",
            BOOK_WITH_AUTHOR_COLUMNS
        );

        let book = sqlx::query_as::<Postgres, BookWithAuthor>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(book)
    }

    #[tracing::instrument(skip(self), fields(db.table = "books", db.operation = "select"))]
    async fn list_by_author(&self, author_id: Uuid) -> Result<Vec<BookWithAuthor>, AppError> {
        let query = format!(
            "SELECT {} FROM books b JOIN users u ON u.id = b.author_id \
             WHERE b.author_id = $1 ORDER BY b.created_at DESC",
            BOOK_WITH_AUTHOR_COLUMNS
        );

        let books = sqlx::query_as::<Postgres, BookWithAuthor>(&query)
            .bind(author_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(books)
    }

    #[tracing::instrument(skip(self, update), fields(db.table = "books", db.operation = "update", db.record_id = %id))]
    async fn update(
        &self,
        id: Uuid,
        update: BookUpdate,
    ) -> Result<Option<BookWithAuthor>, AppError> {
        let query = format!(
            r#"
            WITH b AS (
                UPDATE books
                SET title = COALESCE($2, title),
                    genre = COALESCE($3, genre),
                    description = COALESCE($4, description),
                    cover_image = COALESCE($5, cover_image),
                    file = COALESCE($6, file),
                    updated_at = NOW()
                WHERE id = $1
                RETURNING {}
            )
            SELECT {} FROM b JOIN users u ON u.id = b.author_id
            "#,
            BOOK_COLUMNS, BOOK_WITH_AUTHOR_COLUMNS
        );

        let book = sqlx::query_as::<Postgres, BookWithAuthor>(&query)
            .bind(id)
            .bind(update.title)
            .bind(update.genre)
            .bind(update.description)
            .bind(update.cover_image)
            .bind(update.file)
            .fetch_optional(&self.pool)
            .await?;

        Ok(book)
    }

    #[tracing::instrument(skip(self), fields(db.table = "books", db.operation = "delete", db.record_id = %id))]
    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
