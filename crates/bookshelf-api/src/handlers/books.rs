use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use bookshelf_core::models::{Book, BookResponse, BookUpdate, CreatedBookResponse, NewBook};
use bookshelf_core::{AppError, AssetKind, AssetReference};
use bookshelf_services::UploadError;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::constants::BOOK_TEXT_FIELDS;
use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use crate::utils::multipart::read_upload_form;

const BOOK_ASSETS: &[AssetKind] = &[AssetKind::CoverImage, AssetKind::BookFile];

/// Current remote references of a book. Values that are not remote URLs are
/// skipped.
fn book_assets(book: &Book) -> Vec<AssetReference> {
    BOOK_ASSETS
        .iter()
        .filter_map(|kind| {
            let url = book.asset_url(*kind)?;
            AssetReference::new(url, *kind)
                .map_err(|e| {
                    tracing::warn!(book_id = %book.id, error = %e, "Skipping malformed asset reference");
                })
                .ok()
        })
        .collect()
}

/// Load a book the caller is allowed to modify
async fn owned_book(state: &AppState, book_id: Uuid, user_id: Uuid) -> Result<Book, UploadError> {
    let book = state
        .books
        .find_by_id(book_id)
        .await?
        .ok_or_else(|| UploadError::RecordNotFound("Book not found".to_string()))?;

    if !book.is_owned_by(user_id) {
        tracing::debug!(book_id = %book_id, author_id = %book.author_id, "Rejected access to another author's book");
        return Err(UploadError::AccessDenied(
            "You can not update others book.".to_string(),
        ));
    }

    Ok(book)
}

#[utoipa::path(
    post,
    path = "/api/books",
    tag = "books",
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Book created", body = CreatedBookResponse),
        (status = 400, description = "Missing field or rejected file", body = ErrorResponse),
        (status = 500, description = "Remote store failure", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, multipart), fields(user_id = %auth.user_id, operation = "create_book"))]
pub async fn create_book(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let mut form =
        read_upload_form(multipart, &state.staging, BOOK_ASSETS, BOOK_TEXT_FIELDS).await?;

    let (Some(title), Some(genre)) = (form.take_text("title"), form.take_text("genre")) else {
        return Err(AppError::BadRequest("Title and genre are required".to_string()).into());
    };
    if !form.has_file(AssetKind::CoverImage) || !form.has_file(AssetKind::BookFile) {
        return Err(
            AppError::BadRequest("Cover image and book file are required".to_string()).into(),
        );
    }
    let description = form.take_text("description");

    let author_id = auth.user_id;
    let books = state.books.clone();
    let book = state
        .uploads
        .ingest_all(form.take_files(), author_id, move |references| async move {
            let mut update = BookUpdate::default();
            for reference in references {
                let kind = reference.kind();
                update.set_asset(kind, reference.into_url());
            }
            let (Some(cover_image), Some(file)) = (update.cover_image, update.file) else {
                return Err(AppError::Internal(
                    "Upload finished without both book assets".to_string(),
                ));
            };

            books
                .create(NewBook {
                    id: Uuid::new_v4(),
                    title,
                    genre,
                    description,
                    author_id,
                    cover_image,
                    file,
                })
                .await
        })
        .await?;

    tracing::info!(book_id = %book.id, "Book created");

    Ok((StatusCode::CREATED, Json(CreatedBookResponse { id: book.id })))
}

#[utoipa::path(
    patch,
    path = "/api/books/{book_id}",
    tag = "books",
    params(("book_id" = Uuid, Path, description = "Book ID")),
    request_body(content = inline(Object), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Updated book", body = BookResponse),
        (status = 403, description = "Caller is not the author", body = ErrorResponse),
        (status = 404, description = "Book not found", body = ErrorResponse),
        (status = 500, description = "Remote store failure", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, multipart), fields(user_id = %auth.user_id, book_id = %book_id))]
pub async fn update_book(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(book_id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<BookResponse>, HttpAppError> {
    let book = owned_book(&state, book_id, auth.user_id).await?;

    let mut form =
        read_upload_form(multipart, &state.staging, BOOK_ASSETS, BOOK_TEXT_FIELDS).await?;

    let update = BookUpdate {
        title: form.take_text("title"),
        genre: form.take_text("genre"),
        description: form.take_text("description"),
        ..BookUpdate::default()
    };
    let staged = form.take_files();

    let books = state.books.clone();
    let apply = move |update: BookUpdate| async move {
        books
            .update(book_id, update)
            .await?
            .ok_or_else(|| AppError::NotFound("Book not found".to_string()))
    };

    let updated = if staged.is_empty() {
        apply(update).await?
    } else {
        state
            .uploads
            .replace_all(book_assets(&book), staged, auth.user_id, move |references| {
                let mut update = update;
                for reference in references {
                    let kind = reference.kind();
                    update.set_asset(kind, reference.into_url());
                }
                apply(update)
            })
            .await?
    };

    Ok(Json(updated.into()))
}

#[utoipa::path(
    get,
    path = "/api/books",
    tag = "books",
    responses(
        (status = 200, description = "Books of the caller", body = Vec<BookResponse>),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state), fields(user_id = %auth.user_id))]
pub async fn list_books(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<Vec<BookResponse>>, HttpAppError> {
    let books = state.books.list_by_author(auth.user_id).await?;
    Ok(Json(books.into_iter().map(BookResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/books/{book_id}",
    tag = "books",
    params(("book_id" = Uuid, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book with author", body = BookResponse),
        (status = 404, description = "Book not found", body = ErrorResponse)
    )
)]
#[tracing::instrument(skip(state))]
pub async fn get_book(
    State(state): State<Arc<AppState>>,
    Path(book_id): Path<Uuid>,
) -> Result<Json<BookResponse>, HttpAppError> {
    let book = state
        .books
        .find_with_author(book_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Book not found.".to_string()))?;

    Ok(Json(book.into()))
}

#[utoipa::path(
    delete,
    path = "/api/books/{book_id}",
    tag = "books",
    params(("book_id" = Uuid, Path, description = "Book ID")),
    responses(
        (status = 204, description = "Book deleted"),
        (status = 403, description = "Caller is not the author", body = ErrorResponse),
        (status = 404, description = "Book not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state), fields(user_id = %auth.user_id, book_id = %book_id))]
pub async fn delete_book(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(book_id): Path<Uuid>,
) -> Result<StatusCode, HttpAppError> {
    let book = owned_book(&state, book_id, auth.user_id).await?;

    let books = state.books.clone();
    let deleted = state
        .uploads
        .remove(book_assets(&book), move || async move { books.delete(book_id).await })
        .await?;

    if !deleted {
        return Err(UploadError::RecordNotFound("Book not found".to_string()).into());
    }

    tracing::info!("Book deleted");
    Ok(StatusCode::NO_CONTENT)
}
