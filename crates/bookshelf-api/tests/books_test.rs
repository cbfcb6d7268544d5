mod helpers;

use axum_test::multipart::{MultipartForm, Part};
use bookshelf_services::test_helpers::DestroyBehavior;
use helpers::auth::{register_test_user, TestUser};
use helpers::fixtures::{book_form, cover_part, pdf_part};
use helpers::{setup_test_app, TestApp};
use uuid::Uuid;

async fn create_book(app: &TestApp, user: &TestUser, title: &str) -> Uuid {
    let response = app
        .client()
        .post("/api/books")
        .add_header("Authorization", user.bearer())
        .multipart(book_form(title, "Science Fiction"))
        .await;
    assert_eq!(response.status_code(), 201);
    let body: serde_json::Value = response.json();
    Uuid::parse_str(body["id"].as_str().unwrap()).unwrap()
}

#[tokio::test]
async fn test_create_book_stores_remote_urls() {
    let app = setup_test_app().await;
    let user = register_test_user(app.client(), "Frank Herbert", "frank@example.com").await;

    let book_id = create_book(&app, &user, "Dune").await;

    let book = app.books.get(book_id).expect("book stored");
    assert_eq!(book.title, "Dune");
    assert_eq!(book.author_id, user.id);
    assert!(book
        .cover_image
        .starts_with("https://res.cloudinary.com/demo/image/upload/v1/book-covers/cover_"));
    assert!(book
        .file
        .starts_with("https://res.cloudinary.com/demo/raw/upload/v1/book-pdfs/book_"));
    assert!(book.file.ends_with(".pdf"));

    let uploads = app.remote.uploads();
    assert_eq!(uploads.len(), 2);
    assert!(app.staged_files().is_empty());
}

#[tokio::test]
async fn test_create_book_requires_title_and_files() {
    let app = setup_test_app().await;
    let user = register_test_user(app.client(), "Frank", "frank@example.com").await;

    let no_genre = app
        .client()
        .post("/api/books")
        .add_header("Authorization", user.bearer())
        .multipart(
            MultipartForm::new()
                .add_text("title", "Dune")
                .add_part("coverImage", cover_part())
                .add_part("file", pdf_part()),
        )
        .await;
    assert_eq!(no_genre.status_code(), 400);
    assert_eq!(
        no_genre.json::<serde_json::Value>()["error"],
        "Title and genre are required"
    );

    let no_file = app
        .client()
        .post("/api/books")
        .add_header("Authorization", user.bearer())
        .multipart(
            MultipartForm::new()
                .add_text("title", "Dune")
                .add_text("genre", "Science Fiction")
                .add_part("coverImage", cover_part()),
        )
        .await;
    assert_eq!(no_file.status_code(), 400);
    assert_eq!(
        no_file.json::<serde_json::Value>()["error"],
        "Cover image and book file are required"
    );

    assert!(app.remote.uploads().is_empty());
    assert!(app.books.is_empty());
    assert!(app.staged_files().is_empty());
}

#[tokio::test]
async fn test_create_book_rejects_wrong_file_type() {
    let app = setup_test_app().await;
    let user = register_test_user(app.client(), "Frank", "frank@example.com").await;

    let response = app
        .client()
        .post("/api/books")
        .add_header("Authorization", user.bearer())
        .multipart(
            MultipartForm::new()
                .add_text("title", "Dune")
                .add_text("genre", "Science Fiction")
                .add_part("coverImage", cover_part())
                .add_part(
                    "file",
                    Part::bytes(b"plain text".to_vec())
                        .file_name("dune.txt")
                        .mime_type("text/plain"),
                ),
        )
        .await;

    assert_eq!(response.status_code(), 400);
    assert_eq!(
        response.json::<serde_json::Value>()["error"],
        "Only PDF and EPUB files are allowed for books"
    );
    assert!(app.remote.uploads().is_empty());
    assert!(app.staged_files().is_empty());
}

#[tokio::test]
async fn test_create_book_rejects_duplicate_file_field() {
    let app = setup_test_app().await;
    let user = register_test_user(app.client(), "Frank", "frank@example.com").await;

    let response = app
        .client()
        .post("/api/books")
        .add_header("Authorization", user.bearer())
        .multipart(book_form("Dune", "Science Fiction").add_part("coverImage", cover_part()))
        .await;

    assert_eq!(response.status_code(), 400);
    assert!(app.remote.uploads().is_empty());
    assert!(app.staged_files().is_empty());
}

#[tokio::test]
async fn test_create_book_remote_failure_rolls_back_cover() {
    let app = setup_test_app().await;
    let user = register_test_user(app.client(), "Frank", "frank@example.com").await;
    app.remote.fail_uploads_to("book-pdfs");

    let response = app
        .client()
        .post("/api/books")
        .add_header("Authorization", user.bearer())
        .multipart(book_form("Dune", "Science Fiction"))
        .await;

    assert_eq!(response.status_code(), 500);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "Error while uploading the files.");
    assert_eq!(body["code"], "REMOTE_STORE_ERROR");

    assert!(app.books.is_empty());
    let destroys = app.remote.destroys();
    assert_eq!(destroys.len(), 1);
    assert!(destroys[0].0.starts_with("book-covers/cover_"));
    assert!(app.staged_files().is_empty());
}

#[tokio::test]
async fn test_create_book_persist_failure_destroys_uploads() {
    let app = setup_test_app().await;
    let user = register_test_user(app.client(), "Frank", "frank@example.com").await;
    app.books.set_fail_writes(true);

    let response = app
        .client()
        .post("/api/books")
        .add_header("Authorization", user.bearer())
        .multipart(book_form("Dune", "Science Fiction"))
        .await;

    assert_eq!(response.status_code(), 500);
    assert_eq!(app.remote.uploads().len(), 2);
    assert_eq!(app.remote.destroys().len(), 2);
    assert!(app.staged_files().is_empty());
}

#[tokio::test]
async fn test_get_book_is_public_and_nests_author() {
    let app = setup_test_app().await;
    let user = register_test_user(app.client(), "Frank Herbert", "frank@example.com").await;
    let book_id = create_book(&app, &user, "Dune").await;

    let response = app.client().get(&format!("/api/books/{}", book_id)).await;

    assert_eq!(response.status_code(), 200);
    let body: serde_json::Value = response.json();
    assert_eq!(body["title"], "Dune");
    assert_eq!(body["author"]["id"], user.id.to_string());
    assert_eq!(body["author"]["name"], "Frank Herbert");
    assert!(body.get("authorId").is_none());

    let missing = app
        .client()
        .get(&format!("/api/books/{}", Uuid::new_v4()))
        .await;
    assert_eq!(missing.status_code(), 404);
    assert_eq!(missing.json::<serde_json::Value>()["error"], "Book not found.");
}

#[tokio::test]
async fn test_list_books_only_returns_own() {
    let app = setup_test_app().await;
    let frank = register_test_user(app.client(), "Frank", "frank@example.com").await;
    let ursula = register_test_user(app.client(), "Ursula", "ursula@example.com").await;
    create_book(&app, &frank, "Dune").await;
    create_book(&app, &frank, "Children of Dune").await;
    create_book(&app, &ursula, "The Dispossessed").await;

    let body: serde_json::Value = app
        .client()
        .get("/api/books")
        .add_header("Authorization", frank.bearer())
        .await
        .json();

    let titles: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles.len(), 2);
    assert!(!titles.contains(&"The Dispossessed"));

    let anonymous = app.client().get("/api/books").await;
    assert_eq!(anonymous.status_code(), 401);
}

#[tokio::test]
async fn test_update_book_text_only_touches_no_assets() {
    let app = setup_test_app().await;
    let user = register_test_user(app.client(), "Frank", "frank@example.com").await;
    let book_id = create_book(&app, &user, "Dune").await;
    let before = app.books.get(book_id).unwrap();

    let response = app
        .client()
        .patch(&format!("/api/books/{}", book_id))
        .add_header("Authorization", user.bearer())
        .multipart(MultipartForm::new().add_text("title", "Dune Messiah"))
        .await;

    assert_eq!(response.status_code(), 200);
    let body: serde_json::Value = response.json();
    assert_eq!(body["title"], "Dune Messiah");
    assert_eq!(body["genre"], "Science Fiction");

    let after = app.books.get(book_id).unwrap();
    assert_eq!(after.cover_image, before.cover_image);
    assert_eq!(after.file, before.file);
    assert_eq!(app.remote.uploads().len(), 2);
    assert!(app.remote.destroys().is_empty());
}

#[tokio::test]
async fn test_update_book_cover_destroys_only_old_cover() {
    let app = setup_test_app().await;
    let user = register_test_user(app.client(), "Frank", "frank@example.com").await;
    let book_id = create_book(&app, &user, "Dune").await;
    let before = app.books.get(book_id).unwrap();

    let response = app
        .client()
        .patch(&format!("/api/books/{}", book_id))
        .add_header("Authorization", user.bearer())
        .multipart(MultipartForm::new().add_part("coverImage", cover_part()))
        .await;

    assert_eq!(response.status_code(), 200);
    let after = app.books.get(book_id).unwrap();
    assert_ne!(after.cover_image, before.cover_image);
    assert_eq!(after.file, before.file);

    let destroys = app.remote.destroys();
    assert_eq!(destroys.len(), 1);
    assert!(destroys[0].0.starts_with("book-covers/cover_"));
    assert!(before.cover_image.contains(&destroys[0].0));
    assert!(app.staged_files().is_empty());
}

#[tokio::test]
async fn test_update_book_failed_upload_keeps_record() {
    let app = setup_test_app().await;
    let user = register_test_user(app.client(), "Frank", "frank@example.com").await;
    let book_id = create_book(&app, &user, "Dune").await;
    let before = app.books.get(book_id).unwrap();
    app.remote.fail_uploads_to("book-covers");

    let response = app
        .client()
        .patch(&format!("/api/books/{}", book_id))
        .add_header("Authorization", user.bearer())
        .multipart(
            MultipartForm::new()
                .add_text("title", "Renamed")
                .add_part("coverImage", cover_part()),
        )
        .await;

    assert_eq!(response.status_code(), 500);
    let after = app.books.get(book_id).unwrap();
    assert_eq!(after.title, "Dune");
    assert_eq!(after.cover_image, before.cover_image);
    assert!(app.remote.destroys().is_empty());
}

#[tokio::test]
async fn test_other_author_cannot_modify_book() {
    let app = setup_test_app().await;
    let frank = register_test_user(app.client(), "Frank", "frank@example.com").await;
    let mallory = register_test_user(app.client(), "Mallory", "mallory@example.com").await;
    let book_id = create_book(&app, &frank, "Dune").await;

    let update = app
        .client()
        .patch(&format!("/api/books/{}", book_id))
        .add_header("Authorization", mallory.bearer())
        .multipart(MultipartForm::new().add_part("coverImage", cover_part()))
        .await;
    assert_eq!(update.status_code(), 403);
    let body: serde_json::Value = update.json();
    assert_eq!(body["error"], "You can not update others book.");
    assert_eq!(body["code"], "FORBIDDEN");

    let delete = app
        .client()
        .delete(&format!("/api/books/{}", book_id))
        .add_header("Authorization", mallory.bearer())
        .await;
    assert_eq!(delete.status_code(), 403);

    assert!(app.books.get(book_id).is_some());
    assert_eq!(app.remote.uploads().len(), 2);
    assert!(app.remote.destroys().is_empty());
}

#[tokio::test]
async fn test_modify_missing_book_is_not_found() {
    let app = setup_test_app().await;
    let frank = register_test_user(app.client(), "Frank", "frank@example.com").await;
    let missing = Uuid::new_v4();

    let update = app
        .client()
        .patch(&format!("/api/books/{}", missing))
        .add_header("Authorization", frank.bearer())
        .multipart(MultipartForm::new().add_text("title", "Ghost"))
        .await;
    assert_eq!(update.status_code(), 404);
    assert_eq!(update.json::<serde_json::Value>()["code"], "NOT_FOUND");

    let delete = app
        .client()
        .delete(&format!("/api/books/{}", missing))
        .add_header("Authorization", frank.bearer())
        .await;
    assert_eq!(delete.status_code(), 404);
    assert_eq!(delete.json::<serde_json::Value>()["code"], "NOT_FOUND");
    assert!(app.remote.destroys().is_empty());
}

#[tokio::test]
async fn test_delete_book_destroys_assets() {
    let app = setup_test_app().await;
    let user = register_test_user(app.client(), "Frank", "frank@example.com").await;
    let book_id = create_book(&app, &user, "Dune").await;

    let response = app
        .client()
        .delete(&format!("/api/books/{}", book_id))
        .add_header("Authorization", user.bearer())
        .await;

    assert_eq!(response.status_code(), 204);
    assert!(app.books.get(book_id).is_none());
    let destroyed: Vec<String> = app.remote.destroys().into_iter().map(|d| d.0).collect();
    assert_eq!(destroyed.len(), 2);
    assert!(destroyed.iter().any(|id| id.starts_with("book-covers/")));
    assert!(destroyed
        .iter()
        .any(|id| id.starts_with("book-pdfs/") && id.ends_with(".pdf")));

    let again = app
        .client()
        .delete(&format!("/api/books/{}", book_id))
        .add_header("Authorization", user.bearer())
        .await;
    assert_eq!(again.status_code(), 404);
}

#[tokio::test]
async fn test_delete_book_succeeds_when_destroy_fails() {
    let app = setup_test_app().await;
    let user = register_test_user(app.client(), "Frank", "frank@example.com").await;
    let book_id = create_book(&app, &user, "Dune").await;
    app.remote.set_destroy_behavior(DestroyBehavior::Fail);

    let response = app
        .client()
        .delete(&format!("/api/books/{}", book_id))
        .add_header("Authorization", user.bearer())
        .await;

    assert_eq!(response.status_code(), 204);
    assert!(app.books.is_empty());
    assert_eq!(app.remote.destroys().len(), 2);
}
