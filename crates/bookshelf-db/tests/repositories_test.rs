mod helpers;

use bookshelf_core::models::{AssetKind, BookUpdate, NewUser, UserProfileUpdate};
use bookshelf_core::{AppError, ErrorMetadata};
use bookshelf_db::{BookRepository, BookStore, UserRepository, UserStore};
use helpers::{insert_user, new_book, setup_test_db};
use uuid::Uuid;

#[tokio::test]
async fn test_duplicate_email_is_bad_request() {
    let Some(db) = setup_test_db().await else {
        return;
    };
    let users = UserRepository::new(db.pool.clone());
    insert_user(&db.pool, "Ada Lovelace", "ada@example.com").await;

    let err = users
        .create(NewUser::new(
            "Another Ada".to_string(),
            "ada@example.com".to_string(),
            "hash".to_string(),
        ))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::BadRequest(_)), "got {err:?}");
    assert_eq!(err.http_status_code(), 400);
}

#[tokio::test]
async fn test_duplicate_username_on_profile_update_is_bad_request() {
    let Some(db) = setup_test_db().await else {
        return;
    };
    let users = UserRepository::new(db.pool.clone());
    let ada = insert_user(&db.pool, "Ada", "ada@example.com").await;
    let grace = insert_user(&db.pool, "Grace", "grace@example.com").await;

    let err = users
        .update_profile(
            grace.id,
            UserProfileUpdate {
                username: Some(ada.username.clone()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::BadRequest(_)), "got {err:?}");
}

#[tokio::test]
async fn test_profile_update_keeps_untouched_columns() {
    let Some(db) = setup_test_db().await else {
        return;
    };
    let users = UserRepository::new(db.pool.clone());
    let ada = insert_user(&db.pool, "Ada", "ada@example.com").await;

    let updated = users
        .update_profile(
            ada.id,
            UserProfileUpdate {
                bio: Some("Mathematician".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap()
        .expect("user exists");

    assert_eq!(updated.bio.as_deref(), Some("Mathematician"));
    assert_eq!(updated.name, "Ada");
    assert_eq!(updated.username, ada.username);
    assert_eq!(updated.email, "ada@example.com");

    let found = users.find_by_email("ada@example.com").await.unwrap();
    assert_eq!(found.map(|u| u.id), Some(ada.id));
}

#[tokio::test]
async fn test_profile_photo_must_be_remote_url() {
    let Some(db) = setup_test_db().await else {
        return;
    };
    let users = UserRepository::new(db.pool.clone());
    let ada = insert_user(&db.pool, "Ada", "ada@example.com").await;

    let err = users
        .set_profile_photo(ada.id, "/tmp/upload-123.jpg")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Database(_)), "got {err:?}");

    let url = "https://res.example.com/image/upload/profile-photos/profile_1.jpg";
    let updated = users
        .set_profile_photo(ada.id, url)
        .await
        .unwrap()
        .expect("user exists");
    assert_eq!(updated.profile_photo.as_deref(), Some(url));
}

#[tokio::test]
async fn test_book_joins_author_name() {
    let Some(db) = setup_test_db().await else {
        return;
    };
    let books = BookRepository::new(db.pool.clone());
    let ada = insert_user(&db.pool, "Ada Lovelace", "ada@example.com").await;
    let grace = insert_user(&db.pool, "Grace Hopper", "grace@example.com").await;

    let created = books.create(new_book(ada.id, "Notes")).await.unwrap();
    books.create(new_book(grace.id, "Compilers")).await.unwrap();

    let found = books
        .find_with_author(created.id)
        .await
        .unwrap()
        .expect("book exists");
    assert_eq!(found.author_name, "Ada Lovelace");
    assert_eq!(found.book.title, "Notes");

    let listed = books.list_by_author(ada.id).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].book.id, created.id);
    assert_eq!(listed[0].author_name, "Ada Lovelace");
}

#[tokio::test]
async fn test_book_update_keeps_untouched_columns() {
    let Some(db) = setup_test_db().await else {
        return;
    };
    let books = BookRepository::new(db.pool.clone());
    let ada = insert_user(&db.pool, "Ada Lovelace", "ada@example.com").await;
    let created = books.create(new_book(ada.id, "Notes")).await.unwrap();

    let new_cover = "https://res.example.com/image/upload/book-covers/cover_new.jpg";
    let mut update = BookUpdate {
        title: Some("Notes, Revised".to_string()),
        ..Default::default()
    };
    update.set_asset(AssetKind::CoverImage, new_cover.to_string());

    let updated = books
        .update(created.id, update)
        .await
        .unwrap()
        .expect("book exists");

    assert_eq!(updated.author_name, "Ada Lovelace");
    assert_eq!(updated.book.title, "Notes, Revised");
    assert_eq!(updated.book.cover_image, new_cover);
    assert_eq!(updated.book.genre, created.genre);
    assert_eq!(updated.book.description, created.description);
    assert_eq!(updated.book.file, created.file);
    assert!(updated.book.updated_at >= created.updated_at);
}

#[tokio::test]
async fn test_book_update_missing_id_is_none() {
    let Some(db) = setup_test_db().await else {
        return;
    };
    let books = BookRepository::new(db.pool.clone());

    let result = books
        .update(
            Uuid::new_v4(),
            BookUpdate {
                title: Some("Ghost".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert!(result.is_none());
}

#[tokio::test]
async fn test_book_asset_must_be_remote_url() {
    let Some(db) = setup_test_db().await else {
        return;
    };
    let books = BookRepository::new(db.pool.clone());
    let ada = insert_user(&db.pool, "Ada", "ada@example.com").await;

    let mut book = new_book(ada.id, "Notes");
    book.file = "uploads/book.pdf".to_string();

    let err = books.create(book).await.unwrap_err();
    assert!(matches!(err, AppError::Database(_)), "got {err:?}");
    assert!(books.list_by_author(ada.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_book_delete_reports_whether_row_existed() {
    let Some(db) = setup_test_db().await else {
        return;
    };
    let books = BookRepository::new(db.pool.clone());
    let ada = insert_user(&db.pool, "Ada", "ada@example.com").await;
    let created = books.create(new_book(ada.id, "Notes")).await.unwrap();

    assert!(books.delete(created.id).await.unwrap());
    assert!(!books.delete(created.id).await.unwrap());
    assert!(books.find_by_id(created.id).await.unwrap().is_none());
}
