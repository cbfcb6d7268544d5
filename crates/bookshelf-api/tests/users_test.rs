mod helpers;

use axum_test::multipart::{MultipartForm, Part};
use bookshelf_db::UserStore;
use helpers::auth::register_test_user;
use helpers::fixtures::{cover_part, pdf_part};
use helpers::setup_test_app;
use serde_json::json;

#[tokio::test]
async fn test_register_returns_access_token() {
    let app = setup_test_app().await;
    let client = app.client();

    let response = client
        .post("/api/users/register")
        .json(&json!({ "name": "Ada Lovelace", "email": "ada@example.com", "password": "secret" }))
        .await;

    assert_eq!(response.status_code(), 201);
    let body: serde_json::Value = response.json();
    assert!(body["accessToken"].as_str().is_some_and(|t| !t.is_empty()));

    let user = register_test_user(client, "Grace", "grace@example.com").await;
    let stored = app.users.get(user.id).expect("user stored");
    assert_ne!(stored.password_hash, user.password);
}

#[tokio::test]
async fn test_register_rejects_missing_fields() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .post("/api/users/register")
        .json(&json!({ "name": "Ada", "email": "" }))
        .await;

    assert_eq!(response.status_code(), 400);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "All fields are required");
}

#[tokio::test]
async fn test_register_rejects_duplicate_email() {
    let app = setup_test_app().await;
    let client = app.client();
    register_test_user(client, "Ada", "ada@example.com").await;

    let response = client
        .post("/api/users/register")
        .json(&json!({ "name": "Other", "email": "ada@example.com", "password": "x" }))
        .await;

    assert_eq!(response.status_code(), 400);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "User already exists with this email.");
}

#[tokio::test]
async fn test_login_outcomes() {
    let app = setup_test_app().await;
    let client = app.client();
    let user = register_test_user(client, "Ada", "ada@example.com").await;

    let ok = client
        .post("/api/users/login")
        .json(&json!({ "email": user.email, "password": user.password }))
        .await;
    assert_eq!(ok.status_code(), 200);
    let token = ok.json::<serde_json::Value>()["accessToken"]
        .as_str()
        .unwrap()
        .to_string();
    let me = client
        .get("/api/users")
        .add_header("Authorization", format!("Bearer {}", token))
        .await;
    assert_eq!(me.status_code(), 200);

    let wrong = client
        .post("/api/users/login")
        .json(&json!({ "email": user.email, "password": "not-it" }))
        .await;
    assert_eq!(wrong.status_code(), 400);
    assert_eq!(
        wrong.json::<serde_json::Value>()["error"],
        "Username or password incorrect!"
    );

    let unknown = client
        .post("/api/users/login")
        .json(&json!({ "email": "nobody@example.com", "password": "x" }))
        .await;
    assert_eq!(unknown.status_code(), 404);
    assert_eq!(unknown.json::<serde_json::Value>()["error"], "User not found.");
}

#[tokio::test]
async fn test_current_user_requires_token() {
    let app = setup_test_app().await;
    let client = app.client();

    let missing = client.get("/api/users").await;
    assert_eq!(missing.status_code(), 401);

    let invalid = client
        .get("/api/users")
        .add_header("Authorization", "Bearer not-a-jwt")
        .await;
    assert_eq!(invalid.status_code(), 401);
    assert_eq!(invalid.json::<serde_json::Value>()["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_current_user_hides_password_hash() {
    let app = setup_test_app().await;
    let user = register_test_user(app.client(), "Ada Lovelace", "ada@example.com").await;

    let body: serde_json::Value = app
        .client()
        .get("/api/users")
        .add_header("Authorization", user.bearer())
        .await
        .json();

    assert_eq!(body["email"], "ada@example.com");
    assert_eq!(body["name"], "Ada Lovelace");
    assert!(body.get("password").is_none());
    assert!(body.get("passwordHash").is_none());
    assert!(body["profilePhoto"].is_null());
}

#[tokio::test]
async fn test_update_profile_fields() {
    let app = setup_test_app().await;
    let client = app.client();
    let user = register_test_user(client, "Ada", "ada@example.com").await;

    let response = client
        .patch("/api/users")
        .add_header("Authorization", user.bearer())
        .json(&json!({ "bio": "Writes about engines", "email": "ignored@example.com" }))
        .await;
    assert_eq!(response.status_code(), 200);
    let body: serde_json::Value = response.json();
    assert_eq!(body["bio"], "Writes about engines");
    assert_eq!(body["email"], "ada@example.com");

    let empty = client
        .patch("/api/users")
        .add_header("Authorization", user.bearer())
        .json(&json!({ "email": "ignored@example.com" }))
        .await;
    assert_eq!(empty.status_code(), 400);
    assert_eq!(
        empty.json::<serde_json::Value>()["error"],
        "No valid fields to update"
    );
}

#[tokio::test]
async fn test_profile_photo_replacement_destroys_previous() {
    let app = setup_test_app().await;
    let client = app.client();
    let user = register_test_user(client, "Ada", "ada@example.com").await;

    let first: serde_json::Value = client
        .put("/api/users/profile-photo")
        .add_header("Authorization", user.bearer())
        .multipart(MultipartForm::new().add_part("profilePhoto", cover_part()))
        .await
        .json();
    let first_url = first["profilePhoto"].as_str().unwrap().to_string();
    assert!(first_url.contains("/image/upload/v1/profile-photos/profile_"));
    assert!(app.remote.destroys().is_empty());

    let second = client
        .put("/api/users/profile-photo")
        .add_header("Authorization", user.bearer())
        .multipart(MultipartForm::new().add_part("profilePhoto", cover_part()))
        .await;
    assert_eq!(second.status_code(), 200);
    let second_url = second.json::<serde_json::Value>()["profilePhoto"]
        .as_str()
        .unwrap()
        .to_string();
    assert_ne!(first_url, second_url);

    let destroys = app.remote.destroys();
    assert_eq!(destroys.len(), 1);
    assert!(destroys[0].0.starts_with("profile-photos/profile_"));
    assert_eq!(
        app.users.get(user.id).unwrap().profile_photo.as_deref(),
        Some(second_url.as_str())
    );
    assert!(app.staged_files().is_empty());
}

#[tokio::test]
async fn test_profile_photo_replacement_skips_malformed_previous() {
    let app = setup_test_app().await;
    let client = app.client();
    let user = register_test_user(client, "Ada", "ada@example.com").await;
    app.users
        .set_profile_photo(user.id, "uploads/old-photo.jpg")
        .await
        .unwrap();

    let response = client
        .put("/api/users/profile-photo")
        .add_header("Authorization", user.bearer())
        .multipart(MultipartForm::new().add_part("profilePhoto", cover_part()))
        .await;
    assert_eq!(response.status_code(), 200);

    assert!(app.remote.destroys().is_empty());
    let stored = app.users.get(user.id).unwrap().profile_photo.unwrap();
    assert!(stored.contains("/profile-photos/profile_"));
}

#[tokio::test]
async fn test_profile_photo_rejects_non_images() {
    let app = setup_test_app().await;
    let client = app.client();
    let user = register_test_user(client, "Ada", "ada@example.com").await;

    let response = client
        .put("/api/users/profile-photo")
        .add_header("Authorization", user.bearer())
        .multipart(MultipartForm::new().add_part("profilePhoto", pdf_part()))
        .await;

    assert_eq!(response.status_code(), 400);
    assert_eq!(
        response.json::<serde_json::Value>()["error"],
        "Only image files are allowed for profile photos"
    );
    assert!(app.remote.uploads().is_empty());
    assert!(app.users.get(user.id).unwrap().profile_photo.is_none());
    assert!(app.staged_files().is_empty());

    let missing = client
        .put("/api/users/profile-photo")
        .add_header("Authorization", user.bearer())
        .multipart(MultipartForm::new().add_part(
            "avatar",
            Part::bytes(vec![1, 2, 3]).file_name("a.png").mime_type("image/png"),
        ))
        .await;
    assert_eq!(missing.status_code(), 400);
}
