use axum_test::TestServer;
use serde_json::json;
use uuid::Uuid;

/// Registered user with a valid access token
pub struct TestUser {
    pub id: Uuid,
    pub email: String,
    pub password: String,
    pub token: String,
}

impl TestUser {
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

/// Register a user through the API and resolve its id with `GET /api/users`
pub async fn register_test_user(client: &TestServer, name: &str, email: &str) -> TestUser {
    let password = "TestPassword123!".to_string();
    let response = client
        .post("/api/users/register")
        .json(&json!({ "name": name, "email": email, "password": password }))
        .await;
    assert_eq!(response.status_code(), 201);
    let token = response.json::<serde_json::Value>()["accessToken"]
        .as_str()
        .expect("accessToken missing")
        .to_string();

    let me: serde_json::Value = client
        .get("/api/users")
        .add_header("Authorization", format!("Bearer {}", token))
        .await
        .json();
    let id = me["id"]
        .as_str()
        .and_then(|s| Uuid::parse_str(s).ok())
        .expect("user id missing");

    TestUser {
        id,
        email: email.to_string(),
        password,
        token,
    }
}
