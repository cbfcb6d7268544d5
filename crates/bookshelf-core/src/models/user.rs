use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

const USERNAME_MIN_LEN: usize = 3;
const USERNAME_MAX_LEN: usize = 15;
const USERNAME_SUFFIX_LEN: usize = 6;

/// Registered user
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub bio: Option<String>,
    pub profile_photo: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Values for a user about to be inserted
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: Uuid,
    pub name: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

impl NewUser {
    pub fn new(name: String, email: String, password_hash: String) -> Self {
        let id = Uuid::new_v4();
        let username = generate_username(&name, id);
        Self {
            id,
            name,
            username,
            email,
            password_hash,
        }
    }
}

/// Partial update of a user's profile. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UserProfileUpdate {
    pub name: Option<String>,
    pub username: Option<String>,
    pub bio: Option<String>,
}

impl UserProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.username.is_none() && self.bio.is_none()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub username: String,
    pub bio: Option<String>,
    pub profile_photo: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            username: user.username,
            bio: user.bio,
            profile_photo: user.profile_photo,
            created_at: user.created_at,
        }
    }
}

/// Derive a username from a display name.
///
/// Keeps lowercase ASCII alphanumerics, pads short names with `user`,
/// truncates long ones and appends the last characters of the user id.
pub fn generate_username(name: &str, id: Uuid) -> String {
    let mut base: String = name
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect();

    if base.len() < USERNAME_MIN_LEN {
        base.push_str("user");
    } else if base.len() > USERNAME_MAX_LEN {
        base.truncate(USERNAME_MAX_LEN);
    }

    let simple = id.simple().to_string();
    let suffix = &simple[simple.len() - USERNAME_SUFFIX_LEN..];
    format!("{}{}", base, suffix)
}
