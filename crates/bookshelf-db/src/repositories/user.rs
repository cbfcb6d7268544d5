use async_trait::async_trait;
use bookshelf_core::models::{NewUser, User, UserProfileUpdate};
use bookshelf_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

const USER_COLUMNS: &str =
    "id, name, username, email, password_hash, bio, profile_photo, created_at, updated_at";

/// Persistence operations on users
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create(&self, user: NewUser) -> Result<User, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// Apply a partial profile update. Returns `None` when the user does not exist.
    async fn update_profile(
        &self,
        id: Uuid,
        update: UserProfileUpdate,
    ) -> Result<Option<User>, AppError>;

    /// Point the user's profile photo at a new remote URL
    async fn set_profile_photo(&self, id: Uuid, url: &str) -> Result<Option<User>, AppError>;
}

/// Map a unique violation to a client error, everything else to `Database`
fn map_unique_violation(err: sqlx::Error, message: &str) -> AppError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::BadRequest(message.to_string())
        }
        _ => AppError::Database(err),
    }
}

/// Repository for the `users` table
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for UserRepository {
    #[tracing::instrument(skip(self, user), fields(db.table = "users", db.operation = "insert", db.record_id = %user.id))]
    async fn create(&self, user: NewUser) -> Result<User, AppError> {
        let query = format!(
            "INSERT INTO users (id, name, username, email, password_hash) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            USER_COLUMNS
        );

        sqlx::query_as::<Postgres, User>(&query)
            .bind(user.id)
            .bind(&user.name)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.password_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_unique_violation(e, "User already exists with this email."))
    }

    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "select", db.record_id = %id))]
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);

        let user = sqlx::query_as::<Postgres, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    #[tracing::instrument(skip(self, email), fields(db.table = "users", db.operation = "select"))]
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let query = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);

        let user = sqlx::query_as::<Postgres, User>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    #[tracing::instrument(skip(self, update), fields(db.table = "users", db.operation = "update", db.record_id = %id))]
    async fn update_profile(
        &self,
        id: Uuid,
        update: UserProfileUpdate,
    ) -> Result<Option<User>, AppError> {
        let query = format!(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                username = COALESCE($3, username),
                bio = COALESCE($4, bio),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        );

        sqlx::query_as::<Postgres, User>(&query)
            .bind(id)
            .bind(update.name)
            .bind(update.username)
            .bind(update.bio)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_unique_violation(e, "Username is already taken."))
    }

    #[tracing::instrument(skip(self), fields(db.table = "users", db.operation = "update", db.record_id = %id))]
    async fn set_profile_photo(&self, id: Uuid, url: &str) -> Result<Option<User>, AppError> {
        let query = format!(
            "UPDATE users SET profile_photo = $2, updated_at = NOW() WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        );

        let user = sqlx::query_as::<Postgres, User>(&query)
            .bind(id)
            .bind(url)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }
}
