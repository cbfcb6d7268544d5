use bookshelf_core::models::{NewBook, NewUser, User};
use bookshelf_db::{UserRepository, UserStore};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use testcontainers::runners::AsyncRunner;
use testcontainers::ContainerAsync;
use testcontainers_modules::postgres::Postgres;
use uuid::Uuid;

/// Migrated Postgres running in a throwaway container
pub struct TestDb {
    pub pool: PgPool,
    pub _container: ContainerAsync<Postgres>,
}

/// Start Postgres and run the migrations. Returns `None` when no Docker
/// daemon is reachable so the caller can skip.
pub async fn setup_test_db() -> Option<TestDb> {
    let container = match Postgres::default().start().await {
        Ok(container) => container,
        Err(e) => {
            eprintln!("skipping: postgres container unavailable ({e})");
            return None;
        }
    };

    let host = container.get_host().await.expect("container host");
    let port = container
        .get_host_port_ipv4(5432)
        .await
        .expect("container port");
    let connection_string = format!("postgresql://postgres:postgres@{host}:{port}/postgres");

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&connection_string)
        .await
        .expect("Failed to connect to test database");

    sqlx::migrate!("../../migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    Some(TestDb {
        pool,
        _container: container,
    })
}

pub async fn insert_user(pool: &PgPool, name: &str, email: &str) -> User {
    UserRepository::new(pool.clone())
        .create(NewUser::new(
            name.to_string(),
            email.to_string(),
            "$argon2id$test-hash".to_string(),
        ))
        .await
        .expect("insert user")
}

pub fn new_book(author_id: Uuid, title: &str) -> NewBook {
    let id = Uuid::new_v4();
    NewBook {
        id,
        title: title.to_string(),
        genre: "Fiction".to_string(),
        description: Some("A long voyage.".to_string()),
        author_id,
        cover_image: format!("https://res.example.com/image/upload/book-covers/cover_{id}.jpg"),
        file: format!("https://res.example.com/raw/upload/book-pdfs/book_{id}.pdf"),
    }
}
