//! In-memory store implementations for testing
//!
//! These stores allow exercising handlers and services without a database.

use async_trait::async_trait;
use bookshelf_core::models::{
    Book, BookUpdate, BookWithAuthor, NewBook, NewUser, User, UserProfileUpdate,
};
use bookshelf_core::AppError;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::{BookStore, UserStore};

fn write_failure() -> AppError {
    AppError::Internal("simulated write failure".to_string())
}

/// In-memory user store
#[derive(Clone, Default)]
pub struct InMemoryUserStore {
    users: Arc<Mutex<HashMap<Uuid, User>>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: Uuid) -> Option<User> {
        self.users.lock().unwrap().get(&id).cloned()
    }

    fn name_of(&self, id: Uuid) -> String {
        self.get(id).map(|u| u.name).unwrap_or_default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create(&self, user: NewUser) -> Result<User, AppError> {
        let mut users = self.users.lock().unwrap();
        if users.values().any(|u| u.email == user.email) {
            return Err(AppError::BadRequest(
                "User already exists with this email.".to_string(),
            ));
        }
        let now = Utc::now();
        let created = User {
            id: user.id,
            name: user.name,
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            bio: None,
            profile_photo: None,
            created_at: now,
            updated_at: now,
        };
        users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.get(id))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn update_profile(
        &self,
        id: Uuid,
        update: UserProfileUpdate,
    ) -> Result<Option<User>, AppError> {
        let mut users = self.users.lock().unwrap();
        let Some(user) = users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = update.name {
            user.name = name;
        }
        if let Some(username) = update.username {
            user.username = username;
        }
        if let Some(bio) = update.bio {
            user.bio = Some(bio);
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn set_profile_photo(&self, id: Uuid, url: &str) -> Result<Option<User>, AppError> {
        let mut users = self.users.lock().unwrap();
        let Some(user) = users.get_mut(&id) else {
            return Ok(None);
        };
        user.profile_photo = Some(url.to_string());
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }
}

/// In-memory book store joined against an [`InMemoryUserStore`] for author names
#[derive(Clone)]
pub struct InMemoryBookStore {
    books: Arc<Mutex<HashMap<Uuid, Book>>>,
    users: InMemoryUserStore,
    fail_writes: Arc<AtomicBool>,
}

impl InMemoryBookStore {
    pub fn new(users: InMemoryUserStore) -> Self {
        Self {
            books: Arc::new(Mutex::new(HashMap::new())),
            users,
            fail_writes: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Make every subsequent create/update/delete fail
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn get(&self, id: Uuid) -> Option<Book> {
        self.books.lock().unwrap().get(&id).cloned()
    }

    pub fn insert(&self, book: Book) {
        self.books.lock().unwrap().insert(book.id, book);
    }

    pub fn len(&self) -> usize {
        self.books.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn with_author(&self, book: Book) -> BookWithAuthor {
        let author_name = self.users.name_of(book.author_id);
        BookWithAuthor { book, author_name }
    }

    fn check_writes(&self) -> Result<(), AppError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(write_failure());
        }
        Ok(())
    }
}

#[async_trait]
impl BookStore for InMemoryBookStore {
    async fn create(&self, book: NewBook) -> Result<Book, AppError> {
        self.check_writes()?;
        let now = Utc::now();
        let created = Book {
            id: book.id,
            title: book.title,
            genre: book.genre,
            description: book.description,
            author_id: book.author_id,
            cover_image: book.cover_image,
            file: book.file,
            created_at: now,
            updated_at: now,
        };
        self.insert(created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Book>, AppError> {
        Ok(self.get(id))
    }

    async fn find_with_author(&self, id: Uuid) -> Result<Option<BookWithAuthor>, AppError> {
        Ok(self.get(id).map(|b| self.with_author(b)))
    }

    async fn list_by_author(&self, author_id: Uuid) -> Result<Vec<BookWithAuthor>, AppError> {
        let mut books: Vec<Book> = self
            .books
            .lock()
            .unwrap()
            .values()
            .filter(|b| b.author_id == author_id)
            .cloned()
            .collect();
        books.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(books.into_iter().map(|b| self.with_author(b)).collect())
    }

    async fn update(
        &self,
        id: Uuid,
        update: BookUpdate,
    ) -> Result<Option<BookWithAuthor>, AppError> {
        self.check_writes()?;
        let updated = {
            let mut books = self.books.lock().unwrap();
            let Some(book) = books.get_mut(&id) else {
                return Ok(None);
            };
            if let Some(title) = update.title {
                book.title = title;
            }
            if let Some(genre) = update.genre {
                book.genre = genre;
            }
            if let Some(description) = update.description {
                book.description = Some(description);
            }
            if let Some(cover_image) = update.cover_image {
                book.cover_image = cover_image;
            }
            if let Some(file) = update.file {
                book.file = file;
            }
            book.updated_at = Utc::now();
            book.clone()
        };
        Ok(Some(self.with_author(updated)))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        self.check_writes()?;
        Ok(self.books.lock().unwrap().remove(&id).is_some())
    }
}
