pub mod book;
pub mod user;

pub use book::{BookRepository, BookStore};
pub use user::{UserRepository, UserStore};
