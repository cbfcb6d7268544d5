pub mod books;
pub mod health;
pub mod text;
pub mod users;
