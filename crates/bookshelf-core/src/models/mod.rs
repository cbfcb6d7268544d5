//! Data models for the application
//!
//! Users own books; books and users embed asset references that point at
//! objects held by the remote store.

mod asset;
mod book;
mod user;

pub use asset::*;
pub use book::*;
pub use user::*;
