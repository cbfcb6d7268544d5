//! Database repositories for the data access layer
//!
//! Each repository owns one table and is exposed to the rest of the
//! application through a store trait, so handlers can run against the
//! in-memory stores in tests.

pub mod repositories;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use repositories::{BookRepository, BookStore, UserRepository, UserStore};
