//! Bookshelf Core Library
//!
//! This crate provides core domain models, error types and configuration
//! that are shared across all Bookshelf components.

pub mod config;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use config::{BaseConfig, BookshelfConfig, Config, RemoteStoreBackend, SignatureAlgorithm};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{AssetKind, AssetReference, ResourceClassification};
