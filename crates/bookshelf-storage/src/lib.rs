//! Bookshelf Storage Library
//!
//! This crate provides the remote object store abstraction used for book files,
//! cover images and profile photos, with a Cloudinary-compatible HTTP client and
//! a local filesystem implementation.
//!
//! # Object layout
//!
//! Every backend exposes objects under URLs ending in
//! `.../{image|raw}/.../{folder}/{file}`, so the deletion identifier of any
//! stored reference can be recovered by [`public_id::derive_public_id`].
//!
//! - **Images**: identifier `{folder}/{name}`, the extension is a delivery format
//! - **Raw**: identifier `{folder}/{name}.{ext}`, bytes are served untouched

#[cfg(feature = "storage-cloudinary")]
pub mod cloudinary;
pub mod factory;
#[cfg(feature = "storage-local")]
pub mod local;
pub mod public_id;
pub mod traits;

// Re-export commonly used types
pub use bookshelf_core::{RemoteStoreBackend, ResourceClassification};
#[cfg(feature = "storage-cloudinary")]
pub use cloudinary::CloudinaryStore;
pub use factory::create_remote_store;
#[cfg(feature = "storage-local")]
pub use local::LocalStore;
pub use public_id::derive_public_id;
pub use traits::{RemoteStore, RemoteUpload, StorageError, StorageResult, UploadOptions};
