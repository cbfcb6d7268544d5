//! Remote object store setup

use anyhow::{Context, Result};
use bookshelf_core::Config;
use bookshelf_storage::{create_remote_store, RemoteStore};
use std::sync::Arc;

pub async fn setup_remote_store(config: &Config) -> Result<Arc<dyn RemoteStore>> {
    let store = create_remote_store(config)
        .await
        .context("Failed to initialize remote store")?;

    tracing::info!(
        backend = %store.backend_type(),
        upload_timeout_secs = config.remote_upload_timeout_secs(),
        "Remote store initialized"
    );

    Ok(store)
}
