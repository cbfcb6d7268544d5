//! Service and repository wiring

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use bookshelf_core::Config;
use bookshelf_db::{BookRepository, UserRepository};
use bookshelf_services::{
    DescriptionPolisher, NlpCloudClient, StagingArea, TracingCleanupObserver, UploadCoordinator,
};
use bookshelf_storage::RemoteStore;
use sqlx::PgPool;

use crate::auth::JwtService;
use crate::state::AppState;

pub async fn initialize_services(
    config: &Config,
    pool: PgPool,
    remote: Arc<dyn RemoteStore>,
) -> Result<Arc<AppState>> {
    let staging = StagingArea::from_config(config)
        .await
        .context("Failed to prepare upload staging directory")?;
    tracing::info!(
        staging_dir = %staging.dir().display(),
        max_upload_mb = staging.max_size() / 1024 / 1024,
        "Upload staging ready"
    );

    let uploads = UploadCoordinator::new(
        remote,
        Duration::from_secs(config.remote_upload_timeout_secs()),
    )
    .with_cleanup_observer(Arc::new(TracingCleanupObserver));

    let polisher = NlpCloudClient::from_config(config)
        .context("Failed to create text generation client")?
        .map(|client| {
            tracing::info!(endpoint = %client.endpoint(), "Text generation enabled");
            DescriptionPolisher::new(Arc::new(client))
        });
    if polisher.is_none() {
        tracing::warn!("NLP_CLOUD_API_KEY not set, text generation endpoints will fail");
    }

    Ok(Arc::new(AppState {
        config: config.clone(),
        users: Arc::new(UserRepository::new(pool.clone())),
        books: Arc::new(BookRepository::new(pool)),
        staging,
        uploads,
        jwt: Arc::new(JwtService::new(
            config.jwt_secret(),
            config.jwt_expiry_hours(),
        )),
        polisher,
    }))
}
