//! Application setup and initialization

pub mod database;
pub mod routes;
pub mod server;
pub mod services;
pub mod storage;

use crate::state::AppState;
use anyhow::{Context, Result};
use bookshelf_core::Config;
use sqlx::PgPool;
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router, PgPool)> {
    config
        .validate()
        .context("Configuration validation failed")?;

    crate::telemetry::init_telemetry();

    tracing::info!(
        environment = %config.environment(),
        production = config.is_production(),
        remote_store = %config.remote_store(),
        "Configuration loaded and validated successfully"
    );

    let pool = database::setup_database(&config).await?;
    let remote = storage::setup_remote_store(&config).await?;
    let state = services::initialize_services(&config, pool.clone(), remote).await?;
    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router, pool))
}
