use bookshelf_api::setup;
use bookshelf_core::Config;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize the application (database, remote store, services, routes)
    let (_state, router, pool) = setup::initialize_app(config.clone()).await?;

    // Start the server
    setup::server::start_server(&config, router).await?;

    pool.close().await;
    tracing::info!("Database pool closed");

    Ok(())
}
