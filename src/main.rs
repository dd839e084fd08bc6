//! PantryDesk registration backend
//!
//! Main application entry point

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};

use PantryDesk::{
    config::Settings,
    database::{connection::create_pool, run_migrations, run_public_migrations, DatabaseConfig, DatabaseService},
    handlers::router,
    services::{ServiceFactory, Stores},
    state::AppState,
    utils::logging,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::new().context("Failed to load configuration")?;
    settings.validate()?;

    // Initialize logging; the guard flushes the log file on exit
    let _log_guard = logging::init_logging(&settings.logging)?;

    info!("Starting {}...", PantryDesk::info());

    info!("Connecting to databases...");
    let primary_pool = create_pool(&DatabaseConfig::from(&settings.database)).await?;
    let public_pool = create_pool(&DatabaseConfig::from(&settings.public_database)).await?;

    run_migrations(&primary_pool).await?;
    if settings.public_database.run_migrations {
        run_public_migrations(&public_pool).await?;
    }

    let database = DatabaseService::new(primary_pool, public_pool);

    info!("Initializing services...");
    let services = ServiceFactory::new(&settings, Stores::postgres(&database))?;
    if !services.notification_service.is_enabled() {
        warn!("No notification webhook configured, waitlist promotions will not be announced");
    }

    let state = AppState::new(&settings, services, Some(database.clone()))?;
    if let Some(limiter) = state.rate_limiter.clone() {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(std::time::Duration::from_secs(300));
            loop {
                interval.tick().await;
                limiter.retain_recent();
            }
        });
    }

    let app = router(state);
    let listener = TcpListener::bind(&settings.server.bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", settings.server.bind_address))?;

    info!(address = %settings.server.bind_address, "PantryDesk is ready");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    database.close().await;
    info!("PantryDesk has been shut down.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutdown signal received");
}
