//! Library Backend entry point
//!
//! Loads configuration, starts the store and HTTP services, and runs until
//! Ctrl+C.

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use library_backend::AppState;
use library_backend::config::{Config, LogFormat};
use library_backend::graphql::build_schema;
use library_backend::services::{
    AuthService, HttpServerService, LibraryEvents, ServicesManager, StoreService,
};

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "library_backend=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer().pretty()).init(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // LOG_FORMAT is read before the rest of the config so config warnings are formatted
    let log_format = std::env::var("LOG_FORMAT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or_default();
    init_tracing(log_format);

    tracing::info!("Starting Library Backend");
    let config = Arc::new(Config::from_env().context("Failed to load configuration")?);
    tracing::info!(
        backend = ?config.store_backend,
        auth_mode = %config.auth_mode,
        "Configuration loaded"
    );

    let store_service = Arc::new(StoreService::from_config(&config).await?);
    let store = store_service.shared();

    let auth = Arc::new(AuthService::new(store.clone(), config.auth_config()));
    let events = LibraryEvents::default();
    let schema = build_schema(store.clone(), auth.clone(), events);
    tracing::info!("GraphQL schema built");

    let manager = Arc::new(ServicesManager::new());
    let state = AppState {
        config: config.clone(),
        schema,
        store,
        auth,
        services: manager.clone(),
    };

    manager.register(store_service).await;
    manager
        .register(Arc::new(HttpServerService::new(state)))
        .await;

    if let Err(e) = manager.start_all().await {
        tracing::error!(error = %e, "Startup failed");
        manager.stop_all().await?;
        return Err(e);
    }

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    tracing::info!("Shutdown signal received");

    manager.stop_all().await?;
    tracing::info!("Library Backend stopped");
    Ok(())
}
