//! Secret Server - Main Application Entry Point
//!
//! A REST API that stores short secrets and hands each one out a limited
//! number of times, optionally only until an expiry instant. Once a secret's
//! views are used up or it has expired it can never be read again.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Database**: PostgreSQL with sqlx (async queries)
//! - **Consumption**: one conditional `UPDATE ... RETURNING` per retrieval
//! - **Format**: form-encoded requests, JSON responses
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment variables
//! 2. Create database connection pool and run migrations (Postgres backend)
//! 3. Build HTTP router around the secret service
//! 4. Serve until SIGINT/SIGTERM

mod config;
mod db;
mod error;
mod handlers;
mod models;
mod services;
mod store;

use std::{sync::Arc, time::Duration};

use tokio::signal;
use tracing_subscriber::EnvFilter;

use config::{Config, StoreBackend};
use services::secret_service::SecretService;
use store::{MemorySecretStore, PgSecretStore, SecretStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Reads RUST_LOG, defaults to "info"
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env()?;
    tracing::info!(backend = ?config.store_backend, "Configuration loaded");

    let store: Arc<dyn SecretStore> = match config.store_backend {
        StoreBackend::Postgres => {
            let pool = db::create_pool(config.connect_options()?, config.db_max_connections).await?;
            tracing::info!("Database pool created");

            db::run_migrations(&pool).await?;
            tracing::info!("Database migrations complete");

            Arc::new(PgSecretStore::new(pool))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; secrets will not survive a restart");
            Arc::new(MemorySecretStore::new())
        }
    };

    let app = handlers::router(
        SecretService::new(store),
        Duration::from_secs(config.request_timeout_secs),
        config.max_body_bytes,
    );

    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Resolve on SIGINT or, on unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", err);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => tracing::error!("failed to install SIGTERM handler: {}", err),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received SIGINT, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
