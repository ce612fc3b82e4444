//! deploydeck - Deployment Metrics Dashboard
//!
//! Aggregates pipeline execution history into time-windowed dashboard
//! metrics: health summaries, per-service and per-project change rates,
//! and service/instance growth trends.

mod aggregate;
mod config;
mod dashboard;
mod db;
mod web;

use config::ServerConfig;
use db::SqliteStore;
use web::Server;

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("deploydeck=info".parse()?))
        .init();

    // Load configuration
    let cfg = ServerConfig::load();
    tracing::info!("Starting deploydeck on port {}...", cfg.http_port);
    tracing::info!("Using database at {}", cfg.db_path);

    // Initialize database
    let store = Arc::new(SqliteStore::new(&cfg.db_path)?);
    tracing::info!("Database initialized successfully");

    // Start web server
    let server = Server::new(cfg, store);
    server.start().await?;

    Ok(())
}
