//! Web server module.

mod handlers;

use crate::config::ServerConfig;
use crate::db::SqliteStore;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: ServerConfig,
    pub store: Arc<SqliteStore>,
}

/// Web server for deploydeck.
pub struct Server {
    state: AppState,
}

impl Server {
    /// Create a new server with the given dependencies.
    pub fn new(config: ServerConfig, store: Arc<SqliteStore>) -> Self {
        Self {
            state: AppState { config, store },
        }
    }

    /// Build the router with all routes.
    fn routes(&self) -> Router {
        let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any);

        Router::new()
            // Dashboard endpoints
            .route("/api/deployments/health", get(handlers::handle_health))
            .route(
                "/api/deployments/executions",
                get(handlers::handle_executions),
            )
            .route("/api/services/metrics", get(handlers::handle_service_metrics))
            .route("/api/projects/metrics", get(handlers::handle_project_metrics))
            .route("/api/services/growth", get(handlers::handle_growth_trend))
            .route(
                "/api/services/{id}/instances",
                get(handlers::handle_instance_trend),
            )
            // Ingestion endpoints
            .route("/api/executions", post(handlers::handle_add_execution))
            .route("/api/services", post(handlers::handle_upsert_service))
            .route("/api/instances", post(handlers::handle_add_instance_stat))
            .layer(cors)
            .layer(DefaultBodyLimit::max(1024 * 1024)) // 1MB
            .with_state(self.state.clone())
    }

    /// Start the server on the configured port.
    pub async fn start(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.state.config.http_port));
        let router = self.routes();

        tracing::info!("Web server listening on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, router).await?;

        Ok(())
    }
}
