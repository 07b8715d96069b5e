//! HTTP server wiring.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::state::AppState;
use crate::ws::{ws_handler, MetricsSnapshot};

/// Health endpoint body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    /// Always `ok`.
    pub status: &'static str,
    /// Open connections.
    pub connections: usize,
    /// Client IDs announced on open connections.
    pub clients: Vec<String>,
    /// Counters.
    pub metrics: MetricsSnapshot,
}

/// Builds the router: the WebSocket endpoint at `/` plus `/health`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(ws_handler))
        .route("/health", get(health))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        connections: state.connections.connection_count().await,
        clients: state.connections.client_ids().await,
        metrics: state.metrics.snapshot(),
    })
}

/// The broadcast server.
#[derive(Debug)]
pub struct Server {
    config: ServerConfig,
    state: AppState,
}

impl Server {
    /// Creates a server.
    #[must_use]
    pub fn new(config: ServerConfig, state: AppState) -> Self {
        Self { config, state }
    }

    /// Binds the configured address and serves until the stop signal fires.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound or serving fails.
    pub async fn run(self) -> Result<(), ServerError> {
        let listener = TcpListener::bind(self.config.addr()).await?;
        serve(listener, self.state).await
    }
}

/// Serves on an already bound listener until the stop signal fires.
///
/// # Errors
///
/// Returns an error if serving fails.
pub async fn serve(listener: TcpListener, state: AppState) -> Result<(), ServerError> {
    let port = listener.local_addr()?.port();
    info!("pg_broadcast WebSocket server is up and running on port {}", port);

    let stop = state.stop.clone();
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { stop.triggered().await })
        .await?;

    info!("Server stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_reports_connections() {
        let state = AppState::default();
        state.connections.on_connect(1).await;
        state.connections.set_client_id(1, "abc").await;

        let Json(body) = health(State(state)).await;

        assert_eq!(body.status, "ok");
        assert_eq!(body.connections, 1);
        assert_eq!(body.clients, vec!["abc"]);
    }

    #[tokio::test]
    async fn test_serve_stops_on_signal() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let state = AppState::default();
        let stop = state.stop.clone();

        let server = tokio::spawn(serve(listener, state));
        stop.trigger();

        let result = tokio::time::timeout(std::time::Duration::from_secs(5), server)
            .await
            .expect("stopped in time")
            .expect("task");
        assert!(result.is_ok());
    }
}
