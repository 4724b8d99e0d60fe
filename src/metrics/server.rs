//! HTTP server for the Prometheus scrape endpoints.

use crate::config::DEFAULT_LISTEN_ADDRESS;
use crate::metrics::{ExporterMetrics, MetricsError};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur during metrics server operations.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listener could not be bound.
    #[error("failed to bind to address: {0}")]
    Bind(#[from] std::io::Error),

    /// The server stopped with an error after binding.
    #[error("server error: {0}")]
    Server(String),
}

/// Configuration for the metrics server.
#[derive(Debug, Clone)]
pub struct MetricsServerConfig {
    /// Address to bind the server to.
    pub bind_addr: SocketAddr,
}

impl Default for MetricsServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_LISTEN_ADDRESS,
        }
    }
}

/// HTTP server exposing `/powerpal`, `/metrics` and `/health`.
pub struct MetricsServer {
    config: MetricsServerConfig,
    metrics: Arc<ExporterMetrics>,
}

impl MetricsServer {
    /// Creates a new metrics server.
    pub fn new(config: MetricsServerConfig, metrics: Arc<ExporterMetrics>) -> Self {
        Self { config, metrics }
    }

    /// Builds the router without binding a listener.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/powerpal", get(powerpal_handler))
            .route("/metrics", get(runtime_handler))
            .route("/health", get(health_handler))
            .with_state(Arc::clone(&self.metrics))
    }

    /// Starts the HTTP server.
    ///
    /// This method runs the server until it is shut down.
    pub async fn run(self) -> Result<(), ServerError> {
        let app = self.router();

        let listener = tokio::net::TcpListener::bind(self.config.bind_addr).await?;

        tracing::info!(
            addr = %self.config.bind_addr,
            "Metrics server listening"
        );

        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Server(e.to_string()))?;

        Ok(())
    }
}

fn exposition(result: Result<String, MetricsError>) -> Response {
    match result {
        Ok(output) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            output,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "text/plain; charset=utf-8")],
                format!("Failed to encode metrics: {}", e),
            )
                .into_response()
        }
    }
}

/// Handler for the /powerpal endpoint.
async fn powerpal_handler(State(metrics): State<Arc<ExporterMetrics>>) -> Response {
    exposition(metrics.encode())
}

/// Handler for the /metrics endpoint.
async fn runtime_handler(State(metrics): State<Arc<ExporterMetrics>>) -> Response {
    exposition(metrics.encode_runtime())
}

/// Handler for the /health endpoint.
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
