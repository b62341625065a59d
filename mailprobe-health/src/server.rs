use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use mailprobe_common::Signal;
use mailprobe_metrics::{CONTENT_TYPE, ProbeMetrics};
use tokio::net::TcpListener;
use tower_http::timeout::TimeoutLayer;

use crate::{HealthChecker, HealthConfig, HealthError};

#[derive(Clone)]
struct AppState {
    checker: Arc<HealthChecker>,
    metrics: Arc<ProbeMetrics>,
}

/// Serves the probe and metrics endpoints.
pub struct HealthServer {
    listener: TcpListener,
    router: Router,
}

impl HealthServer {
    /// Bind the listener. Nothing is served until [`HealthServer::serve`].
    ///
    /// # Errors
    ///
    /// [`HealthError::Bind`] if the address cannot be bound.
    pub async fn new(
        config: &HealthConfig,
        checker: Arc<HealthChecker>,
        metrics: Arc<ProbeMetrics>,
    ) -> Result<Self, HealthError> {
        let listener = TcpListener::bind(&config.listen_address)
            .await
            .map_err(|source| HealthError::Bind {
                address: config.listen_address.clone(),
                source,
            })?;

        tracing::info!(address = %config.listen_address, "Health server bound");

        Ok(Self {
            listener,
            router: router(
                checker,
                metrics,
                Duration::from_millis(config.request_timeout_ms),
            ),
        })
    }

    /// The bound address, useful when listening on port 0.
    ///
    /// # Errors
    ///
    /// The socket's local address is unavailable.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serve until a signal arrives on `shutdown`.
    ///
    /// # Errors
    ///
    /// [`HealthError::Server`] if the server fails while running.
    pub async fn serve(
        self,
        mut shutdown: tokio::sync::broadcast::Receiver<Signal>,
    ) -> Result<(), HealthError> {
        tracing::info!("Health server starting");

        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::debug!("Health server received shutdown signal");
            })
            .await
            .map_err(|e| HealthError::Server(e.to_string()))?;

        tracing::info!("Health server stopped");
        Ok(())
    }
}

fn router(checker: Arc<HealthChecker>, metrics: Arc<ProbeMetrics>, timeout: Duration) -> Router {
    Router::new()
        .route("/health/live", get(liveness))
        .route("/health/ready", get(readiness))
        .route("/.well-known/ready", get(readiness))
        .route("/metrics", get(prometheus))
        .with_state(AppState { checker, metrics })
        .layer(TimeoutLayer::new(timeout))
}

async fn liveness(State(state): State<AppState>) -> Response {
    if state.checker.is_alive() {
        (StatusCode::OK, "OK").into_response()
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "Service Unavailable").into_response()
    }
}

async fn readiness(State(state): State<AppState>) -> Response {
    if state.checker.is_ready() {
        return (StatusCode::OK, "OK").into_response();
    }

    let status = state.checker.status();
    tracing::debug!(
        monitors_running = status.monitors_running,
        shutting_down = status.shutting_down,
        "Readiness probe failed"
    );
    (StatusCode::SERVICE_UNAVAILABLE, Json(status)).into_response()
}

async fn prometheus(State(state): State<AppState>) -> Response {
    match state.metrics.render_prometheus() {
        Ok(body) => ([(header::CONTENT_TYPE, CONTENT_TYPE)], body).into_response(),
        Err(err) => {
            tracing::error!(error = %err, "Failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    }
}
