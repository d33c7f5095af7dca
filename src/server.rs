// ABOUTME: HTTP server assembly: middleware stack, listener binding and graceful shutdown
// ABOUTME: Wraps the application router with request IDs, tracing, CORS, body limits and timeout
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Procedure Assistant Contributors

use crate::errors::{AppError, AppResult};
use crate::middleware::{create_request_span, setup_cors};
use crate::resources::ServerResources;
use crate::routes::build_router;
use axum::body::Body;
use axum::extract::DefaultBodyLimit;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Largest accepted request body outside the upload route
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Whole-request timeout; a chat request may walk through every model
const REQUEST_TIMEOUT: Duration = Duration::from_secs(180);

/// Build the application with its middleware stack
#[must_use]
pub fn build_app(resources: &Arc<ServerResources>) -> Router {
    let cors = setup_cors(&resources.config.cors);

    // Outermost first: the request ID must exist before the trace span reads it
    #[allow(deprecated)]
    let middleware = ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(TraceLayer::new_for_http().make_span_with(create_request_span::<Body>))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(cors)
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT));

    // Extractors enforce the limit; the upload route raises it for itself
    build_router(resources)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(middleware)
}

/// Bind and serve until SIGINT or SIGTERM
///
/// # Errors
///
/// Returns an error if the address is invalid, binding fails or the server stops abnormally
pub async fn serve(resources: Arc<ServerResources>) -> AppResult<()> {
    let addr: SocketAddr = format!(
        "{}:{}",
        resources.config.host, resources.config.http_port
    )
    .parse()
    .map_err(|e| AppError::config(format!("Invalid bind address: {e}")))?;

    let app = build_app(&resources);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;
    info!(%addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::internal(format!("HTTP server error: {e}")))?;

    info!("HTTP server stopped");
    Ok(())
}

/// Resolves when SIGINT (Ctrl-C) or SIGTERM is received
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => warn!(error = %e, "Failed to install SIGTERM handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }

    info!("Shutdown signal received, starting graceful shutdown");
}
