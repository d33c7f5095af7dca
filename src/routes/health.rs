// ABOUTME: Health check route handlers for service monitoring and status endpoints
// ABOUTME: Liveness is static; readiness pings the database
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Procedure Assistant Contributors

//! Health check routes for service monitoring
//!
//! `/health` answers as long as the process runs. `/ready` also requires a
//! working database connection and returns 503 otherwise.

use crate::resources::ServerResources;
use std::sync::Arc;

/// Health routes implementation
pub struct HealthRoutes;

impl HealthRoutes {
    /// Create all health check routes
    pub fn routes(resources: Arc<ServerResources>) -> axum::Router {
        use axum::{extract::State, http::StatusCode, routing::get, Json, Router};

        async fn health_handler() -> Json<serde_json::Value> {
            Json(serde_json::json!({
                "status": "healthy",
                "service": crate::constants::service_names::PROCEDURE_ASSISTANT,
                "version": env!("CARGO_PKG_VERSION"),
                "timestamp": chrono::Utc::now().to_rfc3339()
            }))
        }

        async fn ready_handler(
            State(resources): State<Arc<ServerResources>>,
        ) -> (StatusCode, Json<serde_json::Value>) {
            match resources.database.ping().await {
                Ok(()) => (
                    StatusCode::OK,
                    Json(serde_json::json!({
                        "status": "ready",
                        "timestamp": chrono::Utc::now().to_rfc3339()
                    })),
                ),
                Err(e) => {
                    tracing::warn!(error = %e, "Readiness check failed");
                    (
                        StatusCode::SERVICE_UNAVAILABLE,
                        Json(serde_json::json!({
                            "status": "not_ready",
                            "timestamp": chrono::Utc::now().to_rfc3339()
                        })),
                    )
                }
            }
        }

        Router::new()
            .route("/health", get(health_handler))
            .route("/ready", get(ready_handler))
            .with_state(resources)
    }
}
