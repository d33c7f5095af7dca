// ABOUTME: Route module organization for the procedure assistant HTTP API
// ABOUTME: Groups routers by domain and merges them into one application router
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Procedure Assistant Contributors

//! Route module
//!
//! Each domain module contains only route definitions and thin handlers
//! that delegate to the service layer or the repositories.

/// Admin management and statistics routes
pub mod admin;
/// Registration, login and current-user routes
pub mod auth;
/// Chat and conversation history routes
pub mod chat;
/// Health check and readiness routes
pub mod health;
/// Public procedure and category routes
pub mod procedures;

pub use admin::AdminRoutes;
pub use auth::AuthRoutes;
pub use chat::ChatRoutes;
pub use health::HealthRoutes;
pub use procedures::ProcedureRoutes;

use crate::resources::ServerResources;
use axum::Router;
use std::sync::Arc;

/// Merge every domain router into the application router
pub fn build_router(resources: &Arc<ServerResources>) -> Router {
    Router::new()
        .merge(HealthRoutes::routes(Arc::clone(resources)))
        .merge(AuthRoutes::routes(Arc::clone(resources)))
        .merge(ProcedureRoutes::routes(Arc::clone(resources)))
        .merge(ChatRoutes::routes(Arc::clone(resources)))
        .merge(AdminRoutes::routes(Arc::clone(resources)))
}
