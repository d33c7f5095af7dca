// ABOUTME: Authentication route handlers for registration, login and the current user
// ABOUTME: Thin wrappers delegating to AuthService; admin login lives here too
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Procedure Assistant Contributors

use crate::{
    errors::AppError,
    models::User,
    resources::ServerResources,
    services::auth::{AuthResponse, LoginRequest, RegisterRequest},
};
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

/// Authentication routes
pub struct AuthRoutes;

impl AuthRoutes {
    /// Create all authentication routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/auth/register", post(Self::register))
            .route("/api/auth/login", post(Self::login))
            .route("/api/auth/me", get(Self::me))
            .route("/api/admin/login", post(Self::admin_login))
            .with_state(resources)
    }

    async fn register(
        State(resources): State<Arc<ServerResources>>,
        Json(request): Json<RegisterRequest>,
    ) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
        let response = resources.auth_service.register(request).await?;
        Ok((StatusCode::CREATED, Json(response)))
    }

    async fn login(
        State(resources): State<Arc<ServerResources>>,
        Json(request): Json<LoginRequest>,
    ) -> Result<Json<AuthResponse>, AppError> {
        Ok(Json(resources.auth_service.login(request).await?))
    }

    async fn admin_login(
        State(resources): State<Arc<ServerResources>>,
        Json(request): Json<LoginRequest>,
    ) -> Result<Json<AuthResponse>, AppError> {
        Ok(Json(resources.auth_service.admin_login(request).await?))
    }

    async fn me(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Json<User>, AppError> {
        let auth = resources
            .auth_middleware
            .authenticate_request_with_headers(&headers)?;
        Ok(Json(resources.auth_service.current_user(&auth.user_id).await?))
    }
}
