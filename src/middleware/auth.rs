// ABOUTME: Bearer-token authentication for REST handlers
// ABOUTME: Parses the Authorization header, validates the JWT and yields the caller identity
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Procedure Assistant Contributors

use crate::auth::{AuthManager, AuthResult};
use crate::errors::{AppError, AppResult, ErrorCode};
use axum::http::{header, HeaderMap};

/// Middleware for REST authentication
#[derive(Clone)]
pub struct AuthMiddleware {
    auth_manager: AuthManager,
}

impl AuthMiddleware {
    /// Create new auth middleware
    #[must_use]
    pub const fn new(auth_manager: AuthManager) -> Self {
        Self { auth_manager }
    }

    /// Authenticate a request from its headers
    ///
    /// # Errors
    ///
    /// Returns an error if the Authorization header is missing, malformed or carries an invalid token
    pub fn authenticate_request_with_headers(&self, headers: &HeaderMap) -> AppResult<AuthResult> {
        let auth_header = headers
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok());
        self.authenticate_request(auth_header)
    }

    /// Authenticate an `Authorization` header value
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The header is missing (`AUTH_REQUIRED`)
    /// - The header is not `Bearer <token>` (`AUTH_MALFORMED`)
    /// - The token fails validation (`AUTH_INVALID` / `AUTH_EXPIRED`)
    #[tracing::instrument(
        skip(self, auth_header),
        fields(user_id = tracing::field::Empty, success = tracing::field::Empty)
    )]
    pub fn authenticate_request(&self, auth_header: Option<&str>) -> AppResult<AuthResult> {
        // Security: never log the header content
        let Some(header) = auth_header else {
            tracing::Span::current().record("success", false);
            return Err(AppError::auth_required());
        };

        let token = header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                tracing::Span::current().record("success", false);
                AppError::new(
                    ErrorCode::AuthMalformed,
                    "Authorization header must be 'Bearer <token>'",
                )
            })?;

        match self.auth_manager.validate_token(token) {
            Ok(claims) => {
                tracing::Span::current()
                    .record("user_id", claims.sub.as_str())
                    .record("success", true);
                Ok(AuthResult {
                    user_id: claims.sub,
                    email: claims.email,
                    role: claims.role,
                })
            }
            Err(e) => {
                tracing::Span::current().record("success", false);
                tracing::warn!("JWT authentication failed: {}", e);
                Err(e.into())
            }
        }
    }
}
