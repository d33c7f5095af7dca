// ABOUTME: HTTP middleware for authentication, authorization, CORS and request tracing
// ABOUTME: Re-exports the helpers route handlers and the server builder use
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Procedure Assistant Contributors

/// Bearer-token authentication
pub mod auth;
/// Admin role guard
pub mod admin_guard;
/// CORS layer configuration
pub mod cors;
/// Request span construction
pub mod tracing;

pub use admin_guard::require_admin;
pub use auth::AuthMiddleware;
pub use cors::setup_cors;
pub use tracing::{create_request_span, REQUEST_ID_HEADER};
