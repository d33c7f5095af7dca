// ABOUTME: Request span construction for HTTP tracing
// ABOUTME: Tags every request span with method, path and the propagated x-request-id
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Procedure Assistant Contributors

use axum::http::Request;

/// Header carrying the per-request correlation ID
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Create a tracing span for an HTTP request
pub fn create_request_span<B>(request: &Request<B>) -> tracing::Span {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = %request.method(),
        path = %request.uri().path(),
        request_id = %request_id,
    )
}
