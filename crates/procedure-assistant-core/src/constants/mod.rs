// ABOUTME: Constants module with domain-separated organization
// ABOUTME: Pure data constants for the procedure assistant (limits, defaults, service names)
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Procedure Assistant Contributors

//! Constants module
//!
//! Constants are grouped into logical domains rather than being in a single
//! large namespace.

/// Service identifiers used in logs and token audiences
pub mod service_names {
    /// Service name reported by logging
    pub const PROCEDURE_ASSISTANT: &str = "procedure-assistant";
    /// JWT audience for user tokens
    pub const JWT_AUDIENCE: &str = "procedure-assistant";
    /// Name used when reporting gateway failures
    pub const LLM_GATEWAY: &str = "LLM gateway";
}

/// API endpoints
pub mod endpoints {
    /// Health check endpoint
    pub const HEALTH_CHECK: &str = "/health";
    /// API base path
    pub const API_BASE: &str = "/api";
}

/// Network ports
pub mod ports {
    /// Default HTTP port
    pub const DEFAULT_HTTP_PORT: u16 = 8080;
}

/// Chat-completion gateway defaults
pub mod llm {
    /// Default OpenAI-compatible base URL
    pub const DEFAULT_BASE_URL: &str = "https://api.mistral.ai/v1";
    /// Models tried in order until one answers
    pub const DEFAULT_MODELS: [&str; 4] = [
        "mistral-small-latest",
        "open-mistral-7b",
        "open-mixtral-8x7b",
        "mistral-large-latest",
    ];
    /// Per-attempt request timeout
    pub const REQUEST_TIMEOUT_SECS: u64 = 30;
    /// Connect timeout for the HTTP client
    pub const CONNECT_TIMEOUT_SECS: u64 = 10;
    /// Minimum spacing between two dispatches from the same client
    pub const MIN_REQUEST_INTERVAL_MS: u64 = 1000;
    /// Error code the gateway uses for "service tier capacity exceeded"
    pub const CAPACITY_ERROR_CODE: &str = "3505";
}

/// Prompt assembly limits
pub mod prompt {
    /// Maximum number of procedures placed in the context section
    pub const MAX_CONTEXT_PROCEDURES: usize = 5;
    /// Maximum characters of procedure content placed in the context section
    pub const MAX_CONTENT_CHARS: usize = 500;
    /// Default language the assistant answers in
    pub const DEFAULT_RESPONSE_LANGUAGE: &str = "Vietnamese";
    /// Context marker used when retrieval found nothing
    pub const NO_RELEVANT_PROCEDURE: &str = "No relevant procedure was found.";
}

/// Conversation persistence rules
pub mod conversation {
    /// A user's conversation stays open for appends this long after creation
    pub const MERGE_WINDOW_MINUTES: i64 = 60;
    /// Conversation titles are derived from this many characters of the first question
    pub const TITLE_MAX_CHARS: usize = 50;
    /// Title used when the first question is empty
    pub const DEFAULT_TITLE: &str = "New conversation";
    /// Maximum conversations returned by the history endpoint
    pub const HISTORY_LIMIT: i64 = 50;
}

/// Authentication limits
pub mod auth {
    /// Default JWT lifetime
    pub const DEFAULT_TOKEN_EXPIRY_HOURS: i64 = 72;
    /// Minimum accepted password length
    pub const MIN_PASSWORD_LENGTH: usize = 6;
}

/// Store limits
pub mod database {
    /// Timeout applied to store operations (pool acquire and busy wait)
    pub const OPERATION_TIMEOUT_SECS: u64 = 10;
    /// Maximum pooled connections
    pub const MAX_CONNECTIONS: u32 = 10;
}

/// Procedure document uploads
pub mod upload {
    /// Largest accepted document
    pub const MAX_FILE_BYTES: usize = 10 * 1024 * 1024;
    /// Request body allowance for the upload route (document plus form fields)
    pub const MAX_BODY_BYTES: usize = MAX_FILE_BYTES + 1024 * 1024;
    /// Default directory for stored documents
    pub const DEFAULT_DIR: &str = "uploads";
    /// PDF documents
    pub const PDF_MIME: &str = "application/pdf";
    /// Legacy Word documents (stored, not extracted)
    pub const DOC_MIME: &str = "application/msword";
    /// Word documents
    pub const DOCX_MIME: &str =
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
    /// Content types accepted by the upload route
    pub const ALLOWED_MIME_TYPES: [&str; 3] = [PDF_MIME, DOC_MIME, DOCX_MIME];
    /// Prefix of the description given to uploaded procedures
    pub const DESCRIPTION_PREFIX: &str = "File upload: ";
}
