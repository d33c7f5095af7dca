// ABOUTME: OpenAI-compatible chat-completion client with ordered model fallback
// ABOUTME: Classifies each failed attempt as capacity, transient or fatal and spaces dispatches
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Procedure Assistant Contributors

//! # Gateway Client
//!
//! Sends `{model, messages: [{role: "user", content}]}` to
//! `{base_url}/chat/completions` with a bearer credential and reads
//! `choices[0].message.content`.
//!
//! Models are tried in the configured order. Capacity errors (gateway code
//! `3505`, HTTP 429/503) and transient errors (network, timeout, other 5xx,
//! undecodable bodies) move on to the next model. Fatal errors (HTTP
//! 400/401/403/404/422) stop the loop under [`FallbackPolicy::Strict`] and
//! are treated like the others under [`FallbackPolicy::Lenient`].

use super::gate::RequestSpacingGate;
use super::{ChatCompletion, ChatGateway, ChatMessage, FallbackPolicy};
use crate::config::LlmConfig;
use crate::constants::{llm, service_names};
use crate::errors::{AppError, ErrorCode};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

// ============================================================================
// Errors
// ============================================================================

/// Failure of a gateway call
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The model is temporarily out of capacity
    #[error("model {model} is over capacity: {message}")]
    Capacity {
        /// Model that was attempted
        model: String,
        /// Gateway-provided message
        message: String,
    },
    /// Network failure, timeout, server error or unusable body
    #[error("model {model} request failed: {message}")]
    Transient {
        /// Model that was attempted
        model: String,
        /// Failure description
        message: String,
    },
    /// The gateway rejected the request itself
    #[error("model {model} rejected the request (HTTP {status}): {message}")]
    Fatal {
        /// Model that was attempted
        model: String,
        /// HTTP status returned
        status: u16,
        /// Gateway-provided message
        message: String,
    },
    /// Every configured model failed
    #[error("all models failed. Last error: {last}")]
    Exhausted {
        /// Number of attempts made
        attempts: usize,
        /// Error from the last attempted model
        last: Box<GatewayError>,
    },
    /// No models are configured
    #[error("no models configured for the chat-completion gateway")]
    NoModels,
    /// The HTTP client could not be constructed
    #[error("failed to create HTTP client: {0}")]
    Client(String),
}

impl GatewayError {
    /// Whether the fallback loop should try the next model after this error
    #[must_use]
    pub const fn is_retryable(&self, policy: FallbackPolicy) -> bool {
        match self {
            Self::Capacity { .. } | Self::Transient { .. } => true,
            Self::Fatal { .. } => matches!(policy, FallbackPolicy::Lenient),
            Self::Exhausted { .. } | Self::NoModels | Self::Client(_) => false,
        }
    }

    /// Whether this is (or ended with) a capacity failure
    #[must_use]
    pub fn is_capacity(&self) -> bool {
        match self {
            Self::Capacity { .. } => true,
            Self::Exhausted { last, .. } => last.is_capacity(),
            _ => false,
        }
    }
}

impl From<GatewayError> for AppError {
    fn from(error: GatewayError) -> Self {
        let message = error.to_string();
        match &error {
            GatewayError::Fatal {
                status: 401 | 403, ..
            } => Self::new(
                ErrorCode::ExternalAuthFailed,
                format!("{}: {message}", service_names::LLM_GATEWAY),
            ),
            GatewayError::NoModels | GatewayError::Client(_) => Self::config(message),
            _ if error.is_capacity() => {
                Self::external_unavailable(service_names::LLM_GATEWAY, message)
            }
            _ => Self::external_service(service_names::LLM_GATEWAY, message),
        }
    }
}

// ============================================================================
// Wire Types (OpenAI-compatible format)
// ============================================================================

/// Chat-completion request body
#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
}

/// Message in the request body
#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

impl<'a> From<&'a ChatMessage> for WireMessage<'a> {
    fn from(msg: &'a ChatMessage) -> Self {
        Self {
            role: msg.role.as_str(),
            content: &msg.content,
        }
    }
}

/// Chat-completion response body
#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
    #[serde(default)]
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Error code as sent by the gateway, either `"3505"` or `3505`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorCodeValue {
    Text(String),
    Number(i64),
}

impl ErrorCodeValue {
    fn as_string(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Number(n) => n.to_string(),
        }
    }
}

/// Error body: `{error: {message, type, code}}` or a flat `{message, code}`
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<ErrorDetail>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    code: Option<ErrorCodeValue>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: Option<String>,
    #[serde(default, rename = "type")]
    error_type: Option<String>,
    #[serde(default)]
    code: Option<ErrorCodeValue>,
}

/// Decoded error code and message
struct ErrorInfo {
    code: Option<String>,
    message: String,
}

impl ErrorInfo {
    /// Best-effort decode of an error body
    fn parse(body: &str) -> Option<Self> {
        let parsed: ErrorBody = serde_json::from_str(body).ok()?;
        match parsed.error {
            Some(detail) => Some(Self {
                code: detail.code.as_ref().map(ErrorCodeValue::as_string),
                message: detail
                    .message
                    .or(detail.error_type)
                    .unwrap_or_else(|| "unknown error".to_owned()),
            }),
            None if parsed.message.is_some() || parsed.code.is_some() => Some(Self {
                code: parsed.code.as_ref().map(ErrorCodeValue::as_string),
                message: parsed
                    .message
                    .unwrap_or_else(|| "unknown error".to_owned()),
            }),
            None => None,
        }
    }
}

/// Shorten a raw body for error messages
fn body_excerpt(body: &str) -> String {
    const MAX: usize = 300;
    if body.chars().count() > MAX {
        format!("{}...", body.chars().take(MAX).collect::<String>())
    } else {
        body.to_owned()
    }
}

/// Classify a non-success (or error-bearing) response
fn classify_failure(model: &str, status: StatusCode, body: &str) -> GatewayError {
    let info = ErrorInfo::parse(body);
    let code = info.as_ref().and_then(|i| i.code.clone());
    let message = info.map_or_else(
        || format!("HTTP {}: {}", status.as_u16(), body_excerpt(body)),
        |i| i.message,
    );

    let capacity = code.as_deref() == Some(llm::CAPACITY_ERROR_CODE)
        || matches!(
            status,
            StatusCode::TOO_MANY_REQUESTS | StatusCode::SERVICE_UNAVAILABLE
        )
        || message.to_lowercase().contains("capacity");

    if capacity {
        return GatewayError::Capacity {
            model: model.to_owned(),
            message,
        };
    }

    match status.as_u16() {
        400 | 401 | 403 | 404 | 422 => GatewayError::Fatal {
            model: model.to_owned(),
            status: status.as_u16(),
            message,
        },
        _ => GatewayError::Transient {
            model: model.to_owned(),
            message,
        },
    }
}

// ============================================================================
// Client Configuration
// ============================================================================

/// Configuration for [`GatewayClient`]
#[derive(Clone)]
pub struct GatewayConfig {
    /// Base URL without the `/chat/completions` suffix
    pub base_url: String,
    /// Bearer credential
    pub api_key: String,
    /// Models tried in order
    pub models: Vec<String>,
    /// Per-attempt timeout
    pub request_timeout: Duration,
    /// Minimum spacing between dispatches
    pub min_request_interval: Duration,
    /// Handling of fatal errors
    pub fallback_policy: FallbackPolicy,
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("models", &self.models)
            .field("request_timeout", &self.request_timeout)
            .field("min_request_interval", &self.min_request_interval)
            .field("fallback_policy", &self.fallback_policy)
            .finish()
    }
}

impl GatewayConfig {
    /// Configuration with default models, timeout, spacing and strict policy
    #[must_use]
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            models: llm::DEFAULT_MODELS.iter().map(|m| (*m).to_owned()).collect(),
            request_timeout: Duration::from_secs(llm::REQUEST_TIMEOUT_SECS),
            min_request_interval: Duration::from_millis(llm::MIN_REQUEST_INTERVAL_MS),
            fallback_policy: FallbackPolicy::Strict,
        }
    }

    /// Replace the model list
    #[must_use]
    pub fn with_models<I, S>(mut self, models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.models = models.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the minimum dispatch spacing
    #[must_use]
    pub const fn with_min_request_interval(mut self, interval: Duration) -> Self {
        self.min_request_interval = interval;
        self
    }

    /// Replace the per-attempt timeout
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Replace the fallback policy
    #[must_use]
    pub const fn with_fallback_policy(mut self, policy: FallbackPolicy) -> Self {
        self.fallback_policy = policy;
        self
    }
}

impl From<&LlmConfig> for GatewayConfig {
    fn from(config: &LlmConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            models: config.models.clone(),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            min_request_interval: Duration::from_millis(config.min_request_interval_ms),
            fallback_policy: config.fallback_policy,
        }
    }
}

// ============================================================================
// Client
// ============================================================================

/// Chat-completion client with its own spacing gate
pub struct GatewayClient {
    client: Client,
    config: GatewayConfig,
    gate: RequestSpacingGate,
}

impl GatewayClient {
    /// Create a new client
    ///
    /// # Errors
    ///
    /// Returns an error if no models are configured or the HTTP client cannot be built
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayError> {
        if config.models.is_empty() {
            return Err(GatewayError::NoModels);
        }

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(llm::CONNECT_TIMEOUT_SECS))
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| GatewayError::Client(e.to_string()))?;

        info!(
            base_url = %config.base_url,
            models = ?config.models,
            policy = %config.fallback_policy,
            "Initializing chat-completion gateway client"
        );

        Ok(Self {
            client,
            gate: RequestSpacingGate::new(config.min_request_interval),
            config,
        })
    }

    /// Client configuration
    #[must_use]
    pub const fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Build the API URL for a given endpoint
    fn api_url(&self, endpoint: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            endpoint
        )
    }

    /// One attempt against one model
    async fn attempt(&self, model: &str, prompt: &str) -> Result<ChatCompletion, GatewayError> {
        let message = ChatMessage::user(prompt);
        let body = CompletionRequest {
            model,
            messages: vec![WireMessage::from(&message)],
        };

        self.gate.wait_turn().await;
        debug!(model, prompt_chars = prompt.chars().count(), "Dispatching chat completion");

        let response = self
            .client
            .post(self.api_url("chat/completions"))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::Transient {
                model: model.to_owned(),
                message: if e.is_timeout() {
                    format!(
                        "request timed out after {}s",
                        self.config.request_timeout.as_secs()
                    )
                } else if e.is_connect() {
                    format!("cannot connect to {}: {e}", self.config.base_url)
                } else {
                    format!("request error: {e}")
                },
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| GatewayError::Transient {
            model: model.to_owned(),
            message: format!("failed to read response: {e}"),
        })?;

        if !status.is_success() {
            return Err(classify_failure(model, status, &text));
        }

        let parsed: CompletionResponse = match serde_json::from_str(&text) {
            Ok(parsed) => parsed,
            Err(e) => {
                // Some gateways report errors with a 200 status
                if ErrorInfo::parse(&text).is_some() {
                    return Err(classify_failure(model, status, &text));
                }
                return Err(GatewayError::Transient {
                    model: model.to_owned(),
                    message: format!("failed to parse response: {e}"),
                });
            }
        };

        if parsed.choices.is_empty() && ErrorInfo::parse(&text).is_some() {
            return Err(classify_failure(model, status, &text));
        }

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| GatewayError::Transient {
                model: model.to_owned(),
                message: "response contained no answer".to_owned(),
            })?;

        Ok(ChatCompletion {
            content,
            model: parsed.model.unwrap_or_else(|| model.to_owned()),
        })
    }
}

#[async_trait]
impl ChatGateway for GatewayClient {
    #[instrument(skip(self, prompt), fields(models = self.config.models.len()))]
    async fn complete(&self, prompt: &str) -> Result<ChatCompletion, GatewayError> {
        let mut last_error = None;

        for (index, model) in self.config.models.iter().enumerate() {
            match self.attempt(model, prompt).await {
                Ok(completion) => {
                    info!(model = %model, attempt = index + 1, "Chat completion succeeded");
                    return Ok(completion);
                }
                Err(error) => {
                    let retry = error.is_retryable(self.config.fallback_policy);
                    warn!(
                        model = %model,
                        attempt = index + 1,
                        retry,
                        error = %error,
                        "Chat completion attempt failed"
                    );
                    if !retry {
                        return Err(error);
                    }
                    last_error = Some(error);
                }
            }
        }

        Err(GatewayError::Exhausted {
            attempts: self.config.models.len(),
            last: Box::new(last_error.unwrap_or(GatewayError::NoModels)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_code_is_detected_in_nested_error() {
        let body = r#"{"error":{"message":"Service tier capacity exceeded","type":"service_tier_capacity_exceeded","code":"3505"}}"#;
        let err = classify_failure("m1", StatusCode::BAD_REQUEST, body);
        assert!(matches!(err, GatewayError::Capacity { .. }));
    }

    #[test]
    fn test_numeric_capacity_code_in_flat_error() {
        let body = r#"{"object":"error","message":"busy","code":3505}"#;
        let err = classify_failure("m1", StatusCode::OK, body);
        assert!(matches!(err, GatewayError::Capacity { .. }));
    }

    #[test]
    fn test_unauthorized_is_fatal_and_stops_strict_policy() {
        let body = r#"{"message":"Unauthorized"}"#;
        let err = classify_failure("m1", StatusCode::UNAUTHORIZED, body);
        assert!(matches!(err, GatewayError::Fatal { status: 401, .. }));
        assert!(!err.is_retryable(FallbackPolicy::Strict));
        assert!(err.is_retryable(FallbackPolicy::Lenient));
        assert_eq!(AppError::from(err).code, ErrorCode::ExternalAuthFailed);
    }

    #[test]
    fn test_server_error_with_plain_body_is_transient() {
        let err = classify_failure("m1", StatusCode::BAD_GATEWAY, "upstream down");
        match err {
            GatewayError::Transient { message, .. } => assert!(message.contains("upstream down")),
            other => panic!("expected transient error, got {other:?}"),
        }
    }

    #[test]
    fn test_exhausted_message_names_last_model() {
        let err = GatewayError::Exhausted {
            attempts: 2,
            last: Box::new(GatewayError::Capacity {
                model: "open-mistral-7b".to_owned(),
                message: "capacity exceeded".to_owned(),
            }),
        };
        let text = err.to_string();
        assert!(text.starts_with("all models failed. Last error:"));
        assert!(text.contains("open-mistral-7b"));
        assert_eq!(
            AppError::from(err).code,
            ErrorCode::ExternalServiceUnavailable
        );
    }

    #[test]
    fn test_empty_model_list_is_rejected() {
        let config =
            GatewayConfig::new("http://localhost", "key").with_models(Vec::<String>::new());
        assert!(matches!(GatewayClient::new(config), Err(GatewayError::NoModels)));
    }
}
