// ABOUTME: Chat-completion gateway abstraction, prompt assembly and request spacing
// ABOUTME: Defines the ChatGateway trait, wire-independent message types and fallback policy
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Procedure Assistant Contributors

//! # LLM Gateway Module
//!
//! The assistant talks to one hosted, OpenAI-compatible chat-completion API.
//! [`GatewayClient`] sends a single-turn prompt, spacing dispatches through a
//! [`RequestSpacingGate`] and falling back through an ordered model list.
//! [`PromptAssembler`] turns a question and retrieved procedures into that prompt.
//!
//! ## Example
//!
//! ```rust,no_run
//! use procedure_assistant::llm::{ChatGateway, GatewayClient, GatewayConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = GatewayClient::new(GatewayConfig::new("https://api.mistral.ai/v1", "key"))?;
//! let completion = client.complete("How do I request annual leave?").await?;
//! println!("{} answered: {}", completion.model, completion.content);
//! # Ok(())
//! # }
//! ```

/// Minimum-spacing gate shared by all callers of one client
pub mod gate;
/// OpenAI-compatible gateway client with model fallback
pub mod gateway;
/// Prompt assembly from question and retrieved procedures
pub mod prompts;

pub use gate::RequestSpacingGate;
pub use gateway::{GatewayClient, GatewayConfig, GatewayError};
pub use prompts::PromptAssembler;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role of a message sent to the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System instruction message
    System,
    /// User input message
    User,
    /// Assistant response message
    Assistant,
}

impl MessageRole {
    /// Convert to string representation for API calls
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// A single message sent to the gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender
    pub role: MessageRole,
    /// Message content
    pub content: String,
}

impl ChatMessage {
    /// Create a user message
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

/// A successful completion
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatCompletion {
    /// Assistant answer text
    pub content: String,
    /// Model that produced the answer
    pub model: String,
}

/// How the gateway treats failures that are not capacity or transient errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackPolicy {
    /// Stop at the first fatal error (bad credentials, rejected request)
    #[default]
    Strict,
    /// Try the next model after any error
    Lenient,
}

impl fmt::Display for FallbackPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Strict => write!(f, "strict"),
            Self::Lenient => write!(f, "lenient"),
        }
    }
}

impl FromStr for FallbackPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "lenient" => Ok(Self::Lenient),
            other => Err(format!(
                "Invalid LLM_FALLBACK_POLICY '{other}' (expected 'strict' or 'lenient')"
            )),
        }
    }
}

/// A chat-completion backend that answers a single prompt
#[async_trait]
pub trait ChatGateway: Send + Sync {
    /// Answer `prompt`, trying models until one succeeds
    async fn complete(&self, prompt: &str) -> Result<ChatCompletion, GatewayError>;
}
