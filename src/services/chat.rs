// ABOUTME: Chat orchestration from question to answer: retrieval, prompt, gateway call, recording
// ABOUTME: Retrieval falls back to the plain path and recording is best-effort with a failure counter
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Procedure Assistant Contributors

//! # Chat Orchestrator
//!
//! One request moves through
//! `ReceivedRequest -> Retrieving -> PromptBuilt -> Calling -> Succeeded | Exhausted`.
//! Retrieval is skipped when the caller asks for the plain path and
//! abandoned when the store fails. Recording only happens for an
//! identified caller after a successful answer, and its failures never
//! reach the caller.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, instrument, warn, Instrument};

use super::recorder::ConversationRecorder;
use super::retrieval::RetrievalHelper;
use crate::errors::{AppError, AppResult};
use crate::llm::{ChatGateway, PromptAssembler};
use crate::models::Procedure;

/// Stage of a chat request, used to tag log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatStage {
    /// Request accepted
    ReceivedRequest,
    /// Looking up procedures
    Retrieving,
    /// Prompt assembled
    PromptBuilt,
    /// Waiting on the gateway
    Calling,
    /// Answer obtained
    Succeeded,
    /// Every model failed
    Exhausted,
}

impl fmt::Display for ChatStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ReceivedRequest => "received_request",
            Self::Retrieving => "retrieving",
            Self::PromptBuilt => "prompt_built",
            Self::Calling => "calling",
            Self::Succeeded => "succeeded",
            Self::Exhausted => "exhausted",
        };
        f.write_str(name)
    }
}

/// A validated chat request
#[derive(Debug, Clone)]
pub struct ChatRequest {
    /// The user's question
    pub question: String,
    /// Conversation to continue, when the caller names one
    pub conversation_id: Option<String>,
    /// Whether to augment the prompt with retrieved procedures
    pub use_rag: bool,
}

impl ChatRequest {
    /// Request for `question` using retrieval and no explicit conversation
    #[must_use]
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            conversation_id: None,
            use_rag: true,
        }
    }
}

/// Answer returned to the caller
#[derive(Debug, Clone, Serialize)]
pub struct ChatAnswer {
    /// Assistant answer text
    pub answer: String,
    /// Model that produced the answer
    pub model: String,
    /// Conversation the exchange was recorded in, when recording succeeded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

/// Process-wide chat counters
#[derive(Debug, Default)]
pub struct ChatMetrics {
    requests: AtomicU64,
    answered: AtomicU64,
    exhausted: AtomicU64,
    retrieval_fallbacks: AtomicU64,
    persistence_failures: AtomicU64,
}

/// Point-in-time copy of [`ChatMetrics`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChatMetricsSnapshot {
    /// Chat requests accepted
    pub requests: u64,
    /// Requests answered by a model
    pub answered: u64,
    /// Requests where every model failed
    pub exhausted: u64,
    /// Requests where retrieval failed and the plain path was used
    pub retrieval_fallbacks: u64,
    /// Answers whose recording failed
    pub persistence_failures: u64,
}

impl ChatMetrics {
    /// Current counter values
    #[must_use]
    pub fn snapshot(&self) -> ChatMetricsSnapshot {
        ChatMetricsSnapshot {
            requests: self.requests.load(Ordering::Relaxed),
            answered: self.answered.load(Ordering::Relaxed),
            exhausted: self.exhausted.load(Ordering::Relaxed),
            retrieval_fallbacks: self.retrieval_fallbacks.load(Ordering::Relaxed),
            persistence_failures: self.persistence_failures.load(Ordering::Relaxed),
        }
    }

    /// Number of failed recordings so far
    #[must_use]
    pub fn persistence_failures(&self) -> u64 {
        self.persistence_failures.load(Ordering::Relaxed)
    }

    fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Runs chat requests end to end
#[derive(Clone)]
pub struct ChatOrchestrator {
    retrieval: RetrievalHelper,
    assembler: PromptAssembler,
    gateway: Arc<dyn ChatGateway>,
    recorder: ConversationRecorder,
    metrics: Arc<ChatMetrics>,
}

impl ChatOrchestrator {
    /// Wire an orchestrator from its collaborators
    #[must_use]
    pub fn new(
        retrieval: RetrievalHelper,
        assembler: PromptAssembler,
        gateway: Arc<dyn ChatGateway>,
        recorder: ConversationRecorder,
    ) -> Self {
        Self {
            retrieval,
            assembler,
            gateway,
            recorder,
            metrics: Arc::new(ChatMetrics::default()),
        }
    }

    /// Shared counters
    #[must_use]
    pub fn metrics(&self) -> &ChatMetrics {
        &self.metrics
    }

    /// Answer a question, recording the exchange when `user_id` is present
    ///
    /// # Errors
    ///
    /// Returns `INVALID_INPUT` for an empty question, or the gateway failure
    /// when no model answered. Retrieval and recording failures never surface.
    #[instrument(
        skip(self, request),
        fields(use_rag = request.use_rag, user_id = user_id.unwrap_or("anonymous"))
    )]
    pub async fn answer(
        &self,
        request: &ChatRequest,
        user_id: Option<&str>,
    ) -> AppResult<ChatAnswer> {
        let question = request.question.trim();
        if question.is_empty() {
            return Err(AppError::invalid_input("Message cannot be empty"));
        }
        ChatMetrics::incr(&self.metrics.requests);
        debug!(stage = %ChatStage::ReceivedRequest, "Chat request accepted");

        // `None` means the plain path: the raw question goes to the gateway
        let context = if request.use_rag {
            self.retrieve_context(question).await
        } else {
            None
        };

        let prompt = match &context {
            Some(procedures) => self.assembler.assemble(question, procedures),
            None => question.to_owned(),
        };
        debug!(
            stage = %ChatStage::PromptBuilt,
            context_procedures = context.as_ref().map_or(0, Vec::len),
            prompt_chars = prompt.chars().count(),
            "Prompt ready"
        );

        debug!(stage = %ChatStage::Calling, "Calling chat-completion gateway");
        let completion = match self.gateway.complete(&prompt).await {
            Ok(completion) => completion,
            Err(error) => {
                ChatMetrics::incr(&self.metrics.exhausted);
                warn!(stage = %ChatStage::Exhausted, error = %error, "No model answered");
                return Err(error.into());
            }
        };
        ChatMetrics::incr(&self.metrics.answered);
        info!(stage = %ChatStage::Succeeded, model = %completion.model, "Chat answered");

        let conversation_id = match user_id {
            Some(user_id) => {
                self.record_best_effort(user_id, request, question, &completion.content)
                    .await
            }
            None => None,
        };

        Ok(ChatAnswer {
            answer: completion.content,
            model: completion.model,
            conversation_id,
        })
    }

    /// Answer on a spawned task that outlives the caller
    ///
    /// Dropping the returned future (client disconnect, request timeout)
    /// does not cancel the gateway call or the recording that follows it.
    ///
    /// # Errors
    ///
    /// Same as [`Self::answer`], plus `INTERNAL_ERROR` if the task panics
    pub async fn answer_detached(
        &self,
        request: ChatRequest,
        user_id: Option<String>,
    ) -> AppResult<ChatAnswer> {
        let orchestrator = self.clone();
        tokio::spawn(
            async move { orchestrator.answer(&request, user_id.as_deref()).await }
                .in_current_span(),
        )
            .await
            .map_err(|e| AppError::internal(format!("Chat task failed: {e}")))?
    }

    async fn retrieve_context(&self, question: &str) -> Option<Vec<Procedure>> {
        debug!(stage = %ChatStage::Retrieving, "Retrieving procedures");
        match self.retrieval.retrieve(question).await {
            Ok(found) => Some(found),
            Err(error) => {
                ChatMetrics::incr(&self.metrics.retrieval_fallbacks);
                warn!(error = %error, "Retrieval failed, answering without procedure context");
                None
            }
        }
    }

    async fn record_best_effort(
        &self,
        user_id: &str,
        request: &ChatRequest,
        question: &str,
        answer: &str,
    ) -> Option<String> {
        match self
            .recorder
            .record(user_id, request.conversation_id.as_deref(), question, answer)
            .await
        {
            Ok(id) => Some(id),
            Err(error) => {
                ChatMetrics::incr(&self.metrics.persistence_failures);
                warn!(user_id, error = %error, "Failed to record chat exchange");
                None
            }
        }
    }
}
