// ABOUTME: Chat route handlers for the procedure assistant
// ABOUTME: Public and authenticated chat endpoints plus conversation history management
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Procedure Assistant Contributors

//! Chat routes
//!
//! `POST /api/chat/public` answers anonymously and never records anything.
//! The remaining endpoints require a bearer token; `POST /api/chat` records
//! the exchange in the caller's conversation history. Answers run on their
//! own task so a dropped connection still finishes and records the exchange.

use crate::{
    auth::AuthResult,
    constants::conversation,
    errors::AppError,
    models::{Conversation, ConversationSummary},
    resources::ServerResources,
    services::{ChatAnswer, ChatRequest},
};
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// ============================================================================
// Request/Response Types
// ============================================================================

const fn default_use_rag() -> bool {
    true
}

/// Chat request body; `question` is accepted as an alias of `message`
#[derive(Debug, Deserialize)]
pub struct ChatBody {
    /// The user's question
    #[serde(default, alias = "question")]
    pub message: String,
    /// Conversation to continue
    #[serde(default)]
    pub conversation_id: Option<String>,
    /// Whether to add retrieved procedures to the prompt
    #[serde(default = "default_use_rag")]
    pub use_rag: bool,
}

impl From<ChatBody> for ChatRequest {
    fn from(body: ChatBody) -> Self {
        Self {
            question: body.message,
            conversation_id: body.conversation_id.filter(|id| !id.trim().is_empty()),
            use_rag: body.use_rag,
        }
    }
}

/// Conversation history listing
#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    /// Latest conversations, most recently updated first
    pub conversations: Vec<ConversationSummary>,
    /// Number of conversations returned
    pub total: usize,
}

// ============================================================================
// Chat Routes
// ============================================================================

/// Chat routes handler
pub struct ChatRoutes;

impl ChatRoutes {
    /// Create all chat routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/chat/public", post(Self::public_chat))
            .route("/api/chat", post(Self::chat))
            .route("/api/history", get(Self::history))
            .route(
                "/api/chat/conversations/:conversation_id",
                get(Self::get_conversation).delete(Self::delete_conversation),
            )
            .with_state(resources)
    }

    fn authenticate(
        headers: &HeaderMap,
        resources: &ServerResources,
    ) -> Result<AuthResult, AppError> {
        resources
            .auth_middleware
            .authenticate_request_with_headers(headers)
    }

    /// Answer without authentication or recording
    async fn public_chat(
        State(resources): State<Arc<ServerResources>>,
        Json(body): Json<ChatBody>,
    ) -> Result<Json<ChatAnswer>, AppError> {
        let answer = resources
            .chat
            .answer_detached(ChatRequest::from(body), None)
            .await?;
        Ok(Json(answer))
    }

    /// Answer and record the exchange for the caller
    async fn chat(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(body): Json<ChatBody>,
    ) -> Result<Json<ChatAnswer>, AppError> {
        let auth = Self::authenticate(&headers, &resources)?;
        let answer = resources
            .chat
            .answer_detached(ChatRequest::from(body), Some(auth.user_id))
            .await?;
        Ok(Json(answer))
    }

    /// Caller's latest conversations
    async fn history(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Json<HistoryResponse>, AppError> {
        let auth = Self::authenticate(&headers, &resources)?;
        let conversations = resources
            .conversations
            .list_conversations(&auth.user_id, conversation::HISTORY_LIMIT)
            .await?;

        Ok(Json(HistoryResponse {
            total: conversations.len(),
            conversations,
        }))
    }

    /// One of the caller's conversations with all messages
    async fn get_conversation(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(conversation_id): Path<String>,
    ) -> Result<Json<Conversation>, AppError> {
        let auth = Self::authenticate(&headers, &resources)?;
        let conversation = resources
            .conversations
            .get_conversation(&conversation_id, &auth.user_id)
            .await?
            .ok_or_else(|| AppError::not_found("Conversation"))?;

        Ok(Json(conversation))
    }

    /// Delete one of the caller's conversations
    async fn delete_conversation(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(conversation_id): Path<String>,
    ) -> Result<Response, AppError> {
        let auth = Self::authenticate(&headers, &resources)?;
        let deleted = resources
            .conversations
            .delete_conversation(&conversation_id, &auth.user_id)
            .await?;

        if !deleted {
            return Err(AppError::not_found("Conversation"));
        }

        Ok(StatusCode::NO_CONTENT.into_response())
    }
}
