// ABOUTME: Domain service layer for business logic extracted from route handlers
// ABOUTME: Chat orchestration, retrieval, recording, document ingestion and account management
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Procedure Assistant Contributors

//! Domain service layer
//!
//! Route handlers stay thin and delegate here. Services depend on the
//! repository traits rather than on [`crate::database::Database`], so tests
//! can swap in failing stores.

/// Registration, login and admin-managed accounts
pub mod auth;
/// Question to answer orchestration
pub mod chat;
/// Procedures created from uploaded PDF and Word files
pub mod documents;
/// Conversation persistence with merge-or-create
pub mod recorder;
/// Keyword procedure retrieval
pub mod retrieval;

pub use auth::AuthService;
pub use chat::{ChatAnswer, ChatMetrics, ChatMetricsSnapshot, ChatOrchestrator, ChatRequest};
pub use documents::{DocumentIngestor, UploadedDocument};
pub use recorder::ConversationRecorder;
pub use retrieval::RetrievalHelper;
