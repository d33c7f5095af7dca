// ABOUTME: Persists question/answer exchanges into per-user conversations
// ABOUTME: Appends to an owned or recent conversation, otherwise starts a new titled one
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Procedure Assistant Contributors

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use crate::constants::conversation;
use crate::database::ConversationRepository;
use crate::errors::AppResult;
use crate::llm::prompts::truncate_chars;
use crate::models::ConversationRole;

/// Records chat exchanges
///
/// Every call re-queries the store; nothing about a user's session is kept
/// in memory.
#[derive(Clone)]
pub struct ConversationRecorder {
    conversations: Arc<dyn ConversationRepository>,
    merge_window: Duration,
}

impl ConversationRecorder {
    /// Recorder with the default one-hour merge window
    #[must_use]
    pub fn new(conversations: Arc<dyn ConversationRepository>) -> Self {
        Self {
            conversations,
            merge_window: Duration::minutes(conversation::MERGE_WINDOW_MINUTES),
        }
    }

    /// Record an exchange at the current time, returning the conversation ID
    ///
    /// # Errors
    ///
    /// Returns the store's error
    pub async fn record(
        &self,
        user_id: &str,
        conversation_id: Option<&str>,
        question: &str,
        answer: &str,
    ) -> AppResult<String> {
        self.record_at(Utc::now(), user_id, conversation_id, question, answer)
            .await
    }

    /// Record an exchange as of `now`
    ///
    /// Target selection, first match wins:
    /// 1. `conversation_id` when it exists and belongs to `user_id`
    /// 2. the user's latest conversation created within the merge window
    /// 3. a new conversation titled from the question
    ///
    /// # Errors
    ///
    /// Returns the store's error
    pub async fn record_at(
        &self,
        now: DateTime<Utc>,
        user_id: &str,
        conversation_id: Option<&str>,
        question: &str,
        answer: &str,
    ) -> AppResult<String> {
        let target = match conversation_id {
            Some(id) => self.conversations.find_owned_conversation(id, user_id).await?,
            None => None,
        };

        let target = match target {
            Some(found) => Some(found),
            None => {
                self.conversations
                    .find_recent_conversation(user_id, now - self.merge_window)
                    .await?
            }
        };

        let id = if let Some(existing) = target {
            debug!(conversation_id = %existing.id, "Appending exchange to conversation");
            existing.id
        } else {
            let created = self
                .conversations
                .create_conversation(user_id, &derive_title(question), now)
                .await?;
            info!(conversation_id = %created.id, user_id, "Started new conversation");
            created.id
        };

        self.conversations
            .append_messages(
                &id,
                &[
                    (ConversationRole::User, question),
                    (ConversationRole::Assistant, answer),
                ],
                now,
            )
            .await?;

        Ok(id)
    }
}

/// Conversation title from the first characters of the question
#[must_use]
pub fn derive_title(question: &str) -> String {
    let trimmed = question.trim();
    if trimmed.is_empty() {
        conversation::DEFAULT_TITLE.to_owned()
    } else {
        truncate_chars(trimmed, conversation::TITLE_MAX_CHARS)
    }
}
