// ABOUTME: Conversation and message types for persisted chat history
// ABOUTME: Messages are role-tagged, append-only and ordered by sequence number
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Procedure Assistant Contributors

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Who authored a persisted message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationRole {
    /// The person asking
    User,
    /// The assistant answering
    Assistant,
}

impl ConversationRole {
    /// Convert to the string stored in the database
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl fmt::Display for ConversationRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConversationRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            other => Err(format!("Unknown conversation role: {other}")),
        }
    }
}

/// A single persisted message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMessage {
    /// Position within the conversation, starting at 0
    pub sequence: i64,
    /// Author role
    pub role: ConversationRole,
    /// Message text
    pub content: String,
    /// When the message was appended
    pub timestamp: DateTime<Utc>,
}

/// A user's conversation with its full message list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    /// Unique conversation ID
    pub id: String,
    /// Owning user ID
    pub user_id: String,
    /// Title derived from the first question
    pub title: String,
    /// Messages in chronological order
    pub messages: Vec<ConversationMessage>,
    /// When the conversation was created
    pub created_at: DateTime<Utc>,
    /// When the conversation last received a message
    pub updated_at: DateTime<Utc>,
}

/// Summary of a conversation for listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationSummary {
    /// Conversation ID
    pub id: String,
    /// Conversation title
    pub title: String,
    /// Number of messages in the conversation
    pub message_count: i64,
    /// When the conversation was created
    pub created_at: DateTime<Utc>,
    /// When the conversation was last updated
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trips_through_storage_string() {
        for role in [ConversationRole::User, ConversationRole::Assistant] {
            assert_eq!(role.as_str().parse::<ConversationRole>().unwrap(), role);
        }
        assert!("system".parse::<ConversationRole>().is_err());
    }
}
