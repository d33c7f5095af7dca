// ABOUTME: Conversation and message persistence with per-user ownership checks
// ABOUTME: Implements ConversationRepository on Database with append-only ordered messages
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Procedure Assistant Contributors

use super::{format_timestamp, parse_timestamp, ConversationRepository, Database};
use crate::errors::{AppError, AppResult};
use crate::models::{Conversation, ConversationMessage, ConversationRole, ConversationSummary};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

const SUMMARY_SELECT: &str = r"
    SELECT c.id, c.title, c.created_at, c.updated_at,
           (SELECT COUNT(*) FROM conversation_messages m WHERE m.conversation_id = c.id) AS message_count
    FROM conversations c
";

fn row_to_summary(row: &SqliteRow) -> AppResult<ConversationSummary> {
    Ok(ConversationSummary {
        id: row.get("id"),
        title: row.get("title"),
        message_count: row.get("message_count"),
        created_at: parse_timestamp(row.get("created_at"))?,
        updated_at: parse_timestamp(row.get("updated_at"))?,
    })
}

impl Database {
    async fn get_messages(&self, conversation_id: &str) -> AppResult<Vec<ConversationMessage>> {
        let rows = sqlx::query(
            r"
            SELECT sequence, role, content, created_at
            FROM conversation_messages
            WHERE conversation_id = $1
            ORDER BY sequence ASC
            ",
        )
        .bind(conversation_id)
        .fetch_all(self.pool())
        .await
        .map_err(|e| AppError::database(format!("Failed to get messages: {e}")))?;

        rows.iter()
            .map(|r| {
                let role: String = r.get("role");
                Ok(ConversationMessage {
                    sequence: r.get("sequence"),
                    role: role.parse().map_err(AppError::database)?,
                    content: r.get("content"),
                    timestamp: parse_timestamp(r.get("created_at"))?,
                })
            })
            .collect()
    }
}

#[async_trait]
impl ConversationRepository for Database {
    async fn create_conversation(
        &self,
        user_id: &str,
        title: &str,
        at: DateTime<Utc>,
    ) -> AppResult<ConversationSummary> {
        let id = Uuid::new_v4().to_string();
        let stamp = format_timestamp(at);

        sqlx::query(
            r"
            INSERT INTO conversations (id, user_id, title, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $4)
            ",
        )
        .bind(&id)
        .bind(user_id)
        .bind(title)
        .bind(&stamp)
        .execute(self.pool())
        .await
        .map_err(|e| AppError::database(format!("Failed to create conversation: {e}")))?;

        Ok(ConversationSummary {
            id,
            title: title.to_owned(),
            message_count: 0,
            created_at: parse_timestamp(&stamp)?,
            updated_at: parse_timestamp(&stamp)?,
        })
    }

    async fn find_owned_conversation(
        &self,
        conversation_id: &str,
        user_id: &str,
    ) -> AppResult<Option<ConversationSummary>> {
        let row = sqlx::query(&format!(
            "{SUMMARY_SELECT} WHERE c.id = $1 AND c.user_id = $2"
        ))
        .bind(conversation_id)
        .bind(user_id)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| AppError::database(format!("Failed to get conversation: {e}")))?;

        row.as_ref().map(row_to_summary).transpose()
    }

    async fn find_recent_conversation(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> AppResult<Option<ConversationSummary>> {
        let row = sqlx::query(&format!(
            "{SUMMARY_SELECT} WHERE c.user_id = $1 AND c.created_at >= $2 ORDER BY c.created_at DESC LIMIT 1"
        ))
        .bind(user_id)
        .bind(format_timestamp(since))
        .fetch_optional(self.pool())
        .await
        .map_err(|e| AppError::database(format!("Failed to find recent conversation: {e}")))?;

        row.as_ref().map(row_to_summary).transpose()
    }

    async fn append_messages(
        &self,
        conversation_id: &str,
        messages: &[(ConversationRole, &str)],
        at: DateTime<Utc>,
    ) -> AppResult<()> {
        let stamp = format_timestamp(at);
        let mut tx = self
            .pool()
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {e}")))?;

        let updated = sqlx::query("UPDATE conversations SET updated_at = $1 WHERE id = $2")
            .bind(&stamp)
            .bind(conversation_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::database(format!("Failed to touch conversation: {e}")))?;
        if updated.rows_affected() == 0 {
            return Err(AppError::not_found(format!(
                "Conversation {conversation_id}"
            )));
        }

        for (role, content) in messages {
            sqlx::query(
                r"
                INSERT INTO conversation_messages (conversation_id, sequence, role, content, created_at)
                SELECT $1, COALESCE(MAX(sequence), -1) + 1, $2, $3, $4
                FROM conversation_messages
                WHERE conversation_id = $1
                ",
            )
            .bind(conversation_id)
            .bind(role.as_str())
            .bind(*content)
            .bind(&stamp)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::database(format!("Failed to append message: {e}")))?;
        }

        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit messages: {e}")))
    }

    async fn get_conversation(
        &self,
        conversation_id: &str,
        user_id: &str,
    ) -> AppResult<Option<Conversation>> {
        let row = sqlx::query(
            r"
            SELECT id, user_id, title, created_at, updated_at
            FROM conversations
            WHERE id = $1 AND user_id = $2
            ",
        )
        .bind(conversation_id)
        .bind(user_id)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| AppError::database(format!("Failed to get conversation: {e}")))?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(Conversation {
            id: row.get("id"),
            user_id: row.get("user_id"),
            title: row.get("title"),
            messages: self.get_messages(conversation_id).await?,
            created_at: parse_timestamp(row.get("created_at"))?,
            updated_at: parse_timestamp(row.get("updated_at"))?,
        }))
    }

    async fn list_conversations(
        &self,
        user_id: &str,
        limit: i64,
    ) -> AppResult<Vec<ConversationSummary>> {
        let rows = sqlx::query(&format!(
            "{SUMMARY_SELECT} WHERE c.user_id = $1 ORDER BY c.updated_at DESC LIMIT $2"
        ))
        .bind(user_id)
        .bind(limit)
        .fetch_all(self.pool())
        .await
        .map_err(|e| AppError::database(format!("Failed to list conversations: {e}")))?;

        rows.iter().map(row_to_summary).collect()
    }

    async fn delete_conversation(&self, conversation_id: &str, user_id: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM conversations WHERE id = $1 AND user_id = $2")
            .bind(conversation_id)
            .bind(user_id)
            .execute(self.pool())
            .await
            .map_err(|e| AppError::database(format!("Failed to delete conversation: {e}")))?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_conversations(&self) -> AppResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM conversations")
            .fetch_one(self.pool())
            .await
            .map_err(|e| AppError::database(format!("Failed to count conversations: {e}")))
    }
}
