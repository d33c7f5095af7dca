// ABOUTME: Repository traits separating services from the concrete store
// ABOUTME: Implemented on Database; test doubles implement them to inject failures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Procedure Assistant Contributors

use super::UserUpdate;
use crate::errors::AppResult;
use crate::models::{
    Category, Conversation, ConversationRole, ConversationSummary, NewCategory, Procedure,
    ProcedureInput, User, UserRole,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Procedure storage
#[async_trait]
pub trait ProcedureRepository: Send + Sync {
    /// Insert a new procedure
    async fn create_procedure(
        &self,
        input: &ProcedureInput,
        created_by: Option<&str>,
    ) -> AppResult<Procedure>;

    /// Get a procedure by ID
    async fn get_procedure(&self, id: &str) -> AppResult<Option<Procedure>>;

    /// List procedures newest first, optionally restricted to one category
    async fn list_procedures(&self, category: Option<&str>) -> AppResult<Vec<Procedure>>;

    /// Procedures whose title, content or description contains `query`
    /// case-insensitively, in insertion order
    async fn search_procedures(&self, query: &str) -> AppResult<Vec<Procedure>>;

    /// Replace a procedure's editable fields; `None` when the ID is unknown
    async fn update_procedure(
        &self,
        id: &str,
        input: &ProcedureInput,
    ) -> AppResult<Option<Procedure>>;

    /// Delete a procedure; `false` when the ID is unknown
    async fn delete_procedure(&self, id: &str) -> AppResult<bool>;

    /// Number of stored procedures
    async fn count_procedures(&self) -> AppResult<i64>;
}

/// Category storage
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// All categories ordered by name
    async fn list_categories(&self) -> AppResult<Vec<Category>>;

    /// Insert a category; fails with `RESOURCE_ALREADY_EXISTS` on a duplicate name
    async fn create_category(&self, category: &NewCategory) -> AppResult<Category>;

    /// Number of stored categories
    async fn count_categories(&self) -> AppResult<i64>;
}

/// User account storage
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user; fails with `RESOURCE_ALREADY_EXISTS` on a duplicate email
    async fn create_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        role: UserRole,
    ) -> AppResult<User>;

    /// Get a user by ID
    async fn get_user(&self, id: &str) -> AppResult<Option<User>>;

    /// Get a user by (lower-cased) email
    async fn get_user_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// All users, newest first
    async fn list_users(&self) -> AppResult<Vec<User>>;

    /// Apply a partial update; `None` when the ID is unknown
    async fn update_user(&self, id: &str, update: &UserUpdate) -> AppResult<Option<User>>;

    /// Delete a user and their conversations; `false` when the ID is unknown
    async fn delete_user(&self, id: &str) -> AppResult<bool>;

    /// Number of stored users
    async fn count_users(&self) -> AppResult<i64>;
}

/// Conversation storage
#[async_trait]
pub trait ConversationRepository: Send + Sync {
    /// Create an empty conversation for a user
    async fn create_conversation(
        &self,
        user_id: &str,
        title: &str,
        at: DateTime<Utc>,
    ) -> AppResult<ConversationSummary>;

    /// The conversation with this ID if it belongs to `user_id`
    async fn find_owned_conversation(
        &self,
        conversation_id: &str,
        user_id: &str,
    ) -> AppResult<Option<ConversationSummary>>;

    /// The user's most recently created conversation created at or after `since`
    async fn find_recent_conversation(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> AppResult<Option<ConversationSummary>>;

    /// Append messages in order and refresh `updated_at`
    async fn append_messages(
        &self,
        conversation_id: &str,
        messages: &[(ConversationRole, &str)],
        at: DateTime<Utc>,
    ) -> AppResult<()>;

    /// Full conversation with messages, if owned by `user_id`
    async fn get_conversation(
        &self,
        conversation_id: &str,
        user_id: &str,
    ) -> AppResult<Option<Conversation>>;

    /// The user's conversations, most recently updated first
    async fn list_conversations(
        &self,
        user_id: &str,
        limit: i64,
    ) -> AppResult<Vec<ConversationSummary>>;

    /// Delete a conversation owned by `user_id`; `false` when absent
    async fn delete_conversation(&self, conversation_id: &str, user_id: &str) -> AppResult<bool>;

    /// Number of stored conversations
    async fn count_conversations(&self) -> AppResult<i64>;
}
