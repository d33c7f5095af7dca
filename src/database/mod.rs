// ABOUTME: SQLite persistence for procedures, categories, users and conversations
// ABOUTME: Owns the connection pool, runs idempotent migrations and exposes repository traits
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Procedure Assistant Contributors

//! # Database Management
//!
//! The store is a single SQLite database accessed through an sqlx pool.
//! Each table family lives in its own submodule, which implements the
//! matching repository trait from [`repositories`] on [`Database`].

mod categories;
mod conversations;
mod procedures;
/// Repository traits consumed by services
pub mod repositories;
/// Sample data for a fresh knowledge base
pub mod seed;
mod users;

pub use repositories::{
    CategoryRepository, ConversationRepository, ProcedureRepository, UserRepository,
};
pub use users::UserUpdate;

use crate::constants::database::{MAX_CONNECTIONS, OPERATION_TIMEOUT_SECS};
use crate::errors::{AppError, AppResult};
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Database manager shared by every repository
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Connect to the database and run migrations
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid, the connection fails or a migration fails
    pub async fn new(database_url: &str) -> AppResult<Self> {
        let in_memory = database_url.contains(":memory:");
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| AppError::config(format!("Invalid DATABASE_URL: {e}")))?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(OPERATION_TIMEOUT_SECS));

        // An in-memory database lives only as long as one of its connections does
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .min_connections(1)
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(MAX_CONNECTIONS)
        };

        let pool = pool_options
            .acquire_timeout(Duration::from_secs(OPERATION_TIMEOUT_SECS))
            .connect_with(options)
            .await
            .map_err(|e| AppError::database(format!("Failed to connect to database: {e}")))?;

        let db = Self { pool };
        db.migrate().await?;
        info!("Database ready");
        Ok(db)
    }

    /// Get a reference to the database pool for advanced operations
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Check that a connection can run a trivial query
    ///
    /// # Errors
    ///
    /// Returns an error if no connection is available or the query fails
    pub async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Database ping failed: {e}")))?;
        Ok(())
    }

    /// Run database migrations
    ///
    /// # Errors
    ///
    /// Returns an error if any schema statement fails
    pub async fn migrate(&self) -> AppResult<()> {
        self.migrate_users().await?;
        self.migrate_categories().await?;
        self.migrate_procedures().await?;
        self.migrate_conversations().await?;
        Ok(())
    }

    async fn execute_schema(&self, statements: &[&str]) -> AppResult<()> {
        for statement in statements {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| AppError::database(format!("Migration failed: {e}")))?;
        }
        Ok(())
    }

    async fn migrate_users(&self) -> AppResult<()> {
        self.execute_schema(&[r"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                role TEXT NOT NULL DEFAULT 'user' CHECK (role IN ('user', 'admin')),
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "])
        .await
    }

    async fn migrate_categories(&self) -> AppResult<()> {
        self.execute_schema(&[r"
            CREATE TABLE IF NOT EXISTS categories (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                description TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "])
        .await
    }

    async fn migrate_procedures(&self) -> AppResult<()> {
        self.execute_schema(&[
            r"
            CREATE TABLE IF NOT EXISTS procedures (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                content TEXT NOT NULL,
                category TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                created_by TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
            "CREATE INDEX IF NOT EXISTS idx_procedures_category ON procedures(category)",
        ])
        .await
    }

    async fn migrate_conversations(&self) -> AppResult<()> {
        self.execute_schema(&[
            r"
            CREATE TABLE IF NOT EXISTS conversations (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                title TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
            "CREATE INDEX IF NOT EXISTS idx_conversations_user_created ON conversations(user_id, created_at)",
            r"
            CREATE TABLE IF NOT EXISTS conversation_messages (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                conversation_id TEXT NOT NULL REFERENCES conversations(id) ON DELETE CASCADE,
                sequence INTEGER NOT NULL,
                role TEXT NOT NULL CHECK (role IN ('user', 'assistant')),
                content TEXT NOT NULL,
                created_at TEXT NOT NULL,
                UNIQUE (conversation_id, sequence)
            )
            ",
        ])
        .await
    }
}

/// Format a timestamp for storage
///
/// Fixed microsecond precision keeps stored values lexically ordered, which
/// the range queries on `created_at` rely on.
pub(crate) fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a stored timestamp
pub(crate) fn parse_timestamp(value: &str) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AppError::database(format!("Invalid stored timestamp '{value}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration as ChronoDuration, TimeZone};

    #[test]
    fn test_timestamps_sort_lexically() {
        let base = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
        let later = base + ChronoDuration::milliseconds(1500);
        assert!(format_timestamp(base) < format_timestamp(later));
        assert_eq!(parse_timestamp(&format_timestamp(later)).unwrap(), later);
    }
}
