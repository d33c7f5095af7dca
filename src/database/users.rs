// ABOUTME: User table operations with unique email and explicit role storage
// ABOUTME: Implements UserRepository on Database
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Procedure Assistant Contributors

use super::{format_timestamp, parse_timestamp, Database, UserRepository};
use crate::errors::{AppError, AppResult};
use crate::models::{User, UserRole};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

/// Partial update of a user account; `None` fields are left unchanged
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    /// New display name
    pub name: Option<String>,
    /// New email (already lower-cased)
    pub email: Option<String>,
    /// New bcrypt hash
    pub password_hash: Option<String>,
    /// New role
    pub role: Option<UserRole>,
}

const USER_COLUMNS: &str = "id, name, email, password_hash, role, created_at, updated_at";

fn row_to_user(row: &SqliteRow) -> AppResult<User> {
    let role: String = row.get("role");
    Ok(User {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        role: role.parse().map_err(AppError::database)?,
        created_at: parse_timestamp(row.get("created_at"))?,
        updated_at: parse_timestamp(row.get("updated_at"))?,
    })
}

fn map_unique_email(e: sqlx::Error, email: &str, action: &str) -> AppError {
    match e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::already_exists(format!("Email '{email}' is already registered"))
        }
        other => AppError::database(format!("Failed to {action} user: {other}")),
    }
}

#[async_trait]
impl UserRepository for Database {
    async fn create_user(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
        role: UserRole,
    ) -> AppResult<User> {
        let id = Uuid::new_v4().to_string();
        let stamp = format_timestamp(Utc::now());

        sqlx::query(
            r"
            INSERT INTO users (id, name, email, password_hash, role, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            ",
        )
        .bind(&id)
        .bind(name)
        .bind(email)
        .bind(password_hash)
        .bind(role.as_str())
        .bind(&stamp)
        .execute(self.pool())
        .await
        .map_err(|e| map_unique_email(e, email, "create"))?;

        Ok(User {
            id,
            name: name.to_owned(),
            email: email.to_owned(),
            password_hash: password_hash.to_owned(),
            role,
            created_at: parse_timestamp(&stamp)?,
            updated_at: parse_timestamp(&stamp)?,
        })
    }

    async fn get_user(&self, id: &str) -> AppResult<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(|e| AppError::database(format!("Failed to get user: {e}")))?;

        row.as_ref().map(row_to_user).transpose()
    }

    async fn get_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(self.pool())
            .await
            .map_err(|e| AppError::database(format!("Failed to get user by email: {e}")))?;

        row.as_ref().map(row_to_user).transpose()
    }

    async fn list_users(&self) -> AppResult<Vec<User>> {
        let rows = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC, rowid DESC"
        ))
        .fetch_all(self.pool())
        .await
        .map_err(|e| AppError::database(format!("Failed to list users: {e}")))?;

        rows.iter().map(row_to_user).collect()
    }

    async fn update_user(&self, id: &str, update: &UserUpdate) -> AppResult<Option<User>> {
        let stamp = format_timestamp(Utc::now());
        let email = update.email.as_deref().unwrap_or_default();

        let result = sqlx::query(
            r"
            UPDATE users
            SET name = COALESCE($1, name),
                email = COALESCE($2, email),
                password_hash = COALESCE($3, password_hash),
                role = COALESCE($4, role),
                updated_at = $5
            WHERE id = $6
            ",
        )
        .bind(update.name.as_deref())
        .bind(update.email.as_deref())
        .bind(update.password_hash.as_deref())
        .bind(update.role.map(|r| r.as_str()))
        .bind(&stamp)
        .bind(id)
        .execute(self.pool())
        .await
        .map_err(|e| map_unique_email(e, email, "update"))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_user(id).await
    }

    async fn delete_user(&self, id: &str) -> AppResult<bool> {
        // Conversations and their messages go with the user via ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(|e| AppError::database(format!("Failed to delete user: {e}")))?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_users(&self) -> AppResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(self.pool())
            .await
            .map_err(|e| AppError::database(format!("Failed to count users: {e}")))
    }
}
