// ABOUTME: Procedure table operations: CRUD, category listing and case-insensitive search
// ABOUTME: Implements ProcedureRepository on Database with sqlx queries
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Procedure Assistant Contributors

use super::{format_timestamp, parse_timestamp, Database, ProcedureRepository};
use crate::errors::{AppError, AppResult};
use crate::models::{Procedure, ProcedureInput};
use async_trait::async_trait;
use chrono::Utc;
use regex::RegexBuilder;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

const PROCEDURE_COLUMNS: &str =
    "id, title, content, category, description, created_by, created_at, updated_at";

fn row_to_procedure(row: &SqliteRow) -> AppResult<Procedure> {
    Ok(Procedure {
        id: row.get("id"),
        title: row.get("title"),
        content: row.get("content"),
        category: row.get("category"),
        description: row.get("description"),
        created_by: row.get("created_by"),
        created_at: parse_timestamp(row.get("created_at"))?,
        updated_at: parse_timestamp(row.get("updated_at"))?,
    })
}

fn rows_to_procedures(rows: &[SqliteRow]) -> AppResult<Vec<Procedure>> {
    rows.iter().map(row_to_procedure).collect()
}

#[async_trait]
impl ProcedureRepository for Database {
    async fn create_procedure(
        &self,
        input: &ProcedureInput,
        created_by: Option<&str>,
    ) -> AppResult<Procedure> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let stamp = format_timestamp(now);

        sqlx::query(
            r"
            INSERT INTO procedures (id, title, content, category, description, created_by, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
            ",
        )
        .bind(&id)
        .bind(input.title.trim())
        .bind(&input.content)
        .bind(input.category.trim())
        .bind(input.description.trim())
        .bind(created_by)
        .bind(&stamp)
        .execute(self.pool())
        .await
        .map_err(|e| AppError::database(format!("Failed to create procedure: {e}")))?;

        // Re-read so the returned value carries exactly what was stored
        self.get_procedure(&id)
            .await?
            .ok_or_else(|| AppError::internal("Procedure vanished after insert"))
    }

    async fn get_procedure(&self, id: &str) -> AppResult<Option<Procedure>> {
        let row = sqlx::query(&format!(
            "SELECT {PROCEDURE_COLUMNS} FROM procedures WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| AppError::database(format!("Failed to get procedure: {e}")))?;

        row.as_ref().map(row_to_procedure).transpose()
    }

    async fn list_procedures(&self, category: Option<&str>) -> AppResult<Vec<Procedure>> {
        let rows = match category {
            Some(category) => {
                sqlx::query(&format!(
                    "SELECT {PROCEDURE_COLUMNS} FROM procedures WHERE category = $1 ORDER BY created_at DESC, rowid DESC"
                ))
                .bind(category)
                .fetch_all(self.pool())
                .await
            }
            None => {
                sqlx::query(&format!(
                    "SELECT {PROCEDURE_COLUMNS} FROM procedures ORDER BY created_at DESC, rowid DESC"
                ))
                .fetch_all(self.pool())
                .await
            }
        }
        .map_err(|e| AppError::database(format!("Failed to list procedures: {e}")))?;

        rows_to_procedures(&rows)
    }

    async fn search_procedures(&self, query: &str) -> AppResult<Vec<Procedure>> {
        // SQLite's LIKE folds ASCII only, so matching happens here with a
        // Unicode-aware case-insensitive literal pattern.
        let matcher = RegexBuilder::new(&regex::escape(query))
            .case_insensitive(true)
            .build()
            .map_err(|e| AppError::invalid_input(format!("Invalid search query: {e}")))?;

        let rows = sqlx::query(&format!(
            "SELECT {PROCEDURE_COLUMNS} FROM procedures ORDER BY rowid ASC"
        ))
        .fetch_all(self.pool())
        .await
        .map_err(|e| AppError::database(format!("Failed to search procedures: {e}")))?;

        let procedures = rows_to_procedures(&rows)?;
        Ok(procedures
            .into_iter()
            .filter(|p| {
                matcher.is_match(&p.title)
                    || matcher.is_match(&p.content)
                    || matcher.is_match(&p.description)
            })
            .collect())
    }

    async fn update_procedure(
        &self,
        id: &str,
        input: &ProcedureInput,
    ) -> AppResult<Option<Procedure>> {
        let stamp = format_timestamp(Utc::now());

        let result = sqlx::query(
            r"
            UPDATE procedures
            SET title = $1, content = $2, category = $3, description = $4, updated_at = $5
            WHERE id = $6
            ",
        )
        .bind(input.title.trim())
        .bind(&input.content)
        .bind(input.category.trim())
        .bind(input.description.trim())
        .bind(&stamp)
        .bind(id)
        .execute(self.pool())
        .await
        .map_err(|e| AppError::database(format!("Failed to update procedure: {e}")))?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_procedure(id).await
    }

    async fn delete_procedure(&self, id: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM procedures WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(|e| AppError::database(format!("Failed to delete procedure: {e}")))?;

        Ok(result.rows_affected() > 0)
    }

    async fn count_procedures(&self) -> AppResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM procedures")
            .fetch_one(self.pool())
            .await
            .map_err(|e| AppError::database(format!("Failed to count procedures: {e}")))
    }
}
