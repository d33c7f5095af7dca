// ABOUTME: Category table operations with unique-name enforcement
// ABOUTME: Implements CategoryRepository on Database
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Procedure Assistant Contributors

use super::{format_timestamp, parse_timestamp, CategoryRepository, Database};
use crate::errors::{AppError, AppResult};
use crate::models::{Category, NewCategory};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use uuid::Uuid;

#[async_trait]
impl CategoryRepository for Database {
    async fn list_categories(&self) -> AppResult<Vec<Category>> {
        let rows = sqlx::query(
            "SELECT id, name, description, created_at, updated_at FROM categories ORDER BY name ASC",
        )
        .fetch_all(self.pool())
        .await
        .map_err(|e| AppError::database(format!("Failed to list categories: {e}")))?;

        rows.iter()
            .map(|r| {
                Ok(Category {
                    id: r.get("id"),
                    name: r.get("name"),
                    description: r.get("description"),
                    created_at: parse_timestamp(r.get("created_at"))?,
                    updated_at: parse_timestamp(r.get("updated_at"))?,
                })
            })
            .collect()
    }

    async fn create_category(&self, category: &NewCategory) -> AppResult<Category> {
        let name = category.name.trim();
        let exists: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories WHERE name = $1")
            .bind(name)
            .fetch_one(self.pool())
            .await
            .map_err(|e| AppError::database(format!("Failed to check category: {e}")))?;
        if exists > 0 {
            return Err(AppError::already_exists(format!(
                "Category '{name}' already exists"
            )));
        }

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let stamp = format_timestamp(now);

        sqlx::query(
            r"
            INSERT INTO categories (id, name, description, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $4)
            ",
        )
        .bind(&id)
        .bind(name)
        .bind(category.description.trim())
        .bind(&stamp)
        .execute(self.pool())
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::already_exists(format!("Category '{name}' already exists"))
            }
            other => AppError::database(format!("Failed to create category: {other}")),
        })?;

        Ok(Category {
            id,
            name: name.to_owned(),
            description: category.description.trim().to_owned(),
            created_at: parse_timestamp(&stamp)?,
            updated_at: parse_timestamp(&stamp)?,
        })
    }

    async fn count_categories(&self) -> AppResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM categories")
            .fetch_one(self.pool())
            .await
            .map_err(|e| AppError::database(format!("Failed to count categories: {e}")))
    }
}
