// ABOUTME: Procedure document model and the input payload used to create or replace one
// ABOUTME: Procedures are the corpus the chat assistant retrieves context from
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Procedure Assistant Contributors

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored internal procedure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Procedure {
    /// Unique procedure ID
    pub id: String,
    /// Short title
    pub title: String,
    /// Full procedure text
    pub content: String,
    /// Category label
    pub category: String,
    /// Optional one-line summary (empty when absent)
    #[serde(default)]
    pub description: String,
    /// When the procedure was created
    pub created_at: DateTime<Utc>,
    /// When the procedure was last modified
    pub updated_at: DateTime<Utc>,
    /// User ID of the author, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
}

/// Fields supplied when creating or fully replacing a procedure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcedureInput {
    /// Short title
    pub title: String,
    /// Full procedure text
    pub content: String,
    /// Category label
    pub category: String,
    /// Optional one-line summary
    pub description: String,
}

impl ProcedureInput {
    /// Names of required fields that are blank
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.title.trim().is_empty() {
            missing.push("title");
        }
        if self.content.trim().is_empty() {
            missing.push("content");
        }
        if self.category.trim().is_empty() {
            missing.push("category");
        }
        missing
    }
}
