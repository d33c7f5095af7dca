// ABOUTME: Procedure category model and creation payload
// ABOUTME: Category names are unique across the store
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Procedure Assistant Contributors

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named grouping of procedures
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Unique category ID
    pub id: String,
    /// Unique display name
    pub name: String,
    /// Optional description (empty when absent)
    #[serde(default)]
    pub description: String,
    /// When the category was created
    pub created_at: DateTime<Utc>,
    /// When the category was last modified
    pub updated_at: DateTime<Utc>,
}

/// Payload for creating a category
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NewCategory {
    /// Unique display name
    pub name: String,
    /// Optional description
    pub description: String,
}
