// ABOUTME: Keyword retrieval of procedures used as chat context
// ABOUTME: Case-insensitive literal substring match over title, content and description
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Procedure Assistant Contributors

use std::sync::Arc;

use tracing::debug;

use crate::database::ProcedureRepository;
use crate::errors::{AppError, AppResult};
use crate::models::Procedure;

/// Finds procedures matching a free-text query
///
/// There is no ranking; results come back in the store's insertion order.
#[derive(Clone)]
pub struct RetrievalHelper {
    procedures: Arc<dyn ProcedureRepository>,
}

impl RetrievalHelper {
    /// Create a helper over a procedure store
    #[must_use]
    pub fn new(procedures: Arc<dyn ProcedureRepository>) -> Self {
        Self { procedures }
    }

    /// All procedures containing `query`
    ///
    /// # Errors
    ///
    /// Returns `INVALID_INPUT` for an empty query, or the store's error
    pub async fn retrieve(&self, query: &str) -> AppResult<Vec<Procedure>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::invalid_input("Search query cannot be empty"));
        }

        let found = self.procedures.search_procedures(query).await?;
        debug!(matches = found.len(), "Retrieved procedures for query");
        Ok(found)
    }
}
