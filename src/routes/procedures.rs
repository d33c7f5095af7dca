// ABOUTME: Public read-only routes for procedures and categories
// ABOUTME: Listing with category filter, keyword search, lookup by ID and category listing
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Procedure Assistant Contributors

use crate::{
    errors::AppError,
    models::{Category, Procedure},
    resources::ServerResources,
};
use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Optional category filter for listings
#[derive(Debug, Default, Deserialize)]
pub struct ListProceduresQuery {
    /// Restrict to one category label
    pub category: Option<String>,
}

/// Search query parameters
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    /// Keyword matched case-insensitively
    #[serde(default)]
    pub q: String,
}

/// List of procedures with their count
#[derive(Debug, Serialize)]
pub struct ProcedureListResponse {
    /// Matching procedures
    pub procedures: Vec<Procedure>,
    /// Number of procedures returned
    pub total: usize,
}

impl From<Vec<Procedure>> for ProcedureListResponse {
    fn from(procedures: Vec<Procedure>) -> Self {
        Self {
            total: procedures.len(),
            procedures,
        }
    }
}

/// List of categories with their count
#[derive(Debug, Serialize)]
pub struct CategoryListResponse {
    /// All categories
    pub categories: Vec<Category>,
    /// Number of categories returned
    pub total: usize,
}

/// Procedure and category read routes
pub struct ProcedureRoutes;

impl ProcedureRoutes {
    /// Create all public procedure and category routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/procedures", get(Self::list_procedures))
            .route("/api/procedures/search", get(Self::search_procedures))
            .route(
                "/api/procedures/category/:category",
                get(Self::list_by_category),
            )
            .route("/api/procedures/:id", get(Self::get_procedure))
            .route("/api/categories", get(Self::list_categories))
            .with_state(resources)
    }

    async fn list_procedures(
        State(resources): State<Arc<ServerResources>>,
        Query(query): Query<ListProceduresQuery>,
    ) -> Result<Json<ProcedureListResponse>, AppError> {
        let category = query
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty());
        let procedures = resources.procedures.list_procedures(category).await?;
        Ok(Json(procedures.into()))
    }

    async fn search_procedures(
        State(resources): State<Arc<ServerResources>>,
        Query(query): Query<SearchQuery>,
    ) -> Result<Json<ProcedureListResponse>, AppError> {
        let keyword = query.q.trim();
        if keyword.is_empty() {
            return Err(AppError::invalid_input("Search query cannot be empty"));
        }
        let procedures = resources.procedures.search_procedures(keyword).await?;
        Ok(Json(procedures.into()))
    }

    async fn list_by_category(
        State(resources): State<Arc<ServerResources>>,
        Path(category): Path<String>,
    ) -> Result<Json<ProcedureListResponse>, AppError> {
        let procedures = resources
            .procedures
            .list_procedures(Some(category.trim()))
            .await?;
        Ok(Json(procedures.into()))
    }

    async fn get_procedure(
        State(resources): State<Arc<ServerResources>>,
        Path(id): Path<String>,
    ) -> Result<Json<Procedure>, AppError> {
        resources
            .procedures
            .get_procedure(&id)
            .await?
            .map(Json)
            .ok_or_else(|| AppError::not_found("Procedure"))
    }

    async fn list_categories(
        State(resources): State<Arc<ServerResources>>,
    ) -> Result<Json<CategoryListResponse>, AppError> {
        let categories = resources.categories.list_categories().await?;
        Ok(Json(CategoryListResponse {
            total: categories.len(),
            categories,
        }))
    }
}
