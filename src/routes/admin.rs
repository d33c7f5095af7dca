// ABOUTME: Admin route handlers for procedure, category and user management plus statistics
// ABOUTME: Every handler authenticates and then checks the caller's stored admin role
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Procedure Assistant Contributors

//! Admin routes
//!
//! All handlers are thin wrappers. [`require_admin`] re-reads the caller's
//! role from the store, so a token minted before a demotion stops working
//! for these routes immediately.

use crate::{
    constants::upload,
    errors::AppError,
    middleware::require_admin,
    models::{Category, NewCategory, Procedure, ProcedureInput, User},
    resources::ServerResources,
    services::{
        auth::{CreateUserRequest, UpdateUserRequest},
        ChatMetricsSnapshot, UploadedDocument,
    },
};
use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

// ============================================================================
// Response Types
// ============================================================================

/// Store and chat counters
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    /// Stored procedures
    pub procedures: i64,
    /// Stored categories
    pub categories: i64,
    /// Registered users
    pub users: i64,
    /// Stored conversations
    pub conversations: i64,
    /// Chat counters since startup
    pub chat: ChatMetricsSnapshot,
}

/// Result of a document upload
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    /// Confirmation message
    pub message: &'static str,
    /// Procedure created from the document
    pub procedure: Procedure,
}

/// Fields collected from the upload form
#[derive(Default)]
struct UploadForm {
    title: String,
    category: String,
    document: Option<UploadedDocument>,
}

impl UploadForm {
    async fn read(multipart: &mut Multipart) -> Result<Self, AppError> {
        let mut form = Self::default();
        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let name = field.name().unwrap_or_default().to_owned();
            match name.as_str() {
                "title" => form.title = field.text().await.map_err(multipart_error)?,
                "category" => form.category = field.text().await.map_err(multipart_error)?,
                "file" => {
                    let file_name = field.file_name().unwrap_or("document").to_owned();
                    let content_type = field.content_type().unwrap_or_default().to_owned();
                    let bytes = field.bytes().await.map_err(multipart_error)?;
                    form.document = Some(UploadedDocument {
                        file_name,
                        content_type,
                        bytes: bytes.to_vec(),
                    });
                }
                _ => {}
            }
        }
        Ok(form)
    }
}

fn multipart_error(error: MultipartError) -> AppError {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::invalid_input("File size cannot exceed 10MB")
    } else {
        AppError::invalid_input(format!("Invalid upload form: {error}"))
    }
}

/// User listing
#[derive(Debug, Serialize)]
pub struct UserListResponse {
    /// All users, newest first
    pub users: Vec<User>,
    /// Number of users returned
    pub total: usize,
}

// ============================================================================
// Admin Routes
// ============================================================================

/// Admin routes implementation
pub struct AdminRoutes;

impl AdminRoutes {
    /// Create all admin routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/admin/procedures", post(Self::create_procedure))
            .route(
                "/api/admin/procedures/upload",
                post(Self::upload_procedure).layer(DefaultBodyLimit::max(upload::MAX_BODY_BYTES)),
            )
            .route(
                "/api/admin/procedures/:id",
                put(Self::update_procedure).delete(Self::delete_procedure),
            )
            .route("/api/admin/categories", post(Self::create_category))
            .route("/api/admin/stats", get(Self::stats))
            .route(
                "/api/admin/users",
                get(Self::list_users).post(Self::create_user),
            )
            .route(
                "/api/admin/users/:id",
                put(Self::update_user).delete(Self::delete_user),
            )
            .with_state(resources)
    }

    /// Authenticate the caller and require the admin role
    async fn authorize(headers: &HeaderMap, resources: &ServerResources) -> Result<User, AppError> {
        let auth = resources
            .auth_middleware
            .authenticate_request_with_headers(headers)?;
        require_admin(&auth, resources.users.as_ref()).await
    }

    fn validate_procedure(input: &ProcedureInput) -> Result<(), AppError> {
        let missing = input.missing_fields();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(AppError::invalid_input(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )))
        }
    }

    // ========================================================================
    // Procedures
    // ========================================================================

    async fn create_procedure(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(input): Json<ProcedureInput>,
    ) -> Result<(StatusCode, Json<Procedure>), AppError> {
        let admin = Self::authorize(&headers, &resources).await?;
        Self::validate_procedure(&input)?;

        let procedure = resources
            .procedures
            .create_procedure(&input, Some(&admin.id))
            .await?;
        info!(procedure_id = %procedure.id, admin_id = %admin.id, "Procedure created");
        Ok((StatusCode::CREATED, Json(procedure)))
    }

    async fn update_procedure(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
        Json(input): Json<ProcedureInput>,
    ) -> Result<Json<Procedure>, AppError> {
        let admin = Self::authorize(&headers, &resources).await?;
        Self::validate_procedure(&input)?;

        let procedure = resources
            .procedures
            .update_procedure(&id, &input)
            .await?
            .ok_or_else(|| AppError::not_found("Procedure"))?;
        info!(procedure_id = %id, admin_id = %admin.id, "Procedure updated");
        Ok(Json(procedure))
    }

    async fn delete_procedure(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let admin = Self::authorize(&headers, &resources).await?;
        if !resources.procedures.delete_procedure(&id).await? {
            return Err(AppError::not_found("Procedure"));
        }
        info!(procedure_id = %id, admin_id = %admin.id, "Procedure deleted");
        Ok(StatusCode::NO_CONTENT.into_response())
    }

    /// Create a procedure from an uploaded PDF or Word document
    async fn upload_procedure(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        mut multipart: Multipart,
    ) -> Result<(StatusCode, Json<UploadResponse>), AppError> {
        let admin = Self::authorize(&headers, &resources).await?;
        let form = UploadForm::read(&mut multipart).await?;

        let title = form.title.trim();
        let category = form.category.trim();
        if title.is_empty() || category.is_empty() {
            return Err(AppError::invalid_input("Title and category are required"));
        }
        let document = form
            .document
            .ok_or_else(|| AppError::invalid_input("File is required"))?;

        let procedure = resources
            .documents
            .ingest(title, category, document, Some(&admin.id))
            .await?;
        info!(procedure_id = %procedure.id, admin_id = %admin.id, "Procedure uploaded");
        Ok((
            StatusCode::CREATED,
            Json(UploadResponse {
                message: "File uploaded successfully",
                procedure,
            }),
        ))
    }

    // ========================================================================
    // Categories
    // ========================================================================

    async fn create_category(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(input): Json<NewCategory>,
    ) -> Result<(StatusCode, Json<Category>), AppError> {
        Self::authorize(&headers, &resources).await?;
        if input.name.trim().is_empty() {
            return Err(AppError::invalid_input("Category name cannot be empty"));
        }
        let category = resources.categories.create_category(&input).await?;
        Ok((StatusCode::CREATED, Json(category)))
    }

    // ========================================================================
    // Statistics
    // ========================================================================

    async fn stats(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Json<StatsResponse>, AppError> {
        Self::authorize(&headers, &resources).await?;
        Ok(Json(StatsResponse {
            procedures: resources.procedures.count_procedures().await?,
            categories: resources.categories.count_categories().await?,
            users: resources.users.count_users().await?,
            conversations: resources.conversations.count_conversations().await?,
            chat: resources.chat.metrics().snapshot(),
        }))
    }

    // ========================================================================
    // Users
    // ========================================================================

    async fn list_users(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Json<UserListResponse>, AppError> {
        Self::authorize(&headers, &resources).await?;
        let users = resources.users.list_users().await?;
        Ok(Json(UserListResponse {
            total: users.len(),
            users,
        }))
    }

    async fn create_user(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<CreateUserRequest>,
    ) -> Result<(StatusCode, Json<User>), AppError> {
        let admin = Self::authorize(&headers, &resources).await?;
        let user = resources.auth_service.create_user(request).await?;
        info!(user_id = %user.id, role = %user.role, admin_id = %admin.id, "User created by admin");
        Ok((StatusCode::CREATED, Json(user)))
    }

    async fn update_user(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
        Json(request): Json<UpdateUserRequest>,
    ) -> Result<Json<User>, AppError> {
        let admin = Self::authorize(&headers, &resources).await?;
        let user = resources.auth_service.update_user(&id, request).await?;
        info!(user_id = %user.id, admin_id = %admin.id, "User updated by admin");
        Ok(Json(user))
    }

    async fn delete_user(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(id): Path<String>,
    ) -> Result<Response, AppError> {
        let admin = Self::authorize(&headers, &resources).await?;
        if admin.id == id {
            return Err(AppError::invalid_input("Admins cannot delete their own account"));
        }
        if !resources.users.delete_user(&id).await? {
            return Err(AppError::not_found("User"));
        }
        info!(user_id = %id, admin_id = %admin.id, "User deleted by admin");
        Ok(StatusCode::NO_CONTENT.into_response())
    }
}
