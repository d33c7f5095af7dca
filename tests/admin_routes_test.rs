// ABOUTME: Integration tests for admin-only procedure, category, statistics and user routes
// ABOUTME: Verifies the stored-role guard and the CRUD behaviour behind it
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Procedure Assistant Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;
mod helpers;

use axum::http::StatusCode;
use common::{create_test_resources, create_user_with_token, ScriptedGateway, TEST_PASSWORD};
use helpers::axum_test::AxumTestRequest;
use procedure_assistant::database::{ProcedureRepository, UserRepository, UserUpdate};
use procedure_assistant::models::{User, UserRole};
use procedure_assistant::resources::ServerResources;
use procedure_assistant::routes::AdminRoutes;
use serde_json::{json, Value};
use std::sync::Arc;

// ============================================================================
// Test Helpers
// ============================================================================

struct AdminTestSetup {
    resources: Arc<ServerResources>,
    admin: User,
    admin_token: String,
    user: User,
    user_token: String,
}

async fn setup() -> AdminTestSetup {
    let resources = create_test_resources(Arc::new(ScriptedGateway::answering("unused")))
        .await
        .unwrap();
    let (admin, admin_token) =
        create_user_with_token(&resources, "admin@example.com", UserRole::Admin)
            .await
            .unwrap();
    let (user, user_token) = create_user_with_token(&resources, "user@example.com", UserRole::User)
        .await
        .unwrap();
    AdminTestSetup {
        resources,
        admin,
        admin_token,
        user,
        user_token,
    }
}

fn procedure_body() -> Value {
    json!({
        "title": "Quy trình cấp phát laptop",
        "content": "Bước 1: Gửi yêu cầu cho phòng IT.",
        "category": "IT",
        "description": "Cấp phát thiết bị cho nhân viên mới"
    })
}

// ============================================================================
// Authorization
// ============================================================================

#[tokio::test]
async fn test_regular_user_is_forbidden() {
    let setup = setup().await;

    let response = AxumTestRequest::post("/api/admin/procedures")
        .bearer(&setup.user_token)
        .json(&procedure_body())
        .send(AdminRoutes::routes(setup.resources.clone()))
        .await;

    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "PERMISSION_DENIED");
    assert_eq!(setup.resources.procedures.count_procedures().await.unwrap(), 0);
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let setup = setup().await;

    let response = AxumTestRequest::get("/api/admin/stats")
        .send(AdminRoutes::routes(setup.resources))
        .await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_demoted_admin_loses_access_immediately() {
    let setup = setup().await;
    setup
        .resources
        .users
        .update_user(
            &setup.admin.id,
            &UserUpdate {
                role: Some(UserRole::User),
                ..UserUpdate::default()
            },
        )
        .await
        .unwrap();

    // The token still claims admin, but the stored role wins
    let response = AxumTestRequest::get("/api/admin/stats")
        .bearer(&setup.admin_token)
        .send(AdminRoutes::routes(setup.resources))
        .await;

    assert_eq!(response.status_code(), StatusCode::FORBIDDEN);
}

// ============================================================================
// Procedures
// ============================================================================

#[tokio::test]
async fn test_procedure_create_update_delete() {
    let setup = setup().await;

    let created: Value = AxumTestRequest::post("/api/admin/procedures")
        .bearer(&setup.admin_token)
        .json(&procedure_body())
        .send(AdminRoutes::routes(setup.resources.clone()))
        .await
        .assert_status(StatusCode::CREATED)
        .json();
    assert_eq!(created["created_by"], setup.admin.id.as_str());
    let id = created["id"].as_str().unwrap().to_owned();
    let uri = format!("/api/admin/procedures/{id}");

    let mut update = procedure_body();
    update["title"] = json!("Quy trình cấp phát thiết bị");
    let updated: Value = AxumTestRequest::put(&uri)
        .bearer(&setup.admin_token)
        .json(&update)
        .send(AdminRoutes::routes(setup.resources.clone()))
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(updated["title"], "Quy trình cấp phát thiết bị");

    AxumTestRequest::delete(&uri)
        .bearer(&setup.admin_token)
        .send(AdminRoutes::routes(setup.resources.clone()))
        .await
        .assert_status(StatusCode::NO_CONTENT);

    let missing = AxumTestRequest::put(&uri)
        .bearer(&setup.admin_token)
        .json(&update)
        .send(AdminRoutes::routes(setup.resources.clone()))
        .await;
    assert_eq!(missing.status_code(), StatusCode::NOT_FOUND);

    let missing_delete = AxumTestRequest::delete(&uri)
        .bearer(&setup.admin_token)
        .send(AdminRoutes::routes(setup.resources))
        .await;
    assert_eq!(missing_delete.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_procedure_missing_fields_is_bad_request() {
    let setup = setup().await;

    let response = AxumTestRequest::post("/api/admin/procedures")
        .bearer(&setup.admin_token)
        .json(&json!({"title": "Only a title"}))
        .send(AdminRoutes::routes(setup.resources))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    let message = body["error"]["message"].as_str().unwrap();
    assert!(message.contains("content"));
    assert!(message.contains("category"));
}

// ============================================================================
// Categories
// ============================================================================

#[tokio::test]
async fn test_category_create_and_duplicate() {
    let setup = setup().await;
    let body = json!({"name": "Pháp chế", "description": "Quy trình pháp lý"});

    AxumTestRequest::post("/api/admin/categories")
        .bearer(&setup.admin_token)
        .json(&body)
        .send(AdminRoutes::routes(setup.resources.clone()))
        .await
        .assert_status(StatusCode::CREATED);

    let duplicate = AxumTestRequest::post("/api/admin/categories")
        .bearer(&setup.admin_token)
        .json(&body)
        .send(AdminRoutes::routes(setup.resources.clone()))
        .await;
    assert_eq!(duplicate.status_code(), StatusCode::CONFLICT);

    let empty = AxumTestRequest::post("/api/admin/categories")
        .bearer(&setup.admin_token)
        .json(&json!({"name": "  "}))
        .send(AdminRoutes::routes(setup.resources))
        .await;
    assert_eq!(empty.status_code(), StatusCode::BAD_REQUEST);
}

// ============================================================================
// Statistics
// ============================================================================

#[tokio::test]
async fn test_stats_counts_store_and_chat() {
    let setup = setup().await;
    common::create_procedure(setup.resources.procedures.as_ref(), "A", "a", "IT")
        .await
        .unwrap();

    let stats: Value = AxumTestRequest::get("/api/admin/stats")
        .bearer(&setup.admin_token)
        .send(AdminRoutes::routes(setup.resources))
        .await
        .assert_status(StatusCode::OK)
        .json();

    assert_eq!(stats["procedures"], 1);
    assert_eq!(stats["categories"], 0);
    assert_eq!(stats["users"], 2);
    assert_eq!(stats["conversations"], 0);
    assert_eq!(stats["chat"]["requests"], 0);
    assert_eq!(stats["chat"]["persistence_failures"], 0);
}

// ============================================================================
// Users
// ============================================================================

#[tokio::test]
async fn test_user_management() {
    let setup = setup().await;

    let listing: Value = AxumTestRequest::get("/api/admin/users")
        .bearer(&setup.admin_token)
        .send(AdminRoutes::routes(setup.resources.clone()))
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(listing["total"], 2);
    assert!(listing["users"][0].get("password_hash").is_none());

    let created: Value = AxumTestRequest::post("/api/admin/users")
        .bearer(&setup.admin_token)
        .json(&json!({
            "name": "Editor",
            "email": "editor@example.com",
            "password": TEST_PASSWORD,
            "role": "admin"
        }))
        .send(AdminRoutes::routes(setup.resources.clone()))
        .await
        .assert_status(StatusCode::CREATED)
        .json();
    assert_eq!(created["role"], "admin");

    let updated: Value = AxumTestRequest::put(&format!("/api/admin/users/{}", setup.user.id))
        .bearer(&setup.admin_token)
        .json(&json!({"name": "Renamed"}))
        .send(AdminRoutes::routes(setup.resources.clone()))
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(updated["name"], "Renamed");
    assert_eq!(updated["role"], "user");

    AxumTestRequest::delete(&format!("/api/admin/users/{}", setup.user.id))
        .bearer(&setup.admin_token)
        .send(AdminRoutes::routes(setup.resources.clone()))
        .await
        .assert_status(StatusCode::NO_CONTENT);
    assert!(setup
        .resources
        .users
        .get_user(&setup.user.id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_admin_cannot_delete_self() {
    let setup = setup().await;

    let response = AxumTestRequest::delete(&format!("/api/admin/users/{}", setup.admin.id))
        .bearer(&setup.admin_token)
        .send(AdminRoutes::routes(setup.resources.clone()))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert!(setup
        .resources
        .users
        .get_user(&setup.admin.id)
        .await
        .unwrap()
        .is_some());
}
