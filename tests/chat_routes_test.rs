// ABOUTME: Integration tests for the chat route handlers
// ABOUTME: Tests public and authenticated chat, history, and conversation retrieval and deletion
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Procedure Assistant Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;
mod helpers;

use async_trait::async_trait;
use axum::http::StatusCode;
use common::{create_procedure, create_test_resources, create_user_with_token, ScriptedGateway};
use helpers::axum_test::AxumTestRequest;
use procedure_assistant::database::ConversationRepository;
use procedure_assistant::llm::{ChatCompletion, ChatGateway, GatewayError};
use procedure_assistant::models::UserRole;
use procedure_assistant::resources::ServerResources;
use procedure_assistant::routes::ChatRoutes;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Test Helpers
// ============================================================================

async fn setup_test_environment(
    gateway: ScriptedGateway,
) -> (Arc<ServerResources>, Arc<ScriptedGateway>, String, String) {
    let gateway = Arc::new(gateway);
    let resources = create_test_resources(gateway.clone()).await.unwrap();
    create_procedure(
        resources.procedures.as_ref(),
        "Quy trình xin nghỉ phép",
        "Bước 1: Điền đơn trên hệ thống nhân sự.",
        "Nhân sự",
    )
    .await
    .unwrap();
    let (user, token) = create_user_with_token(&resources, "chat@example.com", UserRole::User)
        .await
        .unwrap();
    (resources, gateway, user.id, token)
}

// ============================================================================
// Public Chat
// ============================================================================

#[tokio::test]
async fn test_public_chat_answers_without_recording() {
    let (resources, gateway, _, _) =
        setup_test_environment(ScriptedGateway::answering("Điền đơn nghỉ phép.")).await;

    let response = AxumTestRequest::post("/api/chat/public")
        .json(&json!({"message": "nghỉ phép"}))
        .send(ChatRoutes::routes(resources.clone()))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["answer"], "Điền đơn nghỉ phép.");
    assert_eq!(body["model"], "mistral-small-latest");
    assert!(body.get("conversation_id").is_none());

    assert!(gateway.prompts()[0].contains("Quy trình xin nghỉ phép"));
    assert_eq!(resources.conversations.count_conversations().await.unwrap(), 0);
}

#[tokio::test]
async fn test_public_chat_accepts_question_alias_and_plain_path() {
    let (resources, gateway, _, _) = setup_test_environment(ScriptedGateway::answering("ok")).await;

    let response = AxumTestRequest::post("/api/chat/public")
        .json(&json!({"question": "xin chào", "use_rag": false}))
        .send(ChatRoutes::routes(resources))
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(gateway.prompts(), vec!["xin chào".to_owned()]);
}

#[tokio::test]
async fn test_empty_message_is_bad_request() {
    let (resources, gateway, _, _) = setup_test_environment(ScriptedGateway::answering("ok")).await;

    let response = AxumTestRequest::post("/api/chat/public")
        .json(&json!({"message": "   "}))
        .send(ChatRoutes::routes(resources))
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "INVALID_INPUT");
    assert!(gateway.prompts().is_empty());
}

#[tokio::test]
async fn test_exhausted_gateway_returns_service_unavailable() {
    let (resources, _, _, _) =
        setup_test_environment(ScriptedGateway::scripted(Vec::new())).await;

    let response = AxumTestRequest::post("/api/chat/public")
        .json(&json!({"message": "nghỉ phép"}))
        .send(ChatRoutes::routes(resources))
        .await;

    assert_eq!(response.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "EXTERNAL_SERVICE_UNAVAILABLE");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("all models failed"));
}

// ============================================================================
// Authenticated Chat and History
// ============================================================================

#[tokio::test]
async fn test_authenticated_chat_requires_token() {
    let (resources, _, _, _) = setup_test_environment(ScriptedGateway::answering("ok")).await;

    let response = AxumTestRequest::post("/api/chat")
        .json(&json!({"message": "nghỉ phép"}))
        .send(ChatRoutes::routes(resources))
        .await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_authenticated_chat_records_and_merges() {
    let (resources, _, _, token) =
        setup_test_environment(ScriptedGateway::answering("recorded")).await;

    let first: Value = AxumTestRequest::post("/api/chat")
        .bearer(&token)
        .json(&json!({"message": "Quy trình nghỉ phép?"}))
        .send(ChatRoutes::routes(resources.clone()))
        .await
        .assert_status(StatusCode::OK)
        .json();
    let conversation_id = first["conversation_id"].as_str().unwrap().to_owned();

    let second: Value = AxumTestRequest::post("/api/chat")
        .bearer(&token)
        .json(&json!({"message": "Cần giấy tờ gì?"}))
        .send(ChatRoutes::routes(resources.clone()))
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(second["conversation_id"], conversation_id.as_str());

    let history: Value = AxumTestRequest::get("/api/history")
        .bearer(&token)
        .send(ChatRoutes::routes(resources.clone()))
        .await
        .assert_status(StatusCode::OK)
        .json();
    assert_eq!(history["total"], 1);
    assert_eq!(history["conversations"][0]["title"], "Quy trình nghỉ phép?");
    assert_eq!(history["conversations"][0]["message_count"], 4);

    let conversation: Value = AxumTestRequest::get(&format!(
        "/api/chat/conversations/{conversation_id}"
    ))
    .bearer(&token)
    .send(ChatRoutes::routes(resources))
    .await
    .assert_status(StatusCode::OK)
    .json();
    let messages = conversation["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[0]["role"], "user");
    assert_eq!(messages[1]["role"], "assistant");
    assert_eq!(messages[2]["content"], "Cần giấy tờ gì?");
}

#[tokio::test]
async fn test_conversation_is_private_to_owner() {
    let (resources, _, _, token) = setup_test_environment(ScriptedGateway::answering("ok")).await;
    let (_, other_token) =
        create_user_with_token(&resources, "other@example.com", UserRole::User)
            .await
            .unwrap();

    let answer: Value = AxumTestRequest::post("/api/chat")
        .bearer(&token)
        .json(&json!({"message": "nghỉ phép"}))
        .send(ChatRoutes::routes(resources.clone()))
        .await
        .json();
    let conversation_id = answer["conversation_id"].as_str().unwrap().to_owned();
    let uri = format!("/api/chat/conversations/{conversation_id}");

    let foreign = AxumTestRequest::get(&uri)
        .bearer(&other_token)
        .send(ChatRoutes::routes(resources.clone()))
        .await;
    assert_eq!(foreign.status_code(), StatusCode::NOT_FOUND);

    let foreign_delete = AxumTestRequest::delete(&uri)
        .bearer(&other_token)
        .send(ChatRoutes::routes(resources.clone()))
        .await;
    assert_eq!(foreign_delete.status_code(), StatusCode::NOT_FOUND);

    let other_history: Value = AxumTestRequest::get("/api/history")
        .bearer(&other_token)
        .send(ChatRoutes::routes(resources))
        .await
        .json();
    assert_eq!(other_history["total"], 0);
}

#[tokio::test]
async fn test_delete_conversation() {
    let (resources, _, _, token) = setup_test_environment(ScriptedGateway::answering("ok")).await;

    let answer: Value = AxumTestRequest::post("/api/chat")
        .bearer(&token)
        .json(&json!({"message": "nghỉ phép"}))
        .send(ChatRoutes::routes(resources.clone()))
        .await
        .json();
    let uri = format!(
        "/api/chat/conversations/{}",
        answer["conversation_id"].as_str().unwrap()
    );

    let deleted = AxumTestRequest::delete(&uri)
        .bearer(&token)
        .send(ChatRoutes::routes(resources.clone()))
        .await;
    assert_eq!(deleted.status_code(), StatusCode::NO_CONTENT);

    let again = AxumTestRequest::delete(&uri)
        .bearer(&token)
        .send(ChatRoutes::routes(resources.clone()))
        .await;
    assert_eq!(again.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(resources.conversations.count_conversations().await.unwrap(), 0);
}

#[tokio::test]
async fn test_explicit_conversation_id_continues_thread() {
    let (resources, _, user_id, token) =
        setup_test_environment(ScriptedGateway::answering("ok")).await;
    let old = resources
        .conversations
        .create_conversation(
            &user_id,
            "Older thread",
            chrono::Utc::now() - chrono::Duration::days(2),
        )
        .await
        .unwrap();

    let answer: Value = AxumTestRequest::post("/api/chat")
        .bearer(&token)
        .json(&json!({"message": "follow-up", "conversation_id": old.id}))
        .send(ChatRoutes::routes(resources))
        .await
        .assert_status(StatusCode::OK)
        .json();

    assert_eq!(answer["conversation_id"], old.id.as_str());
}

// ============================================================================
// Caller Disconnect
// ============================================================================

/// Answers after a delay and notes that it finished
struct DelayedGateway {
    delay: Duration,
    finished: AtomicBool,
}

#[async_trait]
impl ChatGateway for DelayedGateway {
    async fn complete(&self, _prompt: &str) -> Result<ChatCompletion, GatewayError> {
        tokio::time::sleep(self.delay).await;
        self.finished.store(true, Ordering::SeqCst);
        Ok(common::completion("Trả lời muộn"))
    }
}

#[tokio::test]
async fn test_dropped_request_still_answers_and_records() {
    let gateway = Arc::new(DelayedGateway {
        delay: Duration::from_millis(300),
        finished: AtomicBool::new(false),
    });
    let resources = create_test_resources(gateway.clone()).await.unwrap();
    let (_, token) = create_user_with_token(&resources, "leaver@example.com", UserRole::User)
        .await
        .unwrap();

    // The caller gives up long before the gateway answers
    let request = AxumTestRequest::post("/api/chat")
        .bearer(&token)
        .json(&json!({"message": "Quy trình nghỉ việc?"}))
        .send(ChatRoutes::routes(resources.clone()));
    assert!(tokio::time::timeout(Duration::from_millis(50), request)
        .await
        .is_err());

    tokio::time::sleep(Duration::from_millis(600)).await;

    assert!(gateway.finished.load(Ordering::SeqCst));
    assert_eq!(resources.conversations.count_conversations().await.unwrap(), 1);
}
