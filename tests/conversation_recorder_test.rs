// ABOUTME: Tests for recording chat exchanges into per-user conversations
// ABOUTME: Covers the merge window, explicit conversation IDs, ownership and titles
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Procedure Assistant Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use chrono::{Duration, Utc};
use procedure_assistant::database::{ConversationRepository, Database};
use procedure_assistant::models::ConversationRole;
use procedure_assistant::services::ConversationRecorder;
use std::sync::Arc;

async fn setup() -> (Arc<Database>, ConversationRecorder, String) {
    let database = Arc::new(common::create_test_database().await.unwrap());
    let user = common::create_test_user(&database, "recorder@example.com")
        .await
        .unwrap();
    let recorder = ConversationRecorder::new(database.clone());
    (database, recorder, user.id)
}

#[tokio::test]
async fn test_first_exchange_creates_titled_conversation() {
    let (database, recorder, user_id) = setup().await;

    let id = recorder
        .record(&user_id, None, "Quy trình xin nghỉ phép như thế nào?", "Bạn cần...")
        .await
        .unwrap();

    let conversation = database.get_conversation(&id, &user_id).await.unwrap().unwrap();
    assert_eq!(conversation.title, "Quy trình xin nghỉ phép như thế nào?");
    assert_eq!(conversation.messages.len(), 2);
    assert_eq!(conversation.messages[0].role, ConversationRole::User);
    assert_eq!(conversation.messages[0].content, "Quy trình xin nghỉ phép như thế nào?");
    assert_eq!(conversation.messages[1].role, ConversationRole::Assistant);
    assert_eq!(conversation.messages[1].content, "Bạn cần...");
}

#[tokio::test]
async fn test_exchange_within_window_merges() {
    let (database, recorder, user_id) = setup().await;
    let now = Utc::now();

    let first = recorder
        .record_at(now - Duration::minutes(10), &user_id, None, "q1", "a1")
        .await
        .unwrap();
    let second = recorder
        .record_at(now, &user_id, None, "q2", "a2")
        .await
        .unwrap();

    assert_eq!(first, second);
    let conversation = database.get_conversation(&first, &user_id).await.unwrap().unwrap();
    let contents: Vec<&str> = conversation
        .messages
        .iter()
        .map(|m| m.content.as_str())
        .collect();
    assert_eq!(contents, ["q1", "a1", "q2", "a2"]);
    assert_eq!(database.count_conversations().await.unwrap(), 1);
}

#[tokio::test]
async fn test_exchange_outside_window_starts_new_conversation() {
    let (database, recorder, user_id) = setup().await;
    let now = Utc::now();

    let old = recorder
        .record_at(now - Duration::hours(2), &user_id, None, "old question", "a")
        .await
        .unwrap();
    let fresh = recorder
        .record_at(now, &user_id, None, "new question", "b")
        .await
        .unwrap();

    assert_ne!(old, fresh);
    let old_conversation = database.get_conversation(&old, &user_id).await.unwrap().unwrap();
    assert_eq!(old_conversation.messages.len(), 2);
    assert_eq!(database.count_conversations().await.unwrap(), 2);
}

#[tokio::test]
async fn test_explicit_owned_conversation_is_used_even_when_old() {
    let (database, recorder, user_id) = setup().await;
    let now = Utc::now();

    let old = recorder
        .record_at(now - Duration::days(3), &user_id, None, "old", "a")
        .await
        .unwrap();
    let appended = recorder
        .record_at(now, &user_id, Some(&old), "follow-up", "b")
        .await
        .unwrap();

    assert_eq!(old, appended);
    let conversation = database.get_conversation(&old, &user_id).await.unwrap().unwrap();
    assert_eq!(conversation.messages.len(), 4);
}

#[tokio::test]
async fn test_foreign_conversation_id_is_ignored() {
    let (database, recorder, owner_id) = setup().await;
    let intruder = common::create_test_user(&database, "intruder@example.com")
        .await
        .unwrap();

    let owned = recorder.record(&owner_id, None, "mine", "a").await.unwrap();
    let recorded = recorder
        .record(&intruder.id, Some(&owned), "not yours", "b")
        .await
        .unwrap();

    assert_ne!(owned, recorded);
    let untouched = database.get_conversation(&owned, &owner_id).await.unwrap().unwrap();
    assert_eq!(untouched.messages.len(), 2);
    assert!(database
        .get_conversation(&owned, &intruder.id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_long_question_title_is_truncated() {
    let (database, recorder, user_id) = setup().await;
    let question = "Hướng dẫn chi tiết ".repeat(10);

    let id = recorder.record(&user_id, None, &question, "a").await.unwrap();

    let conversation = database.get_conversation(&id, &user_id).await.unwrap().unwrap();
    assert!(conversation.title.ends_with("..."));
    assert_eq!(conversation.title.chars().count(), 53);
}
