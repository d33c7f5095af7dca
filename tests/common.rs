// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides in-memory databases, test configuration, a scripted gateway and user helpers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Procedure Assistant Contributors
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::unwrap_used,
    clippy::expect_used
)]
//! Shared test utilities for `procedure_assistant`

use anyhow::Result;
use async_trait::async_trait;
use procedure_assistant::{
    auth::hash_password,
    config::{
        AssistantConfig, AuthConfig, CorsConfig, DatabaseConfig, Environment, LlmConfig,
        ServerConfig, UploadConfig,
    },
    constants::{llm, prompt},
    database::{Database, ProcedureRepository, UserRepository},
    llm::{ChatCompletion, ChatGateway, FallbackPolicy, GatewayError},
    models::{Procedure, ProcedureInput, User, UserRole},
    resources::ServerResources,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, Once};

static INIT_LOGGER: Once = Once::new();

pub const TEST_JWT_SECRET: &str = "test-secret-for-procedure-assistant-tests";
pub const TEST_PASSWORD: &str = "password123";

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        // TEST_LOG controls the level; default to WARN for quiet tests
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// Fresh in-memory database with the schema applied
pub async fn create_test_database() -> Result<Database> {
    init_test_logging();
    Ok(Database::new("sqlite::memory:").await?)
}

/// Configuration pointing the gateway at `llm_base_url`
pub fn test_config(llm_base_url: &str) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_owned(),
        http_port: 0,
        environment: Environment::Testing,
        database: DatabaseConfig {
            url: "sqlite::memory:".to_owned(),
        },
        auth: AuthConfig {
            jwt_secret: TEST_JWT_SECRET.to_owned(),
            jwt_expiry_hours: 1,
        },
        llm: LlmConfig {
            api_key: "test-api-key".to_owned(),
            base_url: llm_base_url.to_owned(),
            models: llm::DEFAULT_MODELS.iter().map(|m| (*m).to_owned()).collect(),
            request_timeout_secs: 5,
            min_request_interval_ms: 0,
            fallback_policy: FallbackPolicy::Strict,
        },
        assistant: AssistantConfig {
            response_language: prompt::DEFAULT_RESPONSE_LANGUAGE.to_owned(),
        },
        admin: None,
        cors: CorsConfig {
            allowed_origins: "*".to_owned(),
        },
        uploads: UploadConfig {
            dir: std::env::temp_dir().join("procedure-assistant-test-uploads"),
        },
    }
}

/// Gateway double that replays scripted outcomes and records prompts
pub struct ScriptedGateway {
    outcomes: Mutex<VecDeque<Result<ChatCompletion, GatewayError>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGateway {
    /// Always answers with `answer` from `mistral-small-latest`
    pub fn answering(answer: &str) -> Self {
        let gateway = Self::scripted(Vec::new());
        gateway
            .outcomes
            .lock()
            .unwrap()
            .push_back(Ok(completion(answer)));
        gateway
    }

    /// Replays `outcomes` in order; the last one repeats
    pub fn scripted(outcomes: Vec<Result<ChatCompletion, GatewayError>>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Prompts received so far
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatGateway for ScriptedGateway {
    async fn complete(&self, prompt: &str) -> Result<ChatCompletion, GatewayError> {
        self.prompts.lock().unwrap().push(prompt.to_owned());
        let mut outcomes = self.outcomes.lock().unwrap();
        if outcomes.len() > 1 {
            return outcomes.pop_front().unwrap();
        }
        match outcomes.front() {
            Some(Ok(done)) => Ok(done.clone()),
            Some(Err(_)) | None => Err(exhausted("open-mistral-7b")),
        }
    }
}

/// Successful completion from the first default model
pub fn completion(answer: &str) -> ChatCompletion {
    ChatCompletion {
        content: answer.to_owned(),
        model: llm::DEFAULT_MODELS[0].to_owned(),
    }
}

/// Exhaustion error whose last attempt hit a capacity limit
pub fn exhausted(last_model: &str) -> GatewayError {
    GatewayError::Exhausted {
        attempts: 4,
        last: Box::new(GatewayError::Capacity {
            model: last_model.to_owned(),
            message: "Service tier capacity exceeded".to_owned(),
        }),
    }
}

/// Server resources over a fresh in-memory database and the given gateway
pub async fn create_test_resources(gateway: Arc<dyn ChatGateway>) -> Result<Arc<ServerResources>> {
    let database = create_test_database().await?;
    Ok(Arc::new(ServerResources::new(
        test_config("http://127.0.0.1:9"),
        database,
        gateway,
    )))
}

/// Insert a user with [`TEST_PASSWORD`] and return it with a valid token
pub async fn create_user_with_token(
    resources: &ServerResources,
    email: &str,
    role: UserRole,
) -> Result<(User, String)> {
    let hash = hash_password(TEST_PASSWORD).await?;
    let user = resources
        .users
        .create_user("Test User", email, &hash, role)
        .await?;
    let token = resources.auth_manager.generate_token(&user)?;
    Ok((user, token))
}

/// Insert a user directly into a database
pub async fn create_test_user(database: &Database, email: &str) -> Result<User> {
    Ok(database
        .create_user("Test User", email, "not-a-real-hash", UserRole::User)
        .await?)
}

/// Insert a procedure
pub async fn create_procedure(
    repo: &dyn ProcedureRepository,
    title: &str,
    content: &str,
    category: &str,
) -> Result<Procedure> {
    let input = ProcedureInput {
        title: title.to_owned(),
        content: content.to_owned(),
        category: category.to_owned(),
        description: String::new(),
    };
    Ok(repo.create_procedure(&input, None).await?)
}
