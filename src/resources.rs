// ABOUTME: Centralized resource container shared by every route handler
// ABOUTME: Builds the database, auth, gateway and chat services once at startup
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Procedure Assistant Contributors

//! # Server Resources
//!
//! Expensive shared objects are created once and handed to routers as
//! `Arc<ServerResources>`. The gateway is injected as a trait object so
//! tests can substitute a canned backend.

use std::sync::Arc;

use crate::auth::AuthManager;
use crate::config::ServerConfig;
use crate::database::{
    CategoryRepository, ConversationRepository, Database, ProcedureRepository, UserRepository,
};
use crate::errors::AppResult;
use crate::llm::{ChatGateway, GatewayClient, GatewayConfig, PromptAssembler};
use crate::middleware::AuthMiddleware;
use crate::services::{
    AuthService, ChatOrchestrator, ConversationRecorder, DocumentIngestor, RetrievalHelper,
};

/// Shared server resources
#[derive(Clone)]
pub struct ServerResources {
    /// Configuration loaded at startup
    pub config: Arc<ServerConfig>,
    /// Concrete store
    pub database: Arc<Database>,
    /// Procedure store
    pub procedures: Arc<dyn ProcedureRepository>,
    /// Category store
    pub categories: Arc<dyn CategoryRepository>,
    /// Account store
    pub users: Arc<dyn UserRepository>,
    /// Conversation store
    pub conversations: Arc<dyn ConversationRepository>,
    /// JWT issuing and validation
    pub auth_manager: AuthManager,
    /// Bearer-token authentication for handlers
    pub auth_middleware: AuthMiddleware,
    /// Account operations
    pub auth_service: AuthService,
    /// Chat pipeline
    pub chat: ChatOrchestrator,
    /// Uploaded document to procedure conversion
    pub documents: DocumentIngestor,
}

impl ServerResources {
    /// Wire all services around a database and a gateway
    #[must_use]
    pub fn new(config: ServerConfig, database: Database, gateway: Arc<dyn ChatGateway>) -> Self {
        let database = Arc::new(database);
        let procedures: Arc<dyn ProcedureRepository> = database.clone();
        let categories: Arc<dyn CategoryRepository> = database.clone();
        let users: Arc<dyn UserRepository> = database.clone();
        let conversations: Arc<dyn ConversationRepository> = database.clone();

        let auth_manager = AuthManager::new(
            config.auth.jwt_secret.as_bytes(),
            config.auth.jwt_expiry_hours,
        );
        let auth_middleware = AuthMiddleware::new(auth_manager.clone());
        let auth_service = AuthService::new(users.clone(), auth_manager.clone());

        let chat = ChatOrchestrator::new(
            RetrievalHelper::new(procedures.clone()),
            PromptAssembler::new(config.assistant.response_language.clone()),
            gateway,
            ConversationRecorder::new(conversations.clone()),
        );

        let documents = DocumentIngestor::new(procedures.clone(), config.uploads.dir.clone());

        Self {
            config: Arc::new(config),
            database,
            procedures,
            categories,
            users,
            conversations,
            auth_manager,
            auth_middleware,
            auth_service,
            chat,
            documents,
        }
    }

    /// Wire all services using the configured chat-completion gateway
    ///
    /// # Errors
    ///
    /// Returns an error if the gateway client cannot be built
    pub fn from_config(config: ServerConfig, database: Database) -> AppResult<Self> {
        let gateway = GatewayClient::new(GatewayConfig::from(&config.llm))?;
        Ok(Self::new(config, database, Arc::new(gateway)))
    }
}
