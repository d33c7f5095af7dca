// ABOUTME: Main library entry point for the procedure assistant backend
// ABOUTME: REST API over an internal procedure knowledge base with an AI chat assistant
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Procedure Assistant Contributors

#![deny(unsafe_code)]

//! # Procedure Assistant
//!
//! A REST backend for a company's internal procedures. Employees browse and
//! search procedures and ask an AI assistant questions; the assistant
//! answers from a hosted chat-completion API, optionally grounding the
//! prompt in procedures retrieved by keyword.
//!
//! ## Architecture
//!
//! - **Database**: SQLite store behind repository traits
//! - **LLM**: gateway client with request spacing and model fallback, prompt assembly
//! - **Services**: retrieval, conversation recording, chat orchestration, accounts
//! - **Routes**: axum routers for auth, procedures, chat and admin
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use procedure_assistant::config::ServerConfig;
//! use procedure_assistant::database::Database;
//! use procedure_assistant::resources::ServerResources;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::from_env()?;
//!     let database = Database::new(&config.database.url).await?;
//!     let resources = Arc::new(ServerResources::from_config(config, database)?);
//!     procedure_assistant::server::serve(resources).await?;
//!     Ok(())
//! }
//! ```

/// JWT issuing and validation, password hashing
pub mod auth;

/// Environment-driven configuration
pub mod config;

/// Application constants
pub mod constants;

/// SQLite persistence and repository traits
pub mod database;

/// Unified error handling
pub mod errors;

/// Chat-completion gateway client and prompt assembly
pub mod llm;

/// Structured logging setup
pub mod logging;

/// Authentication, authorization, CORS and tracing helpers
pub mod middleware;

/// Domain models
pub mod models;

/// Shared server resources
pub mod resources;

/// HTTP route handlers
pub mod routes;

/// Server assembly and lifecycle
pub mod server;

/// Domain services
pub mod services;
