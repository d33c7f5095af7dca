// ABOUTME: Configuration module entry point
// ABOUTME: Exposes environment-driven server configuration
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Procedure Assistant Contributors

/// Environment-based configuration loading and validation
pub mod environment;

pub use environment::{
    AdminBootstrapConfig, AssistantConfig, AuthConfig, CorsConfig, DatabaseConfig, Environment,
    LlmConfig, ServerConfig, UploadConfig,
};
