// ABOUTME: Core types and constants for the procedure assistant backend
// ABOUTME: Foundation crate with error handling, domain models, and constants
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Procedure Assistant Contributors

#![deny(unsafe_code)]

//! # Procedure Assistant Core
//!
//! Foundation crate providing shared types and constants for the procedure
//! assistant backend. This crate is designed to change infrequently, enabling
//! incremental compilation benefits in the workspace.
//!
//! ## Modules
//!
//! - **errors**: Unified error handling with `AppError`, `ErrorCode`, and HTTP responses
//! - **constants**: Application-wide constants organized by domain
//! - **models**: Procedures, categories, conversations and users

/// Unified error handling system with standard error codes and HTTP responses
pub mod errors;

/// Application constants and configuration values organized by domain
pub mod constants;

/// Core data models (Procedure, Category, Conversation, User)
pub mod models;
