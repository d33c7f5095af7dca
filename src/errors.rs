// ABOUTME: Application error types re-exported from the core crate
// ABOUTME: Gives handlers and services a single crate::errors import path
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Procedure Assistant Contributors

//! # Unified Error Handling System
//!
//! The error types live in `procedure-assistant-core` so they can be shared
//! by every workspace crate; this module re-exports them.

pub use procedure_assistant_core::errors::{
    AppError, AppResult, ErrorCode, ErrorResponse, ErrorResponseDetails,
};
