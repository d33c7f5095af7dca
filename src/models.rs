// ABOUTME: Domain models re-exported from the core crate
// ABOUTME: Procedures, categories, conversations and users
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Procedure Assistant Contributors

pub use procedure_assistant_core::models::*;
