// ABOUTME: Shared test helpers for HTTP integration tests
// ABOUTME: Exports the oneshot request builder used against axum routers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Procedure Assistant Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

pub mod axum_test;
