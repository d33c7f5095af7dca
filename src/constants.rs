// ABOUTME: Application constants re-exported from the core crate
// ABOUTME: Limits, defaults and service names grouped by domain
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Procedure Assistant Contributors

pub use procedure_assistant_core::constants::*;
