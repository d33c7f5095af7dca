// ABOUTME: Core data models for the procedure assistant
// ABOUTME: Re-exports Procedure, Category, Conversation and User domain types
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Procedure Assistant Contributors

//! # Data Models
//!
//! ## Core Models
//!
//! - `Procedure`: an internal company procedure document
//! - `Category`: a named grouping for procedures
//! - `Conversation`: a user's chat history with the assistant
//! - `User`: an account with an explicit role

mod category;
mod conversation;
mod procedure;
mod user;

pub use category::{Category, NewCategory};
pub use conversation::{
    Conversation, ConversationMessage, ConversationRole, ConversationSummary,
};
pub use procedure::{Procedure, ProcedureInput};
pub use user::{User, UserRole};
