// ABOUTME: Central admin authorization guard for routes requiring admin privileges
// ABOUTME: Re-reads the stored role and returns 403 Forbidden if the user is not an admin
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Procedure Assistant Contributors

//! Admin Authorization Guard
//!
//! The role claim inside a token is a snapshot from login time. Admin routes
//! call [`require_admin`], which checks the role currently stored for the
//! user, so a demotion takes effect immediately.

use crate::auth::AuthResult;
use crate::database::UserRepository;
use crate::errors::{AppError, AppResult};
use crate::models::User;

/// Require admin privileges for an authenticated caller
///
/// # Errors
///
/// Returns an error if:
/// - The user no longer exists
/// - The database query fails
/// - The stored role is not admin (403 Forbidden)
pub async fn require_admin(auth: &AuthResult, users: &dyn UserRepository) -> AppResult<User> {
    let user = users
        .get_user(&auth.user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;

    if !user.role.is_admin() {
        tracing::warn!(user_id = %user.id, "Non-admin user attempted admin operation");
        return Err(AppError::permission_denied("Admin privileges required"));
    }

    Ok(user)
}
