// ABOUTME: Account business logic: registration, login, admin login and admin-managed users
// ABOUTME: Validates credentials, hashes passwords and issues JWTs; roles are never inferred from email
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Procedure Assistant Contributors

use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::auth::{hash_password, verify_password, AuthManager};
use crate::config::AdminBootstrapConfig;
use crate::constants::auth as auth_limits;
use crate::database::{UserRepository, UserUpdate};
use crate::errors::{AppError, AppResult};
use crate::models::{User, UserRole};

const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// Self-service registration request
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    /// Display name
    pub name: String,
    /// Email address
    pub email: String,
    /// Plain-text password
    pub password: String,
}

/// Login request
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    /// Email address
    pub email: String,
    /// Plain-text password
    pub password: String,
}

/// Admin request creating an account with an explicit role
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    /// Display name
    pub name: String,
    /// Email address
    pub email: String,
    /// Plain-text password
    pub password: String,
    /// Role, `user` when omitted
    #[serde(default)]
    pub role: UserRole,
}

/// Admin request changing an account; omitted fields stay unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserRequest {
    /// New display name
    pub name: Option<String>,
    /// New email address
    pub email: Option<String>,
    /// New plain-text password
    pub password: Option<String>,
    /// New role
    pub role: Option<UserRole>,
}

/// Issued session
#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    /// The authenticated account
    pub user: User,
    /// Bearer token
    pub token: String,
    /// RFC 3339 expiry of the token
    pub expires_at: String,
}

/// Account operations shared by the auth and admin routes
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    auth_manager: AuthManager,
}

impl AuthService {
    /// Create the service
    #[must_use]
    pub fn new(users: Arc<dyn UserRepository>, auth_manager: AuthManager) -> Self {
        Self {
            users,
            auth_manager,
        }
    }

    /// Register a regular user and issue a token
    ///
    /// # Errors
    ///
    /// Returns `INVALID_INPUT` for bad fields and `RESOURCE_ALREADY_EXISTS` for a taken email
    pub async fn register(&self, request: RegisterRequest) -> AppResult<AuthResponse> {
        let email = normalize_email(&request.email);
        info!(email = %email, "User registration attempt");

        validate_name(&request.name)?;
        validate_email(&email)?;
        validate_password(&request.password)?;

        if self.users.get_user_by_email(&email).await?.is_some() {
            return Err(AppError::already_exists("User with this email already exists"));
        }

        let password_hash = hash_password(&request.password).await?;
        let user = self
            .users
            .create_user(request.name.trim(), &email, &password_hash, UserRole::User)
            .await?;

        info!(user_id = %user.id, "User registered");
        self.issue(user)
    }

    /// Check credentials and issue a token
    ///
    /// # Errors
    ///
    /// Returns `AUTH_INVALID` for unknown emails or wrong passwords
    pub async fn login(&self, request: LoginRequest) -> AppResult<AuthResponse> {
        let user = self.check_credentials(&request).await?;
        info!(user_id = %user.id, "User logged in");
        self.issue(user)
    }

    /// Like [`Self::login`], but only for accounts whose stored role is admin
    ///
    /// # Errors
    ///
    /// Returns `AUTH_INVALID` for bad credentials and `PERMISSION_DENIED` for non-admins
    pub async fn admin_login(&self, request: LoginRequest) -> AppResult<AuthResponse> {
        let user = self.check_credentials(&request).await?;
        if !user.role.is_admin() {
            warn!(user_id = %user.id, "Admin login refused for non-admin account");
            return Err(AppError::permission_denied("Admin privileges required"));
        }
        info!(user_id = %user.id, "Admin logged in");
        self.issue(user)
    }

    /// Fetch the account behind an authenticated request
    ///
    /// # Errors
    ///
    /// Returns `RESOURCE_NOT_FOUND` when the account no longer exists
    pub async fn current_user(&self, user_id: &str) -> AppResult<User> {
        self.users
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))
    }

    /// Create the configured admin account, or promote it when it exists as a regular user
    ///
    /// # Errors
    ///
    /// Returns store or hashing errors
    pub async fn ensure_bootstrap_admin(&self, config: &AdminBootstrapConfig) -> AppResult<User> {
        let email = normalize_email(&config.email);
        validate_email(&email)?;
        validate_password(&config.password)?;

        match self.users.get_user_by_email(&email).await? {
            Some(existing) if existing.role.is_admin() => {
                info!(user_id = %existing.id, "Bootstrap admin already present");
                Ok(existing)
            }
            Some(existing) => {
                let update = UserUpdate {
                    role: Some(UserRole::Admin),
                    ..UserUpdate::default()
                };
                let promoted = self
                    .users
                    .update_user(&existing.id, &update)
                    .await?
                    .ok_or_else(|| AppError::not_found("User"))?;
                info!(user_id = %promoted.id, "Promoted existing account to admin");
                Ok(promoted)
            }
            None => {
                let password_hash = hash_password(&config.password).await?;
                let created = self
                    .users
                    .create_user(config.name.trim(), &email, &password_hash, UserRole::Admin)
                    .await?;
                info!(user_id = %created.id, "Created bootstrap admin");
                Ok(created)
            }
        }
    }

    /// Create an account with an explicit role
    ///
    /// # Errors
    ///
    /// Returns `INVALID_INPUT` for bad fields and `RESOURCE_ALREADY_EXISTS` for a taken email
    pub async fn create_user(&self, request: CreateUserRequest) -> AppResult<User> {
        let email = normalize_email(&request.email);
        validate_name(&request.name)?;
        validate_email(&email)?;
        validate_password(&request.password)?;

        let password_hash = hash_password(&request.password).await?;
        self.users
            .create_user(request.name.trim(), &email, &password_hash, request.role)
            .await
    }

    /// Apply an admin update to an account
    ///
    /// # Errors
    ///
    /// Returns `INVALID_INPUT` for bad fields and `RESOURCE_NOT_FOUND` for unknown IDs
    pub async fn update_user(&self, user_id: &str, request: UpdateUserRequest) -> AppResult<User> {
        if let Some(name) = &request.name {
            validate_name(name)?;
        }
        let email = request.email.as_deref().map(normalize_email);
        if let Some(email) = &email {
            validate_email(email)?;
        }
        let password_hash = match &request.password {
            Some(password) => {
                validate_password(password)?;
                Some(hash_password(password).await?)
            }
            None => None,
        };

        let update = UserUpdate {
            name: request.name.map(|n| n.trim().to_owned()),
            email,
            password_hash,
            role: request.role,
        };

        self.users
            .update_user(user_id, &update)
            .await?
            .ok_or_else(|| AppError::not_found("User"))
    }

    async fn check_credentials(&self, request: &LoginRequest) -> AppResult<User> {
        let email = normalize_email(&request.email);
        let Some(user) = self.users.get_user_by_email(&email).await? else {
            warn!(email = %email, "Login attempt for unknown email");
            return Err(AppError::auth_invalid(INVALID_CREDENTIALS));
        };

        if !verify_password(&request.password, &user.password_hash).await? {
            warn!(user_id = %user.id, "Invalid password");
            return Err(AppError::auth_invalid(INVALID_CREDENTIALS));
        }
        Ok(user)
    }

    fn issue(&self, user: User) -> AppResult<AuthResponse> {
        let token = self.auth_manager.generate_token(&user)?;
        let expires_at = Utc::now() + Duration::hours(self.auth_manager.token_expiry_hours());
        Ok(AuthResponse {
            user,
            token,
            expires_at: expires_at.to_rfc3339(),
        })
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Basic email shape check: local part, `@`, dotted domain
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

fn validate_email(email: &str) -> AppResult<()> {
    if is_valid_email(email) {
        Ok(())
    } else {
        Err(AppError::invalid_input("Invalid email format"))
    }
}

fn validate_password(password: &str) -> AppResult<()> {
    if password.chars().count() >= auth_limits::MIN_PASSWORD_LENGTH {
        Ok(())
    } else {
        Err(AppError::invalid_input(format!(
            "Password must be at least {} characters",
            auth_limits::MIN_PASSWORD_LENGTH
        )))
    }
}

fn validate_name(name: &str) -> AppResult<()> {
    if name.trim().is_empty() {
        Err(AppError::invalid_input("Name cannot be empty"))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("nhanvien@congty.vn"));
        assert!(!is_valid_email("nhanvien"));
        assert!(!is_valid_email("@congty.vn"));
        assert!(!is_valid_email("nhanvien@localhost"));
        assert!(!is_valid_email("a@b@c.vn"));
    }

    #[test]
    fn test_password_length_counts_characters() {
        assert!(validate_password("12345").is_err());
        assert!(validate_password("mậtkhẩ").is_ok());
    }
}
