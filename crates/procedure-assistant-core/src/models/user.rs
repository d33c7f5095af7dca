// ABOUTME: User account model with an explicit role field
// ABOUTME: The password hash is never serialized to API callers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Procedure Assistant Contributors

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Account role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Regular employee
    #[default]
    User,
    /// Knowledge-base administrator
    Admin,
}

impl UserRole {
    /// Convert to the string stored in the database
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }

    /// Whether this role may use admin endpoints
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            other => Err(format!("Unknown user role: {other}")),
        }
    }
}

/// A registered account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique user ID
    pub id: String,
    /// Display name
    pub name: String,
    /// Unique, lower-cased email address
    pub email: String,
    /// bcrypt hash of the password
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    /// Explicit role
    pub role: UserRole,
    /// When the account was created
    pub created_at: DateTime<Utc>,
    /// When the account was last modified
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_is_not_serialized() {
        let user = User {
            id: "u-1".to_owned(),
            name: "Lan".to_owned(),
            email: "lan@example.com".to_owned(),
            password_hash: "$2b$04$secret".to_owned(),
            role: UserRole::User,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["role"], "user");
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("admin".parse::<UserRole>().unwrap(), UserRole::Admin);
        assert!(UserRole::Admin.is_admin());
        assert!(!UserRole::User.is_admin());
        assert!("superuser".parse::<UserRole>().is_err());
    }
}
