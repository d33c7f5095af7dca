// ABOUTME: Environment-based configuration loaded once at server startup
// ABOUTME: Validates required secrets and applies defaults for gateway, auth and HTTP settings
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Procedure Assistant Contributors

//! Environment-based configuration management
//!
//! Every setting is read from the process environment exactly once by
//! [`ServerConfig::from_env`]. Missing required values are a fatal startup
//! error; everything else falls back to a documented default.

use crate::constants::{auth, llm, ports, prompt, upload};
use crate::llm::FallbackPolicy;
use anyhow::{anyhow, Context, Result};
use std::env;
use std::fmt;
use std::path::PathBuf;
use tracing::info;

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    /// Local development
    #[default]
    Development,
    /// Production deployment
    Production,
    /// Automated tests
    Testing,
}

impl Environment {
    /// Parse from a string, defaulting to development
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "testing" | "test" => Self::Testing,
            _ => Self::Development,
        }
    }

    /// Whether this is a production deployment
    #[must_use]
    pub const fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
            Self::Testing => write!(f, "testing"),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// sqlx connection URL (`sqlite:...`)
    pub url: String,
}

/// Authentication configuration
#[derive(Clone)]
pub struct AuthConfig {
    /// HS256 signing secret
    pub jwt_secret: String,
    /// Token lifetime
    pub jwt_expiry_hours: i64,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"[REDACTED]")
            .field("jwt_expiry_hours", &self.jwt_expiry_hours)
            .finish()
    }
}

/// Chat-completion gateway configuration
#[derive(Clone)]
pub struct LlmConfig {
    /// Bearer credential for the gateway
    pub api_key: String,
    /// OpenAI-compatible base URL (without `/chat/completions`)
    pub base_url: String,
    /// Models tried in order
    pub models: Vec<String>,
    /// Per-attempt timeout
    pub request_timeout_secs: u64,
    /// Minimum spacing between dispatches
    pub min_request_interval_ms: u64,
    /// How non-capacity failures are treated
    pub fallback_policy: FallbackPolicy,
}

impl fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmConfig")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("models", &self.models)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("min_request_interval_ms", &self.min_request_interval_ms)
            .field("fallback_policy", &self.fallback_policy)
            .finish()
    }
}

/// Prompt assembly settings
#[derive(Debug, Clone)]
pub struct AssistantConfig {
    /// Language the assistant is instructed to answer in
    pub response_language: String,
}

/// Credentials for the admin account ensured at startup
#[derive(Clone)]
pub struct AdminBootstrapConfig {
    /// Admin login email
    pub email: String,
    /// Admin password (hashed before storage)
    pub password: String,
    /// Display name
    pub name: String,
}

impl fmt::Debug for AdminBootstrapConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminBootstrapConfig")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("name", &self.name)
            .finish()
    }
}

/// CORS configuration
#[derive(Debug, Clone)]
pub struct CorsConfig {
    /// Comma-separated list of allowed origins, or `*`
    pub allowed_origins: String,
}

/// Procedure document upload settings
#[derive(Debug, Clone)]
pub struct UploadConfig {
    /// Directory uploaded documents are stored in
    pub dir: PathBuf,
}

/// Complete server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,
    /// HTTP port
    pub http_port: u16,
    /// Deployment environment
    pub environment: Environment,
    /// Database settings
    pub database: DatabaseConfig,
    /// Authentication settings
    pub auth: AuthConfig,
    /// Gateway settings
    pub llm: LlmConfig,
    /// Prompt settings
    pub assistant: AssistantConfig,
    /// Optional admin bootstrap
    pub admin: Option<AdminBootstrapConfig>,
    /// CORS settings
    pub cors: CorsConfig,
    /// Document upload settings
    pub uploads: UploadConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable (`MISTRAL_API_KEY`,
    /// `DATABASE_URL`, `JWT_SECRET`) is missing or a numeric value fails to parse
    pub fn from_env() -> Result<Self> {
        info!("Loading configuration from environment variables");

        let api_key = required_var("MISTRAL_API_KEY")
            .or_else(|_| required_var("LLM_API_KEY"))
            .map_err(|_| anyhow!("MISTRAL_API_KEY (or LLM_API_KEY) must be set"))?;

        let config = Self {
            host: env_var_or("HOST", "0.0.0.0"),
            http_port: env_var_or("HTTP_PORT", &ports::DEFAULT_HTTP_PORT.to_string())
                .parse()
                .context("Invalid HTTP_PORT value")?,
            environment: Environment::from_str_or_default(&env_var_or(
                "ENVIRONMENT",
                "development",
            )),
            database: DatabaseConfig {
                url: required_var("DATABASE_URL")?,
            },
            auth: AuthConfig {
                jwt_secret: required_var("JWT_SECRET")?,
                jwt_expiry_hours: env_var_or(
                    "JWT_EXPIRY_HOURS",
                    &auth::DEFAULT_TOKEN_EXPIRY_HOURS.to_string(),
                )
                .parse()
                .context("Invalid JWT_EXPIRY_HOURS value")?,
            },
            llm: LlmConfig {
                api_key,
                base_url: env_var_or("LLM_BASE_URL", llm::DEFAULT_BASE_URL)
                    .trim_end_matches('/')
                    .to_owned(),
                models: parse_models(&env_var_or("LLM_MODELS", "")),
                request_timeout_secs: env_var_or(
                    "LLM_REQUEST_TIMEOUT_SECS",
                    &llm::REQUEST_TIMEOUT_SECS.to_string(),
                )
                .parse()
                .context("Invalid LLM_REQUEST_TIMEOUT_SECS value")?,
                min_request_interval_ms: env_var_or(
                    "LLM_MIN_REQUEST_INTERVAL_MS",
                    &llm::MIN_REQUEST_INTERVAL_MS.to_string(),
                )
                .parse()
                .context("Invalid LLM_MIN_REQUEST_INTERVAL_MS value")?,
                fallback_policy: env_var_or("LLM_FALLBACK_POLICY", "strict")
                    .parse()
                    .map_err(|e: String| anyhow!(e))?,
            },
            assistant: AssistantConfig {
                response_language: env_var_or(
                    "ASSISTANT_LANGUAGE",
                    prompt::DEFAULT_RESPONSE_LANGUAGE,
                ),
            },
            admin: admin_bootstrap_from_env(),
            cors: CorsConfig {
                allowed_origins: env_var_or("CORS_ALLOWED_ORIGINS", "*"),
            },
            uploads: UploadConfig {
                dir: PathBuf::from(env_var_or("UPLOAD_DIR", upload::DEFAULT_DIR)),
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate cross-field constraints
    ///
    /// # Errors
    ///
    /// Returns an error when a value is present but unusable
    pub fn validate(&self) -> Result<()> {
        if self.llm.models.is_empty() {
            return Err(anyhow!("LLM_MODELS must name at least one model"));
        }
        if self.auth.jwt_expiry_hours <= 0 {
            return Err(anyhow!("JWT_EXPIRY_HOURS must be positive"));
        }
        if self.llm.request_timeout_secs == 0 {
            return Err(anyhow!("LLM_REQUEST_TIMEOUT_SECS must be positive"));
        }
        Ok(())
    }

    /// Log a secret-free summary of the loaded configuration
    pub fn log_summary(&self) {
        info!(
            environment = %self.environment,
            host = %self.host,
            http_port = self.http_port,
            llm.base_url = %self.llm.base_url,
            llm.models = ?self.llm.models,
            llm.fallback_policy = ?self.llm.fallback_policy,
            assistant.language = %self.assistant.response_language,
            admin_bootstrap = self.admin.is_some(),
            upload_dir = %self.uploads.dir.display(),
            "Configuration loaded"
        );
    }
}

fn required_var(key: &str) -> Result<String> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(anyhow!("{key} environment variable is required")),
    }
}

fn env_var_or(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_owned())
}

/// Parse a comma-separated model list, falling back to the default order
fn parse_models(models_str: &str) -> Vec<String> {
    let models: Vec<String> = models_str
        .split(',')
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty())
        .collect();

    if models.is_empty() {
        llm::DEFAULT_MODELS.iter().map(|m| (*m).to_owned()).collect()
    } else {
        models
    }
}

fn admin_bootstrap_from_env() -> Option<AdminBootstrapConfig> {
    let email = env::var("ADMIN_EMAIL").ok().filter(|v| !v.trim().is_empty())?;
    let password = env::var("ADMIN_PASSWORD")
        .ok()
        .filter(|v| !v.is_empty())?;
    Some(AdminBootstrapConfig {
        email: email.trim().to_lowercase(),
        password,
        name: env_var_or("ADMIN_NAME", "Administrator"),
    })
}
