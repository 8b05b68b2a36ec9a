//! Runtime configuration read from the environment.

use std::net::SocketAddr;

use envira_context::{window::DEFAULT_MAX_CHARS, ContextWindow, PromptAssembler};
use envira_runtime::providers::ollama::{DEFAULT_MODEL, OLLAMA_API_BASE};
use thiserror::Error;

use crate::auth::JwtConfig;
use crate::state::ChatSettings;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_JWT_SECRET: &str = "envira-dev-secret-change-me";
pub const DEFAULT_HISTORY_LIMIT: usize = 50;
pub const DEFAULT_PAGE_LIMIT: usize = 20;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct GatewayConfig {
    pub bind_addr: SocketAddr,
    pub database_url: Option<String>,
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub jwt_audience: String,
    pub ollama_base_url: String,
    pub default_model: String,
    /// Signed so that negative budgets can be normalized instead of rejected.
    pub context_max_chars: i64,
    pub context_history_limit: usize,
    pub chat_page_limit: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            database_url: None,
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            jwt_issuer: "envira".to_string(),
            jwt_audience: "envira".to_string(),
            ollama_base_url: OLLAMA_API_BASE.to_string(),
            default_model: DEFAULT_MODEL.to_string(),
            context_max_chars: DEFAULT_MAX_CHARS as i64,
            context_history_limit: DEFAULT_HISTORY_LIMIT,
            chat_page_limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

fn parse<T: std::str::FromStr>(
    key: &'static str,
    value: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match value {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value: raw }),
    }
}

impl GatewayConfig {
    /// Load `.env` if present, then read the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!("loaded environment from {}", path.display());
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        Ok(Self {
            bind_addr: parse("ENVIRA_BIND_ADDR", get("ENVIRA_BIND_ADDR"), defaults.bind_addr)?,
            database_url: get("DATABASE_URL"),
            jwt_secret: get("ENVIRA_JWT_SECRET").unwrap_or(defaults.jwt_secret),
            jwt_issuer: get("ENVIRA_JWT_ISSUER").unwrap_or(defaults.jwt_issuer),
            jwt_audience: get("ENVIRA_JWT_AUDIENCE").unwrap_or(defaults.jwt_audience),
            ollama_base_url: get("OLLAMA_BASE_URL").unwrap_or(defaults.ollama_base_url),
            default_model: get("OLLAMA_DEFAULT_MODEL").unwrap_or(defaults.default_model),
            context_max_chars: parse(
                "ENVIRA_CONTEXT_MAX_CHARS",
                get("ENVIRA_CONTEXT_MAX_CHARS"),
                defaults.context_max_chars,
            )?,
            context_history_limit: parse(
                "ENVIRA_CONTEXT_HISTORY_LIMIT",
                get("ENVIRA_CONTEXT_HISTORY_LIMIT"),
                defaults.context_history_limit,
            )?,
            chat_page_limit: parse(
                "ENVIRA_CHAT_PAGE_LIMIT",
                get("ENVIRA_CHAT_PAGE_LIMIT"),
                defaults.chat_page_limit,
            )?,
        })
    }

    pub fn jwt_config(&self) -> JwtConfig {
        JwtConfig::new(
            &self.jwt_secret,
            self.jwt_issuer.clone(),
            self.jwt_audience.clone(),
        )
    }

    pub fn chat_settings(&self) -> ChatSettings {
        ChatSettings {
            window: ContextWindow::from_signed(self.context_max_chars),
            history_limit: self.context_history_limit,
            page_limit: self.chat_page_limit,
            default_model: self.default_model.clone(),
            prompt: PromptAssembler::default(),
            ..ChatSettings::default()
        }
    }
}
