//! Shared application state handed to every handler.

use std::sync::Arc;

use axum::extract::FromRef;
use envira_context::{ContextWindow, PromptAssembler};
use envira_runtime::{providers::ollama::DEFAULT_MODEL, AIProvider};

use crate::auth::JwtConfig;
use crate::config::{DEFAULT_HISTORY_LIMIT, DEFAULT_PAGE_LIMIT};
use crate::db::{ChatRepository, Repositories, SensorRepository, UserRepository};

/// Settings for the chat flow.
#[derive(Debug, Clone)]
pub struct ChatSettings {
    pub window: ContextWindow,
    /// Exchanges fetched as prompt context.
    pub history_limit: usize,
    /// Exchanges shown on the chat page.
    pub page_limit: usize,
    pub default_model: String,
    pub prompt: PromptAssembler,
    pub temperature: f32,
    pub top_p: f32,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            window: ContextWindow::default(),
            history_limit: DEFAULT_HISTORY_LIMIT,
            page_limit: DEFAULT_PAGE_LIMIT,
            default_model: DEFAULT_MODEL.to_string(),
            prompt: PromptAssembler::default(),
            temperature: 0.7,
            top_p: 0.9,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub readings: Arc<dyn SensorRepository>,
    pub chats: Arc<dyn ChatRepository>,
    pub provider: Arc<dyn AIProvider>,
    pub jwt: JwtConfig,
    pub chat: Arc<ChatSettings>,
}

impl AppState {
    pub fn new(
        repositories: Repositories,
        provider: Arc<dyn AIProvider>,
        jwt: JwtConfig,
        chat: ChatSettings,
    ) -> Self {
        Self {
            users: repositories.users,
            readings: repositories.readings,
            chats: repositories.chats,
            provider,
            jwt,
            chat: Arc::new(chat),
        }
    }
}

impl FromRef<AppState> for Arc<dyn UserRepository> {
    fn from_ref(state: &AppState) -> Self {
        state.users.clone()
    }
}

impl FromRef<AppState> for JwtConfig {
    fn from_ref(state: &AppState) -> Self {
        state.jwt.clone()
    }
}
