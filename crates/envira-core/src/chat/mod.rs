//! Persisted chat exchanges with the assistant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One stored user message and the model's reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRecord {
    pub id: String,
    pub user_id: String,
    pub message: String,
    pub response: String,
    pub model: String,
    pub created_at: DateTime<Utc>,
}

impl ChatRecord {
    pub fn new(
        user_id: impl Into<String>,
        message: impl Into<String>,
        response: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            id: format!("chat_{}", Uuid::new_v4().simple()),
            user_id: user_id.into(),
            message: message.into(),
            response: response.into(),
            model: model.into(),
            created_at: Utc::now(),
        }
    }

    pub fn at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }
}
