//! User identity for Envira.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered account. Readings and chat history are scoped to one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    /// Unique email. Devices also present it as their API key.
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: format!("user_{}", Uuid::new_v4().simple()),
            name: name.into(),
            email: email.into(),
            created_at: Utc::now(),
        }
    }
}
