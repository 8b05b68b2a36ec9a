//! Conversation exchange type

use chrono::{DateTime, Utc};
use envira_core::ChatRecord;
use serde::{Deserialize, Serialize};

const USER_PREFIX: &str = "User: ";
const ASSISTANT_PREFIX: &str = "\nAssistant: ";
const TERMINATOR: &str = "\n\n";

/// One user message paired with the assistant's reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exchange {
    pub user_text: String,
    pub assistant_text: String,
    pub occurred_at: DateTime<Utc>,
}

impl Exchange {
    pub fn new(
        user_text: impl Into<String>,
        assistant_text: impl Into<String>,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            user_text: user_text.into(),
            assistant_text: assistant_text.into(),
            occurred_at,
        }
    }

    /// Character count of the exchange as it appears in a prompt.
    pub fn serialized_len(&self) -> usize {
        USER_PREFIX.len()
            + self.user_text.chars().count()
            + ASSISTANT_PREFIX.len()
            + self.assistant_text.chars().count()
            + TERMINATOR.len()
    }

    /// Append `User: ...\nAssistant: ...\n\n` to `out`.
    pub fn write_to(&self, out: &mut String) {
        out.push_str(USER_PREFIX);
        out.push_str(&self.user_text);
        out.push_str(ASSISTANT_PREFIX);
        out.push_str(&self.assistant_text);
        out.push_str(TERMINATOR);
    }
}

impl From<&ChatRecord> for Exchange {
    fn from(record: &ChatRecord) -> Self {
        Self::new(
            record.message.clone(),
            record.response.clone(),
            record.created_at,
        )
    }
}
