use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    User,
    Assistant,
    /// Status notices such as "listening" or "timed out"
    System,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub role: Role,
    pub text: String,
    /// Text handed to the speech engine; only assistant replies carry one
    pub spoken_text: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            text: text.into(),
            spoken_text: None,
            timestamp: Utc::now(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Role::System, text)
    }

    pub fn assistant(text: impl Into<String>, spoken_text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, text).with_spoken_text(spoken_text)
    }

    pub fn with_spoken_text(mut self, spoken_text: impl Into<String>) -> Self {
        self.spoken_text = Some(spoken_text.into());
        self
    }

    pub fn is_speakable(&self) -> bool {
        self.role == Role::Assistant
            && self
                .spoken_text
                .as_deref()
                .is_some_and(|text| !text.trim().is_empty())
    }
}
