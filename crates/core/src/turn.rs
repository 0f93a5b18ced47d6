//! Turn and conversation identifier types.
//!
//! A turn is one message from either side of a conversation. Turns flow
//! from the front-end into the store, out of the store into prompts, and
//! back into the store once the engine answers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The id the store falls back to when a turn arrives with no conversation.
pub const DEFAULT_CONVERSATION_ID: &str = "default";

/// Unique identifier for a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(pub String);

impl ConversationId {
    /// A fresh short id: the first 8 hex characters of a random UUID.
    pub fn generate() -> Self {
        let mut id = Uuid::new_v4().simple().to_string();
        id.truncate(8);
        Self(id)
    }

    /// The implicit conversation used when nothing else is selected.
    pub fn fallback() -> Self {
        Self(DEFAULT_CONVERSATION_ID.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(&self.0)
    }
}

impl From<&str> for ConversationId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ConversationId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    /// The person typing (or speaking)
    User,
    /// The generation engine, or the apology that replaced it
    Assistant,
}

impl TurnRole {
    /// Capitalized label used when rendering history into a prompt.
    pub fn label(&self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Assistant => "Assistant",
        }
    }
}

impl std::fmt::Display for TurnRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        })
    }
}

/// A single message in a conversation. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    /// Who sent this message
    pub role: TurnRole,

    /// The text content
    pub message: String,

    /// Capture time
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    /// Create a turn stamped with the current time.
    pub fn new(role: TurnRole, message: impl Into<String>) -> Self {
        Self {
            role,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn user(message: impl Into<String>) -> Self {
        Self::new(TurnRole::User, message)
    }

    pub fn assistant(message: impl Into<String>) -> Self {
        Self::new(TurnRole::Assistant, message)
    }

    /// Render as a `"<Role>: <message>"` line.
    pub fn to_line(&self) -> String {
        format!("{}: {}", self.role.label(), self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_user_turn() {
        let turn = Turn::user("Hello, Aurion!");
        assert_eq!(turn.role, TurnRole::User);
        assert_eq!(turn.message, "Hello, Aurion!");
        assert_eq!(turn.to_line(), "User: Hello, Aurion!");
    }

    #[test]
    fn turn_serializes_with_lowercase_role() {
        let turn = Turn::assistant("Hi");
        let json = serde_json::to_string(&turn).unwrap();
        assert!(json.contains(r#""role":"assistant""#));
        assert!(json.contains(r#""message":"Hi""#));
        assert!(json.contains(r#""timestamp":""#));
    }

    #[test]
    fn turn_parses_iso_timestamp() {
        let json = r#"{"role":"user","message":"hey","timestamp":"2026-01-01T09:30:00Z"}"#;
        let turn: Turn = serde_json::from_str(json).unwrap();
        assert_eq!(turn.role, TurnRole::User);
        assert_eq!(turn.timestamp.to_rfc3339(), "2026-01-01T09:30:00+00:00");
    }

    #[test]
    fn generated_ids_are_short_and_distinct() {
        let a = ConversationId::generate();
        let b = ConversationId::generate();
        assert_eq!(a.as_str().len(), 8);
        assert_ne!(a, b);
    }

    #[test]
    fn conversation_id_is_a_plain_json_string() {
        let id = ConversationId::from("abc123");
        assert_eq!(serde_json::to_string(&id).unwrap(), r#""abc123""#);
        assert_eq!(ConversationId::fallback().as_str(), "default");
    }
}
