//! Conversation turn and history types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role in a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnRole {
    /// Caller speech
    User,
    /// Agent response
    Agent,
}

impl TurnRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnRole::User => "user",
            TurnRole::Agent => "agent",
        }
    }
}

impl std::fmt::Display for TurnRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single turn in the conversation history.
///
/// History entries are append-only; once inserted they are never mutated,
/// reordered, or pruned during the life of a call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    /// Role of the speaker
    pub role: TurnRole,
    /// Content of the turn
    pub content: String,
    /// When the turn occurred
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    pub fn new(role: TurnRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create a caller turn
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(TurnRole::User, content)
    }

    /// Create an agent turn
    pub fn agent(content: impl Into<String>) -> Self {
        Self::new(TurnRole::Agent, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_creation() {
        let turn = Turn::user("I'd like to schedule an appointment");
        assert_eq!(turn.role, TurnRole::User);
        assert!(!turn.content.is_empty());

        let turn = Turn::agent("Of course, let me verify your identity first.");
        assert_eq!(turn.role, TurnRole::Agent);
    }

    #[test]
    fn test_role_serialization() {
        let json = serde_json::to_string(&TurnRole::User).unwrap();
        assert_eq!(json, "\"user\"");
        let json = serde_json::to_string(&TurnRole::Agent).unwrap();
        assert_eq!(json, "\"agent\"");
    }
}
