//! Conversation message types.
//!
//! This module contains types for representing messages in a conversation
//! transcript, including roles and message content.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Represents the role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    /// Message typed by the user.
    User,
    /// Message produced by the assistant.
    Bot,
}

impl MessageRole {
    /// Stable string form used by the persistence layer.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Bot => "bot",
        }
    }
}

/// A single message in a conversation transcript.
///
/// Messages are immutable once created. They are owned by the conversation
/// list and persisted externally keyed by (user id, conversation id).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Opaque unique identifier (UUID format)
    pub id: String,
    /// The text content of the message.
    ///
    /// Bot messages may contain embedded command/result markup that the
    /// presentation layer strips before display.
    pub content: String,
    /// The role of the message sender.
    pub role: MessageRole,
    /// Timestamp when the message was created.
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Creates a new message with a fresh id and the current timestamp.
    pub fn new(content: impl Into<String>, role: MessageRole) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            content: content.into(),
            role,
            timestamp: Utc::now(),
        }
    }

    /// Creates a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(content, MessageRole::User)
    }

    /// Creates a bot message.
    pub fn bot(content: impl Into<String>) -> Self {
        Self::new(content, MessageRole::Bot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_have_unique_ids() {
        let a = Message::user("hello");
        let b = Message::user("hello");
        assert_ne!(a.id, b.id, "Message ids must be unique");
    }

    #[test]
    fn test_role_string_forms() {
        assert_eq!(MessageRole::User.as_str(), "user");
        assert_eq!(MessageRole::Bot.as_str(), "bot");
    }

    #[test]
    fn test_role_serde_round_trip() {
        let json = serde_json::to_string(&MessageRole::Bot).unwrap();
        assert_eq!(json, "\"bot\"");
        let role: MessageRole = serde_json::from_str(&json).unwrap();
        assert_eq!(role, MessageRole::Bot);
    }
}
