//! FAQ chatbot conversations

use serde::{Deserialize, Serialize};

use super::{new_id, now, RecordId, Timestamp};
use crate::storage::Record;

/// Longest message a visitor may send
pub const MAX_MESSAGE_CHARS: usize = 1000;

string_enum! {
    /// Author of a chat message
    pub enum ChatRole {
        /// Site visitor
        User => "user",
        /// Scripted bot
        Assistant => "assistant",
    }
}

/// One turn in a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Author
    pub role: ChatRole,
    /// Message text
    pub text: String,
    /// Matched intent; set on assistant replies only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
    /// When the message was added
    pub timestamp: Timestamp,
}

impl ChatMessage {
    /// Visitor message
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
            intent: None,
            timestamp: now(),
        }
    }

    /// Bot reply tagged with the intent that produced it
    pub fn assistant(text: impl Into<String>, intent: &str) -> Self {
        Self {
            role: ChatRole::Assistant,
            text: text.into(),
            intent: Some(intent.to_string()),
            timestamp: now(),
        }
    }
}

/// Conversation state; nothing but the message list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    /// Session id
    pub id: RecordId,
    /// Messages in order
    pub messages: Vec<ChatMessage>,
    /// Creation time
    pub created_at: Timestamp,
    /// Time of the last message
    pub updated_at: Timestamp,
}

impl ChatSession {
    /// Empty session
    pub fn new() -> Self {
        let now = now();
        Self {
            id: new_id(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Append a message
    pub fn push(&mut self, message: ChatMessage) {
        self.updated_at = message.timestamp;
        self.messages.push(message);
    }

    /// Drop the oldest messages until at most `max` remain
    pub fn keep_last(&mut self, max: usize) {
        let excess = self.messages.len().saturating_sub(max);
        self.messages.drain(..excess);
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

impl Record for ChatSession {
    const COLLECTION: &'static str = "chat_sessions";

    fn id(&self) -> RecordId {
        self.id
    }

    // Retention evicts the least recently active session
    fn created_at(&self) -> Timestamp {
        self.updated_at
    }
}
