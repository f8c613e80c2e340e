use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Text shown in the placeholder entry while a reply is pending.
pub const PLACEHOLDER_TEXT: &str = "loading...";

/// Role of a message in a conversation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    /// Display label for the speaker column.
    pub fn label(&self) -> &'static str {
        match self {
            MessageRole::User => "You",
            MessageRole::Assistant => "ChatGPT",
        }
    }
}

/// Where an assistant entry stands relative to the remote reply.
///
/// `Pending` marks the placeholder inserted on send. It is a distinct variant
/// rather than a reserved id, so no response id can collide with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "id", rename_all = "snake_case")]
pub enum ReplyState {
    Pending,
    Resolved(String),
}

/// One transcript entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Role of the message sender
    pub role: MessageRole,
    /// Reply tracking; always `None` for user entries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply: Option<ReplyState>,
    /// Content of the message
    pub content: String,
    /// When the entry was added locally
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            reply: None,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    /// The in-flight placeholder for an assistant reply.
    pub fn placeholder() -> Self {
        Self {
            role: MessageRole::Assistant,
            reply: Some(ReplyState::Pending),
            content: PLACEHOLDER_TEXT.to_string(),
            created_at: Utc::now(),
        }
    }

    pub fn assistant(response_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            reply: Some(ReplyState::Resolved(response_id.into())),
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    /// Remote response id, if this entry has been resolved to one.
    pub fn response_id(&self) -> Option<&str> {
        match &self.reply {
            Some(ReplyState::Resolved(id)) => Some(id.as_str()),
            _ => None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self.reply, Some(ReplyState::Pending))
    }

    /// Append a streamed fragment. Never replaces existing content.
    pub fn append_token(&mut self, token: &str) {
        self.content.push_str(token);
    }
}
