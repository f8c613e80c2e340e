//! The conversation transcript and the rules for merging replies into it.

mod reconciler;

pub use reconciler::{TranscriptReconciler, TurnState};

use crate::models::{Message, MessageRole};

/// Ordered list of conversation entries.
///
/// At most one entry is a placeholder at any time, and it is always the
/// last assistant entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn append_user_message(&mut self, text: impl Into<String>) {
        self.messages.push(Message::user(text));
    }

    /// Append the pending-reply placeholder unless one is already present.
    pub fn append_placeholder(&mut self) {
        if !self.has_placeholder() {
            self.messages.push(Message::placeholder());
        }
    }

    pub fn has_placeholder(&self) -> bool {
        self.messages.iter().any(Message::is_placeholder)
    }

    /// Remove the placeholder. Returns whether one was present.
    pub fn remove_placeholder(&mut self) -> bool {
        let before = self.messages.len();
        self.messages.retain(|m| !m.is_placeholder());
        self.messages.len() != before
    }

    /// Entry holding the reply with `response_id`.
    pub fn find_reply(&self, response_id: &str) -> Option<&Message> {
        self.messages
            .iter()
            .find(|m| m.response_id() == Some(response_id))
    }

    fn find_reply_mut(&mut self, response_id: &str) -> Option<&mut Message> {
        self.messages
            .iter_mut()
            .find(|m| m.response_id() == Some(response_id))
    }

    /// Put a new reply where the placeholder was, or at the end.
    fn replace_placeholder(&mut self, reply: Message) {
        match self.messages.iter().position(Message::is_placeholder) {
            Some(pos) => self.messages[pos] = reply,
            None => self.messages.push(reply),
        }
    }

    /// Render as `Label: content` lines, one per entry.
    pub fn render(&self) -> String {
        self.messages
            .iter()
            .map(|m| format!("{}: {}", m.role.label(), m.content))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Number of entries per role, placeholders excluded.
    pub fn count_role(&self, role: MessageRole) -> usize {
        self.messages
            .iter()
            .filter(|m| m.role == role && !m.is_placeholder())
            .count()
    }
}

impl<'a> IntoIterator for &'a Transcript {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}
