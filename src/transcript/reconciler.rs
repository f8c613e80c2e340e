//! Turn state machine.
//!
//! One turn at a time: `send` opens it with a user entry and a placeholder,
//! deltas fill it in, and stream end, error or cancel closes it. A closed turn
//! never leaves a placeholder behind.

use uuid::Uuid;

use super::Transcript;
use crate::error::ChatError;
use crate::models::{Delta, Message};

/// Where the current turn stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TurnState {
    /// No turn in flight
    #[default]
    Idle,
    /// Placeholder present, no delta merged yet
    AwaitingFirstDelta,
    /// At least one delta merged
    Streaming,
}

/// Merges reply deltas into a [`Transcript`].
#[derive(Debug, Default)]
pub struct TranscriptReconciler {
    transcript: Transcript,
    state: TurnState,
    /// Correlates log lines of one turn
    turn_id: Option<Uuid>,
}

impl TranscriptReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Continue an existing conversation.
    pub fn with_transcript(transcript: Transcript) -> Self {
        Self {
            transcript,
            ..Self::default()
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    /// Whether a turn is in flight.
    pub fn is_loading(&self) -> bool {
        self.state != TurnState::Idle
    }

    pub fn turn_id(&self) -> Option<Uuid> {
        self.turn_id
    }

    /// Open a turn: append the user entry and the placeholder.
    ///
    /// Rejected with [`ChatError::Busy`] while a turn is in flight and with
    /// [`ChatError::EmptyPrompt`] for blank text. A rejected send leaves the
    /// transcript untouched.
    pub fn send(&mut self, text: &str) -> Result<(), ChatError> {
        if self.is_loading() {
            tracing::debug!(turn = ?self.turn_id, "send rejected, turn in flight");
            return Err(ChatError::Busy);
        }
        if text.trim().is_empty() {
            return Err(ChatError::EmptyPrompt);
        }

        self.transcript.append_user_message(text);
        self.transcript.append_placeholder();
        self.state = TurnState::AwaitingFirstDelta;

        let turn_id = Uuid::new_v4();
        self.turn_id = Some(turn_id);
        tracing::debug!(turn = %turn_id, "turn opened");
        Ok(())
    }

    /// Merge one delta.
    ///
    /// The first delta with an unseen id replaces the placeholder, even when
    /// its text is empty. Deltas with a known id are appended to that entry.
    /// Every merged delta leaves the transcript without a placeholder.
    pub fn on_delta(&mut self, delta: &Delta) {
        if self.state == TurnState::Idle {
            tracing::warn!(id = %delta.id, "delta received with no turn in flight");
        }

        match self.transcript.find_reply_mut(&delta.id) {
            Some(reply) => {
                reply.append_token(&delta.text);
                // Providers that reuse one id across turns land here on the
                // first delta of a new turn.
                self.transcript.remove_placeholder();
            }
            None => {
                tracing::debug!(turn = ?self.turn_id, id = %delta.id, "first delta for reply");
                self.transcript
                    .replace_placeholder(Message::assistant(delta.id.clone(), delta.text.clone()));
            }
        }

        if self.state != TurnState::Idle {
            self.state = TurnState::Streaming;
        }
    }

    /// Close the turn normally. Returns whether any delta was merged.
    pub fn on_stream_end(&mut self) -> bool {
        let produced = self.state == TurnState::Streaming;
        if self.transcript.remove_placeholder() {
            tracing::debug!(turn = ?self.turn_id, "stream ended without a reply");
        }
        self.close();
        produced
    }

    /// Close the turn after a failure and return the text to show the user.
    pub fn on_error(&mut self, err: &ChatError) -> String {
        tracing::warn!(
            turn = ?self.turn_id,
            code = err.error_code(),
            category = %err.category(),
            error = %err,
            "turn failed"
        );
        self.transcript.remove_placeholder();
        self.close();
        err.user_message()
    }

    /// Abandon the turn. Merged text is kept, the placeholder is dropped.
    pub fn cancel(&mut self) {
        if self.is_loading() {
            tracing::info!(turn = ?self.turn_id, "turn cancelled");
        }
        self.transcript.remove_placeholder();
        self.close();
    }

    fn close(&mut self) {
        self.state = TurnState::Idle;
        self.turn_id = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MessageRole;

    fn contents(reconciler: &TranscriptReconciler) -> Vec<(MessageRole, Option<String>, String)> {
        reconciler
            .transcript()
            .iter()
            .map(|m| (m.role, m.response_id().map(String::from), m.content.clone()))
            .collect()
    }

    #[test]
    fn test_send_appends_user_and_placeholder() {
        let mut r = TranscriptReconciler::new();
        r.send("Hi").unwrap();

        assert_eq!(r.state(), TurnState::AwaitingFirstDelta);
        assert!(r.is_loading());
        assert!(r.turn_id().is_some());
        let msgs = r.transcript().messages();
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[0].content, "Hi");
        assert!(msgs[1].is_placeholder());
        assert_eq!(msgs[1].content, "loading...");
    }

    #[test]
    fn test_hello_there_scenario() {
        let mut r = TranscriptReconciler::new();
        r.send("Hi").unwrap();

        r.on_delta(&Delta::new("r1", "Hello"));
        assert_eq!(r.state(), TurnState::Streaming);
        assert_eq!(
            contents(&r),
            vec![
                (MessageRole::User, None, "Hi".to_string()),
                (MessageRole::Assistant, Some("r1".to_string()), "Hello".to_string()),
            ]
        );

        r.on_delta(&Delta::new("r1", " there"));
        assert_eq!(
            contents(&r)[1],
            (MessageRole::Assistant, Some("r1".to_string()), "Hello there".to_string())
        );

        assert!(r.on_stream_end());
        assert_eq!(r.state(), TurnState::Idle);
        assert_eq!(r.transcript().len(), 2);
    }

    #[test]
    fn test_concatenation_in_delivery_order() {
        let parts = ["a", "", "bc", " ", "défg", "\n", "h"];
        let mut r = TranscriptReconciler::new();
        r.send("go").unwrap();
        for part in parts {
            r.on_delta(&Delta::new("x", part));
        }
        assert_eq!(r.transcript().find_reply("x").unwrap().content, parts.concat());
    }

    #[test]
    fn test_empty_first_delta_replaces_placeholder() {
        let mut r = TranscriptReconciler::new();
        r.send("Hi").unwrap();
        r.on_delta(&Delta::new("r1", ""));

        assert!(!r.transcript().has_placeholder());
        assert_eq!(r.transcript().find_reply("r1").unwrap().content, "");
        assert_eq!(r.state(), TurnState::Streaming);
    }

    #[test]
    fn test_send_while_loading_is_rejected() {
        let mut r = TranscriptReconciler::new();
        r.send("first").unwrap();
        let before = r.transcript().clone();

        assert!(matches!(r.send("second"), Err(ChatError::Busy)));
        assert_eq!(r.transcript(), &before);

        r.on_delta(&Delta::new("r1", "x"));
        assert!(matches!(r.send("third"), Err(ChatError::Busy)));
        assert_eq!(r.transcript().len(), 2);
    }

    #[test]
    fn test_blank_prompt_rejected() {
        let mut r = TranscriptReconciler::new();
        assert!(matches!(r.send("   "), Err(ChatError::EmptyPrompt)));
        assert!(r.transcript().is_empty());
        assert!(!r.is_loading());
    }

    #[test]
    fn test_stream_end_without_deltas_removes_placeholder() {
        let mut r = TranscriptReconciler::new();
        r.send("Hi").unwrap();
        assert!(!r.on_stream_end());

        assert!(!r.transcript().has_placeholder());
        assert_eq!(r.transcript().len(), 1);
        assert_eq!(r.state(), TurnState::Idle);
        assert!(r.turn_id().is_none());
    }

    #[test]
    fn test_error_removes_placeholder_and_reports() {
        let mut r = TranscriptReconciler::new();
        r.send("Hi").unwrap();
        let shown = r.on_error(&ChatError::Network {
            status: 401,
            message: String::new(),
        });

        assert_eq!(shown, "HTTP Error! status 401");
        assert_eq!(
            contents(&r),
            vec![(MessageRole::User, None, "Hi".to_string())]
        );
        assert!(!r.is_loading());
    }

    #[test]
    fn test_error_after_partial_reply_keeps_text() {
        let mut r = TranscriptReconciler::new();
        r.send("Hi").unwrap();
        r.on_delta(&Delta::new("r1", "Hel"));
        r.on_error(&ChatError::EmptyBody);

        assert_eq!(r.transcript().find_reply("r1").unwrap().content, "Hel");
        assert_eq!(r.transcript().len(), 2);
    }

    #[test]
    fn test_loading_id_is_not_the_placeholder() {
        let mut r = TranscriptReconciler::new();
        r.send("Hi").unwrap();
        r.on_delta(&Delta::new("loading", "real text"));

        assert!(!r.transcript().has_placeholder());
        let reply = r.transcript().find_reply("loading").unwrap();
        assert_eq!(reply.content, "real text");

        r.on_delta(&Delta::new("loading", "!"));
        assert_eq!(r.transcript().find_reply("loading").unwrap().content, "real text!");
    }

    #[test]
    fn test_reentrant_across_turns() {
        let mut r = TranscriptReconciler::new();
        r.send("one").unwrap();
        r.on_delta(&Delta::new("r1", "A"));
        r.on_stream_end();

        r.send("two").unwrap();
        assert_eq!(r.transcript().len(), 4);
        r.on_delta(&Delta::new("r2", "B"));
        r.on_stream_end();

        let ids: Vec<_> = r.transcript().iter().filter_map(|m| m.response_id()).collect();
        assert_eq!(ids, vec!["r1", "r2"]);
        assert_eq!(r.transcript().render(), "You: one\nChatGPT: A\nYou: two\nChatGPT: B");
    }

    #[test]
    fn test_reused_id_across_turns_drops_placeholder() {
        let mut r = TranscriptReconciler::new();
        r.send("one").unwrap();
        r.on_delta(&Delta::new("chatcmpl-1", "A"));
        r.on_stream_end();

        r.send("two").unwrap();
        r.on_delta(&Delta::new("chatcmpl-1", "B"));

        assert_eq!(r.state(), TurnState::Streaming);
        assert!(!r.transcript().has_placeholder());
        assert_eq!(r.transcript().render(), "You: one\nChatGPT: AB\nYou: two");

        r.on_stream_end();
        assert_eq!(r.transcript().len(), 3);
    }

    #[test]
    fn test_cancel_drops_placeholder() {
        let mut r = TranscriptReconciler::new();
        r.send("Hi").unwrap();
        r.cancel();

        assert!(!r.is_loading());
        assert_eq!(r.transcript().len(), 1);
        r.send("again").unwrap();
    }

    #[test]
    fn test_delta_while_idle_is_merged_without_opening_turn() {
        let mut r = TranscriptReconciler::new();
        r.on_delta(&Delta::new("stray", "x"));
        assert_eq!(r.state(), TurnState::Idle);
        assert_eq!(r.transcript().len(), 1);
    }
}
