use serde::{Deserialize, Serialize};

use super::message::{Message, MessageRole};
use crate::config::ClientConfig;

/// How conversation context is sent to the endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadStyle {
    /// Structured `messages` list (chat completions)
    #[default]
    Messages,
    /// Single flattened `prompt` string (text completions)
    Prompt,
}

/// A conversation entry as sent to the endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RequestMessage {
    pub role: MessageRole,
    pub content: String,
}

/// Conversation context, serialized as either `"messages": [...]` or
/// `"prompt": "..."`.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Payload {
    Messages(Vec<RequestMessage>),
    Prompt(String),
}

impl Payload {
    /// Build the payload from transcript entries. Placeholders are never sent.
    pub fn from_transcript<'a, I>(messages: I, style: PayloadStyle) -> Self
    where
        I: IntoIterator<Item = &'a Message>,
    {
        let context = messages
            .into_iter()
            .filter(|m| !m.is_placeholder())
            .map(|m| RequestMessage {
                role: m.role,
                content: m.content.clone(),
            });

        match style {
            PayloadStyle::Messages => Payload::Messages(context.collect()),
            PayloadStyle::Prompt => Payload::Prompt(
                context
                    .map(|m| {
                        let role = match m.role {
                            MessageRole::User => "user",
                            MessageRole::Assistant => "assistant",
                        };
                        format!("{}: {}", role, m.content)
                    })
                    .collect::<Vec<_>>()
                    .join("\n"),
            ),
        }
    }
}

/// Body of the outbound completion request.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub presence_penalty: f32,
    pub stream: bool,
    #[serde(flatten)]
    pub payload: Payload,
}

impl CompletionRequest {
    /// Streaming request using the model and sampling parameters from `config`.
    pub fn new(config: &ClientConfig, payload: Payload) -> Self {
        Self {
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            presence_penalty: config.presence_penalty,
            stream: true,
            payload,
        }
    }
}
