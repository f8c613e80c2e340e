//! Inbound stream payloads.
//!
//! Shapes follow the OpenAI-compatible chunk format served by OpenRouter.
//! Everything except `id` is optional so that partial or provider-specific
//! chunks still deserialize.

use serde::Deserialize;

/// One streamed completion chunk.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CompletionChunk {
    pub id: String,
    #[serde(default)]
    pub choices: Vec<StreamingChoice>,
    #[serde(default)]
    pub created: Option<i64>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub object: Option<String>,
    #[serde(default)]
    pub system_fingerprint: Option<String>,
    /// Sent once at the end of a stream, with an empty `choices` array
    #[serde(default)]
    pub usage: Option<Usage>,
}

impl CompletionChunk {
    /// Text fragment of the first choice, or `""`.
    ///
    /// Chat completions carry it in `delta.content`; prompt completions in
    /// `text`.
    pub fn fragment(&self) -> &str {
        self.choices
            .first()
            .and_then(|choice| {
                choice
                    .delta
                    .as_ref()
                    .and_then(|d| d.content.as_deref())
                    .or(choice.text.as_deref())
            })
            .unwrap_or("")
    }

    /// Error attached to the first choice, if any.
    pub fn choice_error(&self) -> Option<&ErrorResponse> {
        self.choices.first().and_then(|c| c.error.as_ref())
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct StreamingChoice {
    #[serde(default)]
    pub finish_reason: Option<String>,
    #[serde(default)]
    pub delta: Option<ChoiceDelta>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub error: Option<ErrorResponse>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ChoiceDelta {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct Usage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

/// Provider error object. `code` is numeric on OpenRouter but some
/// upstreams send strings, so it is kept as raw JSON.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ErrorResponse {
    #[serde(default)]
    pub code: Option<serde_json::Value>,
    pub message: String,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

impl ErrorResponse {
    /// `code` rendered as plain text.
    pub fn code_string(&self) -> Option<String> {
        self.code.as_ref().map(|code| match code {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }
}

/// Top-level `{"error": {...}}` frame.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ErrorEnvelope {
    pub error: ErrorResponse,
}
