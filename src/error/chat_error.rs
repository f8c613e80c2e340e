//! Turn-level error type.
//!
//! Only failures that end a turn live here. Per-frame problems are modelled
//! separately in [`super::frame`] and never reach the caller.

use thiserror::Error;

use super::category::ErrorCategory;
use crate::traits::HttpError;

/// Error surfaced to the caller when a send operation fails.
///
/// Every variant is terminal for the current turn. None of them are retried
/// automatically; [`ChatError::is_retryable`] is a hint for the UI only.
#[derive(Debug, Clone, Error)]
pub enum ChatError {
    /// The completion endpoint answered with a non-success status.
    #[error("HTTP Error! status {status}")]
    Network { status: u16, message: String },

    /// The endpoint answered successfully but without a stream body.
    #[error("No answer!")]
    EmptyBody,

    /// The connection failed or the body stream broke mid-read.
    #[error("transport error: {0}")]
    Transport(#[from] HttpError),

    /// The provider reported an error object inside the stream.
    #[error("upstream error: {message}")]
    Upstream { code: Option<String>, message: String },

    /// The request body could not be encoded.
    #[error("failed to encode request: {0}")]
    Encode(String),

    /// A reply is still streaming for this session.
    #[error("a reply is still in progress")]
    Busy,

    /// Nothing to send.
    #[error("prompt is empty")]
    EmptyPrompt,

    /// No API key is configured.
    #[error("no API key configured")]
    MissingCredential,

    /// The turn was cancelled before the stream finished.
    #[error("request cancelled")]
    Cancelled,
}

impl ChatError {
    /// HTTP status for [`ChatError::Network`], `None` otherwise.
    pub fn status(&self) -> Option<u16> {
        match self {
            ChatError::Network { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            ChatError::Network { status, .. } => match *status {
                401 | 403 => ErrorCategory::Auth,
                408 | 429 => ErrorCategory::Network,
                s if s >= 500 => ErrorCategory::Server,
                _ => ErrorCategory::Client,
            },
            ChatError::EmptyBody | ChatError::Upstream { .. } => ErrorCategory::Server,
            ChatError::Transport(_) => ErrorCategory::Network,
            ChatError::Encode(_) => ErrorCategory::Client,
            ChatError::Busy | ChatError::EmptyPrompt | ChatError::Cancelled => ErrorCategory::User,
            ChatError::MissingCredential => ErrorCategory::Configuration,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }

    /// Text for the transient notification shown when a turn fails.
    pub fn user_message(&self) -> String {
        match self {
            ChatError::Network { .. } | ChatError::EmptyBody => self.to_string(),
            ChatError::Transport(err) => format!("Connection problem: {}", err),
            ChatError::Upstream { code: Some(code), message } => {
                format!("Provider error ({}): {}", code, message)
            }
            ChatError::Upstream { code: None, message } => format!("Provider error: {}", message),
            ChatError::Encode(_) => "Could not build the request.".to_string(),
            ChatError::Busy => "Please wait for the current reply to finish.".to_string(),
            ChatError::EmptyPrompt => "Type a message first.".to_string(),
            ChatError::MissingCredential => "Set an API key before sending.".to_string(),
            ChatError::Cancelled => "Reply cancelled.".to_string(),
        }
    }

    /// Short code for log lines.
    pub fn error_code(&self) -> &'static str {
        match self {
            ChatError::Network { .. } => "E_NET_HTTP",
            ChatError::EmptyBody => "E_EMPTY_BODY",
            ChatError::Transport(_) => "E_TRANSPORT",
            ChatError::Upstream { .. } => "E_UPSTREAM",
            ChatError::Encode(_) => "E_ENCODE",
            ChatError::Busy => "E_BUSY",
            ChatError::EmptyPrompt => "E_EMPTY_PROMPT",
            ChatError::MissingCredential => "E_NO_KEY",
            ChatError::Cancelled => "E_CANCELLED",
        }
    }
}
