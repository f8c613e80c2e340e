//! Coarse classification of chat errors.
//!
//! Categories drive the hint shown next to a failed turn and tell callers
//! whether resending the same prompt has any chance of succeeding.

use std::fmt;

/// High-level bucket a [`ChatError`](super::ChatError) falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Transport failures: connect, TLS, dropped stream.
    Network,

    /// The completion endpoint rejected the credential (401/403).
    Auth,

    /// The endpoint or an upstream provider failed (5xx, in-stream error objects).
    Server,

    /// Request rejected as malformed (other 4xx).
    Client,

    /// Something the user can fix at the prompt: empty input, busy session, cancel.
    User,

    /// Missing or invalid configuration.
    Configuration,
}

impl ErrorCategory {
    /// Whether resending the same turn may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorCategory::Network | ErrorCategory::Server)
    }

    /// Short label for log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Network => "network",
            ErrorCategory::Auth => "auth",
            ErrorCategory::Server => "server",
            ErrorCategory::Client => "client",
            ErrorCategory::User => "user",
            ErrorCategory::Configuration => "configuration",
        }
    }

    /// Suggested next step for the person at the keyboard.
    pub fn recovery_hint(&self) -> &'static str {
        match self {
            ErrorCategory::Network => "Check your internet connection and try again",
            ErrorCategory::Auth => "Check that your API key is valid",
            ErrorCategory::Server => "The provider may be overloaded. Try again in a moment",
            ErrorCategory::Client => "The request was rejected. Check the model and endpoint settings",
            ErrorCategory::User => "Adjust your input and send again",
            ErrorCategory::Configuration => "Check your configuration file and environment",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_retryable() {
        assert!(ErrorCategory::Network.is_retryable());
        assert!(ErrorCategory::Server.is_retryable());
        assert!(!ErrorCategory::Auth.is_retryable());
        assert!(!ErrorCategory::Client.is_retryable());
        assert!(!ErrorCategory::User.is_retryable());
        assert!(!ErrorCategory::Configuration.is_retryable());
    }

    #[test]
    fn test_category_display() {
        assert_eq!(format!("{}", ErrorCategory::Network), "network");
        assert_eq!(format!("{}", ErrorCategory::Configuration), "configuration");
    }

    #[test]
    fn test_recovery_hint_mentions_key_for_auth() {
        assert!(ErrorCategory::Auth.recovery_hint().contains("API key"));
    }
}
