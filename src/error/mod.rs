//! Error handling for chatstream.
//!
//! Two tiers:
//!
//! - **Turn errors** ([`ChatError`]): network status, empty body, broken
//!   transport, provider error objects, busy/cancelled sessions. These end the
//!   current turn and are surfaced to the caller with a user-facing message.
//! - **Frame errors** ([`FrameParseError`], [`DecodeError`]): malformed frames
//!   and invalid byte sequences. These are logged at `debug` and dropped;
//!   keep-alive and control frames are expected noise.
//!
//! | Category | Example | Retryable |
//! |----------|---------|-----------|
//! | Network | connect refused, 429 | Yes |
//! | Auth | 401, 403 | No |
//! | Server | 5xx, empty body, in-stream error | Yes |
//! | Client | other 4xx | No |
//! | User | busy, empty prompt, cancelled | No |
//! | Configuration | missing API key | No |

mod category;
mod chat_error;
mod frame;

pub use category::ErrorCategory;
pub use chat_error::ChatError;
pub use frame::{DecodeError, FrameParseError};

/// Result alias for turn-level operations.
pub type ChatResult<T> = Result<T, ChatError>;
