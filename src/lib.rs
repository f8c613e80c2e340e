//! chatstream - streaming chat-completion client
//!
//! Posts a conversation to an OpenAI-compatible endpoint, parses the
//! streamed reply frame by frame, and merges the fragments into a transcript
//! as they arrive.
//!
//! This library exposes modules for use in integration tests and the binary.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod models;
pub mod session;
pub mod sse;
pub mod traits;
pub mod transcript;

pub use config::ClientConfig;
pub use error::{ChatError, ChatResult};
pub use fetcher::StreamFetcher;
pub use session::{ChatSession, TurnSummary};
pub use transcript::{Transcript, TranscriptReconciler, TurnState};
