//! Frame- and byte-level errors.
//!
//! These are absorbed where they occur: a bad frame is dropped, a bad byte
//! sequence is skipped. They exist so the dropping site can log what it
//! dropped.

use thiserror::Error;

/// Why a single frame produced no event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameParseError {
    /// Nothing left after removing the data marker, or a comment-only frame.
    #[error("frame has no payload")]
    Empty,

    /// Payload is not JSON.
    #[error("frame payload is not valid JSON: {0}")]
    InvalidJson(String),

    /// Payload is JSON but not a completion chunk (e.g. no `id`).
    #[error("frame payload has unexpected shape: {0}")]
    InvalidShape(String),
}

/// An invalid UTF-8 sequence that was skipped while decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("skipped {len} byte(s) of invalid UTF-8")]
pub struct DecodeError {
    pub len: usize,
}
