//! Per-frame parsing.
//!
//! Parsing is best effort. Keep-alive comments, control frames and anything
//! that is not a completion chunk produce no delta and never abort the
//! stream.

use crate::error::FrameParseError;
use crate::models::{CompletionChunk, Delta, ErrorEnvelope};

use super::decoder::Utf8Decoder;
use super::frames::FrameBuffer;

/// Marker in front of each payload line.
pub const DATA_PREFIX: &str = "data:";

/// Payload that ends the stream.
pub const DONE_SENTINEL: &str = "[DONE]";

/// What one frame turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A reply fragment
    Delta(Delta),
    /// End-of-stream sentinel
    Done,
    /// Error object reported inside the stream
    Error {
        code: Option<String>,
        message: String,
    },
}

/// Extract the payload of a raw frame.
///
/// Payload lines carry the data marker (one optional space after it is
/// removed). Comment lines start with `:`. Other field lines (`event:`,
/// `id:`, `retry:`) are ignored. A frame with no data marker at all is
/// taken as its own payload.
fn frame_payload(raw: &str) -> String {
    let mut data = Vec::new();
    let mut bare = Vec::new();

    for line in raw.lines() {
        let line = line.trim_end_matches('\r');
        if line.starts_with(':') {
            continue;
        }
        if let Some(rest) = line.strip_prefix(DATA_PREFIX) {
            data.push(rest.strip_prefix(' ').unwrap_or(rest));
            continue;
        }
        if line.starts_with("event:") || line.starts_with("id:") || line.starts_with("retry:") {
            continue;
        }
        bare.push(line);
    }

    let lines = if data.is_empty() { bare } else { data };
    lines.join("\n").trim().to_string()
}

/// Classify a raw frame.
pub fn classify_frame(raw: &str) -> Result<Frame, FrameParseError> {
    let payload = frame_payload(raw);
    if payload.is_empty() {
        return Err(FrameParseError::Empty);
    }
    if payload == DONE_SENTINEL {
        return Ok(Frame::Done);
    }

    let value: serde_json::Value = serde_json::from_str(&payload)
        .map_err(|e| FrameParseError::InvalidJson(e.to_string()))?;

    if value.get("error").is_some() {
        let envelope: ErrorEnvelope = serde_json::from_value(value)
            .map_err(|e| FrameParseError::InvalidShape(e.to_string()))?;
        return Ok(Frame::Error {
            code: envelope.error.code_string(),
            message: envelope.error.message,
        });
    }

    let chunk: CompletionChunk =
        serde_json::from_value(value).map_err(|e| FrameParseError::InvalidShape(e.to_string()))?;

    if let Some(err) = chunk.choice_error() {
        return Ok(Frame::Error {
            code: err.code_string(),
            message: err.message.clone(),
        });
    }

    Ok(Frame::Delta(Delta::new(chunk.id.clone(), chunk.fragment())))
}

/// Parse a raw frame into a delta, discarding anything else.
pub fn parse_frame(raw: &str) -> Option<Delta> {
    match classify_frame(raw) {
        Ok(Frame::Delta(delta)) => Some(delta),
        Ok(_) => None,
        Err(e) => {
            tracing::debug!(error = %e, "discarding frame");
            None
        }
    }
}

/// Bytes in, frames out.
///
/// Carries decoder and framing state across chunks of one response body.
/// Frames that fail to parse are logged at debug level and dropped.
#[derive(Debug, Default)]
pub struct FrameParser {
    decoder: Utf8Decoder,
    buffer: FrameBuffer,
    discarded: usize,
}

impl FrameParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one network chunk.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<Frame> {
        let text = self.decoder.decode(chunk);
        let raw = self.buffer.push(&text);
        self.classify_all(raw)
    }

    /// End of body: flush held-back bytes and any unterminated frame.
    pub fn finish(&mut self) -> Vec<Frame> {
        // A truncated character can only be dropped; the decoder logs it.
        let _ = self.decoder.finish();
        let raw: Vec<String> = self.buffer.finish().into_iter().collect();
        self.classify_all(raw)
    }

    /// Frames dropped so far.
    pub fn discarded(&self) -> usize {
        self.discarded
    }

    fn classify_all(&mut self, raw: Vec<String>) -> Vec<Frame> {
        let mut frames = Vec::with_capacity(raw.len());
        for frame in raw {
            match classify_frame(&frame) {
                Ok(parsed) => frames.push(parsed),
                Err(e) => {
                    self.discarded += 1;
                    tracing::debug!(error = %e, "discarding frame");
                }
            }
        }
        frames
    }
}
