//! Streamed completion parsing.
//!
//! The response body is a sequence of frames separated by a blank line:
//! - `data: <json>` - a completion chunk
//! - `data: [DONE]` - end of stream
//! - Lines starting with `:` - keep-alive comments (ignored)
//!
//! # Module structure
//! - `decoder` - Incremental UTF-8 decoding across chunk boundaries
//! - `frames` - Splitting decoded text into frames
//! - `parser` - Turning frames into deltas (FrameParser, parse_frame)

mod decoder;
mod frames;
mod parser;

pub use decoder::Utf8Decoder;
pub use frames::{split_frames, FrameBuffer, FRAME_DELIMITER};
pub use parser::{classify_frame, parse_frame, Frame, FrameParser, DATA_PREFIX, DONE_SENTINEL};
