//! Frame splitting.
//!
//! Frames are separated by a blank line. Text arrives in arbitrary pieces,
//! so [`FrameBuffer`] keeps the unterminated tail until its delimiter shows up.

/// Separator between frames.
pub const FRAME_DELIMITER: &str = "\n\n";

/// Split already-decoded text into raw frames, dropping empty segments.
///
/// Splitting a single frame yields that frame unchanged.
pub fn split_frames(text: &str) -> Vec<&str> {
    text.split(FRAME_DELIMITER)
        .filter(|segment| !segment.trim().is_empty())
        .collect()
}

/// Accumulates decoded text and emits each frame once it is terminated.
#[derive(Debug, Default)]
pub struct FrameBuffer {
    buf: String,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append text and return every frame completed by it.
    ///
    /// `\r\n` line endings are normalized first, including pairs that
    /// straddle two pushes.
    pub fn push(&mut self, text: &str) -> Vec<String> {
        self.buf.push_str(text);
        if self.buf.contains("\r\n") {
            self.buf = self.buf.replace("\r\n", "\n");
        }

        let mut frames = Vec::new();
        while let Some(pos) = self.buf.find(FRAME_DELIMITER) {
            let frame: String = self.buf.drain(..pos + FRAME_DELIMITER.len()).collect();
            let frame = &frame[..pos];
            if !frame.trim().is_empty() {
                frames.push(frame.to_string());
            }
        }
        frames
    }

    /// End of stream: return the unterminated tail, if it holds anything.
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.buf);
        if rest.trim().is_empty() {
            None
        } else {
            Some(rest)
        }
    }

    /// Text held back waiting for a delimiter.
    pub fn pending(&self) -> &str {
        &self.buf
    }
}
