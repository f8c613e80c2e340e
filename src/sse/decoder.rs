//! Incremental UTF-8 decoding.
//!
//! Network chunks split wherever they like, including inside a multi-byte
//! character. The decoder holds back an incomplete trailing sequence until
//! the next chunk completes it.

use crate::error::DecodeError;

/// Stateful UTF-8 decoder carried across chunks of one stream.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    /// Incomplete trailing sequence from the previous chunk (at most 3 bytes)
    pending: Vec<u8>,
    /// Bytes dropped as invalid so far
    skipped: usize,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode `chunk`, returning all text that is complete so far.
    ///
    /// Invalid sequences are skipped and logged. An incomplete sequence at the
    /// end of the chunk is held until the next call.
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        let mut bytes = std::mem::take(&mut self.pending);
        bytes.extend_from_slice(chunk);

        let mut out = String::with_capacity(bytes.len());
        let mut rest: &[u8] = &bytes;

        loop {
            match std::str::from_utf8(rest) {
                Ok(text) => {
                    out.push_str(text);
                    break;
                }
                Err(e) => {
                    let (valid, tail) = rest.split_at(e.valid_up_to());
                    if let Ok(text) = std::str::from_utf8(valid) {
                        out.push_str(text);
                    }
                    match e.error_len() {
                        Some(len) => {
                            self.record_skip(DecodeError { len });
                            rest = &tail[len..];
                        }
                        None => {
                            self.pending = tail.to_vec();
                            break;
                        }
                    }
                }
            }
        }

        out
    }

    /// End of stream: any held-back bytes can never complete.
    pub fn finish(&mut self) -> Option<DecodeError> {
        if self.pending.is_empty() {
            return None;
        }
        let err = DecodeError {
            len: self.pending.len(),
        };
        self.pending.clear();
        self.record_skip(err);
        Some(err)
    }

    /// Number of bytes dropped as invalid.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Whether an incomplete sequence is being held back.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    fn record_skip(&mut self, err: DecodeError) {
        self.skipped += err.len;
        tracing::debug!(error = %err, "skipping invalid UTF-8");
    }
}
