//! Outbound request and response body streaming.
//!
//! [`StreamFetcher`] posts a completion request and hands back the raw body.
//! [`frames`] turns that body into parsed frames.

use futures_util::stream::{self, Stream, StreamExt};
use std::collections::VecDeque;
use std::pin::Pin;

use crate::adapters::ReqwestHttpClient;
use crate::config::ClientConfig;
use crate::error::{ChatError, ChatResult};
use crate::models::CompletionRequest;
use crate::sse::{Frame, FrameParser};
use crate::traits::{ByteStream, Headers, HttpClient};

/// Error bodies longer than this are cut before being surfaced.
const MAX_ERROR_BODY: usize = 500;

/// Stream of parsed frames for one response.
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<Frame, ChatError>> + Send>>;

/// Posts completion requests and returns their streamed bodies.
pub struct StreamFetcher<C: HttpClient = ReqwestHttpClient> {
    client: C,
    /// Sent with every request in addition to auth and content headers
    extra_headers: Headers,
}

impl StreamFetcher<ReqwestHttpClient> {
    pub fn new() -> Self {
        Self::with_client(ReqwestHttpClient::new())
    }
}

impl Default for StreamFetcher<ReqwestHttpClient> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: HttpClient> StreamFetcher<C> {
    pub fn with_client(client: C) -> Self {
        Self {
            client,
            extra_headers: Headers::new(),
        }
    }

    /// Attribution headers taken from `config` (`HTTP-Referer`, `X-Title`).
    pub fn with_config_headers(mut self, config: &ClientConfig) -> Self {
        if let Some(referer) = &config.referer {
            self.extra_headers
                .insert("HTTP-Referer".to_string(), referer.clone());
        }
        if let Some(title) = &config.title {
            self.extra_headers.insert("X-Title".to_string(), title.clone());
        }
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.insert(name.into(), value.into());
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// POST `request` to `endpoint` and return the raw response body.
    ///
    /// Fails with [`ChatError::Network`] on a non-success status and with
    /// [`ChatError::EmptyBody`] when the response carries no body. Nothing is
    /// retried.
    pub async fn fetch(
        &self,
        endpoint: &str,
        credential: &str,
        request: &CompletionRequest,
    ) -> ChatResult<ByteStream> {
        let body = serde_json::to_string(request).map_err(|e| ChatError::Encode(e.to_string()))?;

        let mut headers = self.extra_headers.clone();
        headers.insert("Authorization".to_string(), format!("Bearer {}", credential));
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        headers.insert("Accept".to_string(), "text/event-stream".to_string());

        tracing::debug!(endpoint, model = %request.model, "posting completion request");
        let response = self.client.post_stream(endpoint, &body, &headers).await?;

        if !response.is_success() {
            let status = response.status;
            let message = match response.body {
                Some(body) => read_error_body(body).await,
                None => String::new(),
            };
            tracing::warn!(status, %message, "completion request failed");
            return Err(ChatError::Network { status, message });
        }

        response.body.ok_or_else(|| {
            tracing::warn!(status = response.status, "completion response has no body");
            ChatError::EmptyBody
        })
    }

    /// [`StreamFetcher::fetch`] followed by [`frames`].
    pub async fn stream_frames(
        &self,
        endpoint: &str,
        credential: &str,
        request: &CompletionRequest,
    ) -> ChatResult<FrameStream> {
        let body = self.fetch(endpoint, credential, request).await?;
        Ok(frames(body))
    }
}

/// Collect an error body as text, capped at [`MAX_ERROR_BODY`] characters.
async fn read_error_body(mut body: ByteStream) -> String {
    let mut raw = Vec::new();
    while let Some(chunk) = body.next().await {
        match chunk {
            Ok(bytes) => {
                raw.extend_from_slice(&bytes);
                if raw.len() > MAX_ERROR_BODY * 4 {
                    break;
                }
            }
            Err(_) => break,
        }
    }
    let text = String::from_utf8_lossy(&raw);
    let text = text.trim();
    match text.char_indices().nth(MAX_ERROR_BODY) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

struct FrameState {
    body: ByteStream,
    parser: FrameParser,
    ready: VecDeque<Frame>,
    finished: bool,
}

/// Parse a response body into frames.
///
/// The stream is lazy and pulls one chunk at a time. It ends after the body
/// ends or after the first transport error, which is yielded as
/// [`ChatError::Transport`]. Malformed frames never appear in it.
pub fn frames(body: ByteStream) -> FrameStream {
    let state = FrameState {
        body,
        parser: FrameParser::new(),
        ready: VecDeque::new(),
        finished: false,
    };

    let stream = stream::unfold(state, |mut state| async move {
        loop {
            if let Some(frame) = state.ready.pop_front() {
                return Some((Ok(frame), state));
            }
            if state.finished {
                return None;
            }

            match state.body.next().await {
                Some(Ok(chunk)) => {
                    let parsed = state.parser.feed(&chunk);
                    state.ready.extend(parsed);
                }
                Some(Err(e)) => {
                    tracing::warn!(error = %e, "response body failed mid-stream");
                    state.finished = true;
                    state.ready.clear();
                    return Some((Err(ChatError::Transport(e)), state));
                }
                None => {
                    state.finished = true;
                    let parsed = state.parser.finish();
                    state.ready.extend(parsed);
                    if state.parser.discarded() > 0 {
                        tracing::debug!(discarded = state.parser.discarded(), "frames discarded");
                    }
                }
            }
        }
    });

    Box::pin(stream)
}
