//! HTTP client trait abstraction.
//!
//! The fetcher only ever needs one call: POST a JSON body and get back a
//! status plus a lazily-read byte stream. Keeping that behind a trait lets
//! tests feed hand-cut chunk sequences without a network.

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::collections::HashMap;
use std::fmt;
use std::pin::Pin;

/// HTTP headers represented as a key-value map.
pub type Headers = HashMap<String, String>;

/// Lazy, finite, non-restartable body stream.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, HttpError>> + Send>>;

/// Response whose body has not been read yet.
pub struct StreamingResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: Headers,
    /// Body stream, `None` when the server sent no body at all
    pub body: Option<ByteStream>,
}

impl StreamingResponse {
    pub fn new(status: u16, body: ByteStream) -> Self {
        Self {
            status,
            headers: Headers::new(),
            body: Some(body),
        }
    }

    /// A response that carries no body.
    pub fn without_body(status: u16) -> Self {
        Self {
            status,
            headers: Headers::new(),
            body: None,
        }
    }

    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = headers;
        self
    }

    /// Check if the response indicates success (2xx status).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl fmt::Debug for StreamingResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamingResponse")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("has_body", &self.body.is_some())
            .finish()
    }
}

/// HTTP client errors.
#[derive(Debug, Clone, PartialEq)]
pub enum HttpError {
    /// Connection failed
    ConnectionFailed(String),
    /// Request timeout
    Timeout(String),
    /// Reading the body failed part way through
    Io(String),
    /// Invalid URL
    InvalidUrl(String),
    /// Other error
    Other(String),
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpError::ConnectionFailed(msg) => write!(f, "Connection failed: {}", msg),
            HttpError::Timeout(msg) => write!(f, "Request timeout: {}", msg),
            HttpError::Io(msg) => write!(f, "IO error: {}", msg),
            HttpError::InvalidUrl(msg) => write!(f, "Invalid URL: {}", msg),
            HttpError::Other(msg) => write!(f, "HTTP error: {}", msg),
        }
    }
}

impl std::error::Error for HttpError {}

/// Trait for the outbound streaming call.
///
/// Implementations must not interpret the status code: a 401 is returned as
/// an `Ok(StreamingResponse)` with `status == 401`. Only transport-level
/// failures map to `Err`.
///
/// # Example
///
/// ```ignore
/// use chatstream::traits::{HttpClient, Headers};
///
/// async fn probe<C: HttpClient>(client: &C) -> bool {
///     match client.post_stream("https://example.com", "{}", &Headers::new()).await {
///         Ok(response) => response.is_success(),
///         Err(_) => false,
///     }
/// }
/// ```
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// POST `body` to `url` and return the status with an unread body stream.
    async fn post_stream(
        &self,
        url: &str,
        body: &str,
        headers: &Headers,
    ) -> Result<StreamingResponse, HttpError>;
}
