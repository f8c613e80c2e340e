//! Scripted HTTP client for tests.
//!
//! Responses are cut into explicit chunks so tests control exactly where
//! byte and frame boundaries fall.

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::traits::{ByteStream, Headers, HttpClient, HttpError, StreamingResponse};

/// A recorded request for verification in tests.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub url: String,
    pub headers: Headers,
    pub body: String,
}

impl RecordedRequest {
    /// Parse the recorded body as JSON.
    pub fn json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

/// Scripted outcome of one `post_stream` call.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Status plus a body delivered as the given chunks
    Stream { status: u16, chunks: Vec<Bytes> },
    /// Status with no body at all
    NoBody { status: u16 },
    /// Chunks followed by a mid-stream transport failure
    StreamThenError {
        status: u16,
        chunks: Vec<Bytes>,
        error: HttpError,
    },
    /// Chunks after which the body never yields again
    StreamThenPending { status: u16, chunks: Vec<Bytes> },
    /// The request itself fails
    Error(HttpError),
}

impl MockResponse {
    /// A 200 response whose body arrives as the given text chunks.
    pub fn chunks<I, S>(chunks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Bytes>,
    {
        MockResponse::Stream {
            status: 200,
            chunks: chunks.into_iter().map(Into::into).collect(),
        }
    }

    /// A response with the given status and a short plain-text body.
    pub fn status(status: u16, body: &str) -> Self {
        MockResponse::Stream {
            status,
            chunks: vec![Bytes::from(body.to_string())],
        }
    }
}

/// Mock HTTP client.
///
/// ```ignore
/// let client = MockHttpClient::new();
/// client.set_response(URL, MockResponse::chunks(["data: {\"id\":\"r1\"}\n\n"]));
/// let response = client.post_stream(URL, "{}", &Headers::new()).await?;
/// assert_eq!(client.get_requests().len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockHttpClient {
    responses: Arc<Mutex<HashMap<String, MockResponse>>>,
    default_response: Arc<Mutex<Option<MockResponse>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the response for an exact URL.
    pub fn set_response(&self, url: &str, response: MockResponse) {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(url.to_string(), response);
    }

    /// Set the response used for URLs without a specific entry.
    pub fn set_default_response(&self, response: MockResponse) {
        *self
            .default_response
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(response);
    }

    pub fn get_requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn clear_requests(&self) {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn lookup(&self, url: &str) -> Option<MockResponse> {
        let responses = self.responses.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(response) = responses.get(url) {
            return Some(response.clone());
        }
        self.default_response
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

fn chunk_stream(chunks: Vec<Bytes>, tail: Option<HttpError>) -> ByteStream {
    let items = chunks
        .into_iter()
        .map(Ok)
        .chain(tail.into_iter().map(Err))
        .collect::<Vec<_>>();
    Box::pin(futures::stream::iter(items))
}

fn stalled_stream(chunks: Vec<Bytes>) -> ByteStream {
    let items = chunks.into_iter().map(Ok).collect::<Vec<_>>();
    Box::pin(futures::stream::iter(items).chain(futures::stream::pending()))
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn post_stream(
        &self,
        url: &str,
        body: &str,
        headers: &Headers,
    ) -> Result<StreamingResponse, HttpError> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedRequest {
                url: url.to_string(),
                headers: headers.clone(),
                body: body.to_string(),
            });

        match self.lookup(url) {
            Some(MockResponse::Stream { status, chunks }) => {
                Ok(StreamingResponse::new(status, chunk_stream(chunks, None)))
            }
            Some(MockResponse::NoBody { status }) => Ok(StreamingResponse::without_body(status)),
            Some(MockResponse::StreamThenError {
                status,
                chunks,
                error,
            }) => Ok(StreamingResponse::new(
                status,
                chunk_stream(chunks, Some(error)),
            )),
            Some(MockResponse::StreamThenPending { status, chunks }) => {
                Ok(StreamingResponse::new(status, stalled_stream(chunks)))
            }
            Some(MockResponse::Error(err)) => Err(err),
            None => Err(HttpError::ConnectionFailed(format!(
                "no mock response for {}",
                url
            ))),
        }
    }
}
