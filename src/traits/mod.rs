//! Trait abstractions for dependency injection and testability.
//!
//! - [`HttpClient`] - the single streaming POST the fetcher performs

pub mod http;

pub use http::{ByteStream, Headers, HttpClient, HttpError, StreamingResponse};
