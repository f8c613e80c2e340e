//! Test doubles for the trait abstractions.
//!
//! - [`MockHttpClient`] - scripted status codes and chunked bodies

pub mod http;

pub use http::{MockHttpClient, MockResponse, RecordedRequest};
