//! Common test utilities for integration tests.
//!
//! Builders for stream bodies and sessions pointed at a mock endpoint.

#![allow(dead_code)]

use chatstream::adapters::ReqwestHttpClient;
use chatstream::{ChatSession, ClientConfig};

pub const TEST_KEY: &str = "sk-test-key-12345";
pub const COMPLETIONS_PATH: &str = "/api/v1/chat/completions";

/// One `data:` frame carrying a chat completion chunk.
pub fn sse_frame(id: &str, content: &str) -> String {
    format!(
        "data: {}\n\n",
        serde_json::json!({
            "id": id,
            "choices": [{"delta": {"content": content}, "finish_reason": null}],
            "created": 1700000000,
            "model": "openai/gpt-3.5-turbo-1106",
            "object": "chat.completion.chunk"
        })
    )
}

/// Frame with `content: null` and a finish reason.
pub fn sse_finish(id: &str) -> String {
    format!(
        "data: {}\n\n",
        serde_json::json!({
            "id": id,
            "choices": [{"delta": {"content": null}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 3, "completion_tokens": 2, "total_tokens": 5}
        })
    )
}

pub const SSE_DONE: &str = "data: [DONE]\n\n";

pub const KEEP_ALIVE: &str = ": OPENROUTER PROCESSING\n\n";

/// Full stream body for a reply made of `parts`, ending with `[DONE]`.
pub fn sse_body(id: &str, parts: &[&str]) -> String {
    let mut body = String::from(KEEP_ALIVE);
    for part in parts {
        body.push_str(&sse_frame(id, part));
    }
    body.push_str(&sse_finish(id));
    body.push_str(SSE_DONE);
    body
}

pub fn test_config(base_uri: &str) -> ClientConfig {
    ClientConfig::default()
        .with_endpoint(format!("{}{}", base_uri, COMPLETIONS_PATH))
        .with_api_key(TEST_KEY)
}

/// Session over a real HTTP client aimed at `base_uri`.
pub fn test_session(base_uri: &str) -> ChatSession<ReqwestHttpClient> {
    ChatSession::new(test_config(base_uri), ReqwestHttpClient::new())
}
