//! Client configuration.
//!
//! Resolution order: built-in defaults, then the optional JSON file at
//! `~/.chatstream/config.json`, then environment variables, then CLI flags.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::models::PayloadStyle;

pub const DEFAULT_ENDPOINT: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "openai/gpt-3.5-turbo-1106";

const CONFIG_DIR: &str = ".chatstream";
const CONFIG_FILE: &str = "config.json";

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Settings for talking to the completion endpoint.
///
/// Use the builder methods to customize:
///
/// ```ignore
/// use chatstream::config::ClientConfig;
///
/// let config = ClientConfig::default()
///     .with_api_key("sk-or-...")
///     .with_model("mistralai/mistral-7b-instruct");
/// ```
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Chat-completion endpoint URL
    pub endpoint: String,
    /// Model identifier sent in every request
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub presence_penalty: f32,
    /// Whether to send a `messages` list or a flattened `prompt`
    pub payload_style: PayloadStyle,
    /// Bearer credential. Never logged.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Optional `HTTP-Referer` header (OpenRouter app attribution)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referer: Option<String>,
    /// Optional `X-Title` header (OpenRouter app attribution)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 4000,
            temperature: 0.5,
            presence_penalty: 0.6,
            payload_style: PayloadStyle::Messages,
            api_key: None,
            referer: None,
            title: None,
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .field("presence_penalty", &self.presence_penalty)
            .field("payload_style", &self.payload_style)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("referer", &self.referer)
            .field("title", &self.title)
            .finish()
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_presence_penalty(mut self, presence_penalty: f32) -> Self {
        self.presence_penalty = presence_penalty;
        self
    }

    pub fn with_payload_style(mut self, style: PayloadStyle) -> Self {
        self.payload_style = style;
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_referer(mut self, referer: impl Into<String>) -> Self {
        self.referer = Some(referer.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Default config file location, `~/.chatstream/config.json`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Load from a JSON file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from [`ClientConfig::default_path`], or defaults when there is no home directory.
    pub fn load_default() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    /// Apply `CHATSTREAM_*` environment overrides.
    ///
    /// `CHATSTREAM_API_KEY` falls back to `OPENROUTER_API_KEY`.
    pub fn apply_env(self) -> Self {
        self.apply_vars(|name| std::env::var(name).ok())
    }

    /// Defaults plus environment overrides.
    pub fn from_env() -> Self {
        Self::default().apply_env()
    }

    fn apply_vars<F>(mut self, var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| var(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = non_empty("CHATSTREAM_API_KEY").or_else(|| non_empty("OPENROUTER_API_KEY")) {
            self.api_key = Some(key);
        }
        if let Some(endpoint) = non_empty("CHATSTREAM_ENDPOINT") {
            self.endpoint = endpoint;
        }
        if let Some(model) = non_empty("CHATSTREAM_MODEL") {
            self.model = model;
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::Invalid("endpoint must not be empty".to_string()));
        }
        if self.model.trim().is_empty() {
            return Err(ConfigError::Invalid("model must not be empty".to_string()));
        }
        if self.max_tokens == 0 {
            return Err(ConfigError::Invalid("max_tokens must be positive".to_string()));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::Invalid(format!(
                "temperature {} is outside 0.0..=2.0",
                self.temperature
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.max_tokens, 4000);
        assert_eq!(config.temperature, 0.5);
        assert_eq!(config.presence_penalty, 0.6);
        assert_eq!(config.payload_style, PayloadStyle::Messages);
        assert!(config.api_key.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = ClientConfig::new()
            .with_endpoint("http://localhost:9000/v1/chat")
            .with_model("m")
            .with_api_key("k")
            .with_payload_style(PayloadStyle::Prompt)
            .with_title("chatstream");
        assert_eq!(config.endpoint, "http://localhost:9000/v1/chat");
        assert_eq!(config.model, "m");
        assert_eq!(config.api_key.as_deref(), Some("k"));
        assert_eq!(config.payload_style, PayloadStyle::Prompt);
        assert_eq!(config.title.as_deref(), Some("chatstream"));
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = ClientConfig::default().with_api_key("sk-secret");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_env_overrides() {
        let config = ClientConfig::default().apply_vars(vars(&[
            ("CHATSTREAM_API_KEY", "primary"),
            ("OPENROUTER_API_KEY", "fallback"),
            ("CHATSTREAM_MODEL", "other/model"),
        ]));
        assert_eq!(config.api_key.as_deref(), Some("primary"));
        assert_eq!(config.model, "other/model");
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_env_key_fallback_and_blank_values() {
        let config = ClientConfig::default().apply_vars(vars(&[
            ("CHATSTREAM_API_KEY", "  "),
            ("OPENROUTER_API_KEY", "fallback"),
            ("CHATSTREAM_ENDPOINT", ""),
        ]));
        assert_eq!(config.api_key.as_deref(), Some("fallback"));
        assert_eq!(config.endpoint, DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig::load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, r#"{{"model": "x/y", "payload_style": "prompt"}}"#).unwrap();

        let config = ClientConfig::load(&path).unwrap();
        assert_eq!(config.model, "x/y");
        assert_eq!(config.payload_style, PayloadStyle::Prompt);
        assert_eq!(config.max_tokens, 4000);
    }

    #[test]
    fn test_load_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = ClientConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(ClientConfig::default().with_endpoint(" ").validate().is_err());
        assert!(ClientConfig::default().with_max_tokens(0).validate().is_err());
        assert!(ClientConfig::default().with_temperature(2.5).validate().is_err());
        assert!(ClientConfig::default().with_temperature(-0.1).validate().is_err());
    }
}
