//! CLI module for chatstream.
//!
//! This module provides command-line interface functionality including:
//! - Argument parsing
//! - Version and usage display
//! - The interactive chat loop
//!
//! # Usage
//!
//! ```ignore
//! use chatstream::cli::{parse_args, run_cli_command, CliCommand};
//!
//! let command = parse_args(std::env::args());
//! if let Some(result) = run_cli_command(&command) {
//!     std::process::exit(if result.is_ok() { 0 } else { 2 });
//! }
//! // CliCommand::Chat, start a session
//! ```

pub mod args;
pub mod chat;
pub mod version;

pub use args::{parse_args, ChatArgs, CliCommand, USAGE};
pub use chat::{run_repl, run_turn, Terminal};
pub use version::{version_line, VERSION};

use color_eyre::eyre::eyre;
use color_eyre::Result;

use crate::config::{ClientConfig, ConfigError};

/// Run a CLI command that needs no session.
///
/// # Returns
///
/// * `None` - If the command is `Chat` (a session is needed)
/// * `Some(Ok(()))` - If the command printed its output
/// * `Some(Err(e))` - If the arguments were unusable
pub fn run_cli_command(command: &CliCommand) -> Option<Result<()>> {
    match command {
        CliCommand::Version => {
            println!("{}", version_line());
            Some(Ok(()))
        }
        CliCommand::Help => {
            println!("{}", USAGE);
            Some(Ok(()))
        }
        CliCommand::Invalid(reason) => Some(Err(eyre!("{}\n\n{}", reason, USAGE))),
        CliCommand::Chat(_) => None,
    }
}

/// Resolve the configuration for a chat run.
///
/// File (from `--config` or the default location), then environment, then
/// flags.
pub fn resolve_config(args: &ChatArgs) -> Result<ClientConfig, ConfigError> {
    let config = match &args.config {
        Some(path) => ClientConfig::load(path)?,
        None => ClientConfig::load_default()?,
    };
    let config = args.apply(config.apply_env());
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_returns_none() {
        assert!(run_cli_command(&CliCommand::Chat(ChatArgs::default())).is_none());
    }

    #[test]
    fn test_invalid_is_error() {
        let result = run_cli_command(&CliCommand::Invalid("bad".to_string()));
        assert!(matches!(result, Some(Err(_))));
    }

    #[test]
    fn test_resolve_config_from_file_and_flags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"model": "from/file", "max_tokens": 99}"#).unwrap();

        let args = ChatArgs {
            config: Some(path),
            endpoint: Some("http://localhost:8080/chat".to_string()),
            ..ChatArgs::default()
        };
        let config = resolve_config(&args).unwrap();
        assert_eq!(config.max_tokens, 99);
        assert_eq!(config.endpoint, "http://localhost:8080/chat");
    }

    #[test]
    fn test_resolve_config_rejects_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"max_tokens": 0}"#).unwrap();

        let args = ChatArgs {
            config: Some(path),
            ..ChatArgs::default()
        };
        assert!(matches!(resolve_config(&args), Err(ConfigError::Invalid(_))));
    }
}
