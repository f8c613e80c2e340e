//! Command-line argument parsing for chatstream.
//!
//! This module handles parsing command-line arguments and determining
//! which CLI command to execute.

use std::path::PathBuf;

use crate::config::ClientConfig;
use crate::models::PayloadStyle;

/// Options for a chat run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatArgs {
    /// `--model <id>`
    pub model: Option<String>,
    /// `--endpoint <url>`
    pub endpoint: Option<String>,
    /// `--config <path>`, replaces `~/.chatstream/config.json`
    pub config: Option<PathBuf>,
    /// `--prompt-style`: send a flattened prompt instead of a message list
    pub prompt_style: bool,
    /// Positional words. When present the prompt is sent once and the
    /// program exits.
    pub prompt: Option<String>,
}

impl ChatArgs {
    /// Overlay the flags on a loaded configuration.
    pub fn apply(&self, mut config: ClientConfig) -> ClientConfig {
        if let Some(model) = &self.model {
            config.model = model.clone();
        }
        if let Some(endpoint) = &self.endpoint {
            config.endpoint = endpoint.clone();
        }
        if self.prompt_style {
            config.payload_style = PayloadStyle::Prompt;
        }
        config
    }
}

/// Parsed CLI command to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum CliCommand {
    /// Show version information
    Version,
    /// Show usage
    Help,
    /// Chat interactively, or send a single prompt
    Chat(ChatArgs),
    /// Unusable arguments, with the reason
    Invalid(String),
}

/// Parse command-line arguments and return the appropriate command.
///
/// # Examples
///
/// ```
/// use chatstream::cli::args::{parse_args, CliCommand};
///
/// let args = vec!["chatstream".to_string(), "--version".to_string()];
/// assert_eq!(parse_args(args.into_iter()), CliCommand::Version);
/// ```
pub fn parse_args<I>(args: I) -> CliCommand
where
    I: Iterator<Item = String>,
{
    let mut chat = ChatArgs::default();
    let mut words = Vec::new();
    // Skip the program name
    let mut args = args.skip(1);

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--version" | "-V" => return CliCommand::Version,
            "--help" | "-h" => return CliCommand::Help,
            "--model" | "-m" => match args.next() {
                Some(value) => chat.model = Some(value),
                None => return CliCommand::Invalid(format!("{} needs a value", arg)),
            },
            "--endpoint" => match args.next() {
                Some(value) => chat.endpoint = Some(value),
                None => return CliCommand::Invalid(format!("{} needs a value", arg)),
            },
            "--config" | "-c" => match args.next() {
                Some(value) => chat.config = Some(PathBuf::from(value)),
                None => return CliCommand::Invalid(format!("{} needs a value", arg)),
            },
            "--prompt-style" => chat.prompt_style = true,
            "--" => {
                words.extend(args.by_ref());
            }
            flag if flag.starts_with('-') && flag.len() > 1 => {
                return CliCommand::Invalid(format!("unknown option {}", flag));
            }
            _ => words.push(arg),
        }
    }

    if !words.is_empty() {
        chat.prompt = Some(words.join(" "));
    }
    CliCommand::Chat(chat)
}

/// Usage text for `--help`.
pub const USAGE: &str = "\
Usage: chatstream [OPTIONS] [PROMPT...]

Streams chat completions to the terminal. With a PROMPT, sends it once and
exits; otherwise starts an interactive session (type /quit to leave).
Ctrl-C cancels a reply in progress; at the prompt it ends the session.

Options:
  -m, --model <ID>       Model identifier
      --endpoint <URL>   Chat-completion endpoint
  -c, --config <PATH>    Config file (default ~/.chatstream/config.json)
      --prompt-style     Send a flattened prompt instead of a message list
  -V, --version          Print version
  -h, --help             Print this help

Environment:
  CHATSTREAM_API_KEY (or OPENROUTER_API_KEY), CHATSTREAM_ENDPOINT,
  CHATSTREAM_MODEL, RUST_LOG";
