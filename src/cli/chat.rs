//! Terminal chat loop.
//!
//! Replies are written as they stream in. Failures go to the error writer
//! as a single line and the loop continues. An interrupt cancels the running
//! reply, and at the prompt it ends the session.

use std::io::Write;
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use crate::error::ChatError;
use crate::models::MessageRole;
use crate::session::{ChatSession, TurnSummary};
use crate::traits::HttpClient;

/// Lines that end an interactive session.
const QUIT_COMMANDS: [&str; 2] = ["/quit", "/exit"];

/// Prints the whole transcript.
const HISTORY_COMMAND: &str = "/history";

/// Output sinks and interrupt handling for a chat run.
pub struct Terminal<O: Write, E: Write> {
    pub out: O,
    pub err: E,
    /// Fired once per interrupt
    pub interrupt: Option<Arc<Notify>>,
}

impl<O: Write, E: Write> Terminal<O, E> {
    pub fn new(out: O, err: E) -> Self {
        Self {
            out,
            err,
            interrupt: None,
        }
    }

    pub fn with_interrupt(mut self, interrupt: Arc<Notify>) -> Self {
        self.interrupt = Some(interrupt);
        self
    }

    /// Route Ctrl-C to the interrupt signal for the rest of the process.
    ///
    /// Must be called from inside a Tokio runtime.
    pub fn with_ctrl_c(self) -> Self {
        let interrupt = Arc::new(Notify::new());
        let signal = Arc::clone(&interrupt);
        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                signal.notify_one();
            }
        });
        self.with_interrupt(interrupt)
    }
}

async fn interrupted(signal: Option<&Notify>) {
    match signal {
        Some(notify) => notify.notified().await,
        None => std::future::pending().await,
    }
}

/// Send one prompt and stream the reply.
///
/// Turn errors are reported on the error writer and returned.
pub async fn run_turn<C, O, E>(
    session: &mut ChatSession<C>,
    text: &str,
    term: &mut Terminal<O, E>,
) -> std::io::Result<Result<TurnSummary, ChatError>>
where
    C: HttpClient,
    O: Write,
    E: Write,
{
    let cancel = CancellationToken::new();
    let interrupt = term.interrupt.clone();

    write!(term.out, "{}: ", MessageRole::Assistant.label())?;
    term.out.flush()?;

    let mut write_failed = None;
    let out = &mut term.out;
    let result = {
        let send = session.send_with_cancel(text, &cancel, |delta, _| {
            if write_failed.is_some() {
                return;
            }
            if let Err(e) = out.write_all(delta.text.as_bytes()).and_then(|_| out.flush()) {
                write_failed = Some(e);
            }
        });
        tokio::pin!(send);

        loop {
            tokio::select! {
                biased;
                result = &mut send => break result,
                _ = interrupted(interrupt.as_deref()) => cancel.cancel(),
            }
        }
    };

    if let Some(e) = write_failed {
        return Err(e);
    }

    writeln!(term.out)?;
    if let Err(err) = &result {
        writeln!(term.err, "{}", err.user_message())?;
    }
    Ok(result)
}

/// Read prompts line by line until end of input, a quit command or an
/// interrupt at the prompt.
pub async fn run_repl<C, R, O, E>(
    session: &mut ChatSession<C>,
    input: R,
    term: &mut Terminal<O, E>,
) -> std::io::Result<()>
where
    C: HttpClient,
    R: AsyncBufRead + Unpin,
    O: Write,
    E: Write,
{
    let interrupt = term.interrupt.clone();
    let mut lines = input.lines();

    loop {
        write!(term.out, "{}: ", MessageRole::User.label())?;
        term.out.flush()?;

        let next = tokio::select! {
            line = lines.next_line() => line?,
            _ = interrupted(interrupt.as_deref()) => None,
        };
        let Some(line) = next else {
            writeln!(term.out)?;
            break;
        };
        let line = line.trim();

        if line.is_empty() {
            continue;
        }
        if QUIT_COMMANDS.contains(&line) {
            break;
        }
        if line == HISTORY_COMMAND {
            writeln!(term.out, "{}", session.transcript().render())?;
            continue;
        }

        run_turn(session, line, term).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{MockHttpClient, MockResponse};
    use crate::config::ClientConfig;
    use bytes::Bytes;

    const URL: &str = "http://test.local/chat";

    fn session(response: MockResponse) -> ChatSession<MockHttpClient> {
        let mock = MockHttpClient::new();
        mock.set_default_response(response);
        ChatSession::new(
            ClientConfig::default().with_endpoint(URL).with_api_key("k"),
            mock,
        )
    }

    fn reply(parts: &[&str]) -> MockResponse {
        let mut chunks: Vec<String> = parts
            .iter()
            .map(|p| {
                format!(
                    "data: {}\n\n",
                    serde_json::json!({"id": "r1", "choices": [{"delta": {"content": p}}]})
                )
            })
            .collect();
        chunks.push("data: [DONE]\n\n".to_string());
        MockResponse::chunks(chunks)
    }

    #[tokio::test]
    async fn test_turn_streams_to_out() {
        let mut s = session(reply(&["Hel", "lo"]));
        let mut term = Terminal::new(Vec::new(), Vec::new());

        let result = run_turn(&mut s, "Hi", &mut term).await.unwrap();
        assert!(result.is_ok());
        assert_eq!(String::from_utf8(term.out).unwrap(), "ChatGPT: Hello\n");
        assert!(term.err.is_empty());
    }

    #[tokio::test]
    async fn test_turn_error_goes_to_err() {
        let mut s = session(MockResponse::status(500, "oops"));
        let mut term = Terminal::new(Vec::new(), Vec::new());

        let result = run_turn(&mut s, "Hi", &mut term).await.unwrap();
        assert!(result.is_err());
        assert_eq!(String::from_utf8(term.err).unwrap(), "HTTP Error! status 500\n");
    }

    #[tokio::test]
    async fn test_repl_until_quit() {
        let mut s = session(reply(&["Yo"]));
        let mut term = Terminal::new(Vec::new(), Vec::new());
        let input: &[u8] = b"Hi\n\n/history\n/quit\nignored\n";

        run_repl(&mut s, input, &mut term).await.unwrap();

        let out = String::from_utf8(term.out).unwrap();
        assert!(out.contains("ChatGPT: Yo\n"));
        assert!(out.contains("You: Hi\nChatGPT: Yo\n"));
        assert_eq!(s.transcript().len(), 2);
        assert_eq!(s.http_client().get_requests().len(), 1);
    }

    #[tokio::test]
    async fn test_repl_stops_at_eof() {
        let mut s = session(reply(&["a"]));
        let mut term = Terminal::new(Vec::new(), Vec::new());
        let input: &[u8] = b"one";

        run_repl(&mut s, input, &mut term).await.unwrap();
        assert_eq!(s.transcript().len(), 2);
        assert!(String::from_utf8(term.out).unwrap().ends_with("ChatGPT: a\nYou: \n"));
    }

    #[tokio::test]
    async fn test_interrupt_cancels_running_turn() {
        let mut s = session(MockResponse::StreamThenPending {
            status: 200,
            chunks: vec![Bytes::from(
                "data: {\"id\":\"r1\",\"choices\":[{\"delta\":{\"content\":\"par\"}}]}\n\n",
            )],
        });
        let interrupt = Arc::new(Notify::new());
        let mut term = Terminal::new(Vec::new(), Vec::new()).with_interrupt(Arc::clone(&interrupt));
        interrupt.notify_one();

        let result = run_turn(&mut s, "Hi", &mut term).await.unwrap();

        assert!(matches!(result, Err(ChatError::Cancelled)));
        assert_eq!(String::from_utf8(term.out).unwrap(), "ChatGPT: par\n");
        assert_eq!(String::from_utf8(term.err).unwrap(), "Reply cancelled.\n");
        assert_eq!(s.transcript().last().unwrap().content, "par");
        assert!(!s.is_loading());
    }

    #[tokio::test]
    async fn test_repl_exits_on_interrupt_at_prompt() {
        let mut s = session(reply(&["a"]));
        let interrupt = Arc::new(Notify::new());
        let mut term = Terminal::new(Vec::new(), Vec::new()).with_interrupt(Arc::clone(&interrupt));
        // Input that never delivers a line
        let (_writer, reader) = tokio::io::duplex(64);
        interrupt.notify_one();

        run_repl(&mut s, tokio::io::BufReader::new(reader), &mut term)
            .await
            .unwrap();

        assert_eq!(String::from_utf8(term.out).unwrap(), "You: \n");
        assert!(s.http_client().get_requests().is_empty());
        assert!(s.transcript().is_empty());
    }
}
