//! A chat session: one transcript, one endpoint, one turn at a time.
//!
//! The session wires the fetcher, the frame stream and the reconciler into a
//! single `send` call. Deltas are merged as they are read, and the caller is
//! notified after each one.

use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::adapters::ReqwestHttpClient;
use crate::config::{ClientConfig, ConfigError};
use crate::error::{ChatError, ChatResult};
use crate::fetcher::StreamFetcher;
use crate::models::{CompletionRequest, Delta, Payload};
use crate::sse::Frame;
use crate::traits::HttpClient;
use crate::transcript::{Transcript, TranscriptReconciler, TurnState};

/// Outcome of a completed turn.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnSummary {
    /// Id of the reply, `None` when the stream carried no delta
    pub response_id: Option<String>,
    /// Number of deltas merged
    pub deltas: usize,
    /// Whether the end-of-stream sentinel was seen
    pub finished: bool,
}

pub struct ChatSession<C: HttpClient = ReqwestHttpClient> {
    config: ClientConfig,
    fetcher: StreamFetcher<C>,
    reconciler: TranscriptReconciler,
}

impl ChatSession<ReqwestHttpClient> {
    /// Session over the default HTTP client. Fails if `config` is invalid.
    pub fn from_config(config: ClientConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(config, ReqwestHttpClient::new()))
    }
}

impl<C: HttpClient> ChatSession<C> {
    pub fn new(config: ClientConfig, client: C) -> Self {
        let fetcher = StreamFetcher::with_client(client).with_config_headers(&config);
        Self {
            config,
            fetcher,
            reconciler: TranscriptReconciler::new(),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transcript(&self) -> &Transcript {
        self.reconciler.transcript()
    }

    pub fn state(&self) -> TurnState {
        self.reconciler.state()
    }

    pub fn is_loading(&self) -> bool {
        self.reconciler.is_loading()
    }

    pub fn http_client(&self) -> &C {
        self.fetcher.client()
    }

    /// Abandon a turn whose `send` future was dropped before completing.
    pub fn cancel(&mut self) {
        self.reconciler.cancel();
    }

    /// Send `text` and stream the reply into the transcript.
    pub async fn send(&mut self, text: &str) -> ChatResult<TurnSummary> {
        self.send_with(text, |_, _| {}).await
    }

    /// Like [`ChatSession::send`], calling `on_update` after each merged delta.
    pub async fn send_with<F>(&mut self, text: &str, on_update: F) -> ChatResult<TurnSummary>
    where
        F: FnMut(&Delta, &Transcript),
    {
        let never = CancellationToken::new();
        self.send_with_cancel(text, &never, on_update).await
    }

    /// Like [`ChatSession::send_with`], stopping early when `cancel` fires.
    ///
    /// On cancellation the placeholder is dropped, text already merged is
    /// kept, and [`ChatError::Cancelled`] is returned.
    pub async fn send_with_cancel<F>(
        &mut self,
        text: &str,
        cancel: &CancellationToken,
        mut on_update: F,
    ) -> ChatResult<TurnSummary>
    where
        F: FnMut(&Delta, &Transcript),
    {
        let credential = match self.config.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => key.to_string(),
            _ => return Err(ChatError::MissingCredential),
        };

        self.reconciler.send(text)?;

        let payload = Payload::from_transcript(self.reconciler.transcript(), self.config.payload_style);
        let request = CompletionRequest::new(&self.config, payload);

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ChatError::Cancelled),
            result = stream_turn(
                &self.fetcher,
                &mut self.reconciler,
                &self.config.endpoint,
                &credential,
                &request,
                &mut on_update,
            ) => result,
        };

        match outcome {
            Ok(summary) => {
                self.reconciler.on_stream_end();
                tracing::info!(
                    response_id = ?summary.response_id,
                    deltas = summary.deltas,
                    finished = summary.finished,
                    "turn complete"
                );
                Ok(summary)
            }
            Err(ChatError::Cancelled) => {
                self.reconciler.cancel();
                Err(ChatError::Cancelled)
            }
            Err(err) => {
                self.reconciler.on_error(&err);
                Err(err)
            }
        }
    }
}

/// Fetch the reply and merge every delta until the stream ends.
async fn stream_turn<C, F>(
    fetcher: &StreamFetcher<C>,
    reconciler: &mut TranscriptReconciler,
    endpoint: &str,
    credential: &str,
    request: &CompletionRequest,
    on_update: &mut F,
) -> ChatResult<TurnSummary>
where
    C: HttpClient,
    F: FnMut(&Delta, &Transcript),
{
    let mut frames = fetcher.stream_frames(endpoint, credential, request).await?;
    let mut summary = TurnSummary::default();

    while let Some(frame) = frames.next().await {
        match frame? {
            Frame::Delta(delta) => {
                reconciler.on_delta(&delta);
                if summary.response_id.is_none() {
                    summary.response_id = Some(delta.id.clone());
                }
                summary.deltas += 1;
                on_update(&delta, reconciler.transcript());
            }
            Frame::Done => {
                summary.finished = true;
                break;
            }
            Frame::Error { code, message } => {
                return Err(ChatError::Upstream { code, message });
            }
        }
    }

    Ok(summary)
}
