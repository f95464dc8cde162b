//! WebSocket subscriber for timer change notifications.
//!
//! [`ChangeSubscriber::run`] connects to the server's `/ws` endpoint,
//! subscribes to one session, and offers every `timer.*` notification to
//! the shared display. The server answers each subscribe with a
//! `timer.snapshot`, so the display is re-read after every reconnect.
//! Dropped connections are retried with exponential backoff until the
//! cancellation token fires, at which point the subscriber unsubscribes
//! and closes the socket.

use std::sync::Arc;
use std::time::Duration;

use futures::{Sink, SinkExt, StreamExt};
use podium_core::realtime::{ClientMessage, ServerMessage};
use tokio::net::TcpStream;
use tokio::sync::broadcast;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;

use crate::alert::Alert;
use crate::auth::TokenSource;
use crate::display::{confirm, ApplyOutcome, SharedDisplay};
use crate::error::ClientError;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Tunable parameters for the reconnect backoff.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Delay before the first reconnection attempt.
    pub initial_delay: Duration,
    /// Upper bound on the delay between attempts.
    pub max_delay: Duration,
    /// Factor by which the delay grows after each failure.
    pub multiplier: f64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }
}

/// Next backoff delay, clamped to [`ReconnectConfig::max_delay`].
pub fn next_delay(current: Duration, config: &ReconnectConfig) -> Duration {
    let next_ms = (current.as_millis() as f64 * config.multiplier) as u64;
    Duration::from_millis(next_ms).min(config.max_delay)
}

pub struct ChangeSubscriber {
    ws_url: String,
    tokens: Arc<TokenSource>,
    display: SharedDisplay,
    alert: Arc<dyn Alert>,
    reconnect: ReconnectConfig,
}

impl ChangeSubscriber {
    /// * `ws_url` - WebSocket endpoint, e.g. `ws://localhost:3000/api/v1/ws`.
    /// * `tokens` - supplies the `token` query parameter on each connect.
    pub fn new(
        ws_url: impl Into<String>,
        tokens: Arc<TokenSource>,
        display: SharedDisplay,
        alert: Arc<dyn Alert>,
    ) -> Self {
        Self {
            ws_url: ws_url.into(),
            tokens,
            display,
            alert,
            reconnect: ReconnectConfig::default(),
        }
    }

    pub fn with_reconnect(mut self, reconnect: ReconnectConfig) -> Self {
        self.reconnect = reconnect;
        self
    }

    /// Offer one server message to the display.
    ///
    /// Returns `None` for messages about other sessions and for errors.
    pub async fn handle_message(&self, message: ServerMessage) -> Option<ApplyOutcome> {
        let session_id = self.display.lock().await.session_id();

        match message {
            ServerMessage::Error { code, message } => {
                tracing::warn!(session_id, code = %code, message = %message, "Server reported an error");
                None
            }
            other if other.session_id() != Some(session_id) => None,
            ServerMessage::Expired { timer, .. } => {
                Some(confirm(&self.display, self.alert.as_ref(), timer, true).await)
            }
            ServerMessage::Snapshot { timer, .. } | ServerMessage::Updated { timer, .. } => {
                Some(confirm(&self.display, self.alert.as_ref(), timer, false).await)
            }
        }
    }

    /// Parse a text frame and offer it to the display.
    pub async fn handle_text(&self, text: &str) -> Result<Option<ApplyOutcome>, ClientError> {
        let message: ServerMessage = serde_json::from_str(text)
            .map_err(|e| ClientError::Protocol(format!("Unrecognized frame: {e}")))?;
        Ok(self.handle_message(message).await)
    }

    /// Follow an in-process notification stream, such as the one from
    /// [`crate::local::LocalTimerApi::subscribe`], until `cancel` fires or
    /// the sender is dropped.
    pub async fn follow(
        &self,
        mut receiver: broadcast::Receiver<ServerMessage>,
        cancel: CancellationToken,
    ) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                result = receiver.recv() => match result {
                    Ok(message) => {
                        self.handle_message(message).await;
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(skipped = n, "Timer notifications lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
            }
        }
    }

    /// Keep a subscription alive until `cancel` fires.
    pub async fn run(&self, cancel: CancellationToken) {
        let mut delay = self.reconnect.initial_delay;
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            let connected = tokio::select! {
                _ = cancel.cancelled() => return,
                result = self.connect() => result,
            };

            match connected {
                Ok(stream) => {
                    attempt = 0;
                    delay = self.reconnect.initial_delay;

                    match self.stream_session(stream, &cancel).await {
                        Ok(()) => return,
                        Err(e) => {
                            tracing::warn!(error = %e, "Timer subscription dropped");
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Timer subscription connect failed"
                    );
                }
            }

            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(delay) => {}
            }
            delay = next_delay(delay, &self.reconnect);
        }
    }

    async fn connect(&self) -> Result<WsStream, ClientError> {
        let token = self.tokens.access_token().await?;
        let url = format!("{}?token={token}", self.ws_url);
        let (stream, _response) = connect_async(url.as_str()).await.map_err(|e| {
            ClientError::WebSocket(format!("Failed to connect to {}: {e}", self.ws_url))
        })?;
        Ok(stream)
    }

    /// Subscribe and pump frames until the socket drops (`Err`) or
    /// `cancel` fires (`Ok`).
    async fn stream_session(
        &self,
        stream: WsStream,
        cancel: &CancellationToken,
    ) -> Result<(), ClientError> {
        let session_id = self.display.lock().await.session_id();
        let (mut write, mut read) = stream.split();

        send_json(&mut write, &ClientMessage::Subscribe { session_id }).await?;
        tracing::info!(session_id, "Subscribed to timer notifications");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    let _ = send_json(&mut write, &ClientMessage::Unsubscribe { session_id }).await;
                    let _ = write.send(Message::Close(None)).await;
                    tracing::info!(session_id, "Unsubscribed from timer notifications");
                    return Ok(());
                }
                frame = read.next() => match frame {
                    Some(Ok(Message::Text(text))) => {
                        if let Err(e) = self.handle_text(&text).await {
                            tracing::warn!(session_id, error = %e, "Ignoring timer frame");
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        return Err(ClientError::WebSocket("Connection closed by server".into()));
                    }
                    // Pings are answered by tungstenite.
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(ClientError::WebSocket(e.to_string())),
                },
            }
        }
    }
}

async fn send_json<S>(write: &mut S, message: &ClientMessage) -> Result<(), ClientError>
where
    S: Sink<Message> + Unpin,
    S::Error: std::fmt::Display,
{
    let json = serde_json::to_string(message)
        .map_err(|e| ClientError::Protocol(format!("Failed to encode frame: {e}")))?;
    write
        .send(Message::Text(json))
        .await
        .map_err(|e| ClientError::WebSocket(e.to_string()))
}
