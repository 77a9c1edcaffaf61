//! Relay bridge between one client socket and one upstream connection.
//!
//! A session runs two loops concurrently:
//!
//! - the upstream loop ([`UpstreamConnector::listen`]) forwards decoded
//!   upstream events to the client as [`ClientBoundMessage`] frames
//! - the client loop decodes [`ClientMessage`] frames and issues the
//!   matching upstream commands
//!
//! Whichever loop ends first fires the shared [`Teardown`], which cancels the
//! session token and closes both sockets exactly once.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::select;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::core::realtime::{
    Credentials, HandlerOutcome, RelayError, RelayResult, ServerEvent, UpstreamConnector,
    UpstreamEventHandler,
};

use super::messages::{ClientBoundMessage, ClientCommand, ClientMessage};

/// How long a client gets to take the close frame before the socket is dropped
const CLIENT_CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

// =============================================================================
// Session State
// =============================================================================

/// Lifecycle of one relay session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SessionState {
    /// Dialing the upstream API
    Connecting,
    /// Both loops running
    Active,
    /// A loop ended or a close was requested; sockets are being closed
    Closing,
    /// Both sockets closed
    Closed,
}

/// Shared, forward-only session state.
#[derive(Debug)]
pub struct SessionStatus {
    state: Mutex<SessionState>,
}

impl SessionStatus {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SessionState::Connecting),
        }
    }

    /// Current state.
    pub fn get(&self) -> SessionState {
        *self.state.lock()
    }

    /// Move to `next`. Returns false and leaves the state unchanged if that
    /// would not move forward.
    pub fn advance(&self, next: SessionState) -> bool {
        let mut state = self.state.lock();
        if next > *state {
            debug!(from = ?*state, to = ?next, "Session state transition");
            *state = next;
            true
        } else {
            false
        }
    }
}

impl Default for SessionStatus {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Client Socket Write Half
// =============================================================================

/// Write half of the client socket. The only path that writes to the client.
///
/// A send in flight is abandoned once `cancel` fires, so a client that stopped
/// reading cannot hold the sink lock through teardown.
struct ClientSink {
    sink: tokio::sync::Mutex<SplitSink<WebSocket, Message>>,
    cancel: CancellationToken,
    closed: AtomicBool,
}

impl ClientSink {
    fn new(sink: SplitSink<WebSocket, Message>, cancel: CancellationToken) -> Self {
        Self {
            sink: tokio::sync::Mutex::new(sink),
            cancel,
            closed: AtomicBool::new(false),
        }
    }

    async fn send(&self, message: &ClientBoundMessage) -> RelayResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(RelayError::Send("client connection is closed".to_string()));
        }
        let json = serde_json::to_string(message)
            .map_err(|e| RelayError::Send(format!("failed to serialize client message: {e}")))?;

        select! {
            biased;
            _ = self.cancel.cancelled() => {
                Err(RelayError::Send("client connection is closing".to_string()))
            }
            result = async {
                self.sink.lock().await.send(Message::Text(json.into())).await
            } => result.map_err(|e| RelayError::Send(e.to_string())),
        }
    }

    /// Idempotent. Gives up on the close handshake after [`CLIENT_CLOSE_TIMEOUT`].
    async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let handshake = async {
            let mut sink = self.sink.lock().await;
            if let Err(e) = sink.send(Message::Close(None)).await {
                debug!("Client close frame not sent: {}", e);
            }
            if let Err(e) = sink.close().await {
                debug!("Client sink close failed: {}", e);
            }
        };
        if tokio::time::timeout(CLIENT_CLOSE_TIMEOUT, handshake)
            .await
            .is_err()
        {
            warn!("Client did not take the close frame in time, dropping the socket");
        }
    }
}

// =============================================================================
// Teardown
// =============================================================================

/// Which loop ended first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoopSide {
    Upstream,
    Client,
}

/// Single-fire shutdown shared by both loops.
struct Teardown {
    token: CancellationToken,
    origin: OnceLock<LoopSide>,
    status: Arc<SessionStatus>,
    upstream: Arc<UpstreamConnector>,
    client: Arc<ClientSink>,
}

impl Teardown {
    /// Cancel the session and close both sockets. Only the first call acts.
    async fn trigger(&self, side: LoopSide) {
        if self.origin.set(side).is_err() {
            return;
        }
        self.status.advance(SessionState::Closing);
        self.token.cancel();

        self.upstream.close().await;
        self.client.close().await;
    }

    fn origin(&self) -> Option<LoopSide> {
        self.origin.get().copied()
    }
}

// =============================================================================
// Upstream -> Client
// =============================================================================

/// Forwards upstream events to the client socket.
struct ClientForwarder {
    client: Arc<ClientSink>,
}

#[async_trait]
impl UpstreamEventHandler for ClientForwarder {
    async fn on_event(&mut self, event: ServerEvent) -> HandlerOutcome {
        let Some(message) = ClientBoundMessage::from_event(&event) else {
            match &event {
                ServerEvent::Generic(map) => {
                    info!(
                        event_type = map.get("type").and_then(|t| t.as_str()).unwrap_or("unknown"),
                        "Dropping unrecognized upstream event"
                    );
                }
                other if other.is_bookkeeping() => {
                    debug!(event = other.kind(), "Upstream bookkeeping event");
                }
                other => debug!(event = other.kind(), "Upstream event not forwarded"),
            }
            return HandlerOutcome::Continue;
        };

        if let ServerEvent::Error(err) = &event {
            warn!(
                code = err.error.code.as_deref().unwrap_or(""),
                "Upstream reported error: {}", err.error.message
            );
        }

        match self.client.send(&message).await {
            Ok(()) => HandlerOutcome::Continue,
            Err(e) => {
                warn!("Failed to forward {} to client: {}", event.kind(), e);
                HandlerOutcome::Stop
            }
        }
    }
}

// =============================================================================
// Relay Bridge
// =============================================================================

/// Orchestrates one relay session.
pub struct RelayBridge {
    credentials: Arc<Credentials>,
    response_instructions: Option<String>,
    shutdown: CancellationToken,
    status: Arc<SessionStatus>,
}

impl RelayBridge {
    pub fn new(credentials: Arc<Credentials>) -> Self {
        Self {
            credentials,
            response_instructions: None,
            shutdown: CancellationToken::new(),
            status: Arc::new(SessionStatus::new()),
        }
    }

    /// Request a text response after every relayed user message.
    pub fn with_response_instructions(mut self, instructions: Option<String>) -> Self {
        self.response_instructions = instructions.filter(|i| !i.trim().is_empty());
        self
    }

    /// End the session when `shutdown` is cancelled.
    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }

    /// Lifecycle state of the session.
    pub fn status(&self) -> Arc<SessionStatus> {
        self.status.clone()
    }

    /// Run the session to completion.
    ///
    /// Returns the error of the loop that ended first. A clean close from
    /// either side is not an error.
    pub async fn run(self, mut socket: WebSocket) -> RelayResult<()> {
        let upstream = match UpstreamConnector::connect(&self.credentials).await {
            Ok(upstream) => Arc::new(upstream),
            Err(e) => {
                error!("Failed to connect upstream: {}", e);
                self.status.advance(SessionState::Closing);
                if let Err(close_err) = socket.send(Message::Close(None)).await {
                    debug!("Client close frame not sent: {}", close_err);
                }
                self.status.advance(SessionState::Closed);
                return Err(e);
            }
        };
        self.status.advance(SessionState::Active);

        let token = self.shutdown.child_token();
        let (sink, stream) = socket.split();
        let client = Arc::new(ClientSink::new(sink, token.clone()));
        let teardown = Arc::new(Teardown {
            token,
            origin: OnceLock::new(),
            status: self.status.clone(),
            upstream: upstream.clone(),
            client: client.clone(),
        });

        let upstream_task = tokio::spawn({
            let teardown = teardown.clone();
            let upstream = upstream.clone();
            async move {
                let mut forwarder = ClientForwarder { client };
                let result = upstream.listen(&mut forwarder).await;
                if let Err(e) = &result {
                    debug!("Upstream loop ended: {}", e);
                }
                teardown.trigger(LoopSide::Upstream).await;
                result
            }
        });

        let client_result = self.client_loop(stream, &upstream, &teardown.token).await;
        if let Err(e) = &client_result {
            debug!("Client loop ended: {}", e);
        }
        teardown.trigger(LoopSide::Client).await;

        let upstream_result = upstream_task
            .await
            .map_err(|e| RelayError::Internal(format!("upstream task failed: {e}")))
            .and_then(|result| result);

        self.status.advance(SessionState::Closed);

        let (first, second) = match teardown.origin() {
            Some(LoopSide::Upstream) => (upstream_result, client_result),
            _ => (client_result, upstream_result),
        };
        if let Err(e) = second {
            debug!("Ignoring error from the loop that was torn down: {}", e);
        }
        first
    }

    async fn client_loop(
        &self,
        mut stream: SplitStream<WebSocket>,
        upstream: &UpstreamConnector,
        token: &CancellationToken,
    ) -> RelayResult<()> {
        loop {
            let frame = select! {
                biased;
                _ = token.cancelled() => return Ok(()),
                frame = stream.next() => frame,
            };

            match frame {
                Some(Ok(Message::Text(text))) => self.relay(text.as_bytes(), upstream).await,
                Some(Ok(Message::Binary(data))) => self.relay(&data, upstream).await,
                Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => {}
                Some(Ok(Message::Close(_))) | None => {
                    info!("Client closed the connection");
                    return Ok(());
                }
                Some(Err(e)) => return Err(RelayError::Receive(e.to_string())),
            }
        }
    }

    /// Relay one client frame. Failures are logged; the session continues.
    async fn relay(&self, payload: &[u8], upstream: &UpstreamConnector) {
        let message: ClientMessage = match serde_json::from_slice(payload) {
            Ok(message) => message,
            Err(e) => {
                warn!("Skipping malformed client message: {}", e);
                return;
            }
        };

        match message.command() {
            ClientCommand::Audio { data, commit } => {
                debug!(bytes = data.len(), commit, "Relaying client audio");
                if let Err(e) = upstream.append_audio(data).await {
                    warn!("Failed to append audio: {}", e);
                    return;
                }
                if commit && let Err(e) = upstream.commit_audio_buffer().await {
                    warn!("Failed to commit audio buffer: {}", e);
                }
            }
            ClientCommand::Text { data } => {
                debug!(bytes = data.len(), "Relaying client text");
                if let Err(e) = upstream.send_user_message(data).await {
                    warn!("Failed to send user message: {}", e);
                    return;
                }
                if let Some(instructions) = &self.response_instructions
                    && let Err(e) = upstream.request_response(instructions).await
                {
                    warn!("Failed to request response: {}", e);
                }
            }
            ClientCommand::Ignored { message_type } => {
                info!(message_type, "Ignoring client message of unsupported type");
            }
        }
    }
}
