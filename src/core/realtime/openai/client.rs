//! OpenAI Realtime API upstream connector.
//!
//! [`UpstreamConnector`] owns exactly one WebSocket to the Realtime API for the
//! lifetime of a relay session. It exposes typed send operations and a
//! receive loop ([`UpstreamConnector::listen`]) that decodes every inbound
//! frame and hands it to an [`UpstreamEventHandler`].
//!
//! # API Reference
//!
//! - Endpoint: `wss://api.openai.com/v1/realtime?model=<model>`
//! - Protocol: WebSocket with JSON events
//! - Audio: PCM 16-bit, 24kHz, mono, little-endian, base64 encoded
//!
//! # Example
//!
//! ```rust,ignore
//! use realtime_relay::core::realtime::{Credentials, UpstreamConnector};
//!
//! let creds = Credentials::for_model(api_key, OPENAI_REALTIME_URL, "");
//! let upstream = UpstreamConnector::connect(&creds).await?;
//! upstream.send_user_message("Hello").await?;
//! upstream.listen(&mut handler).await?;
//! upstream.close().await;
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use http::HeaderValue;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::codec::decode_server_event;
use super::config::{Credentials, OPENAI_BETA_HEADER_VALUE};
use super::messages::{ClientEvent, ConversationItem, ResponseConfig};
use crate::core::realtime::base::{HandlerOutcome, RelayError, RelayResult, UpstreamEventHandler};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

/// Upper bound on the close handshake with the Realtime API
const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

// =============================================================================
// Upstream Connector
// =============================================================================

/// A live connection to the OpenAI Realtime API.
///
/// The write half sits behind a single mutex: command sends and pong replies
/// from the receive loop share it. The read half is taken by `listen`, so at
/// most one receive loop runs per connector.
pub struct UpstreamConnector {
    writer: Mutex<Option<WsSink>>,
    reader: Mutex<Option<WsSource>>,
    closed: AtomicBool,
    shutdown: CancellationToken,
}

impl UpstreamConnector {
    /// Dial the configured endpoint and complete the WebSocket handshake.
    pub async fn connect(credentials: &Credentials) -> RelayResult<Self> {
        if !credentials.has_api_key() {
            return Err(RelayError::Config(
                "OpenAI API key is missing or empty".to_string(),
            ));
        }

        let mut request = credentials
            .endpoint()
            .into_client_request()
            .map_err(|e| connection_error(e, "invalid realtime endpoint"))?;

        let bearer = HeaderValue::from_str(&format!("Bearer {}", credentials.api_key()))
            .map_err(|e| RelayError::Config(format!("API key is not a valid header value: {e}")))?;
        let headers = request.headers_mut();
        headers.insert(http::header::AUTHORIZATION, bearer);
        headers.insert("openai-beta", HeaderValue::from_static(OPENAI_BETA_HEADER_VALUE));

        let (ws_stream, response) = tokio_tungstenite::connect_async(request)
            .await
            .map_err(|e| connection_error(e, "handshake with realtime endpoint failed"))?;

        debug!(status = %response.status(), "Realtime handshake completed");
        info!("Connected to OpenAI Realtime API");

        let (sink, source) = ws_stream.split();
        Ok(Self {
            writer: Mutex::new(Some(sink)),
            reader: Mutex::new(Some(source)),
            closed: AtomicBool::new(false),
            shutdown: CancellationToken::new(),
        })
    }

    /// Whether `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    // -------------------------------------------------------------------------
    // Send operations
    // -------------------------------------------------------------------------

    /// Add a user text message to the conversation.
    pub async fn send_user_message(&self, text: &str) -> RelayResult<()> {
        self.send_event(&ClientEvent::ConversationItemCreate {
            previous_item_id: None,
            item: ConversationItem::user_text(text),
        })
        .await
    }

    /// Append base64 audio to the server-side input buffer.
    ///
    /// The payload is forwarded verbatim; it must already be PCM16, 24kHz, mono.
    pub async fn append_audio(&self, audio_base64: &str) -> RelayResult<()> {
        self.send_event(&ClientEvent::InputAudioBufferAppend {
            audio: audio_base64.to_string(),
        })
        .await
    }

    /// Commit the server-side input buffer.
    pub async fn commit_audio_buffer(&self) -> RelayResult<()> {
        self.send_event(&ClientEvent::InputAudioBufferCommit).await
    }

    /// Ask for a text response with the given instructions.
    pub async fn request_response(&self, instructions: &str) -> RelayResult<()> {
        self.send_event(&ClientEvent::ResponseCreate {
            response: ResponseConfig::text(instructions),
        })
        .await
    }

    async fn send_event(&self, event: &ClientEvent) -> RelayResult<()> {
        if self.is_closed() {
            return Err(RelayError::Send("upstream connection is closed".to_string()));
        }

        let json = serde_json::to_string(event)
            .map_err(|e| RelayError::Send(format!("failed to serialize {}: {e}", event.event_type())))?;

        debug!(event_type = event.event_type(), "Sending upstream event");
        self.write(Message::Text(json.into())).await
    }

    /// Single write path. Abandoned when `close` is called so the writer lock
    /// is never held across shutdown.
    async fn write(&self, message: Message) -> RelayResult<()> {
        tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => {
                Err(RelayError::Send("upstream connection is closed".to_string()))
            }
            result = async {
                let mut writer = self.writer.lock().await;
                match writer.as_mut() {
                    Some(sink) => sink
                        .send(message)
                        .await
                        .map_err(|e| RelayError::Send(e.to_string())),
                    None => Err(RelayError::Send("upstream connection is closed".to_string())),
                }
            } => result,
        }
    }

    // -------------------------------------------------------------------------
    // Receive loop
    // -------------------------------------------------------------------------

    /// Read frames until the socket closes, the handler stops, or `close` is called.
    ///
    /// Each frame is decoded and passed to `handler`; the next frame is read only
    /// after the handler returns. A frame that fails to decode ends the loop
    /// with [`RelayError::Decode`]. A closed or failed socket ends it with
    /// [`RelayError::Receive`].
    pub async fn listen<H>(&self, handler: &mut H) -> RelayResult<()>
    where
        H: UpstreamEventHandler + ?Sized,
    {
        let mut source = self
            .reader
            .lock()
            .await
            .take()
            .ok_or_else(|| RelayError::Receive("upstream receive loop already started".to_string()))?;

        loop {
            let frame = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => {
                    debug!("Upstream receive loop released by close");
                    return Ok(());
                }
                frame = source.next() => frame,
            };

            let payload = match frame {
                Some(Ok(Message::Text(text))) => text.as_bytes().to_vec(),
                Some(Ok(Message::Binary(data))) => data.to_vec(),
                Some(Ok(Message::Ping(data))) => {
                    if let Err(e) = self.write(Message::Pong(data)).await
                        && !self.shutdown.is_cancelled()
                    {
                        warn!("Failed to answer upstream ping: {}", e);
                    }
                    continue;
                }
                Some(Ok(Message::Pong(_))) | Some(Ok(Message::Frame(_))) => continue,
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None if self.shutdown.is_cancelled() => {
                    return Ok(());
                }
                Some(Ok(Message::Close(frame))) => {
                    let reason = frame
                        .map(|f| format!("{} {}", f.code, f.reason))
                        .unwrap_or_else(|| "no close frame".to_string());
                    return Err(RelayError::Receive(format!(
                        "upstream closed the connection: {reason}"
                    )));
                }
                Some(Err(e)) => return Err(RelayError::Receive(e.to_string())),
                None => {
                    return Err(RelayError::Receive(
                        "upstream connection ended".to_string(),
                    ));
                }
            };

            let event = decode_server_event(&payload)?;
            debug!(event = event.kind(), "Received upstream event");

            if handler.on_event(event).await == HandlerOutcome::Stop {
                debug!("Upstream handler requested stop");
                return Ok(());
            }
        }
    }

    // -------------------------------------------------------------------------
    // Close
    // -------------------------------------------------------------------------

    /// Close the socket. Calling this more than once is a no-op.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        self.shutdown.cancel();

        if let Some(mut sink) = self.writer.lock().await.take() {
            let handshake = async {
                if let Err(e) = sink.send(Message::Close(None)).await {
                    debug!("Upstream close frame not sent: {}", e);
                }
                if let Err(e) = sink.close().await {
                    debug!("Upstream sink close failed: {}", e);
                }
            };
            if tokio::time::timeout(CLOSE_TIMEOUT, handshake).await.is_err() {
                warn!("Realtime API did not take the close frame in time");
            }
        }

        info!("Disconnected from OpenAI Realtime API");
    }
}

fn connection_error(error: tungstenite::Error, context: &str) -> RelayError {
    match error {
        tungstenite::Error::Http(response) => {
            let status = response.status().as_u16();
            let body = response
                .body()
                .as_ref()
                .map(|b| String::from_utf8_lossy(b).into_owned());
            RelayError::Connection {
                message: context.to_string(),
                status: Some(status),
                body,
            }
        }
        other => RelayError::Connection {
            message: format!("{context}: {other}"),
            status: None,
            body: None,
        },
    }
}
