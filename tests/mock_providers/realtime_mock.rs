//! WebSocket Mock Server for the OpenAI Realtime API
//!
//! Accepts upstream connections on `/v1/realtime`, records the handshake
//! headers, greets with `session.created`, captures every client event as
//! JSON, and lets the test push frames or drop the connection.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use http::HeaderMap;
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::accept_hdr_async;

/// Test-driven action on the live connection
#[derive(Debug)]
enum MockCommand {
    /// Send a raw text frame
    Send(String),
    /// Send a close frame and stop
    Close,
    /// Drop the TCP stream without a close handshake
    Drop,
}

/// Mock server behavior
#[derive(Debug, Clone)]
pub struct MockRealtimeOptions {
    /// Send `session.created` right after the handshake
    pub greet: bool,
    /// Reject the handshake with this HTTP status
    pub reject_status: Option<u16>,
}

impl Default for MockRealtimeOptions {
    fn default() -> Self {
        Self {
            greet: true,
            reject_status: None,
        }
    }
}

/// Shared mock state
#[derive(Default)]
struct MockState {
    connection_count: AtomicU64,
    handshake_headers: Mutex<Vec<HeaderMap>>,
    handshake_uris: Mutex<Vec<String>>,
    connections: Mutex<Vec<mpsc::UnboundedSender<MockCommand>>>,
}

/// Mock OpenAI Realtime API server
pub struct MockRealtimeServer {
    addr: SocketAddr,
    state: Arc<MockState>,
    received: tokio::sync::Mutex<mpsc::UnboundedReceiver<Value>>,
}

impl MockRealtimeServer {
    /// Start a mock server with default options
    pub async fn start() -> Self {
        Self::start_with(MockRealtimeOptions::default()).await
    }

    /// Start a mock server on an ephemeral local port
    pub async fn start_with(options: MockRealtimeOptions) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(MockState::default());
        let (received_tx, received_rx) = mpsc::unbounded_channel();

        let accept_state = state.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let state = accept_state.clone();
                let received_tx = received_tx.clone();
                let options = options.clone();
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, state, received_tx, options).await {
                        eprintln!("Mock realtime connection error: {}", e);
                    }
                });
            }
        });

        Self {
            addr,
            state,
            received: tokio::sync::Mutex::new(received_rx),
        }
    }

    /// Base URL of the realtime endpoint (no query)
    pub fn url(&self) -> String {
        format!("ws://{}/v1/realtime", self.addr)
    }

    /// Number of handshakes completed
    pub fn connection_count(&self) -> u64 {
        self.state.connection_count.load(Ordering::SeqCst)
    }

    /// Headers of the most recent handshake attempt
    pub fn last_headers(&self) -> Option<HeaderMap> {
        self.state.handshake_headers.lock().last().cloned()
    }

    /// Request URI of the most recent handshake attempt
    pub fn last_uri(&self) -> Option<String> {
        self.state.handshake_uris.lock().last().cloned()
    }

    /// Wait until `n` connections have been accepted
    pub async fn wait_for_connections(&self, n: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.state.connections.lock().len() < n {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("Timed out waiting for upstream connection");
    }

    /// Send a JSON event on the most recent connection
    pub fn send_event(&self, event: Value) {
        self.command(MockCommand::Send(event.to_string()));
    }

    /// Send a raw text frame on the most recent connection
    pub fn send_raw(&self, text: &str) {
        self.command(MockCommand::Send(text.to_string()));
    }

    /// Close the most recent connection with a close frame
    pub fn close(&self) {
        self.command(MockCommand::Close);
    }

    /// Drop the most recent connection without a close handshake
    pub fn drop_connection(&self) {
        self.command(MockCommand::Drop);
    }

    fn command(&self, command: MockCommand) {
        let connections = self.state.connections.lock();
        let sender = connections.last().expect("No upstream connection");
        let _ = sender.send(command);
    }

    /// Next client event received by the mock
    pub async fn next_event(&self) -> Value {
        let mut received = self.received.lock().await;
        tokio::time::timeout(Duration::from_secs(5), received.recv())
            .await
            .expect("Timed out waiting for upstream event")
            .expect("Mock server stopped")
    }

    /// Assert that no client event arrives within `wait`
    pub async fn expect_no_event(&self, wait: Duration) {
        let mut received = self.received.lock().await;
        if let Ok(Some(event)) = tokio::time::timeout(wait, received.recv()).await {
            panic!("Unexpected upstream event: {event}");
        }
    }
}

/// Handle a single upstream connection
async fn handle_connection(
    stream: TcpStream,
    state: Arc<MockState>,
    received_tx: mpsc::UnboundedSender<Value>,
    options: MockRealtimeOptions,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let callback_state = state.clone();
    let reject_status = options.reject_status;
    let callback = move |request: &Request, response: Response| -> Result<Response, ErrorResponse> {
        callback_state
            .handshake_headers
            .lock()
            .push(request.headers().clone());
        callback_state
            .handshake_uris
            .lock()
            .push(request.uri().to_string());

        match reject_status {
            Some(status) => Err(http::Response::builder()
                .status(status)
                .body(Some("mock rejected handshake".to_string()))
                .unwrap()),
            None => Ok(response),
        }
    };

    let ws_stream = accept_hdr_async(stream, callback).await?;
    let (mut write, mut read) = ws_stream.split();

    let conn_id = state.connection_count.fetch_add(1, Ordering::SeqCst) + 1;
    let (command_tx, mut command_rx) = mpsc::unbounded_channel();
    state.connections.lock().push(command_tx);

    if options.greet {
        let greeting = json!({
            "type": "session.created",
            "event_id": format!("event_{}", conn_id),
            "session": {
                "id": format!("sess_{}", conn_id),
                "object": "realtime.session",
                "model": "gpt-4o-realtime-preview-2024-10-01",
                "modalities": ["text", "audio"],
                "voice": "alloy",
                "input_audio_format": "pcm16",
                "output_audio_format": "pcm16",
                "tools": [],
                "temperature": 0.8,
                "max_response_output_tokens": "inf"
            }
        });
        write.send(Message::Text(greeting.to_string().into())).await?;
    }

    loop {
        tokio::select! {
            command = command_rx.recv() => match command {
                Some(MockCommand::Send(text)) => {
                    write.send(Message::Text(text.into())).await?;
                }
                Some(MockCommand::Close) => {
                    write.send(Message::Close(None)).await?;
                    break;
                }
                Some(MockCommand::Drop) | None => return Ok(()),
            },
            message = read.next() => match message {
                Some(Ok(Message::Text(text))) => {
                    if let Ok(value) = serde_json::from_str::<Value>(&text) {
                        let _ = received_tx.send(value);
                    }
                }
                Some(Ok(Message::Ping(data))) => {
                    write.send(Message::Pong(data)).await?;
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Err(_)) => break,
                Some(Ok(_)) => {}
            },
        }
    }

    Ok(())
}
