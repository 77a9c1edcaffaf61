//! Realtime WebSocket handler
//!
//! Session entry point: upgrades the connection and runs one
//! [`RelayBridge`] per accepted client socket.

use std::sync::Arc;

use axum::{
    extract::{
        State,
        ws::{WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use tracing::{Instrument, error, info, info_span};
use uuid::Uuid;

use crate::state::AppState;

use super::bridge::RelayBridge;

/// Maximum WebSocket frame size (10 MB)
const MAX_WS_FRAME_SIZE: usize = 10 * 1024 * 1024;

/// Maximum WebSocket message size (10 MB)
const MAX_WS_MESSAGE_SIZE: usize = 10 * 1024 * 1024;

/// Realtime WebSocket handler
///
/// Upgrades the HTTP connection to WebSocket and relays it to the OpenAI
/// Realtime API until either side closes.
pub async fn realtime_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> Response {
    info!("Realtime WebSocket connection upgrade requested");

    ws.max_frame_size(MAX_WS_FRAME_SIZE)
        .max_message_size(MAX_WS_MESSAGE_SIZE)
        .on_upgrade(move |socket| handle_realtime_socket(socket, state))
}

/// Run one session, keeping it counted in the app state while it lives.
async fn handle_realtime_socket(socket: WebSocket, app_state: Arc<AppState>) {
    let session_id = Uuid::new_v4();
    let span = info_span!("realtime_session", %session_id);

    async move {
        let _guard = app_state.track_session();
        info!("Realtime session started");

        let bridge = RelayBridge::new(app_state.credentials.clone())
            .with_response_instructions(app_state.config.response_instructions.clone())
            .with_shutdown(app_state.shutdown.child_token());

        match bridge.run(socket).await {
            Ok(()) => info!("Realtime session ended"),
            Err(e) => error!("Realtime session ended with error: {}", e),
        }
    }
    .instrument(span)
    .await
}
