//! Realtime WebSocket route configuration

use axum::{Router, routing::get};
use tower_http::trace::TraceLayer;

use crate::handlers::realtime::realtime_handler;
use crate::state::AppState;
use std::sync::Arc;

/// Create the Realtime WebSocket router
///
/// # Endpoint
///
/// `GET /app/chat/realtime` - WebSocket upgrade for the realtime relay
///
/// # Example
///
/// ```json
/// // Client sends
/// {"type": "text", "data": "Hello"}
/// {"type": "audio", "data": "<base64 pcm16>", "commit": true}
///
/// // Server forwards
/// {"type": "audio", "data": "<base64 pcm16>"}
/// {"type": "audio_done"}
/// ```
pub fn create_realtime_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/app/chat/realtime", get(realtime_handler))
        .layer(TraceLayer::new_for_http())
}
