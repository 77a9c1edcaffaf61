//! Realtime relay WebSocket handlers
//!
//! This module bridges a browser client to the OpenAI Realtime API.
//!
//! # Protocol
//!
//! ## Client → Server
//!
//! - `{"type":"audio","data":<base64 PCM16 24kHz mono>,"commit":bool}` -
//!   append audio, then commit the buffer when `commit` is true
//! - `{"type":"text","data":<text>}` - add a user message
//! - Binary frames carrying the same JSON are accepted
//! - Any other `type` is ignored
//!
//! ## Server → Client
//!
//! - **audio**: Base64 audio chunk
//! - **audio_done**: Audio response finished
//! - **text**: Text chunk
//! - **text_done**: Text response finished
//! - **error**: Error reported by the upstream API

mod bridge;
mod handler;
pub mod messages;

pub use bridge::{RelayBridge, SessionState, SessionStatus};
pub use handler::realtime_handler;
