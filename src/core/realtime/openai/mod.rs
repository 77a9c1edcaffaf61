//! OpenAI Realtime API module.
//!
//! This module contains everything needed to talk to OpenAI's Realtime API
//! on behalf of one relay session.
//!
//! # Components
//!
//! - [`Credentials`] - API key and endpoint, resolved once at startup
//! - [`ClientEvent`] / [`ServerEvent`] - typed wire events
//! - [`decode_server_event`] - two-pass decoding with a generic fallback
//! - [`UpstreamConnector`] - one live WebSocket with typed sends and a receive loop
//!
//! # Audio Format
//!
//! Input and output audio is PCM 16-bit signed little-endian at 24kHz, mono,
//! base64 encoded.

mod client;
mod codec;
mod config;
mod messages;

pub use client::UpstreamConnector;
pub use codec::decode_server_event;
pub use config::{
    Credentials, DEFAULT_REALTIME_MODEL, OPENAI_BETA_HEADER_VALUE, OPENAI_REALTIME_URL,
};
pub use messages::{
    ApiError, AudioBufferAppend, AudioBufferCommitted, ClientEvent, ContentBlock,
    ConversationItem, ConversationItemEvent, ErrorEvent, MaxTokens, ResponseAudioDelta,
    ResponseAudioDone, ResponseConfig, ResponseTextDelta, ResponseTextDone, ServerEvent, Session,
    SessionCreated, ToolDef, TurnDetection,
};
