//! Realtime relay provider module.
//!
//! Provider-facing half of the relay: the error taxonomy and event-handler
//! seam shared by every session, plus the OpenAI Realtime upstream.
//!
//! # Architecture
//!
//! - [`UpstreamConnector`] owns one upstream socket per session
//! - [`decode_server_event`] turns raw frames into [`ServerEvent`] values
//! - [`UpstreamEventHandler`] receives every decoded event, one at a time
//!
//! # Example
//!
//! ```rust,ignore
//! use realtime_relay::core::realtime::{Credentials, UpstreamConnector, OPENAI_REALTIME_URL};
//!
//! let creds = Credentials::for_model("sk-...", OPENAI_REALTIME_URL, "");
//! let upstream = UpstreamConnector::connect(&creds).await?;
//! upstream.append_audio(chunk_b64).await?;
//! upstream.commit_audio_buffer().await?;
//! ```

mod base;
pub mod openai;

pub use base::{HandlerOutcome, RelayError, RelayResult, UpstreamEventHandler};
pub use openai::{
    ClientEvent, Credentials, DEFAULT_REALTIME_MODEL, MaxTokens, OPENAI_REALTIME_URL, ServerEvent,
    UpstreamConnector, decode_server_event,
};
