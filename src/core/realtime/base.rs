//! Base types shared by the upstream connector and the relay bridge.
//!
//! This module defines the error taxonomy of a relay session and the
//! handler seam through which decoded upstream events are delivered.

use async_trait::async_trait;
use thiserror::Error;

use super::openai::ServerEvent;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur while relaying a realtime session.
#[derive(Debug, Error)]
pub enum RelayError {
    /// A required credential is missing or empty
    #[error("Configuration error: {0}")]
    Config(String),

    /// Dialing or handshaking with the upstream API failed
    #[error("Connection failed: {message}{}", status_suffix(.status))]
    Connection {
        /// Transport or handshake failure description
        message: String,
        /// HTTP status of the rejected handshake, when the server answered
        status: Option<u16>,
        /// Body of the rejected handshake response, when the server sent one
        body: Option<String>,
    },

    /// A frame could not be decoded
    #[error("Failed to decode '{event_type}' event: {source}")]
    Decode {
        /// Discriminator of the offending frame, or "unknown"
        event_type: String,
        /// Underlying parse failure
        #[source]
        source: serde_json::Error,
    },

    /// Writing a frame to a socket failed
    #[error("Send failed: {0}")]
    Send(String),

    /// Reading the next frame from a socket failed or the socket closed
    #[error("Receive failed: {0}")]
    Receive(String),

    /// Internal error (task failures)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RelayError {
    /// Build a decode error for the given discriminator.
    pub fn decode(event_type: impl Into<String>, source: serde_json::Error) -> Self {
        RelayError::Decode {
            event_type: event_type.into(),
            source,
        }
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}

/// Result type for relay operations.
pub type RelayResult<T> = Result<T, RelayError>;

// =============================================================================
// Event Handling
// =============================================================================

/// What the receive loop should do after an event was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerOutcome {
    /// Read the next upstream frame
    Continue,
    /// Stop relaying; the receive loop ends without an error
    Stop,
}

/// Receives every decoded upstream event, one at a time.
///
/// The receive loop awaits `on_event` before it reads the next frame, so a
/// slow handler stalls upstream reads.
#[async_trait]
pub trait UpstreamEventHandler: Send {
    /// Handle one decoded event.
    async fn on_event(&mut self, event: ServerEvent) -> HandlerOutcome;
}
