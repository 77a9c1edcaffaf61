//! Realtime WebSocket message types
//!
//! This module defines the simplified client protocol spoken on
//! `/app/chat/realtime`, and how upstream events map onto it.

use serde::{Deserialize, Serialize};

use crate::core::realtime::ServerEvent;

// =============================================================================
// Incoming Messages (Client -> Server)
// =============================================================================

/// One inbound client frame.
///
/// `type` is kept as a plain string so unrecognized kinds decode and can be
/// ignored instead of failing the frame.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ClientMessage {
    /// Message kind ("audio", "text", anything else is ignored)
    #[serde(rename = "type", default)]
    pub message_type: String,
    /// Base64 PCM16 audio for "audio", user text for "text"
    #[serde(default)]
    pub data: String,
    /// Commit the audio buffer after appending
    #[serde(default)]
    pub commit: bool,
}

/// Decoded meaning of a [`ClientMessage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand<'a> {
    /// Append audio, optionally committing afterwards
    Audio { data: &'a str, commit: bool },
    /// Send a user text message
    Text { data: &'a str },
    /// Anything else
    Ignored { message_type: &'a str },
}

impl ClientMessage {
    /// Classify this message.
    pub fn command(&self) -> ClientCommand<'_> {
        match self.message_type.as_str() {
            "audio" => ClientCommand::Audio {
                data: &self.data,
                commit: self.commit,
            },
            "text" => ClientCommand::Text { data: &self.data },
            other => ClientCommand::Ignored {
                message_type: other,
            },
        }
    }
}

// =============================================================================
// Outgoing Messages (Server -> Client)
// =============================================================================

/// Messages forwarded to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientBoundMessage {
    /// Base64 audio chunk
    Audio { data: String },
    /// Audio stream finished
    AudioDone,
    /// Text chunk
    Text { data: String },
    /// Text stream finished, with the full text
    TextDone { data: String },
    /// Upstream reported an error
    Error {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        code: Option<String>,
    },
}

impl ClientBoundMessage {
    /// The message to forward for an upstream event, if any.
    pub fn from_event(event: &ServerEvent) -> Option<Self> {
        match event {
            ServerEvent::AudioDelta(delta) => Some(ClientBoundMessage::Audio {
                data: delta.audio.clone(),
            }),
            ServerEvent::AudioDone(_) => Some(ClientBoundMessage::AudioDone),
            ServerEvent::TextDelta(delta) => Some(ClientBoundMessage::Text {
                data: delta.delta.clone(),
            }),
            ServerEvent::TextDone(done) => Some(ClientBoundMessage::TextDone {
                data: done.text.clone(),
            }),
            ServerEvent::Error(err) => Some(ClientBoundMessage::Error {
                message: err.error.message.clone(),
                code: err.error.code.clone(),
            }),
            ServerEvent::SessionCreated(_)
            | ServerEvent::ConversationItem(_)
            | ServerEvent::AudioBufferAppend(_)
            | ServerEvent::AudioBufferCommitted(_)
            | ServerEvent::Generic(_) => None,
        }
    }
}
