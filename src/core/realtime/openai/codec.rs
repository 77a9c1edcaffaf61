//! Decoding of upstream frames into [`ServerEvent`] values.
//!
//! Decoding happens in two passes: the `type` discriminator is read on its
//! own, then the full payload is decoded into the variant it names. Frames
//! whose discriminator is missing, empty or not in the catalog decode to
//! [`ServerEvent::Generic`].

use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::messages::ServerEvent;
use crate::core::realtime::base::{RelayError, RelayResult};

const UNKNOWN_EVENT_TYPE: &str = "unknown";

#[derive(Deserialize)]
struct Discriminator {
    #[serde(rename = "type", default)]
    event_type: Option<String>,
}

/// Decode one upstream frame.
pub fn decode_server_event(payload: &[u8]) -> RelayResult<ServerEvent> {
    let discriminator: Discriminator = serde_json::from_slice(payload)
        .map_err(|e| RelayError::decode(UNKNOWN_EVENT_TYPE, e))?;

    let event_type = discriminator.event_type.unwrap_or_default();

    match event_type.as_str() {
        "session.created" => typed(payload, &event_type, ServerEvent::SessionCreated),
        "conversation.item.create" | "conversation.item.created" => {
            typed(payload, &event_type, ServerEvent::ConversationItem)
        }
        "input_audio_buffer.append" => typed(payload, &event_type, ServerEvent::AudioBufferAppend),
        "input_audio_buffer.committed" => {
            typed(payload, &event_type, ServerEvent::AudioBufferCommitted)
        }
        "response.audio.delta" => typed(payload, &event_type, ServerEvent::AudioDelta),
        "response.audio.done" => typed(payload, &event_type, ServerEvent::AudioDone),
        "response.text.delta" => typed(payload, &event_type, ServerEvent::TextDelta),
        "response.text.done" => typed(payload, &event_type, ServerEvent::TextDone),
        "error" => typed(payload, &event_type, ServerEvent::Error),
        _ => generic(payload, &event_type),
    }
}

fn typed<T, F>(payload: &[u8], event_type: &str, wrap: F) -> RelayResult<ServerEvent>
where
    T: DeserializeOwned,
    F: FnOnce(T) -> ServerEvent,
{
    serde_json::from_slice(payload)
        .map(wrap)
        .map_err(|e| RelayError::decode(event_type, e))
}

fn generic(payload: &[u8], event_type: &str) -> RelayResult<ServerEvent> {
    let name = if event_type.is_empty() {
        UNKNOWN_EVENT_TYPE
    } else {
        event_type
    };
    serde_json::from_slice(payload)
        .map(ServerEvent::Generic)
        .map_err(|e| RelayError::decode(name, e))
}
