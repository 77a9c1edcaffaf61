//! OpenAI Realtime API WebSocket message types.
//!
//! This module defines the client and server event types for the OpenAI Realtime API.
//! All events are JSON-encoded and sent over WebSocket.
//!
//! # Protocol Overview
//!
//! Client events (sent to server):
//! - conversation.item.create - Add a user message to the conversation
//! - input_audio_buffer.append - Append audio to buffer
//! - input_audio_buffer.commit - Commit audio buffer
//! - response.create - Generate a response
//!
//! Server events (received from server):
//! - session.created - Session created
//! - conversation.item.create / conversation.item.created - Conversation item
//! - input_audio_buffer.append / input_audio_buffer.committed - Buffer bookkeeping
//! - response.audio.delta - Audio data chunk
//! - response.audio.done - Audio generation complete
//! - response.text.delta - Text chunk
//! - response.text.done - Text complete
//! - error - Error occurred
//!
//! Anything else decodes to [`ServerEvent::Generic`], see [`super::codec`].

use std::fmt;

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};

// =============================================================================
// Max Tokens
// =============================================================================

/// Maximum response output tokens.
///
/// The API sends either an integer or a string (`"inf"` for unbounded), so
/// the value remembers which representation was present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum MaxTokens {
    /// Field absent or null
    #[default]
    Unset,
    /// Integer limit
    Number(i64),
    /// String form, normally "inf"
    Text(String),
}

impl MaxTokens {
    /// True iff the string representation equals "inf".
    pub fn is_unbounded(&self) -> bool {
        matches!(self, MaxTokens::Text(s) if s == "inf")
    }
}

impl fmt::Display for MaxTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaxTokens::Unset => Ok(()),
            MaxTokens::Number(n) => write!(f, "{n}"),
            MaxTokens::Text(s) => f.write_str(s),
        }
    }
}

impl Serialize for MaxTokens {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MaxTokens::Unset => serializer.serialize_none(),
            MaxTokens::Number(n) => serializer.serialize_i64(*n),
            MaxTokens::Text(s) => serializer.serialize_str(s),
        }
    }
}

struct MaxTokensVisitor;

impl<'de> Visitor<'de> for MaxTokensVisitor {
    type Value = MaxTokens;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an integer or a string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<MaxTokens, E> {
        Ok(MaxTokens::Number(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<MaxTokens, E> {
        Ok(MaxTokens::Number(i64::try_from(v).unwrap_or(i64::MAX)))
    }

    // Fractional limits are truncated toward zero.
    fn visit_f64<E: de::Error>(self, v: f64) -> Result<MaxTokens, E> {
        Ok(MaxTokens::Number(v.trunc() as i64))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<MaxTokens, E> {
        Ok(MaxTokens::Text(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<MaxTokens, E> {
        Ok(MaxTokens::Text(v))
    }

    fn visit_unit<E: de::Error>(self) -> Result<MaxTokens, E> {
        Ok(MaxTokens::Unset)
    }

    fn visit_none<E: de::Error>(self) -> Result<MaxTokens, E> {
        Ok(MaxTokens::Unset)
    }
}

impl<'de> Deserialize<'de> for MaxTokens {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(MaxTokensVisitor)
    }
}

// =============================================================================
// Session
// =============================================================================

/// Turn detection settings reported by the server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TurnDetection {
    /// Detection mode (e.g., "server_vad")
    #[serde(rename = "type")]
    pub detection_type: String,
    /// Activation threshold
    pub threshold: Option<f64>,
    /// Audio prefix padding in ms
    pub prefix_padding_ms: Option<u32>,
    /// Silence duration in ms
    pub silence_duration_ms: Option<u32>,
}

/// Tool definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolDef {
    /// Tool type (always "function")
    #[serde(rename = "type")]
    pub tool_type: String,
    /// Function name
    pub name: String,
    /// Function description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Function parameters JSON schema
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<serde_json::Value>,
}

/// Session descriptor sent with `session.created`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Session {
    pub id: String,
    pub object: String,
    pub model: String,
    pub modalities: Vec<String>,
    pub instructions: Option<String>,
    pub voice: Option<String>,
    pub input_audio_format: Option<String>,
    pub output_audio_format: Option<String>,
    pub input_audio_transcription: Option<serde_json::Value>,
    pub turn_detection: Option<TurnDetection>,
    pub tools: Vec<ToolDef>,
    pub tool_choice: Option<String>,
    pub temperature: Option<f64>,
    pub max_response_output_tokens: MaxTokens,
}

// =============================================================================
// Conversation Items
// =============================================================================

/// One content block of a conversation item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    /// Content type ("text" for user messages)
    #[serde(rename = "type")]
    pub content_type: String,
    /// Text content
    #[serde(default)]
    pub text: String,
}

impl ContentBlock {
    /// A text content block.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content_type: "text".to_string(),
            text: text.into(),
        }
    }
}

/// Conversation item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationItem {
    /// Item ID, assigned by the server when omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Item type ("message")
    #[serde(rename = "type")]
    pub item_type: String,
    /// Item role (user, assistant, system)
    #[serde(default)]
    pub role: String,
    /// Ordered content blocks
    #[serde(default)]
    pub content: Vec<ContentBlock>,
}

impl ConversationItem {
    /// A user message with a single text block.
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            id: None,
            item_type: "message".to_string(),
            role: "user".to_string(),
            content: vec![ContentBlock::text(text)],
        }
    }
}

// =============================================================================
// Response Configuration
// =============================================================================

/// Response configuration for `response.create`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResponseConfig {
    /// Response modalities
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub modalities: Vec<String>,
    /// Free-text instructions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    /// Voice for audio
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
    /// Output audio format
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_audio_format: Option<String>,
    /// Tools
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDef>,
    /// Tool choice
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<String>,
    /// Temperature
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Max output tokens
    #[serde(skip_serializing_if = "is_unset")]
    pub max_output_tokens: MaxTokens,
}

fn is_unset(tokens: &MaxTokens) -> bool {
    *tokens == MaxTokens::Unset
}

impl ResponseConfig {
    /// A text-only response with the given instructions.
    pub fn text(instructions: impl Into<String>) -> Self {
        Self {
            modalities: vec!["text".to_string()],
            instructions: Some(instructions.into()),
            ..Default::default()
        }
    }
}

// =============================================================================
// Client Events (sent to server)
// =============================================================================

/// Client events sent to the OpenAI Realtime API.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    /// Create a conversation item
    #[serde(rename = "conversation.item.create")]
    ConversationItemCreate {
        /// Previous item ID to insert after
        #[serde(skip_serializing_if = "Option::is_none")]
        previous_item_id: Option<String>,
        /// Item to create
        item: ConversationItem,
    },

    /// Append audio to input buffer
    #[serde(rename = "input_audio_buffer.append")]
    InputAudioBufferAppend {
        /// Base64-encoded audio data
        audio: String,
    },

    /// Commit the input audio buffer
    #[serde(rename = "input_audio_buffer.commit")]
    InputAudioBufferCommit,

    /// Create a response
    #[serde(rename = "response.create")]
    ResponseCreate {
        /// Response configuration
        response: ResponseConfig,
    },
}

impl ClientEvent {
    /// Discriminator sent on the wire.
    pub fn event_type(&self) -> &'static str {
        match self {
            ClientEvent::ConversationItemCreate { .. } => "conversation.item.create",
            ClientEvent::InputAudioBufferAppend { .. } => "input_audio_buffer.append",
            ClientEvent::InputAudioBufferCommit => "input_audio_buffer.commit",
            ClientEvent::ResponseCreate { .. } => "response.create",
        }
    }
}

// =============================================================================
// Server Events (received from server)
// =============================================================================

/// `session.created`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SessionCreated {
    #[serde(default)]
    pub event_id: Option<String>,
    pub session: Session,
}

/// `conversation.item.create` / `conversation.item.created`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ConversationItemEvent {
    #[serde(default)]
    pub event_id: Option<String>,
    #[serde(default)]
    pub previous_item_id: Option<String>,
    pub item: ConversationItem,
}

/// `input_audio_buffer.append` echoed by the server
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AudioBufferAppend {
    #[serde(default)]
    pub event_id: Option<String>,
    pub audio: String,
}

/// `input_audio_buffer.committed`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AudioBufferCommitted {
    #[serde(default)]
    pub event_id: Option<String>,
    #[serde(default)]
    pub previous_item_id: Option<String>,
    #[serde(default)]
    pub item_id: Option<String>,
}

/// `response.audio.delta`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ResponseAudioDelta {
    #[serde(default)]
    pub response_id: Option<String>,
    #[serde(default)]
    pub item_id: Option<String>,
    /// Base64-encoded audio chunk
    #[serde(alias = "delta")]
    pub audio: String,
}

/// `response.audio.done`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ResponseAudioDone {
    pub response_id: Option<String>,
    pub item_id: Option<String>,
}

/// `response.text.delta`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ResponseTextDelta {
    #[serde(default)]
    pub response_id: Option<String>,
    #[serde(default)]
    pub item_id: Option<String>,
    #[serde(alias = "text")]
    pub delta: String,
}

/// `response.text.done`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ResponseTextDone {
    pub response_id: Option<String>,
    pub item_id: Option<String>,
    pub text: String,
}

/// API error information.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiError {
    /// Error type
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    /// Error code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Error message
    pub message: String,
    /// Parameter that caused the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub param: Option<String>,
    /// Event ID that caused the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
}

/// `error`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ErrorEvent {
    #[serde(default)]
    pub event_id: Option<String>,
    pub error: ApiError,
}

/// Server events received from the OpenAI Realtime API.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    SessionCreated(SessionCreated),
    ConversationItem(ConversationItemEvent),
    AudioBufferAppend(AudioBufferAppend),
    AudioBufferCommitted(AudioBufferCommitted),
    AudioDelta(ResponseAudioDelta),
    AudioDone(ResponseAudioDone),
    TextDelta(ResponseTextDelta),
    TextDone(ResponseTextDone),
    Error(ErrorEvent),
    /// Any event outside the catalog, as its top-level JSON object
    Generic(serde_json::Map<String, serde_json::Value>),
}

impl ServerEvent {
    /// Short name of the variant for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            ServerEvent::SessionCreated(_) => "session.created",
            ServerEvent::ConversationItem(_) => "conversation.item",
            ServerEvent::AudioBufferAppend(_) => "input_audio_buffer.append",
            ServerEvent::AudioBufferCommitted(_) => "input_audio_buffer.committed",
            ServerEvent::AudioDelta(_) => "response.audio.delta",
            ServerEvent::AudioDone(_) => "response.audio.done",
            ServerEvent::TextDelta(_) => "response.text.delta",
            ServerEvent::TextDone(_) => "response.text.done",
            ServerEvent::Error(_) => "error",
            ServerEvent::Generic(_) => "generic",
        }
    }

    /// True for acknowledgements that are never forwarded to the client.
    pub fn is_bookkeeping(&self) -> bool {
        matches!(
            self,
            ServerEvent::SessionCreated(_)
                | ServerEvent::ConversationItem(_)
                | ServerEvent::AudioBufferAppend(_)
                | ServerEvent::AudioBufferCommitted(_)
        )
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_message_serialization() {
        let event = ClientEvent::ConversationItemCreate {
            previous_item_id: None,
            item: ConversationItem::user_text("Hello"),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "conversation.item.create",
                "item": {
                    "type": "message",
                    "role": "user",
                    "content": [{"type": "text", "text": "Hello"}]
                }
            })
        );
    }

    #[test]
    fn test_commit_serialization() {
        let json = serde_json::to_string(&ClientEvent::InputAudioBufferCommit).unwrap();
        assert_eq!(json, r#"{"type":"input_audio_buffer.commit"}"#);
    }

    #[test]
    fn test_append_keeps_payload_verbatim() {
        let event = ClientEvent::InputAudioBufferAppend {
            audio: "QUJD".to_string(),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "input_audio_buffer.append");
        assert_eq!(value["audio"], "QUJD");
    }

    #[test]
    fn test_response_create_serialization() {
        let event = ClientEvent::ResponseCreate {
            response: ResponseConfig::text("Please assist the user."),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "response.create");
        assert_eq!(value["response"]["modalities"], json!(["text"]));
        assert_eq!(value["response"]["instructions"], "Please assist the user.");
        assert!(value["response"].get("max_output_tokens").is_none());
    }

    #[test]
    fn test_event_type_matches_wire_tag() {
        let events = [
            ClientEvent::InputAudioBufferCommit,
            ClientEvent::InputAudioBufferAppend {
                audio: String::new(),
            },
            ClientEvent::ResponseCreate {
                response: ResponseConfig::default(),
            },
        ];
        for event in events {
            let value = serde_json::to_value(&event).unwrap();
            assert_eq!(value["type"], event.event_type());
        }
    }

    #[test]
    fn test_max_tokens_number_round_trip() {
        let encoded = serde_json::to_string(&MaxTokens::Number(1024)).unwrap();
        assert_eq!(encoded, "1024");
        let decoded: MaxTokens = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, MaxTokens::Number(1024));
        assert_eq!(decoded.to_string(), "1024");
        assert!(!decoded.is_unbounded());
    }

    #[test]
    fn test_max_tokens_inf_round_trip() {
        let encoded = serde_json::to_string(&MaxTokens::Text("inf".to_string())).unwrap();
        let decoded: MaxTokens = serde_json::from_str(&encoded).unwrap();
        assert!(decoded.is_unbounded());
        assert_eq!(decoded.to_string(), "inf");
    }

    #[test]
    fn test_max_tokens_other_string_is_bounded() {
        let decoded: MaxTokens = serde_json::from_str(r#""unlimited""#).unwrap();
        assert_eq!(decoded, MaxTokens::Text("unlimited".to_string()));
        assert!(!decoded.is_unbounded());
        assert_eq!(decoded.to_string(), "unlimited");
    }

    #[test]
    fn test_max_tokens_unset_displays_empty() {
        assert_eq!(MaxTokens::Unset.to_string(), "");
        let decoded: MaxTokens = serde_json::from_str("null").unwrap();
        assert_eq!(decoded, MaxTokens::Unset);
    }

    #[test]
    fn test_max_tokens_rejects_other_shapes() {
        assert!(serde_json::from_str::<MaxTokens>("true").is_err());
        assert!(serde_json::from_str::<MaxTokens>("[1]").is_err());
        assert!(serde_json::from_str::<MaxTokens>(r#"{"n":1}"#).is_err());
    }

    #[test]
    fn test_bookkeeping_events() {
        let created = ServerEvent::AudioBufferCommitted(AudioBufferCommitted {
            event_id: None,
            previous_item_id: None,
            item_id: None,
        });
        assert!(created.is_bookkeeping());
        assert!(!ServerEvent::AudioDone(ResponseAudioDone::default()).is_bookkeeping());
        assert!(!ServerEvent::Generic(serde_json::Map::new()).is_bookkeeping());
    }
}
