//! OpenAI Realtime API connection settings.
//!
//! This module contains the endpoint constants for OpenAI's Realtime API and
//! the process-wide [`Credentials`] every upstream connection is built from.

use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

/// OpenAI Realtime API WebSocket endpoint.
pub const OPENAI_REALTIME_URL: &str = "wss://api.openai.com/v1/realtime";

/// Model requested when none is configured.
pub const DEFAULT_REALTIME_MODEL: &str = "gpt-4o-realtime-preview-2024-10-01";

/// Value of the `OpenAI-Beta` header required by the Realtime API.
pub const OPENAI_BETA_HEADER_VALUE: &str = "realtime=v1";

/// Credentials and endpoint used to reach the upstream Realtime API.
///
/// Resolved once at process start and shared read-only by every session.
/// The API key is wiped from memory when the value is dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct Credentials {
    api_key: String,
    endpoint: String,
}

impl Credentials {
    /// Create credentials for an explicit endpoint URL.
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: endpoint.into(),
        }
    }

    /// Create credentials for `base_url` with the `model` query parameter.
    pub fn for_model(api_key: impl Into<String>, base_url: &str, model: &str) -> Self {
        let model = if model.is_empty() {
            DEFAULT_REALTIME_MODEL
        } else {
            model
        };
        Self::new(api_key, format!("{base_url}?model={model}"))
    }

    /// The API key sent as a bearer token.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// The full WebSocket URL of the upstream endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// True when an API key is present.
    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &if self.has_api_key() { "<redacted>" } else { "<empty>" })
            .field("endpoint", &self.endpoint)
            .finish()
    }
}
