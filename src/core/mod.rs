pub mod realtime;

// Re-export commonly used types for convenience
pub use realtime::{
    Credentials, DEFAULT_REALTIME_MODEL, HandlerOutcome, OPENAI_REALTIME_URL, RelayError,
    RelayResult, ServerEvent, UpstreamConnector, UpstreamEventHandler,
};
