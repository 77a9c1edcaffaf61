//! HTTP and WebSocket request handlers
//!
//! - `api` - Health check endpoint
//! - `realtime` - Realtime relay WebSocket (OpenAI Realtime API)

pub mod api;
pub mod realtime;

// Re-export commonly used handlers for convenient access
pub use realtime::realtime_handler;
