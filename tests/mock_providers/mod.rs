//! Mock provider servers for integration tests
//!
//! - `realtime_mock`: scripted OpenAI Realtime API WebSocket server

// Not every test binary uses every helper
#![allow(dead_code)]

pub mod realtime_mock;

pub use realtime_mock::{MockRealtimeServer, MockRealtimeOptions};
