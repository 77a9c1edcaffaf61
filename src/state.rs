//! Application state shared by every request handler.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::config::ServerConfig;
use crate::core::realtime::Credentials;

/// Shared application state.
///
/// Credentials are resolved once here and handed to every session by
/// reference; nothing mutates them afterwards.
pub struct AppState {
    pub config: ServerConfig,
    pub credentials: Arc<Credentials>,
    /// Cancelled on server shutdown; every session watches a child token
    pub shutdown: CancellationToken,
    active_sessions: AtomicUsize,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Arc<Self> {
        if !config.has_openai_api_key() {
            warn!("OPENAI_API_KEY is not set; realtime sessions will fail to reach upstream");
        }

        let credentials = Arc::new(config.credentials());
        Arc::new(Self {
            config,
            credentials,
            shutdown: CancellationToken::new(),
            active_sessions: AtomicUsize::new(0),
        })
    }

    /// Number of relay sessions currently running.
    pub fn active_sessions(&self) -> usize {
        self.active_sessions.load(Ordering::SeqCst)
    }

    /// Count a session for as long as the returned guard lives.
    pub fn track_session(self: &Arc<Self>) -> SessionGuard {
        self.active_sessions.fetch_add(1, Ordering::SeqCst);
        SessionGuard {
            state: self.clone(),
        }
    }
}

/// Decrements the active session count on drop.
pub struct SessionGuard {
    state: Arc<AppState>,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.state.active_sessions.fetch_sub(1, Ordering::SeqCst);
    }
}
