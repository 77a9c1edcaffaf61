pub mod api;
pub mod realtime;

use std::sync::Arc;

use axum::Router;

use crate::state::AppState;

/// Build the full application router with state applied.
pub fn create_app(state: Arc<AppState>) -> Router {
    api::create_api_router()
        .merge(realtime::create_realtime_router())
        .with_state(state)
}
