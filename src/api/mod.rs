//! HTTP API module
//!
//! Control views issue commands here; projection views read the session or
//! follow its snapshot stream.

pub mod handlers;
pub mod responses;

use std::sync::Arc;
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use handlers::*;

/// Create the HTTP router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/sessions/:session_id", get(session_handler).delete(close_session_handler))
        .route("/sessions/:session_id/events", get(events_handler))
        .route("/sessions/:session_id/timers", post(add_timer_handler))
        .route("/sessions/:session_id/timers/:timer_id", delete(remove_timer_handler))
        .route("/sessions/:session_id/timers/:timer_id/name", put(rename_timer_handler))
        .route("/sessions/:session_id/timers/:timer_id/toggle", post(toggle_timer_handler))
        .route("/sessions/:session_id/timers/:timer_id/reset", post(reset_timer_handler))
        .route("/sessions/:session_id/timers/:timer_id/time", put(set_time_handler))
        .route("/sessions/:session_id/reset-all", post(reset_all_handler))
        .route("/sessions/:session_id/pause-all", post(pause_all_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
