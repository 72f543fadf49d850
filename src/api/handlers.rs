//! HTTP endpoint handlers

use std::{convert::Infallible, sync::Arc};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        Json,
    },
};
use futures::stream::{self, Stream};
use tracing::{info, warn};

use crate::{error::CommandError, session::TimerSession, state::AppState};
use super::responses::{
    AddTimerRequest, ApiResponse, ErrorResponse, HealthResponse, RenameRequest, SessionResponse,
    SetTimeRequest,
};

type ApiError = (StatusCode, Json<ErrorResponse>);

fn rejected(e: CommandError) -> ApiError {
    warn!("Rejected command input: {}", e);
    (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(e.to_string())))
}

fn open_session(state: &AppState, session_id: &str) -> Result<Arc<TimerSession>, ApiError> {
    state.registry.get_or_open(session_id).map_err(rejected)
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse::ok(state.get_uptime(), state.registry.len()))
}

/// Handle GET /sessions/:session_id - Return the session's timers
pub async fn session_handler(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionResponse>, ApiError> {
    let session = open_session(&state, &session_id)?;
    Ok(Json(SessionResponse::from_session(&session)))
}

/// Handle GET /sessions/:session_id/events - Stream a snapshot on every change
pub async fn events_handler(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let session = open_session(&state, &session_id)?;
    info!("Projection view attached to session {}", session.id());

    // The stream holds the session so the idle sweeper leaves it open
    let updates = session.subscribe();
    let initial = (session, updates, true);
    let events = stream::unfold(initial, |(session, mut updates, first)| async move {
        if !first && updates.changed().await.is_err() {
            return None;
        }
        let timers = updates.borrow_and_update().clone();
        let payload = match serde_json::to_string(&timers) {
            Ok(payload) => payload,
            Err(e) => {
                warn!("Failed to serialize snapshot event: {}", e);
                "[]".to_string()
            }
        };
        let event = Event::default().event("snapshot").data(payload);
        Some((Ok::<_, Infallible>(event), (session, updates, false)))
    });

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}

/// Handle POST /sessions/:session_id/timers - Add a timer
pub async fn add_timer_handler(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
    Json(request): Json<AddTimerRequest>,
) -> Result<(StatusCode, Json<ApiResponse>), ApiError> {
    let session = open_session(&state, &session_id)?;
    let timer_id = session
        .add_timer(&request.name, request.minutes)
        .map_err(rejected)?;

    info!("Added timer {} to session {}", timer_id, session.id());
    Ok((StatusCode::CREATED, Json(ApiResponse::created(timer_id, &session))))
}

/// Handle DELETE /sessions/:session_id/timers/:timer_id - Remove a timer
pub async fn remove_timer_handler(
    State(state): State<Arc<AppState>>,
    Path((session_id, timer_id)): Path<(String, String)>,
) -> Result<Json<ApiResponse>, ApiError> {
    let session = open_session(&state, &session_id)?;
    session.remove_timer(&timer_id);
    Ok(Json(ApiResponse::ok("Timer removed", &session)))
}

/// Handle PUT /sessions/:session_id/timers/:timer_id/name - Rename a timer
pub async fn rename_timer_handler(
    State(state): State<Arc<AppState>>,
    Path((session_id, timer_id)): Path<(String, String)>,
    Json(request): Json<RenameRequest>,
) -> Result<Json<ApiResponse>, ApiError> {
    let session = open_session(&state, &session_id)?;
    session
        .rename_timer(&timer_id, &request.name)
        .map_err(rejected)?;
    Ok(Json(ApiResponse::ok("Timer renamed", &session)))
}

/// Handle POST /sessions/:session_id/timers/:timer_id/toggle - Start or pause a timer
pub async fn toggle_timer_handler(
    State(state): State<Arc<AppState>>,
    Path((session_id, timer_id)): Path<(String, String)>,
) -> Result<Json<ApiResponse>, ApiError> {
    let session = open_session(&state, &session_id)?;
    session.toggle_timer(&timer_id);
    Ok(Json(ApiResponse::ok("Timer toggled", &session)))
}

/// Handle POST /sessions/:session_id/timers/:timer_id/reset - Reset a timer
pub async fn reset_timer_handler(
    State(state): State<Arc<AppState>>,
    Path((session_id, timer_id)): Path<(String, String)>,
) -> Result<Json<ApiResponse>, ApiError> {
    let session = open_session(&state, &session_id)?;
    session.reset_timer(&timer_id);
    Ok(Json(ApiResponse::ok("Timer reset", &session)))
}

/// Handle PUT /sessions/:session_id/timers/:timer_id/time - Set remaining seconds
pub async fn set_time_handler(
    State(state): State<Arc<AppState>>,
    Path((session_id, timer_id)): Path<(String, String)>,
    Json(request): Json<SetTimeRequest>,
) -> Result<Json<ApiResponse>, ApiError> {
    let session = open_session(&state, &session_id)?;
    session.set_time(&timer_id, request.seconds);
    Ok(Json(ApiResponse::ok("Timer time set", &session)))
}

/// Handle POST /sessions/:session_id/reset-all - Reset every timer
pub async fn reset_all_handler(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<ApiResponse>, ApiError> {
    let session = open_session(&state, &session_id)?;
    session.reset_all();
    Ok(Json(ApiResponse::ok("All timers reset", &session)))
}

/// Handle POST /sessions/:session_id/pause-all - Pause every timer
pub async fn pause_all_handler(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<ApiResponse>, ApiError> {
    let session = open_session(&state, &session_id)?;
    session.pause_all();
    Ok(Json(ApiResponse::ok("All timers paused", &session)))
}

/// Handle DELETE /sessions/:session_id - Close this server's replica of a session
pub async fn close_session_handler(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> StatusCode {
    if state.registry.close(&session_id) {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}
