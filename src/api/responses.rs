//! API response structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{session::TimerSession, state::TimerRecord};

/// A timer as shown to control and projection views
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerView {
    #[serde(flatten)]
    pub record: TimerRecord,
    /// Remaining seconds to display right now
    pub display_time: u64,
    /// Share of the countdown left, 0 to 100
    pub remaining_percent: f64,
}

/// Full view of one session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub session_id: String,
    pub connected: bool,
    pub running: usize,
    pub finished: usize,
    pub timers: Vec<TimerView>,
    pub timestamp: DateTime<Utc>,
}

impl SessionResponse {
    pub fn from_session(session: &TimerSession) -> Self {
        let timers: Vec<TimerView> = session
            .timers()
            .into_iter()
            .map(|record| {
                let display_time = session.displayed_time(&record);
                TimerView {
                    display_time,
                    remaining_percent: record.remaining_ratio(display_time) * 100.0,
                    record,
                }
            })
            .collect();

        Self {
            session_id: session.id().to_string(),
            connected: session.is_connected(),
            running: timers.iter().filter(|t| t.record.is_running()).count(),
            finished: timers.iter().filter(|t| t.record.is_finished()).count(),
            timers,
            timestamp: Utc::now(),
        }
    }
}

/// Response for command endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    pub status: String,
    pub message: String,
    /// Id of the timer a command created
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timer_id: Option<String>,
    pub session: SessionResponse,
}

impl ApiResponse {
    pub fn ok(message: impl Into<String>, session: &TimerSession) -> Self {
        Self {
            status: "ok".to_string(),
            message: message.into(),
            timer_id: None,
            session: SessionResponse::from_session(session),
        }
    }

    pub fn created(timer_id: String, session: &TimerSession) -> Self {
        Self {
            timer_id: Some(timer_id),
            ..Self::ok("Timer added", session)
        }
    }
}

/// Error body for rejected requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
    pub uptime: String,
    pub sessions: usize,
}

impl HealthResponse {
    pub fn ok(uptime: String, sessions: usize) -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime,
            sessions,
        }
    }
}

/// Body of POST /sessions/:session_id/timers
#[derive(Debug, Clone, Deserialize)]
pub struct AddTimerRequest {
    pub name: String,
    #[serde(default = "default_minutes")]
    pub minutes: i64,
}

fn default_minutes() -> i64 {
    5
}

/// Body of PUT /sessions/:session_id/timers/:timer_id/name
#[derive(Debug, Clone, Deserialize)]
pub struct RenameRequest {
    pub name: String,
}

/// Body of PUT /sessions/:session_id/timers/:timer_id/time
#[derive(Debug, Clone, Deserialize)]
pub struct SetTimeRequest {
    pub seconds: i64,
}
