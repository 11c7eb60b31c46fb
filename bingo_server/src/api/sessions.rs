//! Session management API handlers.
//!
//! Operators schedule sessions, start them, call numbers and end them here.
//! Every mutation is also pushed to WebSocket viewers by the session actor.
//!
//! # Examples
//!
//! Schedule a session:
//! ```bash
//! curl -X POST http://localhost:6969/api/v1/sessions \
//!   -H "Content-Type: application/json" \
//!   -d '{"title": "Friday Bingo", "scheduled_start": "2025-06-06T14:00:00Z", "winning_pattern": "four_corners"}'
//! ```
//!
//! Call the next number:
//! ```bash
//! curl -X POST http://localhost:6969/api/v1/sessions/1/call-number
//! ```

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use care_bingo::{
    session::{GameSession, NumberCall, SessionId},
    win::WinPattern,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::{AppState, error::ApiError};
use crate::{logging, metrics};

#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    pub title: String,
    pub scheduled_start: DateTime<Utc>,
    /// Pattern name; aliases such as `line` and `full_house` are accepted
    pub winning_pattern: Option<String>,
}

/// List all sessions, latest scheduled start first.
pub async fn list_sessions(
    State(state): State<AppState>,
) -> Result<Json<Vec<GameSession>>, ApiError> {
    Ok(Json(state.sessions.list_sessions().await?))
}

/// Schedule a new session.
///
/// # Errors
///
/// - `400 Bad Request`: Empty title or unknown pattern
pub async fn create_session(
    State(state): State<AppState>,
    Json(request): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<GameSession>), ApiError> {
    let pattern = match request.winning_pattern.as_deref() {
        Some(name) => name.parse::<WinPattern>()?,
        None => WinPattern::default(),
    };

    let session = state
        .sessions
        .create_session(&request.title, request.scheduled_start, pattern)
        .await?;

    metrics::active_sessions(state.sessions.session_count().await);
    Ok((StatusCode::CREATED, Json(session)))
}

/// Earliest upcoming scheduled session, or `null`.
pub async fn next_session(
    State(state): State<AppState>,
) -> Result<Json<Option<GameSession>>, ApiError> {
    Ok(Json(state.sessions.next_scheduled(Utc::now()).await?))
}

/// The session currently calling numbers, or `null`.
pub async fn active_session(
    State(state): State<AppState>,
) -> Result<Json<Option<GameSession>>, ApiError> {
    Ok(Json(state.sessions.active_session().await?))
}

/// Get a session snapshot.
///
/// # Errors
///
/// - `404 Not Found`: Session doesn't exist
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
) -> Result<Json<GameSession>, ApiError> {
    Ok(Json(state.sessions.get_snapshot(session_id).await?))
}

/// Start a scheduled session ahead of its start time.
///
/// # Errors
///
/// - `404 Not Found`: Session doesn't exist
/// - `409 Conflict`: Session is not scheduled
pub async fn activate_session(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
) -> Result<Json<GameSession>, ApiError> {
    let session = state.sessions.activate(session_id).await?;
    logging::log_operator_action(session_id, "activate", session.called_numbers.len());
    Ok(Json(session))
}

/// Draw the next number.
///
/// # Response
///
/// Returns `200 OK` with the ball and the updated session:
/// ```json
/// { "ball": 42, "session": { "id": 1, "status": "active", "called_numbers": [7, 42], ... } }
/// ```
///
/// # Errors
///
/// - `409 Conflict`: Session not active, or every ball has been called (`exhausted_pool`)
pub async fn call_number(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
) -> Result<Json<NumberCall>, ApiError> {
    let call = state.sessions.call_next_number(session_id).await?;
    metrics::numbers_called_total();
    logging::log_operator_action(session_id, "call_number", call.session.called_numbers.len());
    Ok(Json(call))
}

/// End a session, or cancel it before it starts.
///
/// # Errors
///
/// - `409 Conflict`: Session already completed
pub async fn complete_session(
    State(state): State<AppState>,
    Path(session_id): Path<SessionId>,
) -> Result<Json<GameSession>, ApiError> {
    let session = state.sessions.complete(session_id).await?;
    logging::log_operator_action(session_id, "complete", session.called_numbers.len());
    Ok(Json(session))
}
