//! Session persistence endpoints.

use crate::api::{parse_track, run_blocking, ApiError, TrackQuery};
use crate::middleware::CurrentUser;
use crate::AppState;
use axum::{
    extract::{Extension, Path, Query},
    Json,
};
use rehearse_store::{
    get_session, list_sessions, list_turns, persist_session, CreateSessionParams, NewTurn,
    Session, Turn,
};
use rehearse_types::{SessionStatus, Speaker, Track};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Request body for `POST /api/sessions`.
#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    /// Client-generated UUID; one is assigned when absent.
    #[serde(rename = "sessionId")]
    pub session_id: Option<String>,
    pub track: Track,
    #[serde(rename = "scenarioId")]
    pub scenario_id: Option<i64>,
    #[serde(rename = "startedAt")]
    pub started_at: String,
    #[serde(rename = "endedAt")]
    pub ended_at: Option<String>,
    #[serde(rename = "durationSeconds")]
    pub duration_seconds: i64,
    pub score: Option<f64>,
    #[serde(rename = "userTranscript", default)]
    pub user_transcript: String,
    #[serde(rename = "aiTranscript", default)]
    pub ai_transcript: String,
    /// Arbitrary session metadata; stored verbatim as JSON.
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
    #[serde(default)]
    pub turns: Vec<TurnPayload>,
}

/// A turn as submitted by the client.
#[derive(Debug, Deserialize)]
pub struct TurnPayload {
    #[serde(rename = "turnIndex")]
    pub turn_index: i64,
    pub speaker: Speaker,
    pub content: String,
    #[serde(rename = "offsetMs", default)]
    pub offset_ms: i64,
}

/// A session together with its turns.
#[derive(Debug, Serialize)]
pub struct SessionWithTurns {
    #[serde(flatten)]
    pub session: Session,
    pub turns: Vec<Turn>,
}

/// Handler for `POST /api/sessions`.
///
/// Persists a finished session in one shot: the session record plus its
/// recorded turns. The owning user comes from the bearer token, never
/// the body.
pub async fn create_session_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(payload): Json<CreateSessionRequest>,
) -> Result<Json<Session>, ApiError> {
    if payload.duration_seconds < 0 {
        return Err(ApiError::BadRequest(
            "durationSeconds must be non-negative".to_string(),
        ));
    }
    for turn in &payload.turns {
        if turn.turn_index < 0 {
            return Err(ApiError::BadRequest(
                "turnIndex must be non-negative".to_string(),
            ));
        }
    }

    let session_id = payload
        .session_id
        .clone()
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let metadata_json = match &payload.metadata {
        Some(value) => value.to_string(),
        None => "{}".to_string(),
    };

    let params = CreateSessionParams {
        session_id: session_id.clone(),
        user_id: user.user_id,
        track: payload.track,
        scenario_id: payload.scenario_id,
        started_at: payload.started_at,
        ended_at: payload.ended_at,
        duration_seconds: payload.duration_seconds,
        score: payload.score,
        user_transcript: payload.user_transcript,
        ai_transcript: payload.ai_transcript,
        metadata_json,
        status: SessionStatus::Closed,
    };

    let turns: Vec<NewTurn> = payload
        .turns
        .iter()
        .map(|t| NewTurn {
            turn_index: t.turn_index,
            speaker: t.speaker,
            content: t.content.clone(),
            offset_ms: t.offset_ms,
        })
        .collect();

    let session = run_blocking(move || {
        let conn = state
            .pool
            .get()
            .map_err(|e| ApiError::InternalServerError(format!("db connection failed: {e}")))?;
        persist_session(&conn, &params, &turns).map_err(|e| match e {
            rehearse_store::StoreError::Database(rusqlite::Error::SqliteFailure(err, msg))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                ApiError::Conflict(msg.unwrap_or_else(|| "constraint violation".to_string()))
            }
            other => other.into(),
        })?;
        Ok(get_session(&conn, &params.session_id)?)
    })
    .await?;

    Ok(Json(session))
}

/// Handler for `GET /api/sessions`.
pub async fn list_sessions_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(query): Query<TrackQuery>,
) -> Result<Json<Vec<Session>>, ApiError> {
    let track: Option<Track> = parse_track(query.track.as_deref())?;

    let sessions = run_blocking(move || {
        let conn = state
            .pool
            .get()
            .map_err(|e| ApiError::InternalServerError(format!("db connection failed: {e}")))?;
        Ok(list_sessions(&conn, &user.user_id, track)?)
    })
    .await?;

    Ok(Json(sessions))
}

/// Handler for `GET /api/sessions/{sessionId}`.
///
/// Another user's session reads as not-found rather than forbidden.
pub async fn get_session_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionWithTurns>, ApiError> {
    let result = run_blocking(move || {
        let conn = state
            .pool
            .get()
            .map_err(|e| ApiError::InternalServerError(format!("db connection failed: {e}")))?;
        let session = get_session(&conn, &session_id)?;
        if session.user_id != user.user_id {
            return Err(ApiError::NotFound(session_id));
        }
        let turns = list_turns(&conn, &session.session_id)?;
        Ok(SessionWithTurns { session, turns })
    })
    .await?;

    Ok(Json(result))
}
