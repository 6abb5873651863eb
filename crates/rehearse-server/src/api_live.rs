//! Live capture endpoints: the start/fragments/stop/clear lifecycle
//! over the in-memory capture registry.

use crate::api::{run_blocking, ApiError};
use crate::middleware::CurrentUser;
use crate::AppState;
use async_trait::async_trait;
use axum::{
    extract::{Extension, Path},
    Json,
};
use rehearse_capture::{CaptureError, CaptureSession, SinkError, TurnRecord, TurnSink};
use rehearse_db::DbPool;
use rehearse_store::{
    append_turn, close_session, delete_turns, get_session, insert_session, CreateSessionParams,
    NewTurn, StoreError,
};
use rehearse_types::{SessionStatus, Speaker, Track};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Production turn sink: writes each fragment through the session store
/// on a pooled connection.
pub struct StoreTurnSink {
    pool: DbPool,
}

impl StoreTurnSink {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TurnSink for StoreTurnSink {
    async fn append_turn(&self, turn: &TurnRecord) -> Result<(), SinkError> {
        let pool = self.pool.clone();
        let session_id = turn.session_id.clone();
        let new_turn = NewTurn {
            turn_index: turn.turn_index,
            speaker: turn.speaker,
            content: turn.content.clone(),
            offset_ms: turn.offset_ms,
        };

        tokio::task::spawn_blocking(move || {
            let conn = pool
                .get()
                .map_err(|e| SinkError(format!("db connection failed: {e}")))?;
            append_turn(&conn, &session_id, &new_turn)
                .map(|_| ())
                .map_err(|e| SinkError(e.to_string()))
        })
        .await
        .map_err(|e| SinkError(format!("task join error: {e}")))?
    }
}

/// Request body for `POST /api/live/{sessionId}/start`.
#[derive(Debug, Deserialize)]
pub struct StartLiveRequest {
    pub track: Track,
    #[serde(rename = "scenarioId")]
    pub scenario_id: Option<i64>,
}

/// Capture state echoed by the lifecycle endpoints.
#[derive(Debug, Serialize)]
pub struct LiveStateResponse {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    pub active: bool,
    #[serde(rename = "nextIndex")]
    pub next_index: i64,
    #[serde(rename = "userTranscript")]
    pub user_transcript: String,
    #[serde(rename = "aiTranscript")]
    pub ai_transcript: String,
}

impl LiveStateResponse {
    fn from_session(capture: &CaptureSession) -> Self {
        Self {
            session_id: capture.session_id().to_string(),
            active: capture.is_active(),
            next_index: capture.next_index(),
            user_transcript: capture.user_transcript().to_string(),
            ai_transcript: capture.ai_transcript().to_string(),
        }
    }
}

/// Request body for `POST /api/live/{sessionId}/fragments`.
#[derive(Debug, Deserialize)]
pub struct FragmentRequest {
    pub speaker: Speaker,
    pub content: String,
}

/// Response body for a successful fragment append.
#[derive(Debug, Serialize)]
pub struct FragmentResponse {
    #[serde(rename = "turnIndex")]
    pub turn_index: i64,
    #[serde(rename = "userTranscript")]
    pub user_transcript: String,
    #[serde(rename = "aiTranscript")]
    pub ai_transcript: String,
}

/// Response body for `POST /api/live/{sessionId}/stop`.
#[derive(Debug, Serialize)]
pub struct StopLiveResponse {
    #[serde(rename = "sessionId")]
    pub session_id: String,
    pub status: SessionStatus,
    #[serde(rename = "durationSeconds")]
    pub duration_seconds: i64,
    #[serde(rename = "userTranscript")]
    pub user_transcript: String,
    #[serde(rename = "aiTranscript")]
    pub ai_transcript: String,
}

/// Fetches the capture handle for a session, if one is registered.
fn capture_handle(
    state: &AppState,
    session_id: &str,
) -> Result<Arc<Mutex<CaptureSession>>, ApiError> {
    let registry = state
        .captures
        .read()
        .map_err(|_| ApiError::InternalServerError("capture registry lock poisoned".to_string()))?;
    registry
        .get(session_id)
        .cloned()
        .ok_or_else(|| ApiError::NotFound(format!("no live capture for session {session_id}")))
}

/// Fetches the capture handle after confirming the session row belongs
/// to the caller. Someone else's capture answers the same 404 as a
/// missing one.
async fn owned_capture_handle(
    state: &AppState,
    session_id: &str,
    user_id: &str,
) -> Result<Arc<Mutex<CaptureSession>>, ApiError> {
    let handle = capture_handle(state, session_id)?;

    let pool = state.pool.clone();
    let row_session_id = session_id.to_string();
    let caller = user_id.to_string();
    run_blocking(move || {
        let conn = pool
            .get()
            .map_err(|e| ApiError::InternalServerError(format!("db connection failed: {e}")))?;
        let session = get_session(&conn, &row_session_id)?;
        if session.user_id != caller {
            return Err(ApiError::NotFound(row_session_id));
        }
        Ok(())
    })
    .await?;

    Ok(handle)
}

/// Handler for `POST /api/live/{sessionId}/start`.
///
/// Opens the session row (so turn appends satisfy the foreign key) and
/// marks the capture active with a fresh turn counter. Restarting an
/// existing capture resets the counter but keeps accumulated
/// transcripts; `clear` empties them.
pub async fn start_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(session_id): Path<String>,
    Json(payload): Json<StartLiveRequest>,
) -> Result<Json<LiveStateResponse>, ApiError> {
    let user_id = user.user_id.clone();
    let pool = state.pool.clone();
    let row_session_id = session_id.clone();

    run_blocking(move || {
        let conn = pool
            .get()
            .map_err(|e| ApiError::InternalServerError(format!("db connection failed: {e}")))?;
        match get_session(&conn, &row_session_id) {
            Ok(existing) => {
                if existing.user_id != user_id {
                    return Err(ApiError::NotFound(row_session_id));
                }
                Ok(())
            }
            Err(StoreError::NotFound(_)) => {
                let params = CreateSessionParams {
                    session_id: row_session_id.clone(),
                    user_id,
                    track: payload.track,
                    scenario_id: payload.scenario_id,
                    started_at: chrono::Utc::now().to_rfc3339(),
                    ended_at: None,
                    duration_seconds: 0,
                    score: None,
                    user_transcript: String::new(),
                    ai_transcript: String::new(),
                    metadata_json: "{}".to_string(),
                    status: SessionStatus::Open,
                };
                insert_session(&conn, &params)?;
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    })
    .await?;

    let handle = {
        let mut registry = state.captures.write().map_err(|_| {
            ApiError::InternalServerError("capture registry lock poisoned".to_string())
        })?;
        registry
            .entry(session_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(CaptureSession::new(session_id.clone()))))
            .clone()
    };

    let mut capture = handle.lock().await;
    capture.start();
    tracing::info!(session_id = %session_id, "live capture started");

    Ok(Json(LiveStateResponse::from_session(&capture)))
}

/// Handler for `POST /api/live/{sessionId}/fragments`.
///
/// Remote write first, local fold-in on success. A fragment arriving
/// after `stop` is refused with 409 and never reaches the store.
pub async fn append_fragment_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(session_id): Path<String>,
    Json(payload): Json<FragmentRequest>,
) -> Result<Json<FragmentResponse>, ApiError> {
    let handle = owned_capture_handle(&state, &session_id, &user.user_id).await?;
    let sink = StoreTurnSink::new(state.pool.clone());

    let mut capture = handle.lock().await;
    let turn_index = capture
        .append(&sink, payload.speaker, &payload.content)
        .await
        .map_err(|e| match e {
            CaptureError::NotActive(id) => {
                ApiError::Conflict(format!("capture is not active for session {id}"))
            }
            CaptureError::Sink(err) => ApiError::InternalServerError(err.to_string()),
        })?;

    Ok(Json(FragmentResponse {
        turn_index,
        user_transcript: capture.user_transcript().to_string(),
        ai_transcript: capture.ai_transcript().to_string(),
    }))
}

/// Handler for `POST /api/live/{sessionId}/stop`.
///
/// Deactivates the capture and closes the session row with the final
/// transcripts. The registry entry stays so the transcripts remain
/// inspectable until `clear`.
pub async fn stop_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(session_id): Path<String>,
) -> Result<Json<StopLiveResponse>, ApiError> {
    let handle = owned_capture_handle(&state, &session_id, &user.user_id).await?;

    let (duration_seconds, user_transcript, ai_transcript) = {
        let mut capture = handle.lock().await;
        capture.stop();
        (
            capture.elapsed_ms() / 1000,
            capture.user_transcript().to_string(),
            capture.ai_transcript().to_string(),
        )
    };

    let pool = state.pool.clone();
    let row_session_id = session_id.clone();
    let row_user = user_transcript.clone();
    let row_ai = ai_transcript.clone();
    run_blocking(move || {
        let conn = pool
            .get()
            .map_err(|e| ApiError::InternalServerError(format!("db connection failed: {e}")))?;
        close_session(
            &conn,
            &row_session_id,
            &chrono::Utc::now().to_rfc3339(),
            duration_seconds,
            &row_user,
            &row_ai,
        )?;
        Ok(())
    })
    .await?;

    tracing::info!(session_id = %session_id, duration_seconds, "live capture stopped");

    Ok(Json(StopLiveResponse {
        session_id,
        status: SessionStatus::Closed,
        duration_seconds,
        user_transcript,
        ai_transcript,
    }))
}

/// Handler for `POST /api/live/{sessionId}/clear`.
///
/// Discards the take: empties both transcript buffers, resets the turn
/// counter, and deletes the session's turn rows so the next capture
/// begins again at index 0. The capture lock is held across the delete
/// so no fragment can land between the reset and the row purge.
pub async fn clear_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(session_id): Path<String>,
) -> Result<Json<LiveStateResponse>, ApiError> {
    let handle = owned_capture_handle(&state, &session_id, &user.user_id).await?;

    let mut capture = handle.lock().await;
    capture.clear();

    let pool = state.pool.clone();
    let row_session_id = session_id.clone();
    let deleted = run_blocking(move || {
        let conn = pool
            .get()
            .map_err(|e| ApiError::InternalServerError(format!("db connection failed: {e}")))?;
        Ok(delete_turns(&conn, &row_session_id)?)
    })
    .await?;
    tracing::debug!(session_id = %session_id, deleted, "live capture cleared");

    Ok(Json(LiveStateResponse::from_session(&capture)))
}
