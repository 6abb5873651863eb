//! Session and turn persistence for the Rehearse platform.
//!
//! Implements session writes, turn batch/append writes, history queries,
//! the scenario catalog reads, and user lookup for the auth layer. All
//! operations are plain functions over a `rusqlite::Connection`; callers
//! running inside async handlers move the work onto a blocking thread.
//!
//! Persisting a finished session is deliberately *not* transactional
//! across the session insert and the turns batch: the session record is
//! written first, and a subsequent turns failure propagates to the caller
//! while the session row survives. This mirrors the two-phase write the
//! UI performs and keeps the deferred score backfill path simple.

use rehearse_types::{SessionStatus, Speaker, Track};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod scenario;
pub mod user;

pub use scenario::list_scenarios;
pub use user::{get_user, User};

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("session not found: {0}")]
    NotFound(String),
    #[error("corrupt column value: {0}")]
    CorruptColumn(String),
    #[error("json serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A persisted training session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    /// Internal database ID.
    pub id: i64,
    /// Public session identifier (UUID).
    #[serde(rename = "sessionId")]
    pub session_id: String,
    /// Owning user.
    #[serde(rename = "userId")]
    pub user_id: String,
    /// Scenario track this session practiced.
    pub track: Track,
    /// Catalog scenario, if the session came from one.
    #[serde(rename = "scenarioId")]
    pub scenario_id: Option<i64>,
    /// Start timestamp (ISO 8601).
    #[serde(rename = "startedAt")]
    pub started_at: String,
    /// End timestamp (ISO 8601), absent while the session is open.
    #[serde(rename = "endedAt")]
    pub ended_at: Option<String>,
    /// Wall-clock duration. Never negative.
    #[serde(rename = "durationSeconds")]
    pub duration_seconds: i64,
    /// Overall rubric score. Absent means ungraded.
    pub score: Option<f64>,
    /// Accumulated trainee transcript.
    #[serde(rename = "userTranscript")]
    pub user_transcript: String,
    /// Accumulated AI-counterpart transcript.
    #[serde(rename = "aiTranscript")]
    pub ai_transcript: String,
    /// Arbitrary session metadata as a JSON object string.
    #[serde(rename = "metadataJson")]
    pub metadata_json: String,
    /// Lifecycle state.
    pub status: SessionStatus,
    /// Row creation timestamp (ISO 8601).
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

/// A persisted turn within a session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Turn {
    /// Internal database ID.
    pub id: i64,
    /// Owning session (public ID).
    #[serde(rename = "sessionId")]
    pub session_id: String,
    /// Position within the session; unique and strictly increasing.
    #[serde(rename = "turnIndex")]
    pub turn_index: i64,
    /// Who spoke.
    pub speaker: Speaker,
    /// Utterance text.
    pub content: String,
    /// Milliseconds since session start.
    #[serde(rename = "offsetMs")]
    pub offset_ms: i64,
}

/// Parameters for inserting a new session record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSessionParams {
    pub session_id: String,
    pub user_id: String,
    pub track: Track,
    pub scenario_id: Option<i64>,
    pub started_at: String,
    pub ended_at: Option<String>,
    pub duration_seconds: i64,
    pub score: Option<f64>,
    pub user_transcript: String,
    pub ai_transcript: String,
    pub metadata_json: String,
    pub status: SessionStatus,
}

/// A turn to be written, before it has a database ID.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTurn {
    pub turn_index: i64,
    pub speaker: Speaker,
    pub content: String,
    pub offset_ms: i64,
}

/// Inserts one session record.
pub fn insert_session(conn: &Connection, params: &CreateSessionParams) -> Result<i64, StoreError> {
    conn.execute(
        "INSERT INTO sessions (
            session_id, user_id, track, scenario_id, started_at, ended_at,
            duration_seconds, score, user_transcript, ai_transcript,
            metadata_json, status
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            params.session_id,
            params.user_id,
            params.track.as_str(),
            params.scenario_id,
            params.started_at,
            params.ended_at,
            params.duration_seconds,
            params.score,
            params.user_transcript,
            params.ai_transcript,
            params.metadata_json,
            params.status.as_str(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Batch-inserts turns for an existing session.
///
/// The batch itself runs in a transaction so a half-written batch never
/// survives, but the caller's earlier session insert is not rolled back
/// on failure here.
pub fn insert_turns(
    conn: &Connection,
    session_id: &str,
    turns: &[NewTurn],
) -> Result<usize, StoreError> {
    let tx = conn.unchecked_transaction()?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO turns (session_id, turn_index, speaker, content, offset_ms)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        for turn in turns {
            stmt.execute(params![
                session_id,
                turn.turn_index,
                turn.speaker.as_str(),
                turn.content,
                turn.offset_ms,
            ])?;
        }
    }
    tx.commit()?;
    Ok(turns.len())
}

/// Persists a finished session together with its turns.
///
/// The session record is inserted first; if `turns` is non-empty they are
/// batch-inserted afterwards. A turns failure propagates as-is — no
/// compensating delete of the session row is attempted.
pub fn persist_session(
    conn: &Connection,
    params: &CreateSessionParams,
    turns: &[NewTurn],
) -> Result<i64, StoreError> {
    let row_id = insert_session(conn, params)?;
    if !turns.is_empty() {
        insert_turns(conn, &params.session_id, turns)?;
    }
    tracing::debug!(
        session_id = %params.session_id,
        turns = turns.len(),
        "persisted session"
    );
    Ok(row_id)
}

/// Appends a single turn to a live session. Used by the capture pipeline.
pub fn append_turn(conn: &Connection, session_id: &str, turn: &NewTurn) -> Result<i64, StoreError> {
    conn.execute(
        "INSERT INTO turns (session_id, turn_index, speaker, content, offset_ms)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            session_id,
            turn.turn_index,
            turn.speaker.as_str(),
            turn.content,
            turn.offset_ms,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Deletes every turn row recorded for a session.
///
/// Discarding a take frees the turn indices so the next capture on the
/// same session can begin again at index zero.
pub fn delete_turns(conn: &Connection, session_id: &str) -> Result<usize, StoreError> {
    let deleted = conn.execute("DELETE FROM turns WHERE session_id = ?1", params![session_id])?;
    Ok(deleted)
}

/// Backfills the overall score on an already-persisted session.
///
/// Deferred grading writes the score after the record exists; nothing
/// else about a closed session is ever rewritten.
pub fn backfill_score(conn: &Connection, session_id: &str, score: f64) -> Result<(), StoreError> {
    let updated = conn.execute(
        "UPDATE sessions SET score = ?1 WHERE session_id = ?2",
        params![score, session_id],
    )?;
    if updated == 0 {
        return Err(StoreError::NotFound(session_id.to_string()));
    }
    Ok(())
}

/// Closes an open session: end timestamp, duration, final transcripts.
///
/// The live-capture flow opens the row at start and calls this at stop.
pub fn close_session(
    conn: &Connection,
    session_id: &str,
    ended_at: &str,
    duration_seconds: i64,
    user_transcript: &str,
    ai_transcript: &str,
) -> Result<(), StoreError> {
    let updated = conn.execute(
        "UPDATE sessions
         SET ended_at = ?2, duration_seconds = ?3,
             user_transcript = ?4, ai_transcript = ?5, status = 'closed'
         WHERE session_id = ?1",
        params![
            session_id,
            ended_at,
            duration_seconds,
            user_transcript,
            ai_transcript,
        ],
    )?;
    if updated == 0 {
        return Err(StoreError::NotFound(session_id.to_string()));
    }
    Ok(())
}

/// Retrieves a session by its public ID.
pub fn get_session(conn: &Connection, session_id: &str) -> Result<Session, StoreError> {
    conn.query_row(
        "SELECT
            id, session_id, user_id, track, scenario_id, started_at, ended_at,
            duration_seconds, score, user_transcript, ai_transcript,
            metadata_json, status, created_at
        FROM sessions WHERE session_id = ?1",
        [session_id],
        map_row_to_session,
    )
    .optional()?
    .ok_or_else(|| StoreError::NotFound(session_id.to_string()))
    .and_then(finish_session_row)
}

/// Lists a user's sessions, newest first, optionally filtered by track.
pub fn list_sessions(
    conn: &Connection,
    user_id: &str,
    track: Option<Track>,
) -> Result<Vec<Session>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT
            id, session_id, user_id, track, scenario_id, started_at, ended_at,
            duration_seconds, score, user_transcript, ai_transcript,
            metadata_json, status, created_at
        FROM sessions
        WHERE user_id = ?1 AND (?2 IS NULL OR track = ?2)
        ORDER BY created_at DESC, id DESC",
    )?;

    let rows = stmt.query_map(
        params![user_id, track.map(|t| t.as_str())],
        map_row_to_session,
    )?;
    let mut sessions = Vec::new();
    for row in rows {
        sessions.push(finish_session_row(row?)?);
    }
    Ok(sessions)
}

/// Lists a session's turns ordered by index.
pub fn list_turns(conn: &Connection, session_id: &str) -> Result<Vec<Turn>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT id, session_id, turn_index, speaker, content, offset_ms
         FROM turns WHERE session_id = ?1 ORDER BY turn_index ASC",
    )?;

    let rows = stmt.query_map([session_id], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, i64>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
            row.get::<_, i64>(5)?,
        ))
    })?;

    let mut turns = Vec::new();
    for row in rows {
        let (id, session_id, turn_index, speaker, content, offset_ms) = row?;
        let speaker = speaker
            .parse::<Speaker>()
            .map_err(|e| StoreError::CorruptColumn(e.to_string()))?;
        turns.push(Turn {
            id,
            session_id,
            turn_index,
            speaker,
            content,
            offset_ms,
        });
    }
    Ok(turns)
}

/// Raw session row before the track/status labels have been parsed.
struct SessionRow {
    session: Session,
    track_label: String,
    status_label: String,
}

fn map_row_to_session(row: &Row<'_>) -> rusqlite::Result<SessionRow> {
    Ok(SessionRow {
        session: Session {
            id: row.get(0)?,
            session_id: row.get(1)?,
            user_id: row.get(2)?,
            // Placeholder until the label is parsed below.
            track: Track::Hr,
            scenario_id: row.get(4)?,
            started_at: row.get(5)?,
            ended_at: row.get(6)?,
            duration_seconds: row.get(7)?,
            score: row.get(8)?,
            user_transcript: row.get(9)?,
            ai_transcript: row.get(10)?,
            metadata_json: row.get(11)?,
            status: SessionStatus::Open,
            created_at: row.get(13)?,
        },
        track_label: row.get(3)?,
        status_label: row.get(12)?,
    })
}

fn finish_session_row(raw: SessionRow) -> Result<Session, StoreError> {
    let mut session = raw.session;
    session.track = raw
        .track_label
        .parse()
        .map_err(|e: rehearse_types::ParseTrackError| StoreError::CorruptColumn(e.to_string()))?;
    session.status = raw.status_label.parse().map_err(
        |e: rehearse_types::ParseSessionStatusError| StoreError::CorruptColumn(e.to_string()),
    )?;
    Ok(session)
}
