//! The capture lifecycle object.

use crate::sink::{TurnRecord, TurnSink};
use crate::CaptureError;
use rehearse_types::Speaker;
use std::time::Instant;
use tokio::sync::broadcast;

/// Separator prepended before each fragment in the running transcripts.
pub const TRANSCRIPT_SEPARATOR: &str = "\n";

/// Capacity of the per-session capture event channel.
const CAPTURE_EVENT_CAPACITY: usize = 256;

/// Event emitted after each append attempt.
#[derive(Debug, Clone)]
pub enum CaptureEvent {
    /// A fragment was appended remotely and folded into the local
    /// transcripts. Carries the latest concatenation of both.
    Appended {
        turn_index: i64,
        speaker: Speaker,
        user_transcript: String,
        ai_transcript: String,
    },
    /// The remote append failed; local state was left unchanged.
    AppendFailed { error: String },
}

/// Per-session capture state: turn counter, transcript buffers, and the
/// active flag.
///
/// Lifecycle is two-phase: `start` marks the session capturing and
/// resets the counter; `stop` marks it idle without clearing buffers;
/// `clear` empties the buffers and resets the counter. Appends are only
/// accepted while capturing — this is the abort mechanism: after `stop`,
/// no further remote calls are issued.
///
/// Fragments racing in from the host speech recognizer are serialized by
/// the caller (one append at a time per session); no reordering or
/// deduplication is attempted, so out-of-order delivery yields indices
/// that do not reflect chronology.
#[derive(Debug)]
pub struct CaptureSession {
    session_id: String,
    active: bool,
    next_index: i64,
    started_at: Option<Instant>,
    user_transcript: String,
    ai_transcript: String,
    events_tx: broadcast::Sender<CaptureEvent>,
}

impl CaptureSession {
    /// Creates an idle capture session for the given session ID.
    pub fn new(session_id: impl Into<String>) -> Self {
        let (events_tx, _) = broadcast::channel(CAPTURE_EVENT_CAPACITY);
        Self {
            session_id: session_id.into(),
            active: false,
            next_index: 0,
            started_at: None,
            user_transcript: String::new(),
            ai_transcript: String::new(),
            events_tx,
        }
    }

    /// Marks the session capturing and resets the turn counter.
    ///
    /// Buffers are not cleared here; a stopped-and-restarted capture
    /// continues accumulating on top of what `stop` left behind unless
    /// the caller runs `clear` first.
    pub fn start(&mut self) {
        self.active = true;
        self.next_index = 0;
        self.started_at = Some(Instant::now());
        tracing::debug!(session_id = %self.session_id, "capture started");
    }

    /// Marks the session idle. Buffers are kept.
    pub fn stop(&mut self) {
        self.active = false;
        tracing::debug!(session_id = %self.session_id, "capture stopped");
    }

    /// Milliseconds since the last `start`, 0 if never started.
    pub fn elapsed_ms(&self) -> i64 {
        self.started_at
            .map(|t| t.elapsed().as_millis() as i64)
            .unwrap_or(0)
    }

    /// Empties both transcripts and resets the turn counter.
    pub fn clear(&mut self) {
        self.user_transcript.clear();
        self.ai_transcript.clear();
        self.next_index = 0;
    }

    /// Appends one speech fragment: remote write first, local fold-in on
    /// success.
    ///
    /// On sink failure the error is broadcast as
    /// [`CaptureEvent::AppendFailed`] and returned; the counter and both
    /// buffers are untouched, and the fragment is dropped (no retry).
    pub async fn append(
        &mut self,
        sink: &dyn TurnSink,
        speaker: Speaker,
        fragment: &str,
    ) -> Result<i64, CaptureError> {
        if !self.active {
            return Err(CaptureError::NotActive(self.session_id.clone()));
        }

        let offset_ms = self
            .started_at
            .map(|t| t.elapsed().as_millis() as i64)
            .unwrap_or(0);

        let record = TurnRecord {
            session_id: self.session_id.clone(),
            turn_index: self.next_index,
            speaker,
            content: fragment.to_string(),
            offset_ms,
        };

        if let Err(e) = sink.append_turn(&record).await {
            tracing::warn!(
                session_id = %self.session_id,
                turn_index = record.turn_index,
                "turn append failed: {}",
                e
            );
            let _ = self.events_tx.send(CaptureEvent::AppendFailed {
                error: e.to_string(),
            });
            return Err(CaptureError::Sink(e));
        }

        let turn_index = self.next_index;
        self.next_index += 1;

        let buffer = match speaker {
            Speaker::User => &mut self.user_transcript,
            Speaker::Ai => &mut self.ai_transcript,
        };
        buffer.push_str(TRANSCRIPT_SEPARATOR);
        buffer.push_str(fragment);

        let _ = self.events_tx.send(CaptureEvent::Appended {
            turn_index,
            speaker,
            user_transcript: self.user_transcript.clone(),
            ai_transcript: self.ai_transcript.clone(),
        });

        Ok(turn_index)
    }

    /// Subscribes to append events from this session.
    pub fn subscribe(&self) -> broadcast::Receiver<CaptureEvent> {
        self.events_tx.subscribe()
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn next_index(&self) -> i64 {
        self.next_index
    }

    pub fn user_transcript(&self) -> &str {
        &self.user_transcript
    }

    pub fn ai_transcript(&self) -> &str {
        &self.ai_transcript
    }
}
