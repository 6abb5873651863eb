//! Live-session transcript capture for the Rehearse platform.
//!
//! During a live simulation, speech-to-text fragments arrive tagged by
//! speaker. Each fragment is appended remotely as a numbered turn, and on
//! success the per-speaker running transcripts are extended locally.
//! Observers (the session UI flow) receive updates and failures as
//! [`CaptureEvent`]s over a broadcast channel.
//!
//! The capture state — turn counter, both transcript buffers, the active
//! flag — lives in a [`CaptureSession`] owned by the active flow and
//! passed by handle, never in ambient globals. The remote append is
//! abstracted behind the [`TurnSink`] trait so the persistence transport
//! can be swapped (pooled SQLite in production, scripted sinks in tests).

mod session;
mod sink;

pub use session::{CaptureEvent, CaptureSession, TRANSCRIPT_SEPARATOR};
pub use sink::{SinkError, TurnRecord, TurnSink};

use thiserror::Error;

/// Errors surfaced by capture operations.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// Append was attempted while capture is not active. Once `stop`
    /// runs, no further remote calls are issued.
    #[error("capture is not active for session {0}")]
    NotActive(String),

    /// The remote turn append failed. Local state is left unchanged.
    #[error("turn append failed: {0}")]
    Sink(#[from] SinkError),
}
