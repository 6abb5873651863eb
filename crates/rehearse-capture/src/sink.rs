//! The remote append seam.

use async_trait::async_trait;
use rehearse_types::Speaker;
use thiserror::Error;

/// A turn as handed to the sink, before it has a database identity.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnRecord {
    /// Public session ID the turn belongs to.
    pub session_id: String,
    /// Position assigned by the capture counter.
    pub turn_index: i64,
    /// Speaker tag.
    pub speaker: Speaker,
    /// Fragment text.
    pub content: String,
    /// Milliseconds since capture start.
    pub offset_ms: i64,
}

/// Error from a sink append.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct SinkError(pub String);

/// Destination for captured turns.
///
/// Production wires this to the session store; tests script it. A sink
/// must not assume retries: a failed append is reported once and the
/// fragment is dropped.
#[async_trait]
pub trait TurnSink: Send + Sync {
    async fn append_turn(&self, turn: &TurnRecord) -> Result<(), SinkError>;
}
