//! Shared types, error definitions, and constants for the Rehearse platform.
//!
//! This crate provides the foundational types used across all Rehearse
//! crates: speaker roles, scenario tracks, session lifecycle states, the
//! scoring rubric, and the scenario catalog entry. No crate in the
//! workspace depends on anything *except* `rehearse-types` for
//! cross-cutting type definitions, which keeps the dependency graph clean
//! and prevents circular dependencies.

use serde::{Deserialize, Serialize};

pub mod rubric;
pub mod scenario;

pub use rubric::{RubricMetrics, ScoreCard, ScoreOutcome, RUBRIC_DIMENSIONS};
pub use scenario::Scenario;

/// The two speaker roles inside a training session.
///
/// Each turn is tagged with exactly one of these, and the live capture
/// pipeline maintains one running transcript per role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    /// The human trainee.
    User,
    /// The AI counterpart.
    Ai,
}

impl Speaker {
    /// Returns the canonical string label for this speaker.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Ai => "ai",
        }
    }
}

impl std::fmt::Display for Speaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Speaker {
    type Err = ParseSpeakerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "ai" => Ok(Self::Ai),
            _ => Err(ParseSpeakerError(s.to_string())),
        }
    }
}

/// Error returned when parsing an unknown speaker tag.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown speaker tag: {0}")]
pub struct ParseSpeakerError(pub String);

/// Training scenario categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Track {
    /// HR conversations: feedback, reviews, difficult topics.
    Hr,
    /// Sales calls: discovery, objection handling, closing.
    Sales,
    /// Classroom teaching and tutoring.
    Education,
    /// Strategic planning and leadership discussions.
    Management,
}

impl Track {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hr => "hr",
            Self::Sales => "sales",
            Self::Education => "education",
            Self::Management => "management",
        }
    }
}

impl std::fmt::Display for Track {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Track {
    type Err = ParseTrackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hr" => Ok(Self::Hr),
            "sales" => Ok(Self::Sales),
            "education" => Ok(Self::Education),
            "management" => Ok(Self::Management),
            _ => Err(ParseTrackError(s.to_string())),
        }
    }
}

/// Error returned when parsing an unknown track label.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown track: {0}")]
pub struct ParseTrackError(pub String);

/// Session lifecycle state.
///
/// A session opens when a simulation starts and closes when it ends;
/// there are no intermediate states. Closed sessions count toward the
/// completion rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Open,
    Closed,
}

impl SessionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }
}

impl std::str::FromStr for SessionStatus {
    type Err = ParseSessionStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Self::Open),
            "closed" => Ok(Self::Closed),
            _ => Err(ParseSessionStatusError(s.to_string())),
        }
    }
}

/// Error returned when parsing an unknown session status.
#[derive(Debug, Clone, thiserror::Error)]
#[error("unknown session status: {0}")]
pub struct ParseSessionStatusError(pub String);

/// Clamps a percentage-like value to the `[0, 100]` range.
///
/// Percentile and completion-rate figures must never leave this range,
/// regardless of how degenerate the underlying data is.
pub fn clamp_percent(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}
