//! The fixed scoring rubric and its result types.
//!
//! A transcript is evaluated against five named dimensions, each scored
//! 0–10, plus an overall score and free-text coaching notes. Scoring can
//! always degrade: a response the model produced but we cannot parse is
//! an *ungraded* session, never a failure.

use serde::{Deserialize, Serialize};

/// The five rubric dimensions, in prompt order.
pub const RUBRIC_DIMENSIONS: [&str; 5] = ["clarity", "empathy", "listening", "structure", "impact"];

/// Per-dimension rubric scores, each expected in `[0, 10]`.
///
/// Fields default to zero so a partially-populated model response still
/// deserializes; a fully absent or malformed response is handled one
/// level up as [`ScoreOutcome::Ungraded`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RubricMetrics {
    pub clarity: f64,
    pub empathy: f64,
    pub listening: f64,
    pub structure: f64,
    pub impact: f64,
}

impl RubricMetrics {
    /// Mean of the five dimensions. Useful when the model omits an
    /// overall score.
    pub fn mean(&self) -> f64 {
        (self.clarity + self.empathy + self.listening + self.structure + self.impact) / 5.0
    }
}

/// A fully-parsed evaluation of one session transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreCard {
    /// Per-dimension scores.
    pub metrics: RubricMetrics,
    /// Overall score in `[0, 10]`.
    #[serde(rename = "overallScore")]
    pub overall_score: f64,
    /// Free-text coaching notes from the evaluator.
    #[serde(default)]
    pub notes: String,
}

/// Outcome of the scoring pipeline.
///
/// A session whose evaluation could not be parsed is *ungraded*, not
/// failed: downstream consumers (persistence, dashboards) treat the
/// score as absent rather than surfacing an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScoreOutcome {
    Scored(ScoreCard),
    Ungraded,
}

impl ScoreOutcome {
    /// Returns the overall score if this outcome is graded.
    pub fn overall_score(&self) -> Option<f64> {
        match self {
            Self::Scored(card) => Some(card.overall_score),
            Self::Ungraded => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rubric_metrics_mean() {
        let metrics = RubricMetrics {
            clarity: 8.0,
            empathy: 6.0,
            listening: 7.0,
            structure: 9.0,
            impact: 5.0,
        };
        assert!((metrics.mean() - 7.0).abs() < f64::EPSILON);
    }

    #[test]
    fn partial_metrics_deserialize_with_defaults() {
        let metrics: RubricMetrics = serde_json::from_str(r#"{"clarity": 9.0}"#).unwrap();
        assert_eq!(metrics.clarity, 9.0);
        assert_eq!(metrics.empathy, 0.0);
    }

    #[test]
    fn ungraded_outcome_has_no_score() {
        assert_eq!(ScoreOutcome::Ungraded.overall_score(), None);
    }
}
