//! Dashboard metrics aggregation for the Rehearse platform.
//!
//! Computes derived statistics over a user's persisted sessions: total
//! count, average score, latest score delta, completion rate, an
//! approximate percentile against a fixed reference population, and the
//! streak of consecutive active calendar days. Snapshots are recomputed
//! on every request; nothing here is cached or persisted.
//!
//! Aggregation never throws at the caller: a read failure degrades to
//! the documented fallback snapshot, tagged as such, and a [`Notice`] is
//! emitted on the side channel so the UI can surface a soft warning.

mod compute;
mod notice;

pub use compute::{
    average_score, completion_rate, latest_delta, percentile_estimate, streak_days,
};
pub use notice::{Notice, NoticeLevel};

use rehearse_store::{list_sessions, Session};
use rehearse_types::{clamp_percent, SessionStatus, Track};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Percentile reported when no data is available.
pub const DEFAULT_PERCENTILE: f64 = 50.0;

/// Reference population mean on the 0–10 rubric scale.
pub const INDUSTRY_AVERAGE: f64 = 6.5;

/// Reference top-performer band on the 0–10 rubric scale.
pub const TOP_PERFORMERS: f64 = 9.0;

/// A point-in-time aggregate over one user's sessions for one track
/// filter. Derived, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Total sessions matching the filter.
    #[serde(rename = "sessionCount")]
    pub session_count: usize,
    /// Mean overall score across graded sessions, 0 when none.
    #[serde(rename = "averageScore")]
    pub average_score: f64,
    /// Most recent graded session's score minus the mean of the prior
    /// graded sessions. 0 until there are two graded sessions.
    #[serde(rename = "scoreDelta")]
    pub score_delta: f64,
    /// Closed sessions over all sessions, as a percentage in [0, 100].
    #[serde(rename = "completionRate")]
    pub completion_rate: f64,
    /// Approximate standing versus the reference population, in [0, 100].
    pub percentile: f64,
    /// Consecutive calendar days (ending at the most recent active day)
    /// with at least one session.
    #[serde(rename = "streakDays")]
    pub streak_days: u32,
    /// Reference population mean, echoed for dashboard display.
    #[serde(rename = "industryAverage")]
    pub industry_average: f64,
    /// Reference top-performer band, echoed for dashboard display.
    #[serde(rename = "topPerformers")]
    pub top_performers: f64,
}

/// Result of an aggregation request.
///
/// `Fallback` means the underlying read failed and the snapshot is the
/// fixed default — the dashboard still renders, it just renders zeros.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum MetricsReport {
    Computed(MetricsSnapshot),
    Fallback(MetricsSnapshot),
}

impl MetricsReport {
    /// The snapshot, whichever way it was produced. Never absent.
    pub fn snapshot(&self) -> &MetricsSnapshot {
        match self {
            Self::Computed(s) | Self::Fallback(s) => s,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }
}

/// The fixed snapshot used when aggregation cannot read the store.
pub fn fallback_snapshot() -> MetricsSnapshot {
    MetricsSnapshot {
        session_count: 0,
        average_score: 0.0,
        score_delta: 0.0,
        completion_rate: 0.0,
        percentile: DEFAULT_PERCENTILE,
        streak_days: 0,
        industry_average: INDUSTRY_AVERAGE,
        top_performers: TOP_PERFORMERS,
    }
}

/// Builds a snapshot from an already-loaded session list.
///
/// Sessions are expected newest-first, as [`list_sessions`] returns them.
pub fn snapshot_from_sessions(sessions: &[Session]) -> MetricsSnapshot {
    let scores: Vec<f64> = sessions.iter().filter_map(|s| s.score).collect();
    let closed = sessions
        .iter()
        .filter(|s| s.status == SessionStatus::Closed)
        .count();
    let average = average_score(&scores);

    MetricsSnapshot {
        session_count: sessions.len(),
        average_score: average,
        score_delta: latest_delta(&scores),
        completion_rate: completion_rate(closed, sessions.len()),
        percentile: if scores.is_empty() {
            DEFAULT_PERCENTILE
        } else {
            percentile_estimate(average)
        },
        streak_days: streak_days(sessions.iter().map(|s| s.started_at.as_str())),
        industry_average: INDUSTRY_AVERAGE,
        top_performers: TOP_PERFORMERS,
    }
}

/// Aggregates dashboard metrics for one user and track filter.
///
/// On a store read failure this returns `Fallback(fallback_snapshot())`
/// and pushes a [`Notice`] on the side channel; it never propagates the
/// error to the caller.
pub fn aggregate(
    conn: &Connection,
    user_id: &str,
    track: Option<Track>,
    notices: &broadcast::Sender<Notice>,
) -> MetricsReport {
    match list_sessions(conn, user_id, track) {
        Ok(sessions) => MetricsReport::Computed(snapshot_from_sessions(&sessions)),
        Err(e) => {
            tracing::warn!(
                user_id,
                track = track.map(|t| t.as_str()).unwrap_or("all"),
                "metrics read failed, serving fallback snapshot: {}",
                e
            );
            let notice = Notice {
                level: NoticeLevel::Warning,
                message: format!("dashboard metrics unavailable: {e}"),
            };
            if notices.send(notice).is_err() {
                tracing::debug!("notice channel has no receivers");
            }
            MetricsReport::Fallback(fallback_snapshot())
        }
    }
}

/// Invariant guard used at the HTTP boundary: clamps the two
/// percentage-valued fields.
pub fn clamped(mut snapshot: MetricsSnapshot) -> MetricsSnapshot {
    snapshot.percentile = clamp_percent(snapshot.percentile);
    snapshot.completion_rate = clamp_percent(snapshot.completion_rate);
    snapshot
}

#[cfg(test)]
mod tests {
    use super::*;
    use rehearse_db::{create_pool, run_migrations, DbRuntimeSettings};
    use rehearse_store::{persist_session, CreateSessionParams};

    fn seeded_pool() -> rehearse_db::DbPool {
        let pool = create_pool(":memory:", DbRuntimeSettings::default()).unwrap();
        {
            let conn = pool.get().unwrap();
            run_migrations(&conn).unwrap();
            conn.execute(
                "INSERT INTO users (user_id, display_name) VALUES ('u1', 'Trainee')",
                [],
            )
            .unwrap();
        }
        pool
    }

    fn session(id: &str, day: &str, score: Option<f64>, status: SessionStatus) -> CreateSessionParams {
        CreateSessionParams {
            session_id: id.to_string(),
            user_id: "u1".to_string(),
            track: Track::Sales,
            scenario_id: None,
            started_at: format!("{day}T09:00:00Z"),
            ended_at: None,
            duration_seconds: 300,
            score,
            user_transcript: String::new(),
            ai_transcript: String::new(),
            metadata_json: "{}".to_string(),
            status,
        }
    }

    #[test]
    fn aggregate_computes_over_persisted_sessions() {
        let pool = seeded_pool();
        let conn = pool.get().unwrap();
        for (i, (day, score)) in [
            ("2026-08-27", Some(6.0)),
            ("2026-08-28", Some(7.0)),
            ("2026-08-29", Some(8.0)),
        ]
        .iter()
        .enumerate()
        {
            persist_session(
                &conn,
                &session(&format!("s{i}"), day, *score, SessionStatus::Closed),
                &[],
            )
            .unwrap();
        }

        let (tx, _rx) = broadcast::channel(8);
        let report = aggregate(&conn, "u1", Some(Track::Sales), &tx);
        assert!(!report.is_fallback());

        let snapshot = report.snapshot();
        assert_eq!(snapshot.session_count, 3);
        assert!((snapshot.average_score - 7.0).abs() < 1e-9);
        assert_eq!(snapshot.completion_rate, 100.0);
        assert_eq!(snapshot.streak_days, 3);
    }

    #[test]
    fn aggregate_read_failure_degrades_with_notice() {
        let pool = seeded_pool();
        let conn = pool.get().unwrap();
        // Remove the table out from under the query to force a read error.
        conn.execute_batch("DROP TABLE turns; DROP TABLE sessions;")
            .unwrap();

        let (tx, mut rx) = broadcast::channel(8);
        let report = aggregate(&conn, "u1", None, &tx);

        assert!(report.is_fallback());
        assert_eq!(report.snapshot(), &fallback_snapshot());
        assert_eq!(report.snapshot().percentile, 50.0);
        assert_eq!(report.snapshot().industry_average, 6.5);
        assert_eq!(report.snapshot().top_performers, 9.0);
        assert_eq!(report.snapshot().average_score, 0.0);

        let notice = rx.try_recv().expect("a notice should have been emitted");
        assert_eq!(notice.level, NoticeLevel::Warning);
        assert!(notice.message.contains("metrics unavailable"));
    }

    #[test]
    fn fallback_serializes_with_camel_case_fields() {
        let json = serde_json::to_value(fallback_snapshot()).unwrap();
        assert_eq!(json["percentile"], 50.0);
        assert_eq!(json["industryAverage"], 6.5);
        assert_eq!(json["topPerformers"], 9.0);
        assert_eq!(json["sessionCount"], 0);
    }
}
