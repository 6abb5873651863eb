//! Pure derivations over graded scores and session timestamps.
//!
//! Everything here is total: empty or malformed input yields the neutral
//! value rather than an error, since a dashboard tile with a zero is
//! better than a dashboard tile with a stack trace.

use chrono::NaiveDate;

use rehearse_types::clamp_percent;

use crate::{INDUSTRY_AVERAGE, TOP_PERFORMERS};

/// Mean of the graded scores, 0 when there are none.
pub fn average_score(scores: &[f64]) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    scores.iter().sum::<f64>() / scores.len() as f64
}

/// Closed sessions over all sessions, as a percentage in [0, 100].
pub fn completion_rate(closed: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    clamp_percent(closed as f64 / total as f64 * 100.0)
}

/// Most recent graded score minus the mean of all prior graded scores.
///
/// `scores` is newest-first. Fewer than two graded sessions means there
/// is no prior baseline, so the delta is 0.
pub fn latest_delta(scores: &[f64]) -> f64 {
    match scores {
        [] | [_] => 0.0,
        [latest, rest @ ..] => latest - average_score(rest),
    }
}

/// Linear percentile estimate against the fixed reference population.
///
/// The industry average maps to the 50th percentile and the
/// top-performer band to the 90th; everything else interpolates along
/// that line and clamps to [0, 100].
pub fn percentile_estimate(average: f64) -> f64 {
    let slope = 40.0 / (TOP_PERFORMERS - INDUSTRY_AVERAGE);
    clamp_percent(50.0 + (average - INDUSTRY_AVERAGE) * slope)
}

/// Consecutive active calendar days, ending at the most recent day with
/// a session.
///
/// `started_at` values arrive newest-first in RFC 3339 form; the date is
/// the first ten characters. Unparseable timestamps are skipped. An
/// anchor at "today" is deliberately not required: a streak broken this
/// morning still reads as the run it was.
pub fn streak_days<'a>(started_at: impl Iterator<Item = &'a str>) -> u32 {
    let mut days: Vec<NaiveDate> = started_at
        .filter_map(|ts| ts.get(..10))
        .filter_map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        .collect();
    days.sort_unstable_by(|a, b| b.cmp(a));
    days.dedup();

    let mut streak = 0u32;
    let mut expected: Option<NaiveDate> = None;
    for day in days {
        match expected {
            Some(want) if day != want => break,
            _ => {
                streak += 1;
                expected = day.pred_opt();
            }
        }
    }
    streak
}
