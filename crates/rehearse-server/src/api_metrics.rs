//! Dashboard metrics endpoint.

use crate::api::{parse_track, run_blocking, ApiError, TrackQuery};
use crate::middleware::CurrentUser;
use crate::AppState;
use axum::{
    extract::{Extension, Query},
    Json,
};
use rehearse_metrics::{aggregate, clamped, MetricsReport};
use std::sync::Arc;

/// Handler for `GET /api/metrics?track=…`.
///
/// Always answers 200: a store read failure degrades to the fallback
/// snapshot (tagged `"source": "fallback"`) and a notice goes out on
/// the side channel.
pub async fn get_metrics_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(query): Query<TrackQuery>,
) -> Result<Json<MetricsReport>, ApiError> {
    let track = parse_track(query.track.as_deref())?;
    let notices_tx = state.notices_tx.clone();
    let pool = state.pool.clone();

    let report = run_blocking(move || {
        let conn = pool
            .get()
            .map_err(|e| ApiError::InternalServerError(format!("db connection failed: {e}")))?;
        Ok(aggregate(&conn, &user.user_id, track, &notices_tx))
    })
    .await?;

    let report = match report {
        MetricsReport::Computed(s) => MetricsReport::Computed(clamped(s)),
        MetricsReport::Fallback(s) => MetricsReport::Fallback(clamped(s)),
    };

    Ok(Json(report))
}
