//! Shared API error type and the public scenario catalog endpoint.

use crate::AppState;
use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rehearse_ai::AiError;
use rehearse_store::{list_scenarios, StoreError};
use rehearse_types::{Scenario, Track};
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;

/// API error type mapping to HTTP status codes.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    BadRequest(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("internal server error: {0}")]
    InternalServerError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::InternalServerError(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => ApiError::NotFound(id),
            other => ApiError::InternalServerError(other.to_string()),
        }
    }
}

impl From<AiError> for ApiError {
    fn from(e: AiError) -> Self {
        match e {
            // A provider rejection (rate limit, bad request, auth) comes
            // back as 400 with the provider's own message. Never retried.
            AiError::Upstream { message, .. } => ApiError::BadRequest(message),
            AiError::InputTooLarge { .. } => ApiError::BadRequest(e.to_string()),
            // An unconfigured credential is a deployment problem, and it
            // is caught before any network call goes out.
            AiError::MissingCredential(_) => ApiError::InternalServerError(e.to_string()),
            AiError::Transport(_) | AiError::Payload(_) => {
                ApiError::InternalServerError(e.to_string())
            }
        }
    }
}

/// Runs a blocking store operation on the pool without tying up the
/// async executor.
pub(crate) async fn run_blocking<T, F>(f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::InternalServerError(format!("task join error: {e}")))?
}

#[derive(Debug, Deserialize)]
pub struct TrackQuery {
    pub track: Option<String>,
}

/// Parses an optional `track` query value, rejecting unknown labels.
pub(crate) fn parse_track(raw: Option<&str>) -> Result<Option<Track>, ApiError> {
    raw.map(|t| {
        t.parse::<Track>()
            .map_err(|e| ApiError::BadRequest(e.to_string()))
    })
    .transpose()
}

/// Handler for `GET /api/scenarios`.
pub async fn list_scenarios_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(query): Query<TrackQuery>,
) -> Result<Json<Vec<Scenario>>, ApiError> {
    let track = parse_track(query.track.as_deref())?;

    let scenarios = run_blocking(move || {
        let conn = state
            .pool
            .get()
            .map_err(|e| ApiError::InternalServerError(format!("db connection failed: {e}")))?;
        Ok(list_scenarios(&conn, track)?)
    })
    .await?;

    Ok(Json(scenarios))
}
