use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use rehearse_store::{get_user, User};
use std::sync::Arc;

use crate::AppState;

/// The authenticated user, stored in request extensions for handlers.
#[derive(Clone, Debug)]
pub struct CurrentUser(pub User);

/// Middleware to authenticate requests via `Authorization: Bearer`.
///
/// The bearer token is the user ID, validated against the users table.
/// There is no session or signature layer; callers that need one put a
/// gateway in front. Any lookup failure (including "not found") reads
/// as unauthorized so unknown and inactive accounts are
/// indistinguishable from the outside.
pub async fn auth_middleware(mut req: Request<Body>, next: Next) -> Result<Response, StatusCode> {
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|val| val.to_str().ok())
        .and_then(|val| val.strip_prefix("Bearer "))
        .map(str::to_string)
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let state = req
        .extensions()
        .get::<Arc<AppState>>()
        .ok_or(StatusCode::INTERNAL_SERVER_ERROR)?
        .clone();

    let user = tokio::task::spawn_blocking(move || {
        let conn = state
            .pool
            .get()
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
        get_user(&conn, &token).map_err(|_| StatusCode::UNAUTHORIZED)
    })
    .await
    .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)??;

    if !user.active {
        return Err(StatusCode::UNAUTHORIZED);
    }

    req.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(req).await)
}
