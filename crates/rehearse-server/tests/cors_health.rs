use axum::body::Body;
use axum::http::{Request, StatusCode};
use rehearse_ai::{ElevenLabsConfig, OpenAiConfig};
use rehearse_db::{create_pool, run_migrations, DbRuntimeSettings};
use rehearse_server::{app, AppState};
use tower::ServiceExt;

fn test_state() -> (tempfile::TempDir, AppState) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("server.db");
    let pool = create_pool(path.to_str().unwrap(), DbRuntimeSettings::default()).unwrap();
    {
        let conn = pool.get().unwrap();
        run_migrations(&conn).unwrap();
    }
    let state = AppState::new(
        pool,
        reqwest::Client::new(),
        OpenAiConfig::default(),
        ElevenLabsConfig::default(),
    );
    (dir, state)
}

#[tokio::test]
async fn health_check_returns_ok() {
    let (_dir, state) = test_state();
    let response = app(state)
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn preflight_from_any_origin_succeeds() {
    let (_dir, state) = test_state();
    let response = app(state)
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/api/chat")
                .header("Origin", "https://rehearse.example")
                .header("Access-Control-Request-Method", "POST")
                .header("Access-Control-Request-Headers", "content-type,authorization")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(
        headers.get("access-control-allow-origin").unwrap(),
        "*"
    );
    assert!(headers.contains_key("access-control-allow-methods"));
}

#[tokio::test]
async fn simple_requests_carry_the_cors_header() {
    let (_dir, state) = test_state();
    let response = app(state)
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("Origin", "http://localhost:5173")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .unwrap(),
        "*"
    );
}
