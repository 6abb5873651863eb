use axum::body::Body;
use axum::http::{Request, StatusCode};
use rehearse_ai::{ElevenLabsConfig, OpenAiConfig};
use rehearse_db::{create_pool, run_migrations, DbRuntimeSettings};
use rehearse_server::{app, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;

fn test_state() -> (tempfile::TempDir, AppState) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("server.db");
    let pool = create_pool(path.to_str().unwrap(), DbRuntimeSettings::default()).unwrap();
    {
        let conn = pool.get().unwrap();
        run_migrations(&conn).unwrap();
        for (id, name) in [("trainee-1", "Trainee One"), ("trainee-2", "Trainee Two")] {
            conn.execute(
                "INSERT INTO users (user_id, display_name) VALUES (?1, ?2)",
                rusqlite::params![id, name],
            )
            .unwrap();
        }
    }
    let state = AppState::new(
        pool,
        reqwest::Client::new(),
        OpenAiConfig::default(),
        ElevenLabsConfig::default(),
    );
    (dir, state)
}

fn post_session(token: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/sessions")
        .header("Authorization", format!("Bearer {token}"))
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn sample_session(session_id: &str) -> Value {
    json!({
        "sessionId": session_id,
        "track": "sales",
        "startedAt": "2026-08-30T10:00:00Z",
        "endedAt": "2026-08-30T10:12:00Z",
        "durationSeconds": 720,
        "score": 7.5,
        "userTranscript": "\nhello",
        "aiTranscript": "\nhi there",
        "metadata": {"client": "web"},
        "turns": [
            {"turnIndex": 0, "speaker": "user", "content": "hello", "offsetMs": 0},
            {"turnIndex": 1, "speaker": "ai", "content": "hi there", "offsetMs": 1200}
        ]
    })
}

async fn body_json(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn persist_list_and_fetch_round_trip() {
    let (_dir, state) = test_state();
    let app = app(state);

    let response = app
        .clone()
        .oneshot(post_session("trainee-1", sample_session("s1")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let created = body_json(response).await;
    assert_eq!(created["sessionId"], "s1");
    assert_eq!(created["userId"], "trainee-1");
    assert_eq!(created["track"], "sales");
    assert_eq!(created["status"], "closed");
    assert_eq!(created["score"], 7.5);

    // List shows it.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/sessions")
                .header("Authorization", "Bearer trainee-1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let sessions = body_json(response).await;
    assert_eq!(sessions.as_array().unwrap().len(), 1);

    // Fetch carries the turns in order.
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/sessions/s1")
                .header("Authorization", "Bearer trainee-1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let detail = body_json(response).await;
    let turns = detail["turns"].as_array().unwrap();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0]["turnIndex"], 0);
    assert_eq!(turns[0]["speaker"], "user");
    assert_eq!(turns[1]["content"], "hi there");
}

#[tokio::test]
async fn track_filter_and_invalid_track() {
    let (_dir, state) = test_state();
    let app = app(state);

    app.clone()
        .oneshot(post_session("trainee-1", sample_session("s1")))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/sessions?track=hr")
                .header("Authorization", "Bearer trainee-1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!([]));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/sessions?track=piloting")
                .header("Authorization", "Bearer trainee-1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn another_users_session_reads_as_not_found() {
    let (_dir, state) = test_state();
    let app = app(state);

    app.clone()
        .oneshot(post_session("trainee-1", sample_session("s1")))
        .await
        .unwrap();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/sessions/s1")
                .header("Authorization", "Bearer trainee-2")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn negative_duration_is_rejected() {
    let (_dir, state) = test_state();
    let mut body = sample_session("s1");
    body["durationSeconds"] = json!(-5);

    let response = app(state)
        .oneshot(post_session("trainee-1", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn duplicate_session_id_conflicts() {
    let (_dir, state) = test_state();
    let app = app(state);

    let response = app
        .clone()
        .oneshot(post_session("trainee-1", sample_session("s1")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(post_session("trainee-1", sample_session("s1")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn session_id_is_assigned_when_absent() {
    let (_dir, state) = test_state();
    let mut body = sample_session("ignored");
    body.as_object_mut().unwrap().remove("sessionId");

    let response = app(state)
        .oneshot(post_session("trainee-1", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let created = body_json(response).await;
    let assigned = created["sessionId"].as_str().unwrap();
    assert_eq!(assigned.len(), 36, "a UUID should have been assigned");
}
