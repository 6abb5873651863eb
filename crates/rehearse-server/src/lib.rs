//! Rehearse server library logic.

pub mod api;
pub mod api_ai;
pub mod api_live;
pub mod api_metrics;
pub mod api_sessions;
pub mod config;
pub mod middleware;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Extension, Json, Router,
};
use rehearse_ai::{ChatService, ElevenLabsConfig, OpenAiConfig, ScoringService, SttService, TtsService};
use rehearse_capture::CaptureSession;
use rehearse_db::DbPool;
use rehearse_metrics::Notice;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Live capture sessions keyed by public session ID.
///
/// The outer `std::sync::RwLock` guards only brief HashMap operations
/// that never span `.await` points. Each session gets its own
/// `tokio::sync::Mutex` because an append holds the session across the
/// sink write, and fragments within one session must be serialized.
pub type CaptureRegistry = Arc<RwLock<HashMap<String, Arc<tokio::sync::Mutex<CaptureSession>>>>>;

/// Capacity of the server-wide notice channel.
const NOTICE_CAPACITY: usize = 64;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: DbPool,
    /// Chat-reply service.
    pub chat_service: Arc<ChatService>,
    /// Speech-to-text service.
    pub stt_service: Arc<SttService>,
    /// Text-to-speech service (both providers).
    pub tts_service: Arc<TtsService>,
    /// Session scoring service.
    pub scoring_service: Arc<ScoringService>,
    /// Live capture sessions.
    pub captures: CaptureRegistry,
    /// Broadcast channel for degradation notices (metrics fallback etc).
    pub notices_tx: broadcast::Sender<Notice>,
}

impl AppState {
    /// Wires the AI services onto one shared HTTP client and leaves the
    /// capture registry empty.
    pub fn new(
        pool: DbPool,
        http: reqwest::Client,
        openai: OpenAiConfig,
        eleven: ElevenLabsConfig,
    ) -> Self {
        let (notices_tx, _) = broadcast::channel(NOTICE_CAPACITY);
        Self {
            pool,
            chat_service: Arc::new(ChatService::new(http.clone(), openai.clone())),
            stt_service: Arc::new(SttService::new(http.clone(), openai.clone())),
            tts_service: Arc::new(TtsService::new(http.clone(), openai.clone(), eleven)),
            scoring_service: Arc::new(ScoringService::new(http, openai)),
            captures: Arc::new(RwLock::new(HashMap::new())),
            notices_tx,
        }
    }
}

/// Maximum request body size (2 MiB). Protects against OOM from oversized payloads.
const MAX_REQUEST_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Hard ceiling on uploaded audio for transcription (12 MiB); the AI
/// layer enforces its own tighter per-call limit.
const MAX_AUDIO_BODY_BYTES: usize = 12 * 1024 * 1024;

/// Health check handler.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route(
            "/api/sessions",
            post(api_sessions::create_session_handler).get(api_sessions::list_sessions_handler),
        )
        .route(
            "/api/sessions/{sessionId}",
            get(api_sessions::get_session_handler),
        )
        .route(
            "/api/live/{sessionId}/start",
            post(api_live::start_handler),
        )
        .route(
            "/api/live/{sessionId}/fragments",
            post(api_live::append_fragment_handler),
        )
        .route("/api/live/{sessionId}/stop", post(api_live::stop_handler))
        .route(
            "/api/live/{sessionId}/clear",
            post(api_live::clear_handler),
        )
        .route("/api/metrics", get(api_metrics::get_metrics_handler))
        .layer(axum::middleware::from_fn(middleware::auth_middleware));

    // The transcribe route needs a larger body limit for uploaded audio.
    let audio_routes = Router::new()
        .route("/api/transcribe", post(api_ai::transcribe_handler))
        .layer(DefaultBodyLimit::max(MAX_AUDIO_BODY_BYTES));

    Router::new()
        .route("/health", get(health))
        .route("/api/scenarios", get(api::list_scenarios_handler))
        .route("/api/chat", post(api_ai::chat_handler))
        .route("/api/tts", post(api_ai::tts_handler))
        .route("/api/tts/eleven", post(api_ai::tts_eleven_handler))
        .route("/api/score", post(api_ai::score_handler))
        .merge(audio_routes)
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(Extension(Arc::new(state)))
}
