//! AI provider proxy endpoints: chat reply, transcription, speech
//! synthesis, and session scoring.
//!
//! These are thin pass-throughs. The provider clients in `rehearse-ai`
//! own the credentials, timeouts, and size ceilings; this layer only
//! shapes HTTP bodies and maps [`rehearse_ai::AiError`] onto status
//! codes.

use crate::api::ApiError;
use crate::AppState;
use axum::{
    extract::{Extension, Multipart},
    http::header,
    response::IntoResponse,
    Json,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use rehearse_types::ScoreOutcome;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Request body for `POST /api/chat`.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// Conversation so far, both speakers interleaved.
    #[serde(default)]
    pub transcript: String,
    /// Scenario description conditioning the counterpart's persona.
    #[serde(default)]
    pub scenario: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
}

/// Handler for `POST /api/chat`.
pub async fn chat_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let reply = state
        .chat_service
        .reply(&payload.transcript, &payload.scenario)
        .await?;
    Ok(Json(ChatResponse { reply }))
}

#[derive(Debug, Serialize)]
pub struct TranscribeResponse {
    pub text: String,
}

/// Handler for `POST /api/transcribe`.
///
/// Accepts a multipart form with a `file` field holding recorded audio.
pub async fn transcribe_handler(
    Extension(state): Extension<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<TranscribeResponse>, ApiError> {
    let mut audio: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("invalid multipart body: {e}")))?
    {
        if field.name() == Some("file") {
            let file_name = field
                .file_name()
                .unwrap_or("recording.webm")
                .to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(format!("failed to read upload: {e}")))?;
            audio = Some((file_name, data.to_vec()));
            break;
        }
    }

    let (file_name, data) =
        audio.ok_or_else(|| ApiError::BadRequest("missing 'file' field".to_string()))?;

    let text = state.stt_service.transcribe(&file_name, data).await?;
    Ok(Json(TranscribeResponse { text }))
}

/// Request body for `POST /api/tts`.
#[derive(Debug, Deserialize)]
pub struct TtsRequest {
    pub text: String,
    pub voice: Option<String>,
    pub model: Option<String>,
}

/// Handler for `POST /api/tts`.
///
/// Returns the synthesized audio as raw MP3 bytes.
pub async fn tts_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<TtsRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let audio = state
        .tts_service
        .synthesize(
            &payload.text,
            payload.voice.as_deref(),
            payload.model.as_deref(),
        )
        .await?;

    Ok(([(header::CONTENT_TYPE, "audio/mpeg")], audio))
}

/// Request body for `POST /api/tts/eleven`.
#[derive(Debug, Deserialize)]
pub struct TtsElevenRequest {
    pub text: String,
    #[serde(rename = "voiceId")]
    pub voice_id: String,
    pub model: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TtsElevenResponse {
    /// Synthesized audio, base64-encoded for JSON transport.
    #[serde(rename = "audioBase64")]
    pub audio_base64: String,
}

/// Handler for `POST /api/tts/eleven`.
pub async fn tts_eleven_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<TtsElevenRequest>,
) -> Result<Json<TtsElevenResponse>, ApiError> {
    let audio = state
        .tts_service
        .synthesize_eleven(&payload.text, &payload.voice_id, payload.model.as_deref())
        .await?;

    Ok(Json(TtsElevenResponse {
        audio_base64: BASE64.encode(audio),
    }))
}

/// Request body for `POST /api/score`.
#[derive(Debug, Deserialize)]
pub struct ScoreRequest {
    pub transcript: String,
}

/// Handler for `POST /api/score`.
///
/// A model response that cannot be parsed as rubric JSON comes back as
/// an `ungraded` outcome, not an error; only provider and transport
/// failures produce non-2xx statuses.
pub async fn score_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<ScoreRequest>,
) -> Result<Json<ScoreOutcome>, ApiError> {
    let outcome = state
        .scoring_service
        .score_transcript(&payload.transcript)
        .await?;
    Ok(Json(outcome))
}
