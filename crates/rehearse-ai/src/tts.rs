//! Text-to-speech synthesis against two providers.
//!
//! The primary provider returns raw audio bytes from a JSON request; the
//! secondary provider (ElevenLabs-style) also returns raw bytes but is
//! keyed per-voice in the URL path and authenticated via a header. The
//! HTTP layer decides how the bytes reach the browser (raw body vs.
//! base64-in-JSON).

use crate::config::{ElevenLabsConfig, OpenAiConfig};
use crate::error::{upstream_error, AiError};
use serde::Serialize;
use std::time::Duration;

/// Maximum text input size for TTS (64 KiB). Prevents resource
/// exhaustion from oversized synthesis requests.
const MAX_TTS_INPUT_BYTES: usize = 64 * 1024;

/// Timeout for a synthesis round trip.
const TTS_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
}

#[derive(Debug, Serialize)]
struct ElevenRequest<'a> {
    text: &'a str,
    model_id: &'a str,
}

/// Service for generating speech from text.
#[derive(Debug, Clone)]
pub struct TtsService {
    http: reqwest::Client,
    openai: OpenAiConfig,
    eleven: ElevenLabsConfig,
}

impl TtsService {
    pub fn new(http: reqwest::Client, openai: OpenAiConfig, eleven: ElevenLabsConfig) -> Self {
        Self {
            http,
            openai,
            eleven,
        }
    }

    fn check_input(text: &str) -> Result<(), AiError> {
        if text.len() > MAX_TTS_INPUT_BYTES {
            return Err(AiError::InputTooLarge {
                size: text.len(),
                limit: MAX_TTS_INPUT_BYTES,
            });
        }
        Ok(())
    }

    /// Synthesizes speech with the primary provider. Returns raw audio
    /// bytes (MP3 unless the model says otherwise).
    pub async fn synthesize(
        &self,
        text: &str,
        voice: Option<&str>,
        model: Option<&str>,
    ) -> Result<Vec<u8>, AiError> {
        if self.openai.api_key.is_empty() {
            return Err(AiError::MissingCredential("OPENAI_API_KEY"));
        }
        Self::check_input(text)?;

        let request = SpeechRequest {
            model: model.unwrap_or(&self.openai.tts_model),
            input: text,
            voice: voice.unwrap_or(&self.openai.tts_voice),
        };

        let response = self
            .http
            .post(format!("{}/audio/speech", self.openai.base_url))
            .bearer_auth(&self.openai.api_key)
            .timeout(TTS_TIMEOUT)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            return Err(upstream_error(status.as_u16(), &body));
        }

        Ok(response.bytes().await?.to_vec())
    }

    /// Synthesizes speech with the secondary provider for a specific
    /// voice ID. Returns raw audio bytes.
    pub async fn synthesize_eleven(
        &self,
        text: &str,
        voice_id: &str,
        model: Option<&str>,
    ) -> Result<Vec<u8>, AiError> {
        if self.eleven.api_key.is_empty() {
            return Err(AiError::MissingCredential("ELEVENLABS_API_KEY"));
        }
        Self::check_input(text)?;

        let request = ElevenRequest {
            text,
            model_id: model.unwrap_or(&self.eleven.model),
        };

        let response = self
            .http
            .post(format!(
                "{}/text-to-speech/{}",
                self.eleven.base_url, voice_id
            ))
            .header("xi-api-key", &self.eleven.api_key)
            .timeout(TTS_TIMEOUT)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await?;
            return Err(upstream_error(status.as_u16(), &body));
        }

        Ok(response.bytes().await?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline_service() -> TtsService {
        TtsService::new(
            reqwest::Client::new(),
            OpenAiConfig {
                base_url: "http://127.0.0.1:1".to_string(),
                api_key: "test-key".to_string(),
                ..Default::default()
            },
            ElevenLabsConfig {
                base_url: "http://127.0.0.1:1".to_string(),
                ..Default::default()
            },
        )
    }

    #[tokio::test]
    async fn oversized_text_rejected_locally() {
        let service = offline_service();
        let oversized = "a".repeat(MAX_TTS_INPUT_BYTES + 1);
        let err = service.synthesize(&oversized, None, None).await.unwrap_err();
        assert!(matches!(err, AiError::InputTooLarge { .. }));
    }

    #[tokio::test]
    async fn secondary_provider_requires_its_own_credential() {
        let service = offline_service();
        let err = service
            .synthesize_eleven("hello", "voice-1", None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AiError::MissingCredential("ELEVENLABS_API_KEY")
        ));
    }
}
