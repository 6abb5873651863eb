//! Speech-to-text proxy.

use crate::config::OpenAiConfig;
use crate::error::{upstream_error, AiError};
use serde::Deserialize;
use std::time::Duration;

/// Maximum audio input size for STT (10 MiB). Prevents OOM from
/// oversized payloads.
const MAX_STT_INPUT_BYTES: usize = 10 * 1024 * 1024;

/// Timeout for a transcription round trip.
const STT_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    #[serde(default)]
    text: String,
}

/// Client for the transcription endpoint.
#[derive(Debug, Clone)]
pub struct SttService {
    http: reqwest::Client,
    config: OpenAiConfig,
}

impl SttService {
    pub fn new(http: reqwest::Client, config: OpenAiConfig) -> Self {
        Self { http, config }
    }

    /// Forwards recorded audio to the transcription endpoint and returns
    /// the recognized text.
    pub async fn transcribe(
        &self,
        file_name: &str,
        audio_data: Vec<u8>,
    ) -> Result<String, AiError> {
        if self.config.api_key.is_empty() {
            return Err(AiError::MissingCredential("OPENAI_API_KEY"));
        }
        if audio_data.len() > MAX_STT_INPUT_BYTES {
            return Err(AiError::InputTooLarge {
                size: audio_data.len(),
                limit: MAX_STT_INPUT_BYTES,
            });
        }

        let part = reqwest::multipart::Part::bytes(audio_data)
            .file_name(file_name.to_string())
            .mime_str("application/octet-stream")?;
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("model", self.config.stt_model.clone());

        let response = self
            .http
            .post(format!("{}/audio/transcriptions", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .timeout(STT_TIMEOUT)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(upstream_error(status.as_u16(), &body));
        }

        let parsed: TranscriptionResponse = serde_json::from_str(&body)
            .map_err(|e| AiError::Payload(format!("transcription parse error: {e}")))?;

        Ok(parsed.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn oversized_audio_rejected_before_upload() {
        let config = OpenAiConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            api_key: "test-key".to_string(),
            ..Default::default()
        };
        let service = SttService::new(reqwest::Client::new(), config);
        let err = service
            .transcribe("clip.webm", vec![0u8; MAX_STT_INPUT_BYTES + 1])
            .await
            .unwrap_err();
        assert!(matches!(err, AiError::InputTooLarge { .. }));
    }

    #[tokio::test]
    async fn missing_credential_fails_fast() {
        let config = OpenAiConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            ..Default::default()
        };
        let service = SttService::new(reqwest::Client::new(), config);
        let err = service.transcribe("clip.webm", vec![1, 2, 3]).await.unwrap_err();
        assert!(matches!(err, AiError::MissingCredential(_)));
    }
}
