//! Chat-completion client for the AI counterpart's replies.

use crate::config::OpenAiConfig;
use crate::error::{upstream_error, AiError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Maximum transcript size accepted for a chat exchange (64 KiB).
/// Prevents resource exhaustion from oversized prompts.
pub(crate) const MAX_CHAT_INPUT_BYTES: usize = 64 * 1024;

/// Timeout for a chat-completion round trip.
const CHAT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Serialize)]
pub(crate) struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatChoice {
    pub message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatChoiceMessage {
    #[serde(default)]
    pub content: String,
}

/// Client for the chat-completion endpoint.
#[derive(Debug, Clone)]
pub struct ChatService {
    http: reqwest::Client,
    config: OpenAiConfig,
}

impl ChatService {
    pub fn new(http: reqwest::Client, config: OpenAiConfig) -> Self {
        Self { http, config }
    }

    /// Generates the counterpart's next reply for the running transcript
    /// within the given scenario framing.
    pub async fn reply(&self, transcript: &str, scenario: &str) -> Result<String, AiError> {
        if self.config.api_key.is_empty() {
            return Err(AiError::MissingCredential("OPENAI_API_KEY"));
        }
        if transcript.len() > MAX_CHAT_INPUT_BYTES {
            return Err(AiError::InputTooLarge {
                size: transcript.len(),
                limit: MAX_CHAT_INPUT_BYTES,
            });
        }

        let system = format!(
            "You are role-playing the counterpart in a professional training scenario: {scenario}. \
             Stay in character, keep replies short and conversational, and respond only with \
             what your character says next."
        );

        let request = ChatRequest {
            model: self.config.chat_model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: transcript.to_string(),
                },
            ],
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .timeout(CHAT_TIMEOUT)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(upstream_error(status.as_u16(), &body));
        }

        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| AiError::Payload(format!("chat completion parse error: {e}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| AiError::Payload("chat completion had no choices".to_string()))
    }
}
