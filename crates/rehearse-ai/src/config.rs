//! Provider endpoint and credential configuration.

use serde::{Deserialize, Serialize};
use std::fmt;

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_chat_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_stt_model() -> String {
    "whisper-1".to_string()
}

fn default_tts_model() -> String {
    "tts-1".to_string()
}

fn default_tts_voice() -> String {
    "alloy".to_string()
}

/// Configuration for the primary language/speech provider.
#[derive(Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    /// API base URL. Tests point this at a local mock.
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
    /// Bearer credential. Empty means unconfigured: calls fail fast
    /// with a missing-credential error before touching the network.
    #[serde(default, skip_serializing)]
    pub api_key: String,
    /// Chat-completion model used for replies and scoring.
    #[serde(default = "default_chat_model")]
    pub chat_model: String,
    /// Transcription model.
    #[serde(default = "default_stt_model")]
    pub stt_model: String,
    /// Speech-synthesis model.
    #[serde(default = "default_tts_model")]
    pub tts_model: String,
    /// Default synthesis voice when the request omits one.
    #[serde(default = "default_tts_voice")]
    pub tts_voice: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: default_openai_base_url(),
            api_key: String::new(),
            chat_model: default_chat_model(),
            stt_model: default_stt_model(),
            tts_model: default_tts_model(),
            tts_voice: default_tts_voice(),
        }
    }
}

impl fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("chat_model", &self.chat_model)
            .field("stt_model", &self.stt_model)
            .field("tts_model", &self.tts_model)
            .field("tts_voice", &self.tts_voice)
            .finish()
    }
}

fn default_eleven_base_url() -> String {
    "https://api.elevenlabs.io/v1".to_string()
}

fn default_eleven_model() -> String {
    "eleven_monolingual_v1".to_string()
}

/// Configuration for the secondary (JSON-payload) speech provider.
#[derive(Clone, Serialize, Deserialize)]
pub struct ElevenLabsConfig {
    #[serde(default = "default_eleven_base_url")]
    pub base_url: String,
    /// API key sent in the `xi-api-key` header. Empty means unconfigured.
    #[serde(default, skip_serializing)]
    pub api_key: String,
    #[serde(default = "default_eleven_model")]
    pub model: String,
}

impl Default for ElevenLabsConfig {
    fn default() -> Self {
        Self {
            base_url: default_eleven_base_url(),
            api_key: String::new(),
            model: default_eleven_model(),
        }
    }
}

impl fmt::Debug for ElevenLabsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElevenLabsConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_redacts_credentials() {
        let mut config = OpenAiConfig::default();
        config.api_key = "sk-secret".to_string();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("[REDACTED]"));

        let eleven = ElevenLabsConfig {
            api_key: "xi-secret".to_string(),
            ..Default::default()
        };
        let rendered = format!("{:?}", eleven);
        assert!(!rendered.contains("xi-secret"));
    }

    #[test]
    fn serialization_skips_credentials() {
        let config = OpenAiConfig {
            api_key: "sk-secret".to_string(),
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("sk-secret"));
    }
}
