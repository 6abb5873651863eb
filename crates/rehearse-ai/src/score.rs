//! Transcript scoring against the fixed rubric.
//!
//! Sends the full session transcript to the chat-completion endpoint
//! with an evaluation prompt and parses the structured result back. The
//! parse can always degrade: content that is not valid JSON yields
//! [`ScoreOutcome::Ungraded`], never an error — an unscorable session is
//! an ungraded session.

use crate::chat::{ChatMessage, ChatRequest, ChatResponse};
use crate::config::OpenAiConfig;
use crate::error::{upstream_error, AiError};
use rehearse_types::{RubricMetrics, ScoreCard, ScoreOutcome, RUBRIC_DIMENSIONS};
use serde::Deserialize;
use std::time::Duration;

/// Maximum transcript size accepted for scoring (128 KiB).
const MAX_SCORE_INPUT_BYTES: usize = 128 * 1024;

/// Timeout for a scoring round trip.
const SCORE_TIMEOUT: Duration = Duration::from_secs(90);

/// Client for the scoring pipeline.
#[derive(Debug, Clone)]
pub struct ScoringService {
    http: reqwest::Client,
    config: OpenAiConfig,
}

/// The JSON shape we ask the evaluator to produce.
#[derive(Debug, Deserialize)]
struct ScoredPayload {
    #[serde(default)]
    metrics: Option<RubricMetrics>,
    #[serde(rename = "overallScore", default)]
    overall_score: Option<f64>,
    #[serde(default)]
    notes: String,
}

impl ScoringService {
    pub fn new(http: reqwest::Client, config: OpenAiConfig) -> Self {
        Self { http, config }
    }

    /// Builds the fixed evaluation prompt.
    fn rubric_prompt(transcript: &str) -> String {
        format!(
            "You are an expert communication coach. Evaluate the trainee in the following \
             practice-session transcript.\n\
             Score each dimension from 0 to 10: {dims}.\n\
             Respond with ONLY a JSON object of the shape \
             {{\"metrics\": {{\"clarity\": n, \"empathy\": n, \"listening\": n, \
             \"structure\": n, \"impact\": n}}, \"overallScore\": n, \"notes\": \"...\"}}.\n\
             Transcript:\n{transcript}",
            dims = RUBRIC_DIMENSIONS.join(", "),
        )
    }

    /// Scores a complete transcript.
    ///
    /// Upstream failures and missing credentials are errors; a response
    /// whose content cannot be parsed is `Ungraded`.
    pub async fn score_transcript(&self, transcript: &str) -> Result<ScoreOutcome, AiError> {
        if self.config.api_key.is_empty() {
            return Err(AiError::MissingCredential("OPENAI_API_KEY"));
        }
        if transcript.len() > MAX_SCORE_INPUT_BYTES {
            return Err(AiError::InputTooLarge {
                size: transcript.len(),
                limit: MAX_SCORE_INPUT_BYTES,
            });
        }

        let request = ChatRequest {
            model: self.config.chat_model.clone(),
            messages: vec![ChatMessage {
                role: "user",
                content: Self::rubric_prompt(transcript),
            }],
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .timeout(SCORE_TIMEOUT)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(upstream_error(status.as_u16(), &body));
        }

        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| AiError::Payload(format!("scoring response parse error: {e}")))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .unwrap_or_default();

        Ok(parse_score_content(&content))
    }
}

/// Parses the evaluator's content into a [`ScoreOutcome`].
///
/// Models sometimes wrap the JSON in a markdown fence; strip it before
/// parsing. Anything that still fails to parse, or parses to an object
/// with neither metrics nor an overall score, is `Ungraded`.
pub fn parse_score_content(content: &str) -> ScoreOutcome {
    let trimmed = content.trim();
    let trimmed = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .map(|rest| rest.trim_end_matches("```"))
        .unwrap_or(trimmed)
        .trim();

    let payload: ScoredPayload = match serde_json::from_str(trimmed) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::debug!("scoring content not parseable as JSON, treating as ungraded: {e}");
            return ScoreOutcome::Ungraded;
        }
    };

    let (metrics, overall_score) = match (payload.metrics, payload.overall_score) {
        (None, None) => return ScoreOutcome::Ungraded,
        (Some(metrics), Some(overall)) => (metrics, overall),
        (Some(metrics), None) => {
            let mean = metrics.mean();
            (metrics, mean)
        }
        (None, Some(overall)) => (RubricMetrics::default(), overall),
    };

    ScoreOutcome::Scored(ScoreCard {
        metrics,
        overall_score: overall_score.clamp(0.0, 10.0),
        notes: payload.notes,
    })
}
