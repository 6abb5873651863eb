use thiserror::Error;

#[derive(Debug, Error)]
pub enum AiError {
    /// The required API credential is absent. Detected before any
    /// network call is attempted.
    #[error("missing API credential: {0}")]
    MissingCredential(&'static str),

    /// The provider answered with a non-success status. Carries the
    /// provider's own error message; never retried.
    #[error("upstream error ({status}): {message}")]
    Upstream { status: u16, message: String },

    /// Transport-level failure (connect, timeout, TLS).
    #[error("http transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Input exceeds the configured ceiling for the operation.
    #[error("input exceeds maximum size: {size} bytes (limit: {limit} bytes)")]
    InputTooLarge { size: usize, limit: usize },

    /// The provider's success payload was missing an expected field.
    #[error("invalid upstream payload: {0}")]
    Payload(String),
}

/// Builds an [`AiError::Upstream`] from a non-success response body.
///
/// Providers disagree on error shapes: OpenAI nests
/// `{"error": {"message": …}}`, others use `{"error": "…"}` or plain
/// text. The raw body is the fallback.
pub(crate) fn upstream_error(status: u16, body: &str) -> AiError {
    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error").and_then(|e| {
                e.get("message")
                    .and_then(|m| m.as_str().map(str::to_string))
                    .or_else(|| e.as_str().map(str::to_string))
            })
        })
        .unwrap_or_else(|| body.trim().to_string());

    AiError::Upstream { status, message }
}
