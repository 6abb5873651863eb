//! AI provider integration for the Rehearse platform.
//!
//! Wraps the third-party endpoints the simulator depends on: chat
//! completion for the scripted counterpart's replies and for transcript
//! scoring, speech-to-text for microphone input, and two text-to-speech
//! providers for the counterpart's voice. Everything is a thin HTTP
//! exchange over `reqwest` with explicit timeouts and input-size
//! ceilings; there is no retry, backoff, or circuit breaking anywhere in
//! this crate.
//!
//! The error taxonomy is deliberate: a missing credential fails before
//! any network call, an upstream non-2xx carries the provider's own
//! message, and a scoring response we cannot parse degrades to
//! [`rehearse_types::ScoreOutcome::Ungraded`] rather than erroring.

pub mod chat;
pub mod config;
pub mod error;
pub mod score;
pub mod stt;
pub mod tts;

pub use chat::ChatService;
pub use config::{ElevenLabsConfig, OpenAiConfig};
pub use error::AiError;
pub use score::{parse_score_content, ScoringService};
pub use stt::SttService;
pub use tts::TtsService;
