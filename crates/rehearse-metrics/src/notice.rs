//! Soft, non-fatal warnings surfaced alongside otherwise-successful
//! responses. Delivered over a broadcast channel so any number of
//! listeners (or none) can observe them.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Warning,
}

/// A degradation message for the UI, not an error for the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}
