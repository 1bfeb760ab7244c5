//! Voice command audit entry stored in SQLite and exposed via API.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct VoiceCommandLog {
    pub id: i64,
    pub transcript: String,
    pub action: String,
    /// Resolver confidence scaled to 0..=100.
    pub confidence: i64,
    pub executed_at: DateTime<Utc>,
    pub success: bool,
}

#[derive(Debug, Clone)]
pub struct NewVoiceCommandLog {
    pub transcript: String,
    pub action: String,
    pub confidence: i64,
    pub success: bool,
}

impl NewVoiceCommandLog {
    /// Build an entry from a resolver confidence in `[0, 1]`.
    pub fn new(transcript: &str, action: &str, confidence: f64, success: bool) -> Self {
        Self {
            transcript: transcript.to_string(),
            action: action.to_string(),
            confidence: (confidence.clamp(0.0, 1.0) * 100.0).round() as i64,
            success,
        }
    }
}
