//! Audio delivery: premium TTS with quota tracking and local-synthesis fallback.
//!
//! Three conditions degrade to local synthesis: no provider configured, quota
//! unknown or insufficient, and a failed provider call. All of them produce the
//! same [`SpeechOutcome::LocalSynthesis`] so callers have a single fallback path.

use crate::error::Result;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

pub mod elevenlabs;

pub use elevenlabs::ElevenLabsClient;

/// Hard input limit enforced before text reaches the provider.
pub const MAX_SPEECH_CHARS: usize = 9500;
pub const TRUNCATION_MARKER: &str = "... (content truncated)";
/// Remaining characters below which the quota is reported as low.
pub const LOW_QUOTA_CHARS: u64 = 1000;

fn default_quota_ttl() -> TimeDelta {
  TimeDelta::minutes(5)
}

/// Usage as reported by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderQuota {
  pub used: u64,
  pub limit: u64,
}

/// Cached view of provider usage.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaInfo {
  pub characters_used: u64,
  pub characters_limit: u64,
  pub characters_remaining: u64,
  pub last_checked: DateTime<Utc>,
}

impl QuotaInfo {
  fn from_provider(q: ProviderQuota, now: DateTime<Utc>) -> Self {
    Self {
      characters_used: q.used,
      characters_limit: q.limit,
      characters_remaining: q.limit.saturating_sub(q.used),
      last_checked: now,
    }
  }

  pub fn percentage_used(&self) -> f64 {
    if self.characters_limit == 0 {
      return 100.0;
    }
    let pct = self.characters_used as f64 / self.characters_limit as f64 * 100.0;
    (pct.min(100.0) * 10.0).round() / 10.0
  }

  pub fn status(&self) -> QuotaStatus {
    match self.characters_remaining {
      0 => QuotaStatus::Exceeded,
      r if r < LOW_QUOTA_CHARS => QuotaStatus::Low,
      _ => QuotaStatus::Available,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QuotaStatus {
  Available,
  Low,
  Exceeded,
  Unavailable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaReport {
  #[serde(flatten)]
  pub quota: QuotaInfo,
  pub percentage_used: f64,
  pub status: QuotaStatus,
}

/// Display view returned by `GET /voice/quota`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QuotaView {
  Known(QuotaReport),
  Unavailable { status: QuotaStatus },
}

/// Provider voice parameters. Accepts camelCase and snake_case keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceSettings {
  #[serde(default = "default_stability")]
  pub stability: f32,
  #[serde(default = "default_similarity", alias = "similarity_boost")]
  pub similarity_boost: f32,
  #[serde(default)]
  pub style: Option<f32>,
  #[serde(default, alias = "use_speaker_boost")]
  pub use_speaker_boost: Option<bool>,
}

fn default_stability() -> f32 {
  0.5
}

fn default_similarity() -> f32 {
  0.75
}

impl Default for VoiceSettings {
  fn default() -> Self {
    Self {
      stability: default_stability(),
      similarity_boost: default_similarity(),
      style: None,
      use_speaker_boost: None,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
  NotConfigured,
  QuotaUnknown,
  QuotaExceeded,
  ProviderFailed,
}

impl FallbackReason {
  pub fn message(self) -> &'static str {
    match self {
      FallbackReason::NotConfigured => "Premium voice is not configured. Using browser speech.",
      FallbackReason::QuotaUnknown => "Premium voice quota could not be checked. Using browser speech.",
      FallbackReason::QuotaExceeded => "Premium voice quota exceeded. Using browser speech.",
      FallbackReason::ProviderFailed => "Premium voice is unavailable right now. Using browser speech.",
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SpeechOutcome {
  Audio { bytes: Bytes, content_type: String },
  LocalSynthesis { text: String, reason: FallbackReason },
}

#[async_trait]
pub trait TtsProvider: Send + Sync {
  async fn fetch_quota(&self) -> Result<ProviderQuota>;
  async fn synthesize(&self, text: &str, settings: &VoiceSettings) -> Result<Bytes>;
  fn content_type(&self) -> &str {
    "audio/mpeg"
  }
}

pub trait Clock: Send + Sync {
  fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> DateTime<Utc> {
    Utc::now()
  }
}

/// Truncate to [`MAX_SPEECH_CHARS`] characters, appending [`TRUNCATION_MARKER`].
pub fn prepare_speech_text(text: &str) -> String {
  if text.chars().count() <= MAX_SPEECH_CHARS {
    return text.to_string();
  }
  let mut out: String = text.chars().take(MAX_SPEECH_CHARS).collect();
  out.push_str(TRUNCATION_MARKER);
  out
}

/// Characters to reserve for `text`: length plus a 10% margin, rounded up.
pub fn required_characters(text: &str) -> u64 {
  (text.chars().count() as u64 * 11).div_ceil(10)
}

pub struct AudioDeliveryManager {
  provider: Option<Arc<dyn TtsProvider>>,
  clock: Arc<dyn Clock>,
  ttl: TimeDelta,
  cache: Mutex<Option<QuotaInfo>>,
}

impl AudioDeliveryManager {
  pub fn new(provider: Option<Arc<dyn TtsProvider>>, clock: Arc<dyn Clock>) -> Self {
    Self {
      provider,
      clock,
      ttl: default_quota_ttl(),
      cache: Mutex::new(None),
    }
  }

  pub fn with_ttl(mut self, ttl: TimeDelta) -> Self {
    self.ttl = ttl;
    self
  }

  pub fn is_configured(&self) -> bool {
    self.provider.is_some()
  }

  pub async fn speak(&self, text: &str, settings: Option<&VoiceSettings>) -> SpeechOutcome {
    let text = prepare_speech_text(text);
    let Some(provider) = &self.provider else {
      return local(text, FallbackReason::NotConfigured);
    };

    let Some(quota) = self.quota(provider.as_ref()).await else {
      return local(text, FallbackReason::QuotaUnknown);
    };
    let required = required_characters(&text);
    if quota.characters_remaining < required {
      info!(required, remaining = quota.characters_remaining, "insufficient TTS quota");
      return local(text, FallbackReason::QuotaExceeded);
    }

    let default_settings = VoiceSettings::default();
    match provider.synthesize(&text, settings.unwrap_or(&default_settings)).await {
      Ok(bytes) => {
        self.debit(text.chars().count() as u64).await;
        SpeechOutcome::Audio {
          bytes,
          content_type: provider.content_type().to_string(),
        }
      }
      Err(e) => {
        warn!("TTS provider failed, falling back to local synthesis: {e}");
        local(text, FallbackReason::ProviderFailed)
      }
    }
  }

  pub async fn check_quota_status(&self) -> QuotaView {
    let quota = match &self.provider {
      Some(provider) => self.quota(provider.as_ref()).await,
      None => None,
    };
    match quota {
      Some(quota) => QuotaView::Known(QuotaReport {
        percentage_used: quota.percentage_used(),
        status: quota.status(),
        quota,
      }),
      None => QuotaView::Unavailable { status: QuotaStatus::Unavailable },
    }
  }

  /// Cached quota if fresh, else a refresh. The lock is not held across the
  /// fetch, so concurrent refreshes may race; the last write wins.
  async fn quota(&self, provider: &dyn TtsProvider) -> Option<QuotaInfo> {
    let now = self.clock.now();
    if let Some(cached) = self.cache.lock().await.as_ref() {
      if now - cached.last_checked < self.ttl {
        debug!(remaining = cached.characters_remaining, "TTS quota cache hit");
        return Some(cached.clone());
      }
    }
    match provider.fetch_quota().await {
      Ok(q) => {
        let info = QuotaInfo::from_provider(q, self.clock.now());
        *self.cache.lock().await = Some(info.clone());
        Some(info)
      }
      Err(e) => {
        warn!("TTS quota check failed: {e}");
        None
      }
    }
  }

  async fn debit(&self, characters: u64) {
    if let Some(q) = self.cache.lock().await.as_mut() {
      q.characters_used += characters;
      q.characters_remaining = q.characters_remaining.saturating_sub(characters);
    }
  }
}

fn local(text: String, reason: FallbackReason) -> SpeechOutcome {
  debug!(?reason, "using local speech synthesis");
  SpeechOutcome::LocalSynthesis { text, reason }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn short_text_is_untouched() {
    assert_eq!(prepare_speech_text("hello"), "hello");
    let exact = "a".repeat(MAX_SPEECH_CHARS);
    assert_eq!(prepare_speech_text(&exact), exact);
  }

  #[test]
  fn long_text_is_truncated_with_marker() {
    let long = "é".repeat(MAX_SPEECH_CHARS + 500);
    let out = prepare_speech_text(&long);
    assert!(out.ends_with(TRUNCATION_MARKER));
    assert_eq!(out.chars().count(), MAX_SPEECH_CHARS + TRUNCATION_MARKER.chars().count());
  }

  #[test]
  fn requirement_has_ten_percent_margin() {
    assert_eq!(required_characters(""), 0);
    assert_eq!(required_characters("hello"), 6);
    assert_eq!(required_characters(&"x".repeat(100)), 110);
    assert_eq!(required_characters(&"x".repeat(101)), 112);
  }

  #[test]
  fn status_thresholds() {
    let now = Utc::now();
    let q = |used, limit| QuotaInfo::from_provider(ProviderQuota { used, limit }, now);
    assert_eq!(q(0, 10_000).status(), QuotaStatus::Available);
    assert_eq!(q(9_500, 10_000).status(), QuotaStatus::Low);
    assert_eq!(q(10_000, 10_000).status(), QuotaStatus::Exceeded);
    assert_eq!(q(12_000, 10_000).characters_remaining, 0);
    assert_eq!(q(2_500, 10_000).percentage_used(), 25.0);
  }

  #[test]
  fn voice_settings_accept_both_key_styles() {
    let a: VoiceSettings = serde_json::from_str(r#"{"stability":0.3,"similarityBoost":0.9}"#).unwrap();
    let b: VoiceSettings = serde_json::from_str(r#"{"stability":0.3,"similarity_boost":0.9}"#).unwrap();
    assert_eq!(a, b);
    let d: VoiceSettings = serde_json::from_str("{}").unwrap();
    assert_eq!(d, VoiceSettings::default());
  }
}
