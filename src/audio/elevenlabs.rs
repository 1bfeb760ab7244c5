//! ElevenLabs TTS: paid cloud synthesis via REST API.
//!
//! GET  `https://api.elevenlabs.io/v1/user/subscription` for character usage.
//! POST `https://api.elevenlabs.io/v1/text-to-speech/{voice_id}` returns mp3 bytes.

use super::{ProviderQuota, TtsProvider, VoiceSettings};
use crate::error::{Error, Result};
use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;
use std::time::Duration;
use tracing::info;

const DEFAULT_BASE_URL: &str = "https://api.elevenlabs.io/v1";

pub struct ElevenLabsClient {
  api_key: String,
  voice_id: String,
  model_id: String,
  base_url: String,
  client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct Subscription {
  character_count: u64,
  character_limit: u64,
}

impl ElevenLabsClient {
  pub fn new(api_key: &str, voice_id: &str, model_id: &str, timeout: Duration) -> Result<Self> {
    let client = reqwest::Client::builder().timeout(timeout).build()?;
    Ok(Self {
      api_key: api_key.to_string(),
      voice_id: voice_id.to_string(),
      model_id: model_id.to_string(),
      base_url: DEFAULT_BASE_URL.to_string(),
      client,
    })
  }

  pub fn with_base_url(mut self, base_url: &str) -> Self {
    self.base_url = base_url.trim_end_matches('/').to_string();
    self
  }

  async fn check(resp: reqwest::Response) -> Result<reqwest::Response> {
    if resp.status().is_success() {
      return Ok(resp);
    }
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    Err(Error::Provider { status, body })
  }
}

#[async_trait]
impl TtsProvider for ElevenLabsClient {
  async fn fetch_quota(&self) -> Result<ProviderQuota> {
    let resp = self
      .client
      .get(format!("{}/user/subscription", self.base_url))
      .header("xi-api-key", &self.api_key)
      .send()
      .await?;
    let sub: Subscription = Self::check(resp).await?.json().await?;
    Ok(ProviderQuota {
      used: sub.character_count,
      limit: sub.character_limit,
    })
  }

  async fn synthesize(&self, text: &str, settings: &VoiceSettings) -> Result<Bytes> {
    info!(voice = %self.voice_id, text_len = text.len(), "ElevenLabs TTS request");

    let mut voice_settings = serde_json::json!({
      "stability": settings.stability,
      "similarity_boost": settings.similarity_boost,
    });
    if let Some(style) = settings.style {
      voice_settings["style"] = style.into();
    }
    if let Some(boost) = settings.use_speaker_boost {
      voice_settings["use_speaker_boost"] = boost.into();
    }
    let body = serde_json::json!({
      "text": text,
      "model_id": self.model_id,
      "voice_settings": voice_settings,
    });

    let resp = self
      .client
      .post(format!("{}/text-to-speech/{}", self.base_url, self.voice_id))
      .header("xi-api-key", &self.api_key)
      .header("Accept", "audio/mpeg")
      .json(&body)
      .send()
      .await?;
    let bytes = Self::check(resp).await?.bytes().await?;
    if bytes.is_empty() {
      return Err(Error::Parse("empty audio response".into()));
    }
    info!(bytes = bytes.len(), "ElevenLabs synthesis complete");
    Ok(bytes)
  }
}
