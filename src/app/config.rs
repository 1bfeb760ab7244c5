//! Environment configuration.

use crate::error::{Error, Result};
use std::{net::SocketAddr, time::Duration};

/// Runtime configuration, built from environment variables.
///
/// Provider credentials are optional: without them the resolver answers
/// `unknown` and speech always falls back to local synthesis.
#[derive(Debug, Clone)]
pub struct AppConfig {
  pub database_url: String,
  pub addr: SocketAddr,
  pub seed_demo_data: bool,
  pub openai_api_key: Option<String>,
  pub nlu_model: String,
  pub nlu_base_url: String,
  pub elevenlabs_api_key: Option<String>,
  pub elevenlabs_voice_id: String,
  pub elevenlabs_model_id: String,
  pub provider_timeout: Duration,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      database_url: "sqlite://voxmail.db".to_string(),
      addr: SocketAddr::from(([127, 0, 0, 1], 8030)),
      seed_demo_data: false,
      openai_api_key: None,
      nlu_model: "gpt-4o-mini".to_string(),
      nlu_base_url: "https://api.openai.com/v1".to_string(),
      elevenlabs_api_key: None,
      elevenlabs_voice_id: "21m00Tcm4TlvDq8Ikwq5".to_string(),
      elevenlabs_model_id: "eleven_monolingual_v1".to_string(),
      provider_timeout: Duration::from_secs(30),
    }
  }
}

fn var(name: &str) -> Option<String> {
  std::env::var(name)
    .ok()
    .map(|v| v.trim().to_string())
    .filter(|v| !v.is_empty())
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    let defaults = Self::default();

    let addr = match var("VOXMAIL_ADDR") {
      Some(a) => a
        .parse()
        .map_err(|e| Error::Config(format!("VOXMAIL_ADDR '{a}': {e}")))?,
      None => defaults.addr,
    };
    let provider_timeout = match var("VOXMAIL_PROVIDER_TIMEOUT_SECS") {
      Some(s) => Duration::from_secs(
        s.parse()
          .map_err(|e| Error::Config(format!("VOXMAIL_PROVIDER_TIMEOUT_SECS '{s}': {e}")))?,
      ),
      None => defaults.provider_timeout,
    };

    Ok(Self {
      database_url: var("VOXMAIL_DATABASE").unwrap_or(defaults.database_url),
      addr,
      seed_demo_data: var("VOXMAIL_SEED")
        .is_some_and(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes")),
      openai_api_key: var("OPENAI_API_KEY"),
      nlu_model: var("VOXMAIL_NLU_MODEL").unwrap_or(defaults.nlu_model),
      nlu_base_url: var("VOXMAIL_NLU_URL").unwrap_or(defaults.nlu_base_url),
      elevenlabs_api_key: var("ELEVENLABS_API_KEY"),
      elevenlabs_voice_id: var("ELEVENLABS_VOICE_ID").unwrap_or(defaults.elevenlabs_voice_id),
      elevenlabs_model_id: var("ELEVENLABS_MODEL_ID").unwrap_or(defaults.elevenlabs_model_id),
      provider_timeout,
    })
  }
}
