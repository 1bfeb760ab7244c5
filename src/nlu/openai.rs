//! OpenAI-compatible chat completions adapter.
//!
//! POST `{base_url}/chat/completions`
//! Body: `{"model": "...", "messages": [...], "response_format": {"type": "json_object"}}`

use super::{NluProvider, Summarizer};
use crate::{
  error::{Error, Result},
  intent::Action,
  models::email::Email,
};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::info;

const DIGEST_EMAIL_LIMIT: usize = 10;
const DIGEST_BODY_CHARS: usize = 280;

pub struct OpenAiClient {
  api_key: String,
  model: String,
  base_url: String,
  client: reqwest::Client,
}

impl OpenAiClient {
  pub fn new(api_key: &str, model: &str, base_url: &str, timeout: Duration) -> Result<Self> {
    let client = reqwest::Client::builder().timeout(timeout).build()?;
    Ok(Self {
      api_key: api_key.to_string(),
      model: model.to_string(),
      base_url: base_url.trim_end_matches('/').to_string(),
      client,
    })
  }

  async fn complete(&self, system: &str, user: &str, json_mode: bool) -> Result<String> {
    let mut body = json!({
      "model": self.model,
      "temperature": 0,
      "messages": [
        { "role": "system", "content": system },
        { "role": "user", "content": user },
      ],
    });
    if json_mode {
      body["response_format"] = json!({ "type": "json_object" });
    }

    let resp = self
      .client
      .post(format!("{}/chat/completions", self.base_url))
      .bearer_auth(&self.api_key)
      .json(&body)
      .send()
      .await?;

    if !resp.status().is_success() {
      let status = resp.status();
      let body = resp.text().await.unwrap_or_default();
      return Err(Error::Provider { status, body });
    }

    let v: Value = resp.json().await?;
    v.pointer("/choices/0/message/content")
      .and_then(Value::as_str)
      .map(str::to_string)
      .ok_or_else(|| Error::Parse("completion has no message content".into()))
  }
}

fn classification_prompt() -> String {
  let actions: Vec<&str> = Action::ALL.iter().map(Action::as_str).collect();
  format!(
    "You map voice commands for an email inbox to JSON. Reply with one object: \
     {{\"action\": <one of {}>, \"parameters\": {{\"query\", \"emailId\", \"sender\", \"subject\", \
     \"all\", \"recipient\", \"message\", \"timeframe\", \"tab\"}} (only those present), \
     \"confidence\": <0..1>}}.",
    actions.join(", ")
  )
}

fn digest_prompt(emails: &[Email], context: &str) -> String {
  let mut out = format!(
    "Summarise these {context} for a listener in two or three spoken sentences. \
     Mention how many there are and the most notable senders and topics.\n"
  );
  for e in emails.iter().take(DIGEST_EMAIL_LIMIT) {
    let preview: String = e
      .text_content
      .as_deref()
      .unwrap_or_default()
      .chars()
      .take(DIGEST_BODY_CHARS)
      .collect();
    out.push_str(&format!(
      "\n- From: {} | Subject: {} | Read: {} | {}",
      e.sender_label(),
      e.subject,
      e.is_read,
      preview.replace('\n', " ")
    ));
  }
  out
}

#[async_trait]
impl NluProvider for OpenAiClient {
  async fn classify(&self, transcript: &str) -> Result<String> {
    info!(model = %self.model, transcript_len = transcript.len(), "NLU classify request");
    self.complete(&classification_prompt(), transcript, true).await
  }
}

#[async_trait]
impl Summarizer for OpenAiClient {
  async fn digest(&self, emails: &[Email], context: &str) -> Result<String> {
    info!(model = %self.model, emails = emails.len(), "digest request");
    let text = self
      .complete("You are a concise voice email assistant.", &digest_prompt(emails, context), false)
      .await?;
    Ok(text.trim().to_string())
  }
}
