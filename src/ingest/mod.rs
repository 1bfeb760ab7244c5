//! Inbound email ingestion: payload validation, forwarding attribution and the
//! idempotent insert.

use crate::{
  error::{Error, Result},
  forwarding::{parse_forwarding, parse_mailbox},
  models::email::NewEmail,
  store::{InsertOutcome, MailboxStore},
  util::{collect_attachment_names, collect_headers, extract_bodies, html_to_text},
};
use chrono::{DateTime, Utc};
use mailparse::parse_mail;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

/// Webhook payload. Field names follow the common inbound-parse shapes.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundEmail {
  #[serde(alias = "message_id", alias = "Message-Id", alias = "message-id")]
  pub message_id: Option<String>,
  /// Envelope sender, `addr` or `Name <addr>`.
  pub from: Option<String>,
  #[serde(alias = "from_name")]
  pub from_name: Option<String>,
  pub to: Option<String>,
  pub subject: Option<String>,
  pub date: Option<String>,
  #[serde(alias = "text_content", alias = "textContent", alias = "body-plain")]
  pub text: Option<String>,
  #[serde(alias = "html_content", alias = "htmlContent", alias = "body-html")]
  pub html: Option<String>,
  #[serde(default)]
  pub attachments: Vec<InboundAttachment>,
}

/// Attachments arrive either as bare filenames or as objects; only the name is kept.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum InboundAttachment {
  Name(String),
  Meta {
    #[serde(alias = "name")]
    filename: Option<String>,
  },
}

impl InboundAttachment {
  fn filename(&self) -> Option<&str> {
    match self {
      InboundAttachment::Name(n) => Some(n.as_str()),
      InboundAttachment::Meta { filename } => filename.as_deref(),
    }
    .map(str::trim)
    .filter(|n| !n.is_empty())
  }
}

fn present(v: &Option<String>) -> bool {
  v.as_deref().is_some_and(|s| !s.trim().is_empty())
}

impl InboundEmail {
  /// Names of required fields that are missing or blank.
  pub fn missing_fields(&self) -> Vec<&'static str> {
    let mut missing = Vec::new();
    for (name, value) in [
      ("messageId", &self.message_id),
      ("from", &self.from),
      ("to", &self.to),
      ("subject", &self.subject),
      ("date", &self.date),
    ] {
      if !present(value) {
        missing.push(name);
      }
    }
    missing
  }

  /// Map a raw RFC 822 message into a payload.
  pub fn from_raw(raw: &[u8]) -> Result<Self> {
    let parsed = parse_mail(raw).map_err(|e| Error::Parse(format!("invalid message: {e}")))?;
    let headers = collect_headers(&parsed);
    let (text, html) = extract_bodies(&parsed);
    let attachments = collect_attachment_names(&parsed)
      .into_iter()
      .map(InboundAttachment::Name)
      .collect();
    Ok(Self {
      message_id: headers
        .get("message-id")
        .map(|s| s.trim().trim_matches(['<', '>']).to_string()),
      from: headers.get("from").cloned(),
      from_name: None,
      to: headers.get("to").cloned(),
      subject: headers.get("subject").cloned(),
      date: headers.get("date").cloned(),
      text,
      html,
      attachments,
    })
  }

  /// A locally generated message with a fresh `messageId` and the current date.
  pub fn simulated(from: &str, to: &str, subject: &str, text: &str) -> Self {
    Self {
      message_id: Some(format!("sim-{}@voxmail.local", Uuid::new_v4())),
      from: Some(from.to_string()),
      to: Some(to.to_string()),
      subject: Some(subject.to_string()),
      date: Some(Utc::now().to_rfc2822()),
      text: Some(text.to_string()),
      ..Self::default()
    }
  }

  pub(crate) fn demo(message_id: &str, from: &str, subject: &str, text: &str, date: &str) -> Self {
    Self {
      message_id: Some(message_id.to_string()),
      from: Some(from.to_string()),
      to: Some("me@voxmail.local".to_string()),
      subject: Some(subject.to_string()),
      date: Some(date.to_string()),
      text: Some(text.to_string()),
      ..Self::default()
    }
  }
}

/// RFC 2822 or RFC 3339; anything else is left to the store's ingestion time.
fn parse_date(raw: Option<&str>) -> Option<DateTime<Utc>> {
  let raw = raw?.trim();
  DateTime::parse_from_rfc2822(raw)
    .or_else(|_| DateTime::parse_from_rfc3339(raw))
    .ok()
    .map(|d| d.with_timezone(&Utc))
}

/// Build the stored record, attributing forwarded mail to its original sender.
///
/// When a forwarded header block is found, the original sender and subject
/// become the primary identity and the envelope sender is kept in
/// `actual_sender_*`.
pub fn build_new_email(inbound: &InboundEmail) -> NewEmail {
  let from_line = inbound.from.as_deref().unwrap_or_default();
  let (envelope_email, parsed_name) = parse_mailbox(from_line);
  let envelope_email = envelope_email.unwrap_or_else(|| from_line.trim().to_string());
  let envelope_name = inbound
    .from_name
    .clone()
    .filter(|n| !n.trim().is_empty())
    .or(parsed_name);

  let to_line = inbound.to.as_deref().unwrap_or_default();
  let to_email = parse_mailbox(to_line).0.unwrap_or_else(|| to_line.trim().to_string());
  let subject = inbound.subject.clone().unwrap_or_default().trim().to_string();

  let mut new = NewEmail {
    message_id: inbound.message_id.clone().unwrap_or_default().trim().to_string(),
    from_email: envelope_email.clone(),
    from_name: envelope_name.clone(),
    to_email,
    subject: subject.clone(),
    text_content: inbound.text.clone(),
    html_content: inbound.html.clone(),
    received_at: parse_date(inbound.date.as_deref()),
    attachments: inbound
      .attachments
      .iter()
      .filter_map(InboundAttachment::filename)
      .map(str::to_string)
      .collect(),
    ..NewEmail::default()
  };

  let body = inbound
    .text
    .clone()
    .or_else(|| inbound.html.as_deref().map(html_to_text));
  if let Some(fwd) = parse_forwarding(body.as_deref()) {
    new.is_forwarded = true;
    new.from_name = match (&fwd.original_from_name, &fwd.original_from) {
      (Some(name), _) => Some(name.clone()),
      (None, Some(_)) => None,
      (None, None) => envelope_name.clone(),
    };
    new.from_email = fwd.original_from.clone().unwrap_or(envelope_email.clone());
    new.subject = fwd.original_subject.clone().unwrap_or(subject);
    new.actual_sender_email = Some(envelope_email);
    new.actual_sender_name = envelope_name;
    new.original_from = fwd.original_from;
    new.original_from_name = fwd.original_from_name;
    new.original_to = fwd.original_to;
    new.original_date = fwd.original_date;
    new.original_subject = fwd.original_subject;
  }
  new
}

/// Store an already validated payload. A duplicate `messageId` is a no-op.
pub async fn ingest(store: &dyn MailboxStore, inbound: &InboundEmail) -> Result<InsertOutcome> {
  let new = build_new_email(inbound);
  let outcome = store.insert_email(&new).await?;
  match &outcome {
    InsertOutcome::Created(email) => info!(
      id = email.id,
      message_id = %email.message_id,
      forwarded = email.is_forwarded,
      "ingested email"
    ),
    InsertOutcome::Duplicate(id) => info!(id, message_id = %new.message_id, "duplicate email ignored"),
  }
  Ok(outcome)
}
