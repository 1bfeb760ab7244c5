//! API representation of an email.

use super::db_email::DbEmail;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Email {
  pub id: i64,
  pub message_id: String,
  pub from_email: String,
  pub from_name: Option<String>,
  pub to_email: String,
  pub subject: String,
  pub text_content: Option<String>,
  pub html_content: Option<String>,
  pub received_at: DateTime<Utc>,
  pub is_read: bool,
  pub is_important: bool,
  pub is_deleted: bool,
  pub attachments: Vec<String>,
  pub is_forwarded: bool,
  pub original_from: Option<String>,
  pub original_from_name: Option<String>,
  pub original_to: Option<String>,
  pub original_date: Option<String>,
  pub original_subject: Option<String>,
  pub actual_sender_email: Option<String>,
  pub actual_sender_name: Option<String>,
}

impl Email {
  /// Display name if known, else the address.
  pub fn sender_label(&self) -> &str {
    self
      .from_name
      .as_deref()
      .filter(|n| !n.trim().is_empty())
      .unwrap_or(&self.from_email)
  }

  /// Case-insensitive match of `needle` against the sender address or name.
  pub fn sender_matches(&self, needle: &str) -> bool {
    let needle = needle.to_lowercase();
    self.from_email.to_lowercase().contains(&needle)
      || self
        .from_name
        .as_deref()
        .is_some_and(|n| n.to_lowercase().contains(&needle))
  }

  /// Case-insensitive match against subject, sender and text body.
  pub fn matches_term(&self, term: &str) -> bool {
    self.subject_or_body_matches(term) || self.sender_matches(term)
  }

  /// Case-insensitive match against subject and text body only.
  pub fn subject_or_body_matches(&self, term: &str) -> bool {
    let term = term.to_lowercase();
    self.subject.to_lowercase().contains(&term)
      || self
        .text_content
        .as_deref()
        .is_some_and(|t| t.to_lowercase().contains(&term))
  }
}

impl From<DbEmail> for Email {
  fn from(d: DbEmail) -> Self {
    let attachments: Vec<String> = d
      .attachments_json
      .as_deref()
      .and_then(|s| serde_json::from_str(s).ok())
      .unwrap_or_default();
    Email {
      id: d.id,
      message_id: d.message_id,
      from_email: d.from_email,
      from_name: d.from_name,
      to_email: d.to_email,
      subject: d.subject,
      text_content: d.text_content,
      html_content: d.html_content,
      received_at: d.received_at,
      is_read: d.is_read,
      is_important: d.is_important,
      is_deleted: d.is_deleted,
      attachments,
      is_forwarded: d.is_forwarded,
      original_from: d.original_from,
      original_from_name: d.original_from_name,
      original_to: d.original_to,
      original_date: d.original_date,
      original_subject: d.original_subject,
      actual_sender_email: d.actual_sender_email,
      actual_sender_name: d.actual_sender_name,
    }
  }
}
