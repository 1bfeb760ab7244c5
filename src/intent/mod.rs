//! Intent model and resolution.
//!
//! The NLU provider is probabilistic and its output is free-form JSON. Everything
//! here is about turning that into a closed, validated [`Intent`] without ever
//! failing the caller.

use crate::nlu::NluProvider;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::{fmt, str::FromStr, sync::Arc};
use tracing::{debug, warn};

/// Every operation the dispatcher knows how to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
  ReadEmails,
  GetUnread,
  GetRead,
  SearchEmails,
  MarkAsRead,
  MarkUnread,
  DeleteEmails,
  MarkImportant,
  RemoveImportant,
  ArchiveEmails,
  RestoreEmails,
  UnarchiveEmails,
  GetImportant,
  GetRecent,
  GetArchived,
  PermanentlyDelete,
  ComposeEmail,
  ReplyEmail,
  ForwardEmail,
  SwitchTab,
  Unknown,
}

impl Action {
  pub const ALL: [Action; 21] = [
    Action::ReadEmails,
    Action::GetUnread,
    Action::GetRead,
    Action::SearchEmails,
    Action::MarkAsRead,
    Action::MarkUnread,
    Action::DeleteEmails,
    Action::MarkImportant,
    Action::RemoveImportant,
    Action::ArchiveEmails,
    Action::RestoreEmails,
    Action::UnarchiveEmails,
    Action::GetImportant,
    Action::GetRecent,
    Action::GetArchived,
    Action::PermanentlyDelete,
    Action::ComposeEmail,
    Action::ReplyEmail,
    Action::ForwardEmail,
    Action::SwitchTab,
    Action::Unknown,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      Action::ReadEmails => "read_emails",
      Action::GetUnread => "get_unread",
      Action::GetRead => "get_read",
      Action::SearchEmails => "search_emails",
      Action::MarkAsRead => "mark_as_read",
      Action::MarkUnread => "mark_unread",
      Action::DeleteEmails => "delete_emails",
      Action::MarkImportant => "mark_important",
      Action::RemoveImportant => "remove_important",
      Action::ArchiveEmails => "archive_emails",
      Action::RestoreEmails => "restore_emails",
      Action::UnarchiveEmails => "unarchive_emails",
      Action::GetImportant => "get_important",
      Action::GetRecent => "get_recent",
      Action::GetArchived => "get_archived",
      Action::PermanentlyDelete => "permanently_delete",
      Action::ComposeEmail => "compose_email",
      Action::ReplyEmail => "reply_email",
      Action::ForwardEmail => "forward_email",
      Action::SwitchTab => "switch_tab",
      Action::Unknown => "unknown",
    }
  }
}

impl fmt::Display for Action {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Action {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let key = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
    Action::ALL
      .into_iter()
      .find(|a| a.as_str() == key)
      .ok_or_else(|| format!("unknown action '{s}'"))
  }
}

/// Optional parameters extracted by the NLU step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentParameters {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub query: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub email_id: Option<i64>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub sender: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub subject: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub all: Option<bool>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub recipient: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub message: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub timeframe: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub tab: Option<String>,
}

impl IntentParameters {
  pub fn wants_all(&self) -> bool {
    self.all.unwrap_or(false)
  }

  /// Lenient extraction from an untyped JSON object.
  ///
  /// Strings are trimmed and dropped when empty, `emailId` accepts numbers and
  /// numeric strings, and `all` accepts booleans and `"true"`/`"yes"`.
  pub fn from_value(value: Option<&Value>) -> Self {
    let Some(obj) = value.and_then(Value::as_object) else {
      return Self::default();
    };
    Self {
      query: text(obj, &["query", "searchTerm", "search_term"]),
      email_id: email_id(obj),
      sender: text(obj, &["sender", "from"]),
      subject: text(obj, &["subject"]),
      all: flag(obj, "all"),
      recipient: text(obj, &["recipient", "to"]),
      message: text(obj, &["message", "body"]),
      timeframe: text(obj, &["timeframe"]),
      tab: text(obj, &["tab"]),
    }
  }
}

fn text(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
  keys.iter().find_map(|k| {
    obj
      .get(*k)
      .and_then(Value::as_str)
      .map(str::trim)
      .filter(|s| !s.is_empty())
      .map(str::to_string)
  })
}

fn email_id(obj: &Map<String, Value>) -> Option<i64> {
  let v = obj.get("emailId").or_else(|| obj.get("email_id"))?;
  match v {
    Value::Number(n) => n.as_i64().or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
    Value::String(s) => s.trim().trim_start_matches('#').parse().ok(),
    _ => None,
  }
}

fn flag(obj: &Map<String, Value>, key: &str) -> Option<bool> {
  match obj.get(key)? {
    Value::Bool(b) => Some(*b),
    Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
      "true" | "yes" | "1" => Some(true),
      "false" | "no" | "0" => Some(false),
      _ => None,
    },
    Value::Number(n) => n.as_i64().map(|i| i != 0),
    _ => None,
  }
}

/// Normalised output of intent resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
  pub action: Action,
  #[serde(default)]
  pub parameters: IntentParameters,
  /// Always within `[0, 1]`.
  pub confidence: f64,
}

impl Intent {
  pub fn new(action: Action, parameters: IntentParameters, confidence: f64) -> Self {
    Self {
      action,
      parameters,
      confidence: clamp_confidence(confidence),
    }
  }

  pub fn unknown() -> Self {
    Self::new(Action::Unknown, IntentParameters::default(), 0.0)
  }

  /// Normalise raw provider text into an intent.
  ///
  /// Accepts bare JSON as well as JSON wrapped in prose or a code fence. Anything
  /// that does not yield a recognised `action` collapses to [`Intent::unknown`].
  pub fn from_provider_output(raw: &str) -> Self {
    let Some(value) = extract_json_object(raw) else {
      return Self::unknown();
    };
    let Some(action) = value
      .get("action")
      .and_then(Value::as_str)
      .and_then(|s| s.parse::<Action>().ok())
    else {
      return Self::unknown();
    };
    if action == Action::Unknown {
      return Self::unknown();
    }
    let confidence = value.get("confidence").and_then(Value::as_f64).unwrap_or(0.0);
    Self::new(action, IntentParameters::from_value(value.get("parameters")), confidence)
  }
}

fn clamp_confidence(c: f64) -> f64 {
  if c.is_nan() { 0.0 } else { c.clamp(0.0, 1.0) }
}

fn extract_json_object(raw: &str) -> Option<Value> {
  let trimmed = raw.trim();
  if let Ok(v @ Value::Object(_)) = serde_json::from_str::<Value>(trimmed) {
    return Some(v);
  }
  let start = trimmed.find('{')?;
  let end = trimmed.rfind('}')?;
  if end <= start {
    return None;
  }
  match serde_json::from_str::<Value>(&trimmed[start..=end]) {
    Ok(v @ Value::Object(_)) => Some(v),
    _ => None,
  }
}

/// Resolves transcripts into intents through an optional NLU provider.
///
/// Without a provider every transcript resolves to [`Intent::unknown`].
#[derive(Clone)]
pub struct IntentResolver {
  provider: Option<Arc<dyn NluProvider>>,
}

impl IntentResolver {
  pub fn new(provider: Option<Arc<dyn NluProvider>>) -> Self {
    Self { provider }
  }

  pub async fn resolve(&self, transcript: &str) -> Intent {
    let Some(provider) = &self.provider else {
      debug!("no NLU provider configured; resolving to unknown");
      return Intent::unknown();
    };
    match provider.classify(transcript).await {
      Ok(raw) => {
        let intent = Intent::from_provider_output(&raw);
        if intent.action == Action::Unknown {
          debug!(raw = %raw, "provider output did not map to a known action");
        }
        intent
      }
      Err(e) => {
        warn!("intent resolution failed, falling back to unknown: {e}");
        Intent::unknown()
      }
    }
  }
}
