//! Language-model collaborators: intent classification and mailbox digests.

use crate::{error::Result, models::email::Email};
use async_trait::async_trait;

pub mod openai;

pub use openai::OpenAiClient;

/// Classifies a transcript. Returns the provider's raw text; normalisation
/// happens in [`crate::intent::Intent::from_provider_output`].
#[async_trait]
pub trait NluProvider: Send + Sync {
  async fn classify(&self, transcript: &str) -> Result<String>;
}

/// Produces a short spoken digest of a set of emails.
#[async_trait]
pub trait Summarizer: Send + Sync {
  /// `context` names what the set is ("unread emails", "search results"...).
  async fn digest(&self, emails: &[Email], context: &str) -> Result<String>;
}

/// Deterministic digest used without a language model, and as the fallback
/// when the remote digest fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalDigest;

impl LocalDigest {
  pub fn render(emails: &[Email], context: &str) -> String {
    let Some(latest) = emails.first() else {
      return format!("There are no {context}.");
    };
    let mut out = format!(
      "You have {}. The latest is from {} about \"{}\".",
      count_phrase(emails.len(), context),
      latest.sender_label(),
      latest.subject
    );
    let others: Vec<&str> = emails.iter().skip(1).take(2).map(Email::sender_label).collect();
    match others.as_slice() {
      [] => {}
      [one] => out.push_str(&format!(" There is also one from {one}.")),
      [a, b, ..] => out.push_str(&format!(" Others are from {a} and {b}.")),
    }
    out
  }
}

fn count_phrase(n: usize, context: &str) -> String {
  if n == 1 {
    // "unread emails" -> "1 unread email"
    format!("1 {}", context.strip_suffix('s').unwrap_or(context))
  } else {
    format!("{n} {context}")
  }
}

#[async_trait]
impl Summarizer for LocalDigest {
  async fn digest(&self, emails: &[Email], context: &str) -> Result<String> {
    Ok(Self::render(emails, context))
  }
}
