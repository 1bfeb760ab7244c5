//! Action dispatch: executes a resolved [`Intent`] against the mailbox.
//!
//! Each action has its own handler. Handlers never mutate the store when they
//! cannot determine a target, and bulk handlers update one record at a time so
//! the reported count is always the number of rows that actually changed.

use crate::{
  error::{Error, Result},
  intent::{Action, Intent},
  models::email::{Email, EmailPatch},
  nlu::{LocalDigest, Summarizer},
  store::MailboxStore,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

mod archive;
mod flags;
mod read;

/// Outcome of dispatching one intent.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResult {
  pub intent: Intent,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub summary: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub emails: Option<Vec<Email>>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub switch_tab: Option<String>,
}

/// What a handler produced, before the intent is attached.
#[derive(Debug, Default)]
struct Reply {
  summary: String,
  emails: Option<Vec<Email>>,
  switch_tab: Option<String>,
}

impl Reply {
  fn say(summary: impl Into<String>) -> Self {
    Self { summary: summary.into(), ..Self::default() }
  }

  fn with_emails(summary: impl Into<String>, emails: Vec<Email>) -> Self {
    Self { summary: summary.into(), emails: Some(emails), ..Self::default() }
  }
}

/// Records changed by a bulk loop, and the error that stopped it early, if any.
struct Bulk {
  changed: Vec<Email>,
  aborted: Option<Error>,
}

impl Bulk {
  fn count(&self) -> usize {
    self.changed.len()
  }

  /// Appended to a summary when the loop stopped before covering every target.
  fn abort_note(&self) -> &'static str {
    if self.aborted.is_some() {
      " I ran into a problem partway through, so the rest were left unchanged."
    } else {
      ""
    }
  }
}

const CAPABILITIES: &str = "Sorry, I didn't understand that. You can ask me to read your unread emails, \
  search by sender or keyword, mark emails as read or important, archive or restore emails, \
  or switch tabs.";

pub struct Dispatcher {
  store: Arc<dyn MailboxStore>,
  summarizer: Arc<dyn Summarizer>,
}

impl Dispatcher {
  pub fn new(store: Arc<dyn MailboxStore>, summarizer: Arc<dyn Summarizer>) -> Self {
    Self { store, summarizer }
  }

  /// Execute an intent.
  ///
  /// Errors only when the store fails outside a bulk loop (for example the
  /// initial lookup); errors inside bulk loops truncate the loop instead.
  pub async fn execute(&self, intent: Intent) -> Result<CommandResult> {
    let p = &intent.parameters;
    let reply = match intent.action {
      Action::ReadEmails => self.read_emails().await?,
      Action::GetUnread => self.get_unread().await?,
      Action::GetRead => self.get_read().await?,
      Action::SearchEmails => self.search_emails(p).await?,
      Action::MarkAsRead => self.change_flag(flags::FlagChange::Read, p).await?,
      Action::MarkUnread => self.change_flag(flags::FlagChange::Unread, p).await?,
      Action::MarkImportant => self.change_flag(flags::FlagChange::Important, p).await?,
      Action::RemoveImportant => self.change_flag(flags::FlagChange::NotImportant, p).await?,
      Action::DeleteEmails | Action::ArchiveEmails => self.archive_emails(p).await?,
      Action::RestoreEmails | Action::UnarchiveEmails => self.restore_emails(p).await?,
      Action::GetImportant => self.get_important().await?,
      Action::GetRecent => self.get_recent(p).await?,
      Action::GetArchived => self.get_archived().await?,
      Action::PermanentlyDelete => self.permanently_delete(p).await?,
      Action::ComposeEmail => Reply::say("Composing new emails isn't available yet."),
      Action::ReplyEmail => Reply::say("Replying to emails isn't available yet."),
      Action::ForwardEmail => Reply::say("Forwarding emails isn't available yet."),
      Action::SwitchTab => switch_tab(p.tab.as_deref()),
      Action::Unknown => Reply::say(CAPABILITIES),
    };
    info!(action = %intent.action, summary = %reply.summary, "dispatched intent");
    Ok(CommandResult {
      intent,
      summary: Some(reply.summary),
      emails: reply.emails,
      switch_tab: reply.switch_tab,
    })
  }

  /// Spoken digest of `emails`; falls back to the local digest when the
  /// summarizer fails.
  async fn digest(&self, emails: &[Email], context: &str) -> String {
    match self.summarizer.digest(emails, context).await {
      Ok(text) if !text.trim().is_empty() => text,
      Ok(_) => LocalDigest::render(emails, context),
      Err(e) => {
        warn!("digest failed, using local summary: {e}");
        LocalDigest::render(emails, context)
      }
    }
  }

  /// Apply `patch` to each target in order, stopping at the first store error.
  async fn update_each(&self, targets: &[Email], patch: EmailPatch) -> Bulk {
    let mut changed = Vec::with_capacity(targets.len());
    for email in targets {
      match self.store.update_email(email.id, &patch).await {
        Ok(Some(updated)) => changed.push(updated),
        Ok(None) => {}
        Err(e) => {
          warn!(email_id = email.id, done = changed.len(), "bulk update aborted: {e}");
          return Bulk { changed, aborted: Some(e) };
        }
      }
    }
    Bulk { changed, aborted: None }
  }

  /// Physically delete each target in order, stopping at the first store error.
  async fn delete_each(&self, targets: &[Email]) -> Bulk {
    let mut changed = Vec::with_capacity(targets.len());
    for email in targets {
      match self.store.delete_email(email.id).await {
        Ok(true) => changed.push(email.clone()),
        Ok(false) => {}
        Err(e) => {
          warn!(email_id = email.id, done = changed.len(), "bulk delete aborted: {e}");
          return Bulk { changed, aborted: Some(e) };
        }
      }
    }
    Bulk { changed, aborted: None }
  }
}

fn switch_tab(tab: Option<&str>) -> Reply {
  let tab = tab
    .map(|t| t.trim().to_lowercase())
    .filter(|t| !t.is_empty())
    .unwrap_or_else(|| "all".to_string());
  Reply {
    summary: format!("Switched to the {tab} tab."),
    emails: None,
    switch_tab: Some(tab),
  }
}

/// "1 email" / "3 emails".
pub(crate) fn count_emails(n: usize) -> String {
  if n == 1 { "1 email".to_string() } else { format!("{n} emails") }
}

/// `the email from Jane about "Lunch"`.
fn describe(email: &Email) -> String {
  format!("the email from {} about \"{}\"", email.sender_label(), email.subject)
}
