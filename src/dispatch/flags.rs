//! Read/important flag handlers.
//!
//! Targeting order: `all`, then a numeric `emailId`, then the most recently
//! received candidate.

use super::{Dispatcher, Reply, count_emails, describe};
use crate::{
  error::Result,
  intent::IntentParameters,
  models::email::{EmailFilter, EmailPatch},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum FlagChange {
  Read,
  Unread,
  Important,
  NotImportant,
}

impl FlagChange {
  fn patch(self) -> EmailPatch {
    match self {
      FlagChange::Read => EmailPatch::read(true),
      FlagChange::Unread => EmailPatch::read(false),
      FlagChange::Important => EmailPatch::important(true),
      FlagChange::NotImportant => EmailPatch::important(false),
    }
  }

  /// Non-archived emails whose flag would actually change.
  fn bulk_targets(self) -> EmailFilter {
    match self {
      FlagChange::Read => EmailFilter::active().read(false),
      FlagChange::Unread => EmailFilter::active().read(true),
      FlagChange::Important => EmailFilter::active().important(false),
      FlagChange::NotImportant => EmailFilter::active().important(true),
    }
  }

  /// Candidate for the implicit single target.
  fn fallback_target(self) -> EmailFilter {
    match self {
      FlagChange::NotImportant => EmailFilter::active().important(true).limit(1),
      _ => EmailFilter::active().limit(1),
    }
  }

  fn done_many(self, n: usize) -> String {
    let what = count_emails(n);
    match self {
      FlagChange::Read => format!("Marked {what} as read."),
      FlagChange::Unread => format!("Marked {what} as unread."),
      FlagChange::Important => format!("Marked {what} as important."),
      FlagChange::NotImportant => format!("Removed the important flag from {what}."),
    }
  }

  fn done_one(self, target: &str) -> String {
    match self {
      FlagChange::Read => format!("Marked {target} as read."),
      FlagChange::Unread => format!("Marked {target} as unread."),
      FlagChange::Important => format!("Marked {target} as important."),
      FlagChange::NotImportant => format!("Removed the important flag from {target}."),
    }
  }

  fn nothing_for_all(self) -> &'static str {
    match self {
      FlagChange::Read => "All your emails are already marked as read.",
      FlagChange::Unread => "All your emails are already unread.",
      FlagChange::Important => "All your emails are already marked as important.",
      FlagChange::NotImportant => "You don't have any important emails.",
    }
  }

  fn nothing_for_one(self) -> &'static str {
    match self {
      FlagChange::NotImportant => "You don't have any important emails to unmark.",
      _ => "There are no emails to update.",
    }
  }
}

impl Dispatcher {
  pub(super) async fn change_flag(&self, change: FlagChange, p: &IntentParameters) -> Result<Reply> {
    if p.wants_all() {
      let targets = self.store.list_emails(&change.bulk_targets()).await?;
      if targets.is_empty() {
        return Ok(Reply::with_emails(change.nothing_for_all(), Vec::new()));
      }
      let bulk = self.update_each(&targets, change.patch()).await;
      let summary = format!("{}{}", change.done_many(bulk.count()), bulk.abort_note());
      return Ok(Reply::with_emails(summary, bulk.changed));
    }

    let target = match p.email_id {
      Some(id) => match self.store.get_email(id).await? {
        Some(email) => email,
        None => return Ok(Reply::say(format!("I couldn't find email number {id}."))),
      },
      None => match self.store.list_emails(&change.fallback_target()).await?.into_iter().next() {
        Some(email) => email,
        None => return Ok(Reply::say(change.nothing_for_one())),
      },
    };

    match self.store.update_email(target.id, &change.patch()).await? {
      Some(updated) => Ok(Reply::with_emails(change.done_one(&describe(&updated)), vec![updated])),
      None => Ok(Reply::say(format!("I couldn't find email number {}.", target.id))),
    }
  }
}
