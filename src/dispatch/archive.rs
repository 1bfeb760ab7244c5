//! Archive, restore and permanent deletion.

use super::{Dispatcher, Reply, count_emails};
use crate::{
  error::Result,
  intent::IntentParameters,
  models::email::{Email, EmailFilter, EmailPatch},
};

impl Dispatcher {
  /// `delete_emails` and `archive_emails`: soft delete only.
  pub(super) async fn archive_emails(&self, p: &IntentParameters) -> Result<Reply> {
    let (targets, label) = if p.wants_all() {
      (self.store.list_emails(&EmailFilter::active()).await?, None)
    } else if let Some(query) = p.query.as_deref() {
      (self.store.search_emails(query).await?, Some(format!("matching \"{query}\"")))
    } else if let Some(sender) = p.sender.as_deref() {
      (self.store.find_by_sender(sender).await?, Some(format!("from {sender}")))
    } else {
      return Ok(Reply::say(
        "Which emails should I archive? Say \"all\", or give me a keyword or a sender.",
      ));
    };

    if targets.is_empty() {
      let summary = match label {
        Some(label) => format!("I couldn't find any emails {label} to archive."),
        None => "There are no emails to archive.".to_string(),
      };
      return Ok(Reply::with_emails(summary, targets));
    }
    let bulk = self.update_each(&targets, EmailPatch::deleted(true)).await;
    let summary = format!(
      "Archived {}. You can restore them from the archive.{}",
      count_emails(bulk.count()),
      bulk.abort_note()
    );
    Ok(Reply::with_emails(summary, bulk.changed))
  }

  /// `restore_emails` and `unarchive_emails`.
  ///
  /// Query matches are computed over the archived set itself: search excludes
  /// archived rows, so restoring from search output would never restore anything.
  pub(super) async fn restore_emails(&self, p: &IntentParameters) -> Result<Reply> {
    let (targets, label) = if p.wants_all() {
      (self.archived().await?, None)
    } else if let Some(sender) = p.sender.as_deref() {
      let targets = self.archived_where(|e| e.sender_matches(sender)).await?;
      (targets, Some(format!("from {sender}")))
    } else if let Some(query) = p.query.as_deref() {
      let targets = self.archived_where(|e| e.matches_term(query)).await?;
      (targets, Some(format!("matching \"{query}\"")))
    } else {
      return Ok(Reply::say(
        "Which emails should I restore? Say \"all\", or give me a keyword or a sender.",
      ));
    };

    if targets.is_empty() {
      let summary = match label {
        Some(label) => format!("I couldn't find any archived emails {label}."),
        None => "There are no archived emails to restore.".to_string(),
      };
      return Ok(Reply::with_emails(summary, targets));
    }
    let bulk = self.update_each(&targets, EmailPatch::deleted(false)).await;
    let summary = format!("Restored {} to your inbox.{}", count_emails(bulk.count()), bulk.abort_note());
    Ok(Reply::with_emails(summary, bulk.changed))
  }

  /// The only irreversible action. Only archived emails are ever removed.
  pub(super) async fn permanently_delete(&self, p: &IntentParameters) -> Result<Reply> {
    let (targets, label) = if p.wants_all() {
      (self.archived().await?, None)
    } else if let Some(query) = p.query.as_deref() {
      let targets = self.archived_where(|e| e.subject_or_body_matches(query)).await?;
      (targets, Some(format!("matching \"{query}\"")))
    } else {
      return Ok(Reply::say(
        "Which archived emails should I permanently delete? Say \"all\" or give me a keyword.",
      ));
    };

    if targets.is_empty() {
      let summary = match label {
        Some(label) => format!("I couldn't find any archived emails {label} to delete."),
        None => "There are no archived emails to delete.".to_string(),
      };
      return Ok(Reply::with_emails(summary, targets));
    }
    let bulk = self.delete_each(&targets).await;
    let summary = format!(
      "Permanently deleted {}. This cannot be undone.{}",
      count_emails(bulk.count()),
      bulk.abort_note()
    );
    Ok(Reply::with_emails(summary, bulk.changed))
  }

  async fn archived(&self) -> Result<Vec<Email>> {
    self.store.list_emails(&EmailFilter::archived()).await
  }

  async fn archived_where(&self, keep: impl Fn(&Email) -> bool) -> Result<Vec<Email>> {
    Ok(self.archived().await?.into_iter().filter(|e| keep(e)).collect())
  }
}
