//! Read-only handlers: listings, search and digests.

use super::{Dispatcher, Reply, count_emails};
use crate::{error::Result, intent::IntentParameters, models::email::EmailFilter};

const READ_LIMIT: u32 = 5;
const LOOKUP_LIMIT: u32 = 10;

pub(super) const NO_UNREAD: &str = "You're all caught up! You have no unread emails.";
pub(super) const NO_READ: &str = "You haven't read any emails yet.";
pub(super) const EMPTY_INBOX: &str = "Your inbox is empty.";

impl Dispatcher {
  async fn listing(&self, filter: EmailFilter, context: &str, empty: &str) -> Result<Reply> {
    let emails = self.store.list_emails(&filter).await?;
    if emails.is_empty() {
      return Ok(Reply::with_emails(empty, emails));
    }
    let summary = self.digest(&emails, context).await;
    Ok(Reply::with_emails(summary, emails))
  }

  pub(super) async fn read_emails(&self) -> Result<Reply> {
    self
      .listing(EmailFilter::active().limit(READ_LIMIT), "emails", EMPTY_INBOX)
      .await
  }

  pub(super) async fn get_unread(&self) -> Result<Reply> {
    self
      .listing(EmailFilter::active().read(false).limit(READ_LIMIT), "unread emails", NO_UNREAD)
      .await
  }

  pub(super) async fn get_read(&self) -> Result<Reply> {
    self
      .listing(EmailFilter::active().read(true).limit(READ_LIMIT), "read emails", NO_READ)
      .await
  }

  pub(super) async fn get_important(&self) -> Result<Reply> {
    self
      .listing(
        EmailFilter::active().important(true).limit(LOOKUP_LIMIT),
        "important emails",
        "You don't have any important emails.",
      )
      .await
  }

  /// The window is always the latest ten; `timeframe` only changes the wording.
  pub(super) async fn get_recent(&self, p: &IntentParameters) -> Result<Reply> {
    let phrase = match p.timeframe.as_deref().map(str::to_lowercase).as_deref() {
      None | Some("recent") | Some("recently") => "recent emails".to_string(),
      Some(tf @ ("today" | "this week" | "yesterday" | "this month")) => format!("emails from {tf}"),
      Some(tf) => format!("{tf} emails"),
    };
    let emails = self
      .store
      .list_emails(&EmailFilter::active().limit(LOOKUP_LIMIT))
      .await?;
    if emails.is_empty() {
      return Ok(Reply::with_emails(format!("You don't have any {phrase}."), emails));
    }
    let digest = self.digest(&emails, &phrase).await;
    Ok(Reply::with_emails(format!("Here are your {phrase}. {digest}"), emails))
  }

  pub(super) async fn get_archived(&self) -> Result<Reply> {
    self
      .listing(
        EmailFilter::archived(),
        "archived emails",
        "You don't have any archived emails.",
      )
      .await
  }

  /// Sender takes precedence over query; `subject` is accepted as a query.
  pub(super) async fn search_emails(&self, p: &IntentParameters) -> Result<Reply> {
    let (emails, label) = if let Some(sender) = p.sender.as_deref() {
      (self.store.find_by_sender(sender).await?, format!("from {sender}"))
    } else if let Some(query) = p.query.as_deref().or(p.subject.as_deref()) {
      (self.store.search_emails(query).await?, format!("matching \"{query}\""))
    } else {
      return Ok(Reply::say(
        "What would you like me to search for? You can give me a sender or a keyword.",
      ));
    };

    if emails.is_empty() {
      return Ok(Reply::with_emails(format!("I couldn't find any emails {label}."), emails));
    }
    let digest = self.digest(&emails, "matching emails").await;
    let summary = format!("Found {} {label}. {digest}", count_emails(emails.len()));
    Ok(Reply::with_emails(summary, emails))
  }
}
