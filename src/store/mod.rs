//! Mailbox store: the persistence boundary used by ingestion, dispatch and the REST API.

use crate::{
  error::Result,
  models::{
    email::{DbEmail, Email, EmailFilter, EmailPatch, NewEmail, db_email::EMAIL_COLUMNS},
    log::{NewVoiceCommandLog, VoiceCommandLog},
  },
};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};

/// Result of an idempotent insert keyed on `message_id`.
#[derive(Debug, Clone, PartialEq)]
pub enum InsertOutcome {
  Created(Email),
  /// A row with the same `message_id` already exists; carries its id.
  Duplicate(i64),
}

#[async_trait]
pub trait MailboxStore: Send + Sync {
  async fn insert_email(&self, new: &NewEmail) -> Result<InsertOutcome>;
  async fn get_email(&self, id: i64) -> Result<Option<Email>>;
  async fn find_by_message_id(&self, message_id: &str) -> Result<Option<Email>>;
  /// Filtered read, newest first.
  async fn list_emails(&self, filter: &EmailFilter) -> Result<Vec<Email>>;
  /// Non-archived emails whose subject, sender or text body contain `query`,
  /// ignoring case.
  async fn search_emails(&self, query: &str) -> Result<Vec<Email>>;
  /// Non-archived emails whose sender address or name contain `sender`, ignoring case.
  async fn find_by_sender(&self, sender: &str) -> Result<Vec<Email>>;
  async fn update_email(&self, id: i64, patch: &EmailPatch) -> Result<Option<Email>>;
  /// Physically removes the row. Returns whether anything was deleted.
  async fn delete_email(&self, id: i64) -> Result<bool>;
  async fn count_emails(&self) -> Result<i64>;
  async fn log_voice_command(&self, entry: &NewVoiceCommandLog) -> Result<VoiceCommandLog>;
  /// Most recent entries, returned oldest first.
  async fn list_voice_command_logs(&self, limit: u32) -> Result<Vec<VoiceCommandLog>>;
}

/// [`MailboxStore`] backed by the SQLite pool.
#[derive(Clone)]
pub struct SqliteMailboxStore {
  pool: SqlitePool,
}

impl SqliteMailboxStore {
  pub fn new(pool: SqlitePool) -> Self {
    Self { pool }
  }

  fn select() -> QueryBuilder<'static, Sqlite> {
    QueryBuilder::new(format!("SELECT {EMAIL_COLUMNS} FROM emails WHERE 1 = 1"))
  }

  /// Non-archived rows, newest first. Term matching runs over these with the
  /// same Unicode case folding as the archive filters; terms are never patterns.
  async fn active(&self) -> Result<Vec<Email>> {
    let mut qb = Self::select();
    qb.push(" AND is_deleted = 0 ORDER BY received_at DESC, id DESC");
    self.fetch(qb).await
  }

  async fn fetch(&self, mut qb: QueryBuilder<'_, Sqlite>) -> Result<Vec<Email>> {
    let rows: Vec<DbEmail> = qb.build_query_as().fetch_all(&self.pool).await?;
    Ok(rows.into_iter().map(Email::from).collect())
  }
}

#[async_trait]
impl MailboxStore for SqliteMailboxStore {
  async fn insert_email(&self, new: &NewEmail) -> Result<InsertOutcome> {
    let attachments_json = if new.attachments.is_empty() {
      None
    } else {
      Some(serde_json::to_string(&new.attachments)?)
    };
    let res = sqlx::query(
      "INSERT INTO emails (message_id, from_email, from_name, to_email, subject, text_content, html_content, received_at, is_read, is_important, is_deleted, attachments_json, is_forwarded, original_from, original_from_name, original_to, original_date, original_subject, actual_sender_email, actual_sender_name) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, ?, ?, ?, ?, ?, ?, ?, ?, ?) ON CONFLICT(message_id) DO NOTHING",
    )
    .bind(&new.message_id)
    .bind(&new.from_email)
    .bind(&new.from_name)
    .bind(&new.to_email)
    .bind(&new.subject)
    .bind(&new.text_content)
    .bind(&new.html_content)
    .bind(new.received_at.unwrap_or_else(Utc::now))
    .bind(new.is_read)
    .bind(new.is_important)
    .bind(attachments_json)
    .bind(new.is_forwarded)
    .bind(&new.original_from)
    .bind(&new.original_from_name)
    .bind(&new.original_to)
    .bind(&new.original_date)
    .bind(&new.original_subject)
    .bind(&new.actual_sender_email)
    .bind(&new.actual_sender_name)
    .execute(&self.pool)
    .await?;

    if res.rows_affected() == 0 {
      let existing = self.find_by_message_id(&new.message_id).await?;
      let id = existing.map(|e| e.id).ok_or_else(|| {
        crate::error::Error::NotFound(format!("message {} vanished after conflict", new.message_id))
      })?;
      return Ok(InsertOutcome::Duplicate(id));
    }
    let id = res.last_insert_rowid();
    let created = self
      .get_email(id)
      .await?
      .ok_or_else(|| crate::error::Error::NotFound(format!("email {id}")))?;
    Ok(InsertOutcome::Created(created))
  }

  async fn get_email(&self, id: i64) -> Result<Option<Email>> {
    let row: Option<DbEmail> =
      sqlx::query_as(&format!("SELECT {EMAIL_COLUMNS} FROM emails WHERE id = ?"))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
    Ok(row.map(Email::from))
  }

  async fn find_by_message_id(&self, message_id: &str) -> Result<Option<Email>> {
    let row: Option<DbEmail> =
      sqlx::query_as(&format!("SELECT {EMAIL_COLUMNS} FROM emails WHERE message_id = ?"))
        .bind(message_id)
        .fetch_optional(&self.pool)
        .await?;
    Ok(row.map(Email::from))
  }

  async fn list_emails(&self, filter: &EmailFilter) -> Result<Vec<Email>> {
    let mut qb = Self::select();
    if let Some(v) = filter.is_read {
      qb.push(" AND is_read = ").push_bind(v);
    }
    if let Some(v) = filter.is_important {
      qb.push(" AND is_important = ").push_bind(v);
    }
    if let Some(v) = filter.is_deleted {
      qb.push(" AND is_deleted = ").push_bind(v);
    }
    qb.push(" ORDER BY received_at DESC, id DESC");
    if let Some(limit) = filter.limit {
      qb.push(" LIMIT ").push_bind(i64::from(limit));
    }
    self.fetch(qb).await
  }

  async fn search_emails(&self, query: &str) -> Result<Vec<Email>> {
    let term = query.trim();
    Ok(self.active().await?.into_iter().filter(|e| e.matches_term(term)).collect())
  }

  async fn find_by_sender(&self, sender: &str) -> Result<Vec<Email>> {
    let needle = sender.trim();
    Ok(self.active().await?.into_iter().filter(|e| e.sender_matches(needle)).collect())
  }

  async fn update_email(&self, id: i64, patch: &EmailPatch) -> Result<Option<Email>> {
    if !patch.is_empty() {
      let mut qb: QueryBuilder<'_, Sqlite> = QueryBuilder::new("UPDATE emails SET ");
      let mut sets = qb.separated(", ");
      if let Some(v) = patch.is_read {
        sets.push("is_read = ").push_bind_unseparated(v);
      }
      if let Some(v) = patch.is_important {
        sets.push("is_important = ").push_bind_unseparated(v);
      }
      if let Some(v) = patch.is_deleted {
        sets.push("is_deleted = ").push_bind_unseparated(v);
      }
      qb.push(" WHERE id = ").push_bind(id);
      qb.build().execute(&self.pool).await?;
    }
    self.get_email(id).await
  }

  async fn delete_email(&self, id: i64) -> Result<bool> {
    let res = sqlx::query("DELETE FROM emails WHERE id = ?")
      .bind(id)
      .execute(&self.pool)
      .await?;
    Ok(res.rows_affected() > 0)
  }

  async fn count_emails(&self) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM emails")
      .fetch_one(&self.pool)
      .await?;
    Ok(count)
  }

  async fn log_voice_command(&self, entry: &NewVoiceCommandLog) -> Result<VoiceCommandLog> {
    let executed_at = Utc::now();
    let res = sqlx::query(
      "INSERT INTO voice_command_logs (transcript, action, confidence, executed_at, success) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&entry.transcript)
    .bind(&entry.action)
    .bind(entry.confidence)
    .bind(executed_at)
    .bind(entry.success)
    .execute(&self.pool)
    .await?;
    Ok(VoiceCommandLog {
      id: res.last_insert_rowid(),
      transcript: entry.transcript.clone(),
      action: entry.action.clone(),
      confidence: entry.confidence,
      executed_at,
      success: entry.success,
    })
  }

  async fn list_voice_command_logs(&self, limit: u32) -> Result<Vec<VoiceCommandLog>> {
    let mut logs: Vec<VoiceCommandLog> = sqlx::query_as(
      "SELECT id, transcript, action, confidence, executed_at, success FROM voice_command_logs ORDER BY id DESC LIMIT ?",
    )
    .bind(i64::from(limit))
    .fetch_all(&self.pool)
    .await?;
    logs.reverse();
    Ok(logs)
  }
}
