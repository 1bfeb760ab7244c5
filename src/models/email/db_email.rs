//! Database row for an email.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Column list matching [`DbEmail`], in declaration order.
pub const EMAIL_COLUMNS: &str = "id, message_id, from_email, from_name, to_email, subject, \
    text_content, html_content, received_at, is_read, is_important, is_deleted, attachments_json, \
    is_forwarded, original_from, original_from_name, original_to, original_date, original_subject, \
    actual_sender_email, actual_sender_name";

#[derive(Debug, FromRow)]
pub struct DbEmail {
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
    pub attachments_json: Option<String>,
    pub is_forwarded: bool,
    pub original_from: Option<String>,
    pub original_from_name: Option<String>,
    pub original_to: Option<String>,
    pub original_date: Option<String>,
    pub original_subject: Option<String>,
    pub actual_sender_email: Option<String>,
    pub actual_sender_name: Option<String>,
}
