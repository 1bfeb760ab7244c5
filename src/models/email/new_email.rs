//! Write-side inputs for the mailbox store.

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// A message ready to be stored. Produced by ingestion and seeding.
#[derive(Debug, Clone, Default)]
pub struct NewEmail {
    pub message_id: String,
    pub from_email: String,
    pub from_name: Option<String>,
    pub to_email: String,
    pub subject: String,
    pub text_content: Option<String>,
    pub html_content: Option<String>,
    /// Defaults to ingestion time when absent.
    pub received_at: Option<DateTime<Utc>>,
    pub is_read: bool,
    pub is_important: bool,
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

/// Flag changes applied by `update_email`. `None` leaves a column untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailPatch {
    pub is_read: Option<bool>,
    pub is_important: Option<bool>,
    pub is_deleted: Option<bool>,
}

impl EmailPatch {
    pub fn read(value: bool) -> Self {
        Self { is_read: Some(value), ..Self::default() }
    }

    pub fn important(value: bool) -> Self {
        Self { is_important: Some(value), ..Self::default() }
    }

    pub fn deleted(value: bool) -> Self {
        Self { is_deleted: Some(value), ..Self::default() }
    }

    pub fn is_empty(&self) -> bool {
        self.is_read.is_none() && self.is_important.is_none() && self.is_deleted.is_none()
    }
}

/// Filtered read over the mailbox. Results are always newest first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct EmailFilter {
    pub is_read: Option<bool>,
    pub is_important: Option<bool>,
    pub is_deleted: Option<bool>,
    pub limit: Option<u32>,
}

impl EmailFilter {
    /// Non-archived emails.
    pub fn active() -> Self {
        Self { is_deleted: Some(false), ..Self::default() }
    }

    /// Archived emails.
    pub fn archived() -> Self {
        Self { is_deleted: Some(true), ..Self::default() }
    }

    pub fn read(mut self, value: bool) -> Self {
        self.is_read = Some(value);
        self
    }

    pub fn important(mut self, value: bool) -> Self {
        self.is_important = Some(value);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}
