//! Database helpers: migrations, path handling and demo data.

use crate::{
    error::Result,
    ingest::{self, InboundEmail},
    store::{InsertOutcome, MailboxStore},
};
use sqlx::SqlitePool;
use std::path::Path;
use tracing::info;

/// Run SQLite migrations to create tables if absent.
pub async fn run_migrations(pool: &SqlitePool) -> std::result::Result<(), sqlx::Error> {
    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS emails (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            message_id TEXT NOT NULL UNIQUE,
            from_email TEXT NOT NULL,
            from_name TEXT NULL,
            to_email TEXT NOT NULL,
            subject TEXT NOT NULL,
            text_content TEXT NULL,
            html_content TEXT NULL,
            received_at TEXT NOT NULL,
            is_read INTEGER NOT NULL DEFAULT 0,
            is_important INTEGER NOT NULL DEFAULT 0,
            is_deleted INTEGER NOT NULL DEFAULT 0,
            attachments_json TEXT NULL,
            is_forwarded INTEGER NOT NULL DEFAULT 0,
            original_from TEXT NULL,
            original_from_name TEXT NULL,
            original_to TEXT NULL,
            original_date TEXT NULL,
            original_subject TEXT NULL,
            actual_sender_email TEXT NULL,
            actual_sender_name TEXT NULL
        )"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"CREATE INDEX IF NOT EXISTS idx_emails_received_at ON emails(received_at)"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS voice_command_logs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            transcript TEXT NOT NULL,
            action TEXT NOT NULL,
            confidence INTEGER NOT NULL,
            executed_at TEXT NOT NULL,
            success INTEGER NOT NULL
        )"#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

/// Ensure SQLite file and parent folder exist for a given sqlx URL.
pub fn ensure_sqlite_path(db_url: &str) -> String {
    if !db_url.starts_with("sqlite:") {
        return db_url.to_string();
    }
    let path_part = db_url.trim_start_matches("sqlite://");
    if path_part == ":memory:" {
        return db_url.to_string();
    }
    let (path_only, _) = match path_part.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (path_part, None),
    };
    if !path_only.is_empty() {
        let p = Path::new(path_only);
        if let Some(parent) = p.parent() {
            if !parent.as_os_str().is_empty() {
                let _ = std::fs::create_dir_all(parent);
            }
        }
        let _ = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(p);
    }
    db_url.to_string()
}

/// Insert a small demo mailbox when the store is empty. Returns how many rows were created.
pub async fn seed_demo_emails(store: &dyn MailboxStore) -> Result<usize> {
    if store.count_emails().await? > 0 {
        return Ok(0);
    }
    let demo = [
        InboundEmail::demo(
            "seed-1@voxmail.local",
            "Jane Doe <jane@example.com>",
            "Lunch on Friday?",
            "Are you free for lunch on Friday around noon?",
            "Mon, 13 Oct 2025 09:15:00 +0000",
        ),
        InboundEmail::demo(
            "seed-2@voxmail.local",
            "Billing <billing@utility.example>",
            "Your October statement",
            "Your statement is ready. Amount due: $42.17.",
            "Tue, 14 Oct 2025 07:02:00 +0000",
        ),
        InboundEmail::demo(
            "seed-3@voxmail.local",
            "Sam Lee <sam@work.example>",
            "Fwd: Project kickoff",
            "FYI\n\n---------- Forwarded message ---------\nFrom: Priya Patel <priya@client.example>\nDate: Wed, 15 Oct 2025 at 10:00\nSubject: Project kickoff\nTo: Sam Lee <sam@work.example>\n\nKickoff is confirmed for Monday at 9am.",
            "Wed, 15 Oct 2025 11:30:00 +0000",
        ),
    ];
    let mut created = 0;
    for inbound in demo {
        let new = ingest::build_new_email(&inbound);
        if let InsertOutcome::Created(_) = store.insert_email(&new).await? {
            created += 1;
        }
    }
    info!("seeded {created} demo emails");
    Ok(created)
}
