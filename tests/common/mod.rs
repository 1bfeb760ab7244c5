#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use bytes::Bytes;
use chrono::{DateTime, Duration, TimeZone, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};
use tokio::task::JoinHandle;
use voxmail::{
    Error, Result,
    app::AppState,
    audio::{Clock, ProviderQuota, TtsProvider, VoiceSettings},
    db, http,
    models::{
        email::{Email, EmailFilter, EmailPatch, NewEmail},
        log::{NewVoiceCommandLog, VoiceCommandLog},
    },
    nlu::{NluProvider, Summarizer},
    store::{InsertOutcome, MailboxStore, SqliteMailboxStore},
};

pub async fn memory_store() -> SqliteMailboxStore {
    let db_url = db::ensure_sqlite_path("sqlite://:memory:");
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(&db_url)
        .await
        .expect("connect memory sqlite");
    db::run_migrations(&pool).await.expect("migrate");
    SqliteMailboxStore::new(pool)
}

/// Deterministic timestamps: `minutes` after a fixed base.
pub fn at(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 10, 1, 8, 0, 0).unwrap() + Duration::minutes(minutes)
}

pub struct Seed<'a> {
    pub from: &'a str,
    pub subject: &'a str,
    pub body: &'a str,
    pub read: bool,
    pub important: bool,
    pub archived: bool,
}

impl<'a> Seed<'a> {
    pub fn new(from: &'a str, subject: &'a str) -> Self {
        Self { from, subject, body: "", read: false, important: false, archived: false }
    }
    pub fn body(mut self, body: &'a str) -> Self {
        self.body = body;
        self
    }
    pub fn read(mut self) -> Self {
        self.read = true;
        self
    }
    pub fn important(mut self) -> Self {
        self.important = true;
        self
    }
    pub fn archived(mut self) -> Self {
        self.archived = true;
        self
    }
}

/// Insert seeds in order; later seeds are received later.
pub async fn seed(store: &dyn MailboxStore, seeds: Vec<Seed<'_>>) -> Vec<Email> {
    let mut out = Vec::new();
    for (i, s) in seeds.into_iter().enumerate() {
        let new = NewEmail {
            message_id: format!("seed-{i}-{}", s.subject),
            from_email: format!("{}@example.com", s.from.to_lowercase().replace(' ', ".")),
            from_name: Some(s.from.to_string()),
            to_email: "me@example.com".into(),
            subject: s.subject.into(),
            text_content: Some(s.body.into()),
            received_at: Some(at(i as i64)),
            is_read: s.read,
            is_important: s.important,
            ..NewEmail::default()
        };
        let InsertOutcome::Created(mut email) = store.insert_email(&new).await.unwrap() else {
            panic!("seed collided");
        };
        if s.archived {
            email = store
                .update_email(email.id, &EmailPatch::deleted(true))
                .await
                .unwrap()
                .unwrap();
        }
        out.push(email);
    }
    out
}

#[derive(Default)]
pub struct CountingSummarizer {
    pub calls: AtomicUsize,
}

impl CountingSummarizer {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Summarizer for CountingSummarizer {
    async fn digest(&self, emails: &[Email], context: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(format!("digest of {} {context}", emails.len()))
    }
}

pub struct FailingSummarizer;

#[async_trait]
impl Summarizer for FailingSummarizer {
    async fn digest(&self, _emails: &[Email], _context: &str) -> Result<String> {
        Err(Error::Parse("summarizer offline".into()))
    }
}

/// Returns a fixed raw completion, or an error when `None`.
pub struct ScriptedNlu(pub Option<String>);

#[async_trait]
impl NluProvider for ScriptedNlu {
    async fn classify(&self, _transcript: &str) -> Result<String> {
        self.0.clone().ok_or_else(|| Error::Parse("nlu offline".into()))
    }
}

/// Delegates to SQLite but fails every update/delete after `allowed` succeed.
pub struct FlakyStore {
    pub inner: SqliteMailboxStore,
    pub allowed: usize,
    pub writes: AtomicUsize,
}

impl FlakyStore {
    pub fn new(inner: SqliteMailboxStore, allowed: usize) -> Self {
        Self { inner, allowed, writes: AtomicUsize::new(0) }
    }

    fn gate(&self) -> Result<()> {
        if self.writes.fetch_add(1, Ordering::SeqCst) >= self.allowed {
            Err(Error::Database(sqlx::Error::PoolTimedOut))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl MailboxStore for FlakyStore {
    async fn insert_email(&self, new: &NewEmail) -> Result<InsertOutcome> {
        self.inner.insert_email(new).await
    }
    async fn get_email(&self, id: i64) -> Result<Option<Email>> {
        self.inner.get_email(id).await
    }
    async fn find_by_message_id(&self, message_id: &str) -> Result<Option<Email>> {
        self.inner.find_by_message_id(message_id).await
    }
    async fn list_emails(&self, filter: &EmailFilter) -> Result<Vec<Email>> {
        self.inner.list_emails(filter).await
    }
    async fn search_emails(&self, query: &str) -> Result<Vec<Email>> {
        self.inner.search_emails(query).await
    }
    async fn find_by_sender(&self, sender: &str) -> Result<Vec<Email>> {
        self.inner.find_by_sender(sender).await
    }
    async fn update_email(&self, id: i64, patch: &EmailPatch) -> Result<Option<Email>> {
        self.gate()?;
        self.inner.update_email(id, patch).await
    }
    async fn delete_email(&self, id: i64) -> Result<bool> {
        self.gate()?;
        self.inner.delete_email(id).await
    }
    async fn count_emails(&self) -> Result<i64> {
        self.inner.count_emails().await
    }
    async fn log_voice_command(&self, entry: &NewVoiceCommandLog) -> Result<VoiceCommandLog> {
        self.inner.log_voice_command(entry).await
    }
    async fn list_voice_command_logs(&self, limit: u32) -> Result<Vec<VoiceCommandLog>> {
        self.inner.list_voice_command_logs(limit).await
    }
}

/// Scriptable TTS provider that records what it was asked to do.
pub struct FakeTts {
    pub quota: Mutex<Option<ProviderQuota>>,
    pub fail_synthesis: bool,
    pub quota_calls: AtomicUsize,
    pub synth_calls: AtomicUsize,
    pub last_text: Mutex<Option<String>>,
}

impl FakeTts {
    /// `quota = None` makes quota checks fail.
    pub fn new(quota: Option<ProviderQuota>, fail_synthesis: bool) -> Self {
        Self {
            quota: Mutex::new(quota),
            fail_synthesis,
            quota_calls: AtomicUsize::new(0),
            synth_calls: AtomicUsize::new(0),
            last_text: Mutex::new(None),
        }
    }

    pub fn with_remaining(remaining: u64) -> Self {
        Self::new(Some(ProviderQuota { used: 100_000 - remaining, limit: 100_000 }), false)
    }

    pub fn quota_calls(&self) -> usize {
        self.quota_calls.load(Ordering::SeqCst)
    }

    pub fn synth_calls(&self) -> usize {
        self.synth_calls.load(Ordering::SeqCst)
    }

    pub fn last_text(&self) -> Option<String> {
        self.last_text.lock().unwrap().clone()
    }
}

#[async_trait]
impl TtsProvider for FakeTts {
    async fn fetch_quota(&self) -> Result<ProviderQuota> {
        self.quota_calls.fetch_add(1, Ordering::SeqCst);
        let quota = *self.quota.lock().unwrap();
        quota.ok_or_else(|| Error::Parse("quota endpoint down".into()))
    }

    async fn synthesize(&self, text: &str, _settings: &VoiceSettings) -> Result<Bytes> {
        self.synth_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_text.lock().unwrap() = Some(text.to_string());
        if self.fail_synthesis {
            return Err(Error::Parse("synthesis failed".into()));
        }
        Ok(Bytes::from_static(b"ID3fake-mp3"))
    }
}

pub struct ManualClock(pub Mutex<DateTime<Utc>>);

impl ManualClock {
    pub fn new() -> Self {
        Self(Mutex::new(at(0)))
    }

    pub fn advance(&self, by: Duration) {
        *self.0.lock().unwrap() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

/// Serve `state` on an ephemeral port.
pub async fn start_server(state: AppState) -> (String, JoinHandle<()>) {
    let app: Router = http::build_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}", addr), handle)
}

pub fn shared<T>(value: T) -> Arc<T> {
    Arc::new(value)
}
