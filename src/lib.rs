//! voxmail library entrypoint.
//!
//! Modules:
//! - `app`: startup, configuration, shared state
//! - `http`: Axum router and handlers
//! - `intent`: closed action set and fail-soft intent resolution
//! - `dispatch`: executes intents against the mailbox
//! - `audio`: premium TTS with quota cache and local-synthesis fallback
//! - `forwarding`: forwarded-message header detection
//! - `ingest`: webhook payloads into stored emails
//! - `nlu`: language-model collaborators (classification, digests)
//! - `store`: mailbox persistence boundary and its SQLite implementation
//! - `db`: migrations, SQLite helpers and demo data
//! - `models`: typed records used across layers
//! - `util`: helpers for tracing and mail parsing

pub mod app;
pub mod audio;
pub mod db;
pub mod dispatch;
pub mod error;
pub mod forwarding;
pub mod http;
pub mod ingest;
pub mod intent;
pub mod models;
pub mod nlu;
pub mod store;
pub mod util;

pub use error::{Error, Result};
