//! Error types shared across the crate.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors raised by the store, the provider adapters and configuration.
#[derive(Debug, Error)]
pub enum Error {
  /// Database operation failed.
  #[error("database error: {0}")]
  Database(#[from] sqlx::Error),

  /// Underlying HTTP client error.
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  /// Serialization/deserialization error.
  #[error("serialization error: {0}")]
  Serde(#[from] serde_json::Error),

  /// Provider answered with a non-success status.
  #[error("provider returned {status}: {body}")]
  Provider { status: StatusCode, body: String },

  /// Provider answered successfully but the payload was unusable.
  #[error("parse error: {0}")]
  Parse(String),

  /// Invalid configuration value.
  #[error("configuration error: {0}")]
  Config(String),

  /// Requested record does not exist.
  #[error("not found: {0}")]
  NotFound(String),
}

/// Result type alias using the crate error.
pub type Result<T> = std::result::Result<T, Error>;
