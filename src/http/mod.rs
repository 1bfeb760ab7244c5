//! HTTP router and handlers.

use crate::app::AppState;
use axum::{
  Json, Router,
  http::StatusCode,
  response::{IntoResponse, Response},
  routing::{get, post},
};
use tracing::error;

pub mod emails;
pub mod logs;
pub mod voice;
pub mod webhooks;

/// Assemble the HTTP router with all routes.
pub fn build_router(state: AppState) -> Router {
  Router::new()
    .route("/voice/command", post(voice::command))
    .route("/voice/speak", post(voice::speak))
    .route("/voice/quota", get(voice::quota))
    .route("/voice/logs", get(logs::list_voice_logs))
    .route("/webhooks/:provider", post(webhooks::receive))
    .route("/webhooks/:provider/raw", post(webhooks::receive_raw))
    .route("/emails", get(emails::list_emails))
    .route("/emails/simulate", post(webhooks::simulate))
    .route("/emails/search/:query", get(emails::search_emails))
    .route(
      "/emails/:id",
      get(emails::get_email)
        .put(emails::update_email)
        .delete(emails::delete_email),
    )
    .with_state(state)
}

/// Handler error rendered as `{ "error": "..." }`.
#[derive(Debug)]
pub enum ApiError {
  BadRequest(String),
  NotFound(String),
  Internal(crate::error::Error),
}

impl From<crate::error::Error> for ApiError {
  fn from(e: crate::error::Error) -> Self {
    ApiError::Internal(e)
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, msg) = match self {
      ApiError::BadRequest(s) => (StatusCode::BAD_REQUEST, s),
      ApiError::NotFound(s) => (StatusCode::NOT_FOUND, s),
      ApiError::Internal(e) => {
        error!("internal error: {e}");
        (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_string())
      }
    };
    (status, Json(serde_json::json!({ "error": msg }))).into_response()
  }
}
