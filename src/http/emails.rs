//! Mailbox JSON APIs: direct store passthroughs.

use super::ApiError;
use crate::{
  app::AppState,
  models::email::{Email, EmailFilter, EmailPatch},
};
use axum::{
  Json,
  extract::{Path as AxumPath, Query, State, rejection::JsonRejection},
  http::StatusCode,
};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  pub read: Option<bool>,
  pub important: Option<bool>,
  /// Archived emails are hidden unless asked for.
  pub archived: Option<bool>,
  pub limit: Option<u32>,
}

impl ListParams {
  fn filter(&self) -> EmailFilter {
    EmailFilter {
      is_read: self.read,
      is_important: self.important,
      is_deleted: Some(self.archived.unwrap_or(false)),
      limit: Some(self.limit.unwrap_or(50).clamp(1, 200)),
    }
  }
}

pub async fn list_emails(
  State(state): State<AppState>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Email>>, ApiError> {
  Ok(Json(state.store.list_emails(&params.filter()).await?))
}

pub async fn get_email(
  State(state): State<AppState>,
  AxumPath(id): AxumPath<i64>,
) -> Result<Json<Email>, ApiError> {
  state
    .store
    .get_email(id)
    .await?
    .map(Json)
    .ok_or_else(|| ApiError::NotFound("email not found".into()))
}

pub async fn update_email(
  State(state): State<AppState>,
  AxumPath(id): AxumPath<i64>,
  payload: Result<Json<EmailPatch>, JsonRejection>,
) -> Result<Json<Email>, ApiError> {
  let Json(patch) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
  state
    .store
    .update_email(id, &patch)
    .await?
    .map(Json)
    .ok_or_else(|| ApiError::NotFound("email not found".into()))
}

/// Permanent removal.
pub async fn delete_email(
  State(state): State<AppState>,
  AxumPath(id): AxumPath<i64>,
) -> Result<StatusCode, ApiError> {
  if state.store.delete_email(id).await? {
    Ok(StatusCode::NO_CONTENT)
  } else {
    Err(ApiError::NotFound("email not found".into()))
  }
}

pub async fn search_emails(
  State(state): State<AppState>,
  AxumPath(query): AxumPath<String>,
) -> Result<Json<Vec<Email>>, ApiError> {
  let query = query.trim();
  if query.is_empty() {
    return Err(ApiError::BadRequest("search query must not be empty".into()));
  }
  Ok(Json(state.store.search_emails(query).await?))
}
