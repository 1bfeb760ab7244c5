//! Voice command history.

use super::ApiError;
use crate::{app::AppState, models::log::VoiceCommandLog};
use axum::{
  Json,
  extract::{Query, State},
};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct LogParams {
  pub limit: Option<u32>,
}

/// Latest entries, oldest first.
pub async fn list_voice_logs(
  State(state): State<AppState>,
  Query(params): Query<LogParams>,
) -> Result<Json<Vec<VoiceCommandLog>>, ApiError> {
  let limit = params.limit.unwrap_or(200).clamp(1, 1000);
  Ok(Json(state.store.list_voice_command_logs(limit).await?))
}
