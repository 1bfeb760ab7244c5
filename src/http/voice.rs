//! Voice endpoints: command dispatch, speech and quota.

use super::ApiError;
use crate::{
  app::AppState,
  audio::{SpeechOutcome, VoiceSettings},
  dispatch::CommandResult,
  models::log::NewVoiceCommandLog,
};
use axum::{
  Json,
  extract::{State, rejection::JsonRejection},
  http::{HeaderMap, HeaderValue, header},
  response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info};

/// Required non-empty string field of a JSON body.
fn required_text(
  payload: Result<Json<Value>, JsonRejection>,
  field: &str,
) -> Result<(String, Value), ApiError> {
  let Json(body) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
  let text = body
    .get(field)
    .and_then(Value::as_str)
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .ok_or_else(|| ApiError::BadRequest(format!("field '{field}' must be a non-empty string")))?
    .to_string();
  Ok((text, body))
}

pub async fn command(
  State(state): State<AppState>,
  payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<CommandResult>, ApiError> {
  let (transcript, _) = required_text(payload, "transcript")?;

  let intent = state.resolver.resolve(&transcript).await;
  info!(action = %intent.action, confidence = intent.confidence, "resolved voice command");
  let (action, confidence) = (intent.action, intent.confidence);
  let result = state.dispatcher.execute(intent).await;

  let entry = NewVoiceCommandLog::new(&transcript, action.as_str(), confidence, result.is_ok());
  if let Err(e) = state.store.log_voice_command(&entry).await {
    error!("voice command log write failed: {e}");
  }

  Ok(Json(result?))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LocalSpeech {
  use_web_speech: bool,
  text: String,
  message: &'static str,
}

pub async fn speak(
  State(state): State<AppState>,
  payload: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiError> {
  let (text, body) = required_text(payload, "text")?;
  let settings = match body.get("voiceSettings").or_else(|| body.get("voice_settings")) {
    None | Some(Value::Null) => None,
    Some(v) => Some(
      serde_json::from_value::<VoiceSettings>(v.clone())
        .map_err(|e| ApiError::BadRequest(format!("invalid voiceSettings: {e}")))?,
    ),
  };

  match state.audio.speak(&text, settings.as_ref()).await {
    SpeechOutcome::Audio { bytes, content_type } => {
      let mut headers = HeaderMap::new();
      headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&content_type).unwrap_or(HeaderValue::from_static("audio/mpeg")),
      );
      Ok((headers, bytes).into_response())
    }
    SpeechOutcome::LocalSynthesis { text, reason } => Ok(
      Json(LocalSpeech {
        use_web_speech: true,
        text,
        message: reason.message(),
      })
      .into_response(),
    ),
  }
}

pub async fn quota(State(state): State<AppState>) -> impl IntoResponse {
  Json(state.audio.check_quota_status().await)
}
