//! Inbound email webhooks and local simulation.

use super::ApiError;
use crate::{
  app::AppState,
  ingest::{self, InboundEmail},
  store::InsertOutcome,
};
use axum::{
  Json,
  extract::{Path as AxumPath, State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

#[derive(Debug, Serialize)]
pub struct IngestResponse {
  pub id: i64,
  pub duplicate: bool,
}

impl From<InsertOutcome> for IngestResponse {
  fn from(outcome: InsertOutcome) -> Self {
    match outcome {
      InsertOutcome::Created(email) => IngestResponse { id: email.id, duplicate: false },
      InsertOutcome::Duplicate(id) => IngestResponse { id, duplicate: true },
    }
  }
}

async fn accept(state: &AppState, provider: &str, inbound: InboundEmail) -> Result<Json<IngestResponse>, ApiError> {
  let missing = inbound.missing_fields();
  if !missing.is_empty() {
    warn!(provider, ?missing, "rejected inbound email");
    return Err(ApiError::BadRequest(format!("missing required fields: {}", missing.join(", "))));
  }
  let outcome = ingest::ingest(state.store.as_ref(), &inbound).await?;
  Ok(Json(outcome.into()))
}

pub async fn receive(
  State(state): State<AppState>,
  AxumPath(provider): AxumPath<String>,
  payload: Result<Json<InboundEmail>, JsonRejection>,
) -> Result<Json<IngestResponse>, ApiError> {
  let Json(inbound) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;
  info!(provider = %provider, "inbound webhook");
  accept(&state, &provider, inbound).await
}

pub async fn receive_raw(
  State(state): State<AppState>,
  AxumPath(provider): AxumPath<String>,
  body: axum::body::Bytes,
) -> Result<Json<IngestResponse>, ApiError> {
  let inbound = InboundEmail::from_raw(&body).map_err(|e| ApiError::BadRequest(e.to_string()))?;
  info!(provider = %provider, raw_len = body.len(), "inbound raw message");
  accept(&state, &provider, inbound).await
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SimulateRequest {
  pub from: Option<String>,
  pub to: Option<String>,
  pub subject: Option<String>,
  pub text: Option<String>,
}

pub async fn simulate(
  State(state): State<AppState>,
  payload: Option<Json<SimulateRequest>>,
) -> Result<Json<IngestResponse>, ApiError> {
  let req = payload.map(|Json(r)| r).unwrap_or_default();
  let inbound = InboundEmail::simulated(
    req.from.as_deref().unwrap_or("Simulator <simulator@voxmail.local>"),
    req.to.as_deref().unwrap_or("me@voxmail.local"),
    req.subject.as_deref().unwrap_or("Simulated message"),
    req.text.as_deref().unwrap_or("This message was generated locally."),
  );
  accept(&state, "simulate", inbound).await
}
