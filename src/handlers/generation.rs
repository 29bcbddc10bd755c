//! Routine generation proxy handler.

use super::resource::body_to_record;
use crate::error::AppError;
use crate::response;
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use serde_json::Value;

#[derive(Serialize)]
pub struct GeneratedRoutine {
    pub routine: String,
}

/// `POST /routine-generation` with `{prompt}`; returns `{routine}` with the provider's raw text.
pub async fn generate_routine(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let body = body_to_record(payload)?;
    let prompt = body.get("prompt").and_then(Value::as_str).unwrap_or_default();
    let routine = state.generator.generate(prompt).await?;
    tracing::info!(provider = %state.generator.provider(), chars = routine.len(), "routine generated");
    Ok(response::ok(GeneratedRoutine { routine }))
}
