//! Resource CRUD handlers. Each resource router carries its `ResourceKind` as an extension;
//! single-record operations address the record with `?id=`.

use crate::error::AppError;
use crate::response;
use crate::schema::{Record, ResourceKind};
use crate::service::{parse_id, CrudService};
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde_json::Value;
use std::collections::HashMap;

/// Body must be a JSON object; malformed JSON is reported in the standard error shape.
pub(crate) fn body_to_record(payload: Result<Json<Value>, JsonRejection>) -> Result<Record, AppError> {
    let Json(value) = payload.map_err(|e| {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge
        } else {
            AppError::BadRequest(e.body_text())
        }
    })?;
    match value {
        Value::Object(m) => Ok(m),
        _ => Err(AppError::BadRequest("body must be a JSON object".into())),
    }
}

fn id_param(params: &HashMap<String, String>) -> Result<i64, AppError> {
    params.get("id").ok_or(AppError::InvalidId).and_then(|s| parse_id(s))
}

/// `GET /{resource}`: a single record when `id` is given (an empty `id` counts as absent),
/// otherwise the filtered list.
pub async fn list_or_read(
    State(state): State<AppState>,
    Extension(kind): Extension<ResourceKind>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let schema = kind.schema();
    if let Some(raw) = params.get("id").filter(|s| !s.is_empty()) {
        let record = CrudService::read(state.store.as_ref(), schema, parse_id(raw)?).await?;
        return Ok(response::ok(Value::Object(record)));
    }
    let rows = CrudService::list(state.store.as_ref(), schema, &params).await?;
    Ok(response::ok(Value::Array(rows.into_iter().map(Value::Object).collect())))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(kind): Extension<ResourceKind>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let schema = kind.schema();
    let body = body_to_record(payload)?;
    let record = CrudService::create(state.store.as_ref(), schema, &body).await?;
    Ok(response::created(record))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(kind): Extension<ResourceKind>,
    Query(params): Query<HashMap<String, String>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let schema = kind.schema();
    let id = id_param(&params)?;
    let body = body_to_record(payload)?;
    let record = CrudService::update(state.store.as_ref(), schema, id, &body).await?;
    Ok(response::ok(record))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(kind): Extension<ResourceKind>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let schema = kind.schema();
    let id = id_param(&params)?;
    let record = CrudService::delete(state.store.as_ref(), schema, id).await?;
    Ok(response::deleted(schema, record))
}

/// `GET /{resource}/{key}`: slug for blog posts, id for products, user id for memberships.
/// Resources without a key lookup answer `NOT_FOUND`.
pub async fn read_by_key(
    State(state): State<AppState>,
    Extension(kind): Extension<ResourceKind>,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let schema = kind.schema();
    let record = CrudService::read_by_key(state.store.as_ref(), schema, &key).await?;
    Ok(response::ok(record))
}

/// `GET /routines/lookup?pet_type=&apartment_size=`
pub async fn routine_lookup(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let record = CrudService::lookup_routine(
        state.store.as_ref(),
        params.get("pet_type").map(String::as_str),
        params.get("apartment_size").map(String::as_str),
    )
    .await?;
    Ok(response::ok(record))
}
