//! Success response helpers. Records and lists are returned bare, without an envelope.

use crate::schema::{Record, ResourceSchema};
use axum::{http::StatusCode, Json};
use serde::Serialize;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Deleted {
    pub message: String,
    pub deleted_record: Record,
}

pub fn ok<T: Serialize>(data: T) -> (StatusCode, Json<T>) {
    (StatusCode::OK, Json(data))
}

pub fn created<T: Serialize>(data: T) -> (StatusCode, Json<T>) {
    (StatusCode::CREATED, Json(data))
}

pub fn deleted(schema: &ResourceSchema, record: Record) -> (StatusCode, Json<Deleted>) {
    ok(Deleted {
        message: format!("{} deleted successfully", schema.label),
        deleted_record: record,
    })
}
