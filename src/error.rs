//! Typed errors and HTTP mapping.

use crate::case::to_screaming_snake_case;
use crate::generation::GenerationError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Datastore failures. Unique-index violations are kept apart so they can be reported like the pre-check.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("unique constraint violated on {field}")]
    UniqueViolation { field: &'static str },
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    #[error("{0}")]
    Backend(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{field} is required")]
    MissingField { field: &'static str },
    #[error("{field} must be {expected}")]
    InvalidType {
        field: &'static str,
        expected: &'static str,
    },
    #[error("{field} must be one of: {}", allowed.join(", "))]
    InvalidEnum {
        field: &'static str,
        allowed: &'static [&'static str],
    },
    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        field: &'static str,
        min: i64,
        max: i64,
    },
    #[error("{message}")]
    DuplicateValue {
        field: &'static str,
        message: &'static str,
    },
    #[error("{0}")]
    NotFound(String),
    #[error("Valid ID is required")]
    InvalidId,
    #[error("{0} is not supported for this resource")]
    NotAllowed(&'static str),
    #[error("{0}")]
    BadRequest(String),
    #[error("Request body is too large")]
    PayloadTooLarge,
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MissingField { .. }
            | AppError::InvalidType { .. }
            | AppError::InvalidEnum { .. }
            | AppError::OutOfRange { .. }
            | AppError::DuplicateValue { .. }
            | AppError::InvalidId
            | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::NotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            AppError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Generation(e) => e.status(),
            AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable code; `None` for internal errors, which only carry a message.
    pub fn code(&self) -> Option<String> {
        Some(match self {
            AppError::MissingField { field } => format!("MISSING_{}", to_screaming_snake_case(field)),
            AppError::InvalidType { field, .. }
            | AppError::InvalidEnum { field, .. }
            | AppError::OutOfRange { field, .. } => format!("INVALID_{}", to_screaming_snake_case(field)),
            AppError::DuplicateValue { field, .. } => format!("DUPLICATE_{}", to_screaming_snake_case(field)),
            AppError::NotFound(_) => "NOT_FOUND".into(),
            AppError::InvalidId => "INVALID_ID".into(),
            AppError::NotAllowed(_) => "METHOD_NOT_ALLOWED".into(),
            AppError::BadRequest(_) => "INVALID_BODY".into(),
            AppError::PayloadTooLarge => "PAYLOAD_TOO_LARGE".into(),
            AppError::Generation(e) => return e.code().map(String::from),
            AppError::Store(_) => return None,
        })
    }
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            AppError::Store(e) => {
                tracing::error!(error = %e, "datastore failure");
                ErrorBody {
                    error: format!("Internal server error: {}", e),
                    code: None,
                    details: None,
                }
            }
            AppError::Generation(e) => {
                tracing::warn!(error = %e, status = %status, "routine generation failed");
                ErrorBody {
                    error: e.public_message().to_string(),
                    code: self.code(),
                    details: e.details(),
                }
            }
            _ => ErrorBody {
                error: self.to_string(),
                code: self.code(),
                details: None,
            },
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::PRODUCT_PET_TYPES;

    #[test]
    fn codes_follow_field_names() {
        assert_eq!(
            AppError::MissingField { field: "affiliateLink" }.code().as_deref(),
            Some("MISSING_AFFILIATE_LINK")
        );
        assert_eq!(
            AppError::OutOfRange { field: "rating", min: 1, max: 5 }.code().as_deref(),
            Some("INVALID_RATING")
        );
        assert_eq!(
            AppError::DuplicateValue {
                field: "slug",
                message: "taken"
            }
            .code()
            .as_deref(),
            Some("DUPLICATE_SLUG")
        );
    }

    #[test]
    fn enum_message_lists_allowed_values_in_order() {
        let e = AppError::InvalidEnum {
            field: "petType",
            allowed: PRODUCT_PET_TYPES,
        };
        assert_eq!(e.to_string(), "petType must be one of: dog, cat, both");
        assert_eq!(e.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn duplicates_are_bad_requests_not_conflicts() {
        let e = AppError::DuplicateValue {
            field: "email",
            message: "Email already subscribed",
        };
        assert_eq!(e.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn store_errors_are_internal_without_code() {
        let e = AppError::from(StoreError::Backend("disk full".into()));
        assert_eq!(e.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(e.code(), None);
    }
}
