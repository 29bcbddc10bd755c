//! CrudService: schema-driven CRUD over a `Store`, plus the validation, uniqueness, merge and filter steps it runs.

mod crud;
mod filter;
mod merge;
mod uniqueness;
mod validation;

pub use crud::CrudService;
pub use filter::{parse_id, QueryFilter};
pub use merge::UpdateMerger;
pub use uniqueness::UniquenessChecker;
pub use validation::{normalize_field, RequestValidator};

use chrono::{DateTime, SecondsFormat, Utc};

/// Canonical timestamp text: UTC, millisecond precision, `Z` suffix. Sorts lexicographically.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn timestamp_now() -> String {
    format_timestamp(Utc::now())
}
