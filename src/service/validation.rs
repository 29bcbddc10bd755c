//! Request validation and normalization from the resource schema.

use crate::error::AppError;
use crate::schema::{Access, FieldKind, FieldSpec, Record, ResourceSchema};
use crate::service::format_timestamp;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde_json::Value;

const EMAIL_PATTERN: &str = r"^\S+@\S+$";

pub struct RequestValidator;

impl RequestValidator {
    /// Validate a create payload. Returns the normalized record: writable fields only,
    /// absent optional fields omitted, defaults applied. Fields are checked in schema order
    /// and the first failure is reported.
    pub fn validate(schema: &ResourceSchema, body: &Record) -> Result<Record, AppError> {
        let mut out = Record::new();
        for field in schema.fields {
            if field.access != Access::Writable {
                continue;
            }
            match normalize_field(field, body.get(field.name))? {
                Some(v) => {
                    out.insert(field.name.to_string(), v);
                }
                None if field.required => {
                    return Err(AppError::MissingField { field: field.name });
                }
                None => {
                    if let Some(default) = field.default {
                        out.insert(field.name.to_string(), default.to_value());
                    }
                }
            }
        }
        Ok(out)
    }

    /// Validate only the fields present in body (for PUT). Returns the change set:
    /// normalized values, or `null` where the caller cleared an optional field.
    pub fn validate_partial(schema: &ResourceSchema, body: &Record) -> Result<Record, AppError> {
        let mut out = Record::new();
        for field in schema.fields {
            if field.access == Access::Managed {
                continue;
            }
            let Some(raw) = body.get(field.name) else {
                continue;
            };
            match normalize_field(field, Some(raw))? {
                Some(v) => {
                    out.insert(field.name.to_string(), v);
                }
                None if field.nullable() && field.default.is_none() => {
                    out.insert(field.name.to_string(), Value::Null);
                }
                None => {
                    return Err(AppError::InvalidType {
                        field: field.name,
                        expected: non_empty_expectation(field.kind),
                    });
                }
            }
        }
        Ok(out)
    }
}

/// Normalize one raw value. `Ok(None)` means "no value": absent, `null` or blank after trimming.
pub fn normalize_field(field: &FieldSpec, raw: Option<&Value>) -> Result<Option<Value>, AppError> {
    let v = match raw {
        None | Some(Value::Null) => return Ok(None),
        Some(v) => v,
    };
    match field.kind {
        FieldKind::Text => {
            let s = expect_str(field, v, "a string")?;
            Ok(non_blank(s.trim()).map(|s| Value::String(s.to_string())))
        }
        FieldKind::Email => {
            let s = expect_str(field, v, "a valid email address")?;
            let Some(email) = non_blank(s.trim()) else {
                return Ok(None);
            };
            let email = email.to_lowercase();
            if !is_email(&email) {
                return Err(AppError::InvalidType {
                    field: field.name,
                    expected: "a valid email address",
                });
            }
            Ok(Some(Value::String(email)))
        }
        FieldKind::Enum(allowed) => {
            let invalid = || AppError::InvalidEnum {
                field: field.name,
                allowed,
            };
            let s = v.as_str().ok_or_else(invalid)?;
            let Some(s) = non_blank(s.trim()) else {
                return Ok(None);
            };
            let s = s.to_lowercase();
            if !allowed.contains(&s.as_str()) {
                return Err(invalid());
            }
            Ok(Some(Value::String(s)))
        }
        FieldKind::Integer { min, max } => {
            let n = as_whole_number(v).ok_or(AppError::InvalidType {
                field: field.name,
                expected: "a whole number",
            })?;
            let below = min.map(|m| n < m).unwrap_or(false);
            let above = max.map(|m| n > m).unwrap_or(false);
            if below || above {
                return Err(AppError::OutOfRange {
                    field: field.name,
                    min: min.unwrap_or(i64::MIN),
                    max: max.unwrap_or(i64::MAX),
                });
            }
            Ok(Some(Value::Number(n.into())))
        }
        FieldKind::Boolean => {
            let b = v.as_bool().ok_or(AppError::InvalidType {
                field: field.name,
                expected: "a boolean",
            })?;
            Ok(Some(Value::Bool(b)))
        }
        FieldKind::Timestamp => {
            let expected = "an RFC 3339 timestamp";
            let s = expect_str(field, v, expected)?;
            let Some(s) = non_blank(s.trim()) else {
                return Ok(None);
            };
            let parsed = DateTime::parse_from_rfc3339(s).map_err(|_| AppError::InvalidType {
                field: field.name,
                expected,
            })?;
            Ok(Some(Value::String(format_timestamp(parsed.with_timezone(&Utc)))))
        }
    }
}

fn expect_str<'a>(field: &FieldSpec, v: &'a Value, expected: &'static str) -> Result<&'a str, AppError> {
    v.as_str().ok_or(AppError::InvalidType {
        field: field.name,
        expected,
    })
}

fn non_blank(s: &str) -> Option<&str> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

fn as_whole_number(v: &Value) -> Option<i64> {
    if let Some(n) = v.as_i64() {
        return Some(n);
    }
    let f = v.as_f64()?;
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

fn is_email(s: &str) -> bool {
    Regex::new(EMAIL_PATTERN)
        .map(|re| re.is_match(s))
        .unwrap_or(false)
}

fn non_empty_expectation(kind: FieldKind) -> &'static str {
    match kind {
        FieldKind::Text => "a non-empty string",
        FieldKind::Email => "a valid email address",
        FieldKind::Enum(_) => "a non-empty string",
        FieldKind::Integer { .. } => "a whole number",
        FieldKind::Boolean => "a boolean",
        FieldKind::Timestamp => "an RFC 3339 timestamp",
    }
}
