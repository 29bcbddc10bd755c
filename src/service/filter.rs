//! List query parameters to store predicates.

use crate::error::AppError;
use crate::schema::{FilterKind, ResourceSchema};
use crate::store::{ListQuery, Predicate, DEFAULT_LIMIT, MAX_LIMIT};
use serde_json::Value;
use std::collections::HashMap;

/// Numeric record id from a path segment or `?id=`.
pub fn parse_id(s: &str) -> Result<i64, AppError> {
    s.parse::<i64>().map_err(|_| AppError::InvalidId)
}

pub struct QueryFilter;

impl QueryFilter {
    /// Build the list query. `limit`/`offset` read their leading integer (`"500abc"` is 500);
    /// without digits they fall back to their defaults. `limit` is capped at 100, `offset`
    /// floored at 0. Unknown parameters are ignored.
    pub fn from_params(schema: &ResourceSchema, params: &HashMap<String, String>) -> Result<ListQuery, AppError> {
        let mut query = ListQuery::new(schema);

        let limit = params
            .get("limit")
            .and_then(|v| leading_int(v))
            .unwrap_or(i64::from(DEFAULT_LIMIT));
        query.limit = limit.clamp(0, i64::from(MAX_LIMIT)) as u32;
        query.offset = params
            .get("offset")
            .and_then(|v| leading_int(v))
            .unwrap_or(0)
            .max(0) as u64;

        if let Some(term) = params.get("search").filter(|s| !s.is_empty()) {
            if !schema.search_fields.is_empty() {
                query.predicates.push(Predicate::Search {
                    fields: schema.search_fields,
                    term: term.clone(),
                });
            }
        }

        for filter in schema.filters {
            let raw = params.get(filter.param);
            let value = match filter.kind {
                FilterKind::Enum => match raw.map(|s| s.trim()).filter(|s| !s.is_empty()) {
                    Some(s) => Some(Value::String(enum_value(schema, filter.field, s)?)),
                    None => None,
                },
                FilterKind::Bool { default } => match raw {
                    Some(s) => Some(Value::Bool(s == "true")),
                    None => default.map(Value::Bool),
                },
                FilterKind::Exact => raw.filter(|s| !s.is_empty()).map(|s| Value::String(s.clone())),
            };
            if let Some(value) = value {
                query.predicates.push(Predicate::Eq {
                    field: filter.field,
                    value,
                });
            }
        }
        Ok(query)
    }
}

/// Optional sign then the leading run of digits; overflow saturates. `None` without digits.
fn leading_int(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let (negative, rest) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let n = rest[..digits].parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -n } else { n })
}

/// Lower-case and check against the target field's allow-list.
pub(crate) fn enum_value(schema: &ResourceSchema, field: &'static str, raw: &str) -> Result<String, AppError> {
    let allowed = schema
        .field(field)
        .and_then(|f| f.allowed_values())
        .unwrap_or_default();
    let v = raw.trim().to_lowercase();
    if allowed.contains(&v.as_str()) {
        Ok(v)
    } else {
        Err(AppError::InvalidEnum { field, allowed })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{BLOG_POSTS, EMAIL_LEADS, MEMBERSHIPS, PRODUCTS};
    use rstest::rstest;
    use serde_json::json;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[rstest]
    #[case(&[], 10, 0)]
    #[case(&[("limit", "500")], 100, 0)]
    #[case(&[("limit", "abc"), ("offset", "x")], 10, 0)]
    #[case(&[("limit", "-3"), ("offset", "-7")], 0, 0)]
    #[case(&[("limit", "25"), ("offset", "50")], 25, 50)]
    #[case(&[("limit", "99999999999999999999")], 100, 0)]
    #[case(&[("limit", "500abc")], 100, 0)]
    #[case(&[("limit", "1e3"), ("offset", " 20px")], 1, 20)]
    #[case(&[("limit", "-99999999999999999999")], 0, 0)]
    fn paging_defaults_and_clamps(#[case] pairs: &[(&str, &str)], #[case] limit: u32, #[case] offset: u64) {
        let q = QueryFilter::from_params(&PRODUCTS, &params(pairs)).unwrap();
        assert_eq!(q.limit, limit);
        assert_eq!(q.offset, offset);
    }

    #[test]
    fn blog_posts_default_to_published_only() {
        let q = QueryFilter::from_params(&BLOG_POSTS, &params(&[])).unwrap();
        assert_eq!(
            q.predicates,
            vec![Predicate::Eq {
                field: "published",
                value: json!(true)
            }]
        );
    }

    #[rstest]
    #[case("true", true)]
    #[case("false", false)]
    #[case("TRUE", false)]
    #[case("", false)]
    fn boolean_filters_compare_to_literal_true(#[case] raw: &str, #[case] expected: bool) {
        let q = QueryFilter::from_params(&EMAIL_LEADS, &params(&[("subscribed", raw)])).unwrap();
        assert_eq!(
            q.predicates,
            vec![Predicate::Eq {
                field: "subscribed",
                value: json!(expected)
            }]
        );
    }

    #[test]
    fn optional_boolean_filter_absent_means_no_predicate() {
        let q = QueryFilter::from_params(&PRODUCTS, &params(&[])).unwrap();
        assert!(q.predicates.is_empty());
    }

    #[test]
    fn enum_filters_are_lowercased_and_validated() {
        let q = QueryFilter::from_params(&PRODUCTS, &params(&[("pet_type", " Dog ")])).unwrap();
        assert_eq!(
            q.predicates,
            vec![Predicate::Eq {
                field: "petType",
                value: json!("dog")
            }]
        );

        let err = QueryFilter::from_params(&PRODUCTS, &params(&[("category", "snacks")])).unwrap_err();
        assert_eq!(err.code().as_deref(), Some("INVALID_CATEGORY"));
        assert_eq!(
            err.to_string(),
            "category must be one of: food, toys, grooming, bedding, training, health"
        );
    }

    #[test]
    fn search_spans_the_schema_fields() {
        let q = QueryFilter::from_params(&PRODUCTS, &params(&[("search", "leash")])).unwrap();
        assert_eq!(
            q.predicates,
            vec![Predicate::Search {
                fields: &["name", "description"],
                term: "leash".into()
            }]
        );
        let q = QueryFilter::from_params(&MEMBERSHIPS, &params(&[("search", "x")])).unwrap();
        assert!(q.predicates.is_empty());
    }

    #[test]
    fn membership_user_filter_is_exact() {
        let q = QueryFilter::from_params(&MEMBERSHIPS, &params(&[("user_id", "User-1")])).unwrap();
        assert_eq!(
            q.predicates,
            vec![Predicate::Eq {
                field: "userId",
                value: json!("User-1")
            }]
        );
        assert_eq!(q.order_by, "startedAt");
    }

    #[rstest]
    #[case("42", Some(42))]
    #[case("abc", None)]
    #[case("4.2", None)]
    #[case("", None)]
    fn ids_must_be_integers(#[case] raw: &str, #[case] expected: Option<i64>) {
        assert_eq!(parse_id(raw).ok(), expected);
    }
}
