//! Case conversion between API field names (camelCase), column names (snake_case) and error codes (SCREAMING_SNAKE_CASE).

use serde_json::{Map, Value};

/// Convert a single identifier from snake_case to camelCase.
/// e.g. "pet_type" -> "petType", "created_at" -> "createdAt"
pub fn to_camel_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut capitalize_next = false;
    for c in s.chars() {
        if c == '_' {
            capitalize_next = true;
        } else if capitalize_next {
            out.extend(c.to_uppercase());
            capitalize_next = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Convert a single identifier from camelCase to snake_case.
/// e.g. "affiliateLink" -> "affiliate_link", "stripeSubscriptionId" -> "stripe_subscription_id"
pub fn to_snake_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 4);
    for (i, c) in s.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Field name as it appears in error codes: "petType" -> "PET_TYPE".
pub fn to_screaming_snake_case(s: &str) -> String {
    to_snake_case(s).to_uppercase()
}

/// Convert all keys of a JSON object from snake_case to camelCase (in place).
/// Rows come back from PostgreSQL keyed by column; clients receive API names.
pub fn object_keys_to_camel_case(obj: &mut Map<String, Value>) {
    let keys: Vec<String> = obj.keys().cloned().collect();
    for k in keys {
        let camel = to_camel_case(&k);
        if camel != k {
            if let Some(v) = obj.remove(&k) {
                obj.insert(camel, v);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snake_and_camel_are_inverse_for_field_names() {
        for name in ["petType", "apartmentSize", "seoDescription", "stripeSubscriptionId", "id"] {
            assert_eq!(to_camel_case(&to_snake_case(name)), name);
        }
    }

    #[test]
    fn error_code_segment() {
        assert_eq!(to_screaming_snake_case("affiliateLink"), "AFFILIATE_LINK");
        assert_eq!(to_screaming_snake_case("slug"), "SLUG");
        assert_eq!(to_screaming_snake_case("startedAt"), "STARTED_AT");
    }

    #[test]
    fn row_keys_become_camel_case() {
        let mut row = serde_json::json!({ "pet_type": "dog", "id": 3 })
            .as_object()
            .cloned()
            .unwrap();
        object_keys_to_camel_case(&mut row);
        assert_eq!(row.get("petType"), Some(&Value::String("dog".into())));
        assert!(row.contains_key("id"));
        assert!(!row.contains_key("pet_type"));
    }
}
