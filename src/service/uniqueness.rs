//! Unique-field pre-checks. The store's unique index stays authoritative; its violations
//! are translated into the same error.

use crate::error::{AppError, StoreError};
use crate::schema::{Record, ResourceSchema};
use crate::store::{ListQuery, Store};
use serde_json::Value;

pub struct UniquenessChecker;

impl UniquenessChecker {
    pub async fn check_create(store: &dyn Store, schema: &ResourceSchema, record: &Record) -> Result<(), AppError> {
        for field in schema.unique_fields() {
            if let Some(value) = record.get(field.name).filter(|v| !v.is_null()) {
                if Self::taken(store, schema, field.name, value, None).await? {
                    return Err(Self::duplicate(schema, field.name));
                }
            }
        }
        Ok(())
    }

    /// Only fields whose value actually changes are checked.
    pub async fn check_update(
        store: &dyn Store,
        schema: &ResourceSchema,
        existing: &Record,
        changes: &Record,
    ) -> Result<(), AppError> {
        let own_id = existing.get("id").and_then(Value::as_i64);
        for field in schema.unique_fields() {
            let Some(value) = changes.get(field.name).filter(|v| !v.is_null()) else {
                continue;
            };
            if existing.get(field.name) == Some(value) {
                continue;
            }
            if Self::taken(store, schema, field.name, value, own_id).await? {
                return Err(Self::duplicate(schema, field.name));
            }
        }
        Ok(())
    }

    /// Map a store failure: unique-index violations become `DuplicateValue`, the rest stay internal.
    pub fn translate(schema: &ResourceSchema, err: StoreError) -> AppError {
        match err {
            StoreError::UniqueViolation { field } => Self::duplicate(schema, field),
            other => AppError::Store(other),
        }
    }

    async fn taken(
        store: &dyn Store,
        schema: &ResourceSchema,
        field: &'static str,
        value: &Value,
        own_id: Option<i64>,
    ) -> Result<bool, AppError> {
        // Two rows are enough to see past the record itself.
        let mut query = ListQuery::new(schema).with_eq(field, value.clone());
        query.limit = 2;
        let rows = store.list(schema, &query).await?;
        Ok(rows.iter().any(|r| match own_id {
            Some(own) => r.get("id").and_then(Value::as_i64) != Some(own),
            None => true,
        }))
    }

    fn duplicate(schema: &ResourceSchema, field: &'static str) -> AppError {
        let message = schema
            .field(field)
            .and_then(|f| f.unique)
            .unwrap_or("Value already exists");
        AppError::DuplicateValue { field, message }
    }
}
