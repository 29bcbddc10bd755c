//! Schema-driven CRUD: validate, check uniqueness, merge, then one store call.

use super::filter::enum_value;
use super::{timestamp_now, QueryFilter, RequestValidator, UniquenessChecker, UpdateMerger};
use crate::error::AppError;
use crate::schema::{Operation, PathLookup, Record, ResourceSchema, ROUTINES};
use crate::store::{ListQuery, Store};
use serde_json::Value;
use std::collections::HashMap;

pub struct CrudService;

impl CrudService {
    /// List records matching the query parameters (paging, search, resource filters).
    pub async fn list(
        store: &dyn Store,
        schema: &ResourceSchema,
        params: &HashMap<String, String>,
    ) -> Result<Vec<Record>, AppError> {
        Self::require(schema, Operation::Read, "GET")?;
        let query = QueryFilter::from_params(schema, params)?;
        Ok(store.list(schema, &query).await?)
    }

    pub async fn read(store: &dyn Store, schema: &ResourceSchema, id: i64) -> Result<Record, AppError> {
        Self::require(schema, Operation::Read, "GET")?;
        store
            .find_by_id(schema, id)
            .await?
            .ok_or_else(|| AppError::NotFound(schema.not_found_message()))
    }

    /// Single record addressed by a path key, per the schema's lookup rule.
    pub async fn read_by_key(store: &dyn Store, schema: &ResourceSchema, key: &str) -> Result<Record, AppError> {
        let query = match schema.lookup {
            Some(PathLookup::Id) => return Self::read(store, schema, super::parse_id(key)?).await,
            Some(PathLookup::Field(field)) => ListQuery::new(schema).with_eq(field, Value::String(key.to_string())),
            Some(PathLookup::Latest { field, order_by }) => ListQuery {
                order_by,
                ..ListQuery::new(schema).with_eq(field, Value::String(key.to_string()))
            },
            None => return Err(AppError::NotFound(schema.not_found_message())),
        };
        Self::first(store, schema, &query.single()).await
    }

    /// Canonical routine for a pet type and apartment size: the earliest one created.
    pub async fn lookup_routine(
        store: &dyn Store,
        pet_type: Option<&str>,
        apartment_size: Option<&str>,
    ) -> Result<Record, AppError> {
        let schema = &ROUTINES;
        let pet_type = pet_type
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(AppError::MissingField { field: "petType" })?;
        let apartment_size = apartment_size
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(AppError::MissingField { field: "apartmentSize" })?;
        let query = ListQuery {
            descending: false,
            ..ListQuery::new(schema)
                .with_eq("petType", Value::String(enum_value(schema, "petType", pet_type)?))
                .with_eq(
                    "apartmentSize",
                    Value::String(enum_value(schema, "apartmentSize", apartment_size)?),
                )
                .single()
        };
        Self::first(store, schema, &query).await
    }

    /// Validate, reject duplicates, stamp server-managed timestamps, insert.
    pub async fn create(store: &dyn Store, schema: &ResourceSchema, body: &Record) -> Result<Record, AppError> {
        Self::require(schema, Operation::Create, "POST")?;
        let mut record = RequestValidator::validate(schema, body)?;
        UniquenessChecker::check_create(store, schema, &record).await?;

        let now = Value::String(timestamp_now());
        record.insert(schema.created_at.to_string(), now.clone());
        if let Some(updated_at) = schema.updated_at {
            record.insert(updated_at.to_string(), now.clone());
        }
        if let Some(rule) = schema.publish {
            if record.get(rule.flag) == Some(&Value::Bool(true)) {
                record.insert(rule.stamp.to_string(), now);
            }
        }

        let created = store
            .insert(schema, &record)
            .await
            .map_err(|e| UniquenessChecker::translate(schema, e))?;
        tracing::info!(resource = schema.path, id = ?created.get("id"), "record created");
        Ok(created)
    }

    /// Partial update. Absent keys are untouched; an update that changes nothing returns the record as stored.
    pub async fn update(
        store: &dyn Store,
        schema: &ResourceSchema,
        id: i64,
        body: &Record,
    ) -> Result<Record, AppError> {
        Self::require(schema, Operation::Update, "PUT")?;
        let existing = store
            .find_by_id(schema, id)
            .await?
            .ok_or_else(|| AppError::NotFound(schema.not_found_message()))?;
        let changes = RequestValidator::validate_partial(schema, body)?;
        UniquenessChecker::check_update(store, schema, &existing, &changes).await?;

        let Some(changes) = UpdateMerger::merge(schema, &existing, changes, &timestamp_now()) else {
            tracing::debug!(resource = schema.path, id, "empty update");
            return Ok(existing);
        };
        let updated = store
            .update(schema, id, &changes)
            .await
            .map_err(|e| UniquenessChecker::translate(schema, e))?
            .ok_or_else(|| AppError::NotFound(schema.not_found_message()))?;
        tracing::info!(resource = schema.path, id, fields = changes.len(), "record updated");
        Ok(updated)
    }

    /// Hard delete; only resources that allow it.
    pub async fn delete(store: &dyn Store, schema: &ResourceSchema, id: i64) -> Result<Record, AppError> {
        Self::require(schema, Operation::Delete, "DELETE")?;
        let deleted = store
            .delete(schema, id)
            .await?
            .ok_or_else(|| AppError::NotFound(schema.not_found_message()))?;
        tracing::info!(resource = schema.path, id, "record deleted");
        Ok(deleted)
    }

    fn require(schema: &ResourceSchema, op: Operation, method: &'static str) -> Result<(), AppError> {
        if schema.allows(op) {
            Ok(())
        } else {
            Err(AppError::NotAllowed(method))
        }
    }

    async fn first(store: &dyn Store, schema: &ResourceSchema, query: &ListQuery) -> Result<Record, AppError> {
        store
            .list(schema, query)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound(schema.not_found_message()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{BLOG_POSTS, EMAIL_LEADS, MEMBERSHIPS, PRODUCTS};
    use crate::store::MemoryStore;
    use serde_json::json;

    fn rec(v: Value) -> Record {
        v.as_object().cloned().unwrap()
    }

    fn post(slug: &str) -> Record {
        rec(json!({ "title": "T", "slug": slug, "content": "C", "category": "care" }))
    }

    #[tokio::test]
    async fn create_stamps_timestamps_and_defaults() {
        let store = MemoryStore::new();
        let created = CrudService::create(&store, &BLOG_POSTS, &post("a")).await.unwrap();
        assert_eq!(created["published"], json!(false));
        assert!(created.contains_key("createdAt"));
        assert_eq!(created["createdAt"], created["updatedAt"]);
        assert!(!created.contains_key("publishedAt"));
    }

    #[tokio::test]
    async fn create_published_post_stamps_published_at() {
        let store = MemoryStore::new();
        let mut body = post("a");
        body.insert("published".into(), json!(true));
        let created = CrudService::create(&store, &BLOG_POSTS, &body).await.unwrap();
        assert_eq!(created["publishedAt"], created["createdAt"]);
    }

    #[tokio::test]
    async fn failed_validation_persists_nothing() {
        let store = MemoryStore::new();
        let err = CrudService::create(&store, &PRODUCTS, &rec(json!({ "name": "Leash" })))
            .await
            .unwrap_err();
        assert_eq!(err.code().as_deref(), Some("MISSING_AFFILIATE_LINK"));
        let rows = CrudService::list(&store, &PRODUCTS, &HashMap::new()).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn empty_update_returns_existing_record() {
        let store = MemoryStore::new();
        let created = CrudService::create(&store, &BLOG_POSTS, &post("a")).await.unwrap();
        let id = created["id"].as_i64().unwrap();
        let same = CrudService::update(&store, &BLOG_POSTS, id, &rec(json!({ "unknown": 1 })))
            .await
            .unwrap();
        assert_eq!(same, created);
    }

    #[tokio::test]
    async fn update_of_missing_record_is_not_found() {
        let store = MemoryStore::new();
        let err = CrudService::update(&store, &PRODUCTS, 3, &rec(json!({ "rating": 2 })))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Product not found");
    }

    #[tokio::test]
    async fn delete_only_where_allowed() {
        let store = MemoryStore::new();
        let lead = CrudService::create(&store, &EMAIL_LEADS, &rec(json!({ "email": "a@b.c" })))
            .await
            .unwrap();
        let err = CrudService::delete(&store, &EMAIL_LEADS, lead["id"].as_i64().unwrap())
            .await
            .unwrap_err();
        assert_eq!(err.code().as_deref(), Some("METHOD_NOT_ALLOWED"));
    }

    #[tokio::test]
    async fn current_membership_is_latest_started() {
        let store = MemoryStore::new();
        for (plan, started) in [("basic", "2024-01-01T00:00:00Z"), ("premium", "2024-06-01T00:00:00Z")] {
            let m = CrudService::create(
                &store,
                &MEMBERSHIPS,
                &rec(json!({ "userId": "u1", "planType": plan, "status": "active" })),
            )
            .await
            .unwrap();
            CrudService::update(
                &store,
                &MEMBERSHIPS,
                m["id"].as_i64().unwrap(),
                &rec(json!({ "startedAt": started })),
            )
            .await
            .unwrap();
        }
        let current = CrudService::read_by_key(&store, &MEMBERSHIPS, "u1").await.unwrap();
        assert_eq!(current["planType"], json!("premium"));
        let err = CrudService::read_by_key(&store, &MEMBERSHIPS, "nobody").await.unwrap_err();
        assert_eq!(err.to_string(), "Membership not found");
    }

    #[tokio::test]
    async fn key_read_without_lookup_rule_is_not_found() {
        let store = MemoryStore::new();
        CrudService::create(&store, &EMAIL_LEADS, &rec(json!({ "email": "a@b.c" })))
            .await
            .unwrap();
        let err = CrudService::read_by_key(&store, &EMAIL_LEADS, "1").await.unwrap_err();
        assert_eq!(err.code().as_deref(), Some("NOT_FOUND"));
        let err = CrudService::read_by_key(&store, &ROUTINES, "1").await.unwrap_err();
        assert_eq!(err.to_string(), "Routine not found");
    }

    #[tokio::test]
    async fn routine_lookup_requires_and_validates_both_keys() {
        let store = MemoryStore::new();
        let err = CrudService::lookup_routine(&store, None, Some("studio")).await.unwrap_err();
        assert_eq!(err.code().as_deref(), Some("MISSING_PET_TYPE"));
        let err = CrudService::lookup_routine(&store, Some("bird"), Some("studio")).await.unwrap_err();
        assert_eq!(err.code().as_deref(), Some("INVALID_PET_TYPE"));

        let first = CrudService::create(
            &store,
            &ROUTINES,
            &rec(json!({ "petType": "dog", "apartmentSize": "studio", "morningRoutine": "walk" })),
        )
        .await
        .unwrap();
        CrudService::create(
            &store,
            &ROUTINES,
            &rec(json!({ "petType": "dog", "apartmentSize": "studio", "morningRoutine": "run" })),
        )
        .await
        .unwrap();
        let found = CrudService::lookup_routine(&store, Some("DOG"), Some("Studio")).await.unwrap();
        assert_eq!(found["id"], first["id"]);
    }
}
