//! In-process store: one ordered map per table behind a lock. Enforces the schema's unique fields like a unique index would.

use super::{ListQuery, Predicate, Store};
use crate::error::StoreError;
use crate::schema::{Record, ResourceSchema};
use crate::service::UpdateMerger;
use async_trait::async_trait;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Default)]
struct Table {
    last_id: i64,
    rows: BTreeMap<i64, Record>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<&'static str, Table>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<&'static str, Table>>, StoreError> {
        self.tables
            .read()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".into()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<&'static str, Table>>, StoreError> {
        self.tables
            .write()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".into()))
    }
}

/// First unique field of `candidate` whose value another row (other than `own_id`) already holds.
fn unique_conflict(schema: &ResourceSchema, table: &Table, candidate: &Record, own_id: Option<i64>) -> Option<&'static str> {
    schema.unique_fields().find_map(|f| {
        let v = candidate.get(f.name).filter(|v| !v.is_null())?;
        table
            .rows
            .iter()
            .any(|(id, row)| Some(*id) != own_id && row.get(f.name) == Some(v))
            .then_some(f.name)
    })
}

fn without_nulls(values: &Record) -> Record {
    values
        .iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

fn matches(row: &Record, predicate: &Predicate) -> bool {
    match predicate {
        Predicate::Eq { field, value } => row.get(*field) == Some(value),
        Predicate::Search { fields, term } => {
            let needle = term.to_lowercase();
            fields.iter().any(|f| {
                row.get(*f)
                    .and_then(Value::as_str)
                    .map(|s| s.to_lowercase().contains(&needle))
                    .unwrap_or(false)
            })
        }
    }
}

/// Missing sorts first; otherwise strings, numbers and booleans compare naturally.
fn compare(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.read().map(|_| ())
    }

    async fn find_by_id(&self, schema: &ResourceSchema, id: i64) -> Result<Option<Record>, StoreError> {
        let tables = self.read()?;
        Ok(tables.get(schema.table).and_then(|t| t.rows.get(&id)).cloned())
    }

    async fn list(&self, schema: &ResourceSchema, query: &ListQuery) -> Result<Vec<Record>, StoreError> {
        let tables = self.read()?;
        let Some(table) = tables.get(schema.table) else {
            return Ok(Vec::new());
        };
        let mut rows: Vec<(&i64, &Record)> = table
            .rows
            .iter()
            .filter(|(_, row)| query.predicates.iter().all(|p| matches(row, p)))
            .collect();
        rows.sort_by(|(ia, a), (ib, b)| {
            let ord = compare(a.get(query.order_by), b.get(query.order_by)).then(ia.cmp(ib));
            if query.descending {
                ord.reverse()
            } else {
                ord
            }
        });
        Ok(rows
            .into_iter()
            .skip(usize::try_from(query.offset).unwrap_or(usize::MAX))
            .take(query.limit as usize)
            .map(|(_, row)| row.clone())
            .collect())
    }

    async fn insert(&self, schema: &ResourceSchema, values: &Record) -> Result<Record, StoreError> {
        let mut tables = self.write()?;
        let table = tables.entry(schema.table).or_default();
        if let Some(field) = unique_conflict(schema, table, values, None) {
            return Err(StoreError::UniqueViolation { field });
        }
        table.last_id += 1;
        let id = table.last_id;
        let mut row = without_nulls(values);
        row.insert("id".into(), Value::Number(id.into()));
        table.rows.insert(id, row.clone());
        Ok(row)
    }

    async fn update(&self, schema: &ResourceSchema, id: i64, changes: &Record) -> Result<Option<Record>, StoreError> {
        let mut tables = self.write()?;
        let table = tables.entry(schema.table).or_default();
        let Some(existing) = table.rows.get(&id) else {
            return Ok(None);
        };
        let updated = UpdateMerger::apply(existing, changes);
        if let Some(field) = unique_conflict(schema, table, &updated, Some(id)) {
            return Err(StoreError::UniqueViolation { field });
        }
        table.rows.insert(id, updated.clone());
        Ok(Some(updated))
    }

    async fn delete(&self, schema: &ResourceSchema, id: i64) -> Result<Option<Record>, StoreError> {
        let mut tables = self.write()?;
        Ok(tables.get_mut(schema.table).and_then(|t| t.rows.remove(&id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{BLOG_POSTS, EMAIL_LEADS};
    use serde_json::json;

    fn rec(v: Value) -> Record {
        v.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn insert_assigns_sequential_ids_and_drops_nulls() {
        let store = MemoryStore::new();
        let a = store
            .insert(&EMAIL_LEADS, &rec(json!({ "email": "a@x.io", "name": null })))
            .await
            .unwrap();
        let b = store.insert(&EMAIL_LEADS, &rec(json!({ "email": "b@x.io" }))).await.unwrap();
        assert_eq!(a.get("id"), Some(&json!(1)));
        assert_eq!(b.get("id"), Some(&json!(2)));
        assert!(!a.contains_key("name"));
    }

    #[tokio::test]
    async fn unique_fields_are_enforced_on_insert_and_update() {
        let store = MemoryStore::new();
        store.insert(&EMAIL_LEADS, &rec(json!({ "email": "a@x.io" }))).await.unwrap();
        let err = store
            .insert(&EMAIL_LEADS, &rec(json!({ "email": "a@x.io" })))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation { field: "email" }));

        store.insert(&EMAIL_LEADS, &rec(json!({ "email": "b@x.io" }))).await.unwrap();
        let err = store
            .update(&EMAIL_LEADS, 2, &rec(json!({ "email": "a@x.io" })))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation { field: "email" }));
        // Rewriting a record's own value is not a conflict.
        store
            .update(&EMAIL_LEADS, 1, &rec(json!({ "email": "a@x.io" })))
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn list_filters_orders_and_pages() {
        let store = MemoryStore::new();
        for (i, published) in [true, false, true, true].into_iter().enumerate() {
            store
                .insert(
                    &BLOG_POSTS,
                    &rec(json!({
                        "title": format!("Post {}", i),
                        "slug": format!("p{}", i),
                        "published": published,
                        "createdAt": format!("2024-01-0{}T00:00:00.000Z", i + 1),
                    })),
                )
                .await
                .unwrap();
        }
        let mut q = ListQuery::new(&BLOG_POSTS).with_eq("published", json!(true));
        let rows = store.list(&BLOG_POSTS, &q).await.unwrap();
        let slugs: Vec<_> = rows.iter().map(|r| r["slug"].as_str().unwrap()).collect();
        assert_eq!(slugs, vec!["p3", "p2", "p0"]);

        q.offset = 1;
        q.limit = 1;
        let rows = store.list(&BLOG_POSTS, &q).await.unwrap();
        assert_eq!(rows[0]["slug"], json!("p2"));
    }

    #[tokio::test]
    async fn search_is_case_insensitive_across_fields() {
        let store = MemoryStore::new();
        store
            .insert(&EMAIL_LEADS, &rec(json!({ "email": "a@x.io", "name": "Mira" })))
            .await
            .unwrap();
        store.insert(&EMAIL_LEADS, &rec(json!({ "email": "b@x.io" }))).await.unwrap();
        let mut q = ListQuery::new(&EMAIL_LEADS);
        q.predicates.push(Predicate::Search {
            fields: EMAIL_LEADS.search_fields,
            term: "mIR".into(),
        });
        let rows = store.list(&EMAIL_LEADS, &q).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["email"], json!("a@x.io"));
    }

    #[tokio::test]
    async fn update_and_delete_missing_rows() {
        let store = MemoryStore::new();
        assert!(store.update(&BLOG_POSTS, 9, &Record::new()).await.unwrap().is_none());
        assert!(store.delete(&BLOG_POSTS, 9).await.unwrap().is_none());
    }
}
