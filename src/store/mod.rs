//! Datastore seam. Handlers and services only see `Store`; PostgreSQL and an in-process map implement it.

mod memory;
mod pg;

pub use memory::MemoryStore;
pub use pg::{ensure_database_exists, PgStore};

use crate::error::StoreError;
use crate::schema::{Record, ResourceSchema};
use async_trait::async_trait;
use serde_json::Value;

pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 100;

#[derive(Clone, Debug, PartialEq)]
pub enum Predicate {
    /// Field equals value.
    Eq { field: &'static str, value: Value },
    /// Any of the fields contains the term (case-insensitive substring).
    Search {
        fields: &'static [&'static str],
        term: String,
    },
}

/// Conjunction of predicates plus ordering and paging.
#[derive(Clone, Debug, PartialEq)]
pub struct ListQuery {
    pub predicates: Vec<Predicate>,
    pub order_by: &'static str,
    pub descending: bool,
    pub limit: u32,
    pub offset: u64,
}

impl ListQuery {
    /// No predicates, newest first by the schema's ordering field, first page.
    pub fn new(schema: &ResourceSchema) -> Self {
        ListQuery {
            predicates: Vec::new(),
            order_by: schema.order_by,
            descending: true,
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }

    pub fn with_eq(mut self, field: &'static str, value: Value) -> Self {
        self.predicates.push(Predicate::Eq { field, value });
        self
    }

    pub fn single(mut self) -> Self {
        self.limit = 1;
        self
    }
}

#[async_trait]
pub trait Store: Send + Sync {
    /// Cheap liveness check for readiness probes.
    async fn ping(&self) -> Result<(), StoreError>;

    async fn find_by_id(&self, schema: &ResourceSchema, id: i64) -> Result<Option<Record>, StoreError>;

    async fn list(&self, schema: &ResourceSchema, query: &ListQuery) -> Result<Vec<Record>, StoreError>;

    /// Insert normalized values; returns the stored record including its new id.
    /// A unique-index violation must surface as `StoreError::UniqueViolation`.
    async fn insert(&self, schema: &ResourceSchema, values: &Record) -> Result<Record, StoreError>;

    /// Write `changes` (`null` clears) to the record; `None` when the id does not exist.
    async fn update(&self, schema: &ResourceSchema, id: i64, changes: &Record) -> Result<Option<Record>, StoreError>;

    /// Remove the record; returns it, or `None` when the id does not exist.
    async fn delete(&self, schema: &ResourceSchema, id: i64) -> Result<Option<Record>, StoreError>;
}
