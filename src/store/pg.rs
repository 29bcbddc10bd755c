//! PostgreSQL store: SQL from the builder, rows decoded back to camelCase JSON records.

use super::{ListQuery, Store};
use crate::case::object_keys_to_camel_case;
use crate::error::StoreError;
use crate::schema::{Record, ResourceSchema};
use crate::service::format_timestamp;
use crate::sql::{self, PgBindValue, QueryBuf};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::ConnectOptions;
use std::str::FromStr;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        PgStore { pool }
    }

    /// Create the database if needed, then open a pool.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        ensure_database_exists(database_url).await?;
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(std::time::Duration::from_secs(3))
            .connect(database_url)
            .await?;
        tracing::info!("database connection pool initialized");
        Ok(PgStore { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn fetch_optional(&self, schema: &ResourceSchema, q: &QueryBuf) -> Result<Option<Record>, StoreError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(PgBindValue::from_json(p));
        }
        let row = query
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| translate(schema, e))?;
        Ok(row.map(|r| row_to_record(&r)))
    }

    async fn fetch_all(&self, schema: &ResourceSchema, q: &QueryBuf) -> Result<Vec<Record>, StoreError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(PgBindValue::from_json(p));
        }
        let rows = query.fetch_all(&self.pool).await.map_err(|e| translate(schema, e))?;
        Ok(rows.iter().map(row_to_record).collect())
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").fetch_optional(&self.pool).await?;
        Ok(())
    }

    async fn find_by_id(&self, schema: &ResourceSchema, id: i64) -> Result<Option<Record>, StoreError> {
        self.fetch_optional(schema, &sql::select_by_id(schema, id)).await
    }

    async fn list(&self, schema: &ResourceSchema, query: &ListQuery) -> Result<Vec<Record>, StoreError> {
        self.fetch_all(schema, &sql::select_list(schema, query)).await
    }

    async fn insert(&self, schema: &ResourceSchema, values: &Record) -> Result<Record, StoreError> {
        self.fetch_optional(schema, &sql::insert(schema, values))
            .await?
            .ok_or_else(|| StoreError::Db(sqlx::Error::RowNotFound))
    }

    async fn update(&self, schema: &ResourceSchema, id: i64, changes: &Record) -> Result<Option<Record>, StoreError> {
        self.fetch_optional(schema, &sql::update(schema, id, changes)).await
    }

    async fn delete(&self, schema: &ResourceSchema, id: i64) -> Result<Option<Record>, StoreError> {
        self.fetch_optional(schema, &sql::delete(schema, id)).await
    }
}

/// Unique-index violations name their constraint (`blog_posts_slug_key`); map it back to the field.
fn translate(schema: &ResourceSchema, e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            let constraint = db.constraint().unwrap_or_default();
            let field = schema
                .unique_fields()
                .find(|f| constraint.contains(&f.column()))
                .or_else(|| schema.unique_fields().next());
            if let Some(f) = field {
                return StoreError::UniqueViolation { field: f.name };
            }
        }
    }
    StoreError::Db(e)
}

/// Row to record: snake_case columns become camelCase keys, NULL columns are omitted.
fn row_to_record(row: &PgRow) -> Record {
    use sqlx::Column;
    use sqlx::Row;
    let mut map = serde_json::Map::new();
    for col in row.columns() {
        let name = col.name();
        let v = cell_to_value(row, name);
        if !v.is_null() {
            map.insert(name.to_string(), v);
        }
    }
    object_keys_to_camel_case(&mut map);
    map
}

fn cell_to_value(row: &PgRow, name: &str) -> Value {
    use sqlx::Row;
    if let Ok(Some(n)) = row.try_get::<Option<i32>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<i64>, _>(name) {
        return Value::Number(n.into());
    }
    if let Ok(Some(n)) = row.try_get::<Option<f64>, _>(name) {
        if let Some(n) = serde_json::Number::from_f64(n) {
            return Value::Number(n);
        }
    }
    if let Ok(Some(b)) = row.try_get::<Option<bool>, _>(name) {
        return Value::Bool(b);
    }
    if let Ok(Some(d)) = row.try_get::<Option<chrono::DateTime<chrono::Utc>>, _>(name) {
        return Value::String(format_timestamp(d));
    }
    if let Ok(Some(s)) = row.try_get::<Option<String>, _>(name) {
        return Value::String(s);
    }
    if let Ok(Some(j)) = row.try_get::<Option<serde_json::Value>, _>(name) {
        return j;
    }
    Value::Null
}

/// Ensure the database in `database_url` exists; create it if not. Connects to the
/// default `postgres` database to run CREATE DATABASE. Call before creating the main pool.
pub async fn ensure_database_exists(database_url: &str) -> Result<(), StoreError> {
    let (admin_url, db_name) = parse_db_name_from_url(database_url)?;
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    let opts = sqlx::postgres::PgConnectOptions::from_str(&admin_url)?;
    let mut conn: sqlx::PgConnection = opts.connect().await?;
    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await?;
    if !exists.0 {
        tracing::info!(database = %db_name, "creating database");
        sqlx::query(&format!("CREATE DATABASE \"{}\"", db_name.replace('"', "\"\"")))
            .execute(&mut conn)
            .await?;
    }
    Ok(())
}

fn parse_db_name_from_url(url: &str) -> Result<(String, String), StoreError> {
    let path_start = url
        .rfind('/')
        .ok_or_else(|| StoreError::Backend("DATABASE_URL: no path".into()))?
        + 1;
    let path_and_query = url.get(path_start..).unwrap_or("");
    let db_name = path_and_query.split('?').next().unwrap_or("").trim();
    let base = url.get(..path_start).unwrap_or(url);
    Ok((format!("{}postgres", base), db_name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_name_is_split_from_url() {
        let (admin, name) = parse_db_name_from_url("postgres://u:p@localhost:5432/pawspace?sslmode=disable").unwrap();
        assert_eq!(admin, "postgres://u:p@localhost:5432/postgres");
        assert_eq!(name, "pawspace");
    }

    #[test]
    fn url_without_path_is_rejected() {
        assert!(parse_db_name_from_url("pawspace").is_err());
    }
}
