//! Builds parameterized INSERT, SELECT, UPDATE, DELETE from a resource schema.

use crate::case::to_snake_case;
use crate::schema::{Record, ResourceSchema};
use crate::store::{ListQuery, Predicate};
use serde_json::Value;

/// Quote identifier for PostgreSQL (safe: only from the registry).
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

#[derive(Debug)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<Value>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: Value) -> u32 {
        let n = self.params.len() as u32 + 1;
        self.params.push(v);
        n
    }
}

/// `$n::type` for a schema field, `$n` for anything else.
fn placeholder(schema: &ResourceSchema, field: &str, n: u32) -> String {
    schema
        .field(field)
        .map(|f| format!("${}::{}", n, f.kind.pg_type()))
        .unwrap_or_else(|| format!("${}", n))
}

/// Column for an API field name.
fn column(field: &str) -> String {
    quoted(&to_snake_case(field))
}

fn select_column_list(schema: &ResourceSchema) -> String {
    std::iter::once(quoted("id"))
        .chain(schema.fields.iter().map(|f| quoted(&f.column())))
        .collect::<Vec<_>>()
        .join(", ")
}

/// SELECT by primary key.
pub fn select_by_id(schema: &ResourceSchema, id: i64) -> QueryBuf {
    let mut q = QueryBuf::new();
    let n = q.push_param(Value::Number(id.into()));
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} = ${}",
        select_column_list(schema),
        quoted(schema.table),
        quoted("id"),
        n
    );
    q
}

/// SELECT list: predicates joined with AND, search terms as an OR of ILIKE matches,
/// ORDER BY the requested field then id in the same direction, LIMIT/OFFSET.
pub fn select_list(schema: &ResourceSchema, query: &ListQuery) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut where_parts = Vec::new();
    for p in &query.predicates {
        match p {
            Predicate::Eq { field, value } => {
                let n = q.push_param(value.clone());
                where_parts.push(format!("{} = {}", column(field), placeholder(schema, field, n)));
            }
            Predicate::Search { fields, term } => {
                if fields.is_empty() {
                    continue;
                }
                let n = q.push_param(Value::String(format!("%{}%", term)));
                let ors: Vec<String> = fields
                    .iter()
                    .map(|f| format!("{} ILIKE ${}", column(f), n))
                    .collect();
                where_parts.push(format!("({})", ors.join(" OR ")));
            }
        }
    }
    let where_clause = if where_parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", where_parts.join(" AND "))
    };
    let dir = if query.descending { "DESC" } else { "ASC" };
    q.sql = format!(
        "SELECT {} FROM {}{} ORDER BY {} {}, {} {} LIMIT {} OFFSET {}",
        select_column_list(schema),
        quoted(schema.table),
        where_clause,
        column(query.order_by),
        dir,
        quoted("id"),
        dir,
        query.limit,
        query.offset
    );
    q
}

/// INSERT the given (already normalized) values; keys that are not schema fields are skipped.
pub fn insert(schema: &ResourceSchema, values: &Record) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut cols = Vec::new();
    let mut placeholders = Vec::new();
    for f in schema.fields {
        let Some(v) = values.get(f.name) else { continue };
        let n = q.push_param(v.clone());
        cols.push(quoted(&f.column()));
        placeholders.push(placeholder(schema, f.name, n));
    }
    q.sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
        quoted(schema.table),
        cols.join(", "),
        placeholders.join(", "),
        select_column_list(schema)
    );
    q
}

/// UPDATE by id: SET only the schema fields present in `changes`.
/// With nothing to set this degrades to a SELECT by id.
pub fn update(schema: &ResourceSchema, id: i64, changes: &Record) -> QueryBuf {
    let mut q = QueryBuf::new();
    let mut sets = Vec::new();
    for f in schema.fields {
        let Some(v) = changes.get(f.name) else { continue };
        let n = q.push_param(v.clone());
        sets.push(format!("{} = {}", quoted(&f.column()), placeholder(schema, f.name, n)));
    }
    if sets.is_empty() {
        return select_by_id(schema, id);
    }
    let id_param = q.push_param(Value::Number(id.into()));
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = ${} RETURNING {}",
        quoted(schema.table),
        sets.join(", "),
        quoted("id"),
        id_param,
        select_column_list(schema)
    );
    q
}

/// DELETE by id, returning the removed row.
pub fn delete(schema: &ResourceSchema, id: i64) -> QueryBuf {
    let mut q = QueryBuf::new();
    let n = q.push_param(Value::Number(id.into()));
    q.sql = format!(
        "DELETE FROM {} WHERE {} = ${} RETURNING {}",
        quoted(schema.table),
        quoted("id"),
        n,
        select_column_list(schema)
    );
    q
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{BLOG_POSTS, PRODUCTS, ROUTINES};
    use serde_json::json;

    fn rec(v: Value) -> Record {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn list_combines_filters_search_and_paging() {
        let query = ListQuery {
            predicates: vec![
                Predicate::Eq {
                    field: "published",
                    value: json!(true),
                },
                Predicate::Search {
                    fields: BLOG_POSTS.search_fields,
                    term: "cat".into(),
                },
            ],
            order_by: "createdAt",
            descending: true,
            limit: 10,
            offset: 20,
        };
        let q = select_list(&BLOG_POSTS, &query);
        assert!(q.sql.contains(r#"WHERE "published" = $1::boolean AND ("title" ILIKE $2 OR "excerpt" ILIKE $2 OR "content" ILIKE $2)"#));
        assert!(q.sql.ends_with(r#"ORDER BY "created_at" DESC, "id" DESC LIMIT 10 OFFSET 20"#));
        assert_eq!(q.params, vec![json!(true), json!("%cat%")]);
    }

    #[test]
    fn list_without_predicates_has_no_where() {
        let query = ListQuery::new(&ROUTINES);
        let q = select_list(&ROUTINES, &query);
        assert!(!q.sql.contains("WHERE"));
        assert!(q.params.is_empty());
    }

    #[test]
    fn insert_casts_each_column() {
        let q = insert(
            &PRODUCTS,
            &rec(json!({ "name": "Leash", "featured": false, "rating": 3, "createdAt": "2024-01-01T00:00:00.000Z" })),
        );
        assert_eq!(
            q.sql,
            format!(
                r#"INSERT INTO "products" ("name", "featured", "rating", "created_at") VALUES ($1::text, $2::boolean, $3::integer, $4::timestamptz) RETURNING {}"#,
                select_column_list(&PRODUCTS)
            )
        );
        assert_eq!(q.params.len(), 4);
    }

    #[test]
    fn update_sets_only_present_fields_and_binds_id_last() {
        let q = update(&PRODUCTS, 7, &rec(json!({ "rating": null, "petType": "cat" })));
        assert!(q.sql.starts_with(r#"UPDATE "products" SET "pet_type" = $1::text, "rating" = $2::integer WHERE "id" = $3"#));
        assert_eq!(q.params, vec![json!("cat"), json!(null), json!(7)]);
    }

    #[test]
    fn empty_update_reads_the_row() {
        let q = update(&PRODUCTS, 7, &Record::new());
        assert!(q.sql.starts_with("SELECT"));
        assert_eq!(q.params, vec![json!(7)]);
    }

    #[test]
    fn column_list_starts_with_id() {
        assert!(select_column_list(&ROUTINES).starts_with(r#""id", "pet_type", "apartment_size""#));
    }
}
