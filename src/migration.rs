//! DDL derived from the resource registry: one table per resource plus lookup indexes.
//! Idempotent (IF NOT EXISTS); columns added to the registry later are not altered in.

use crate::error::StoreError;
use crate::schema::{FieldDefault, ResourceKind, ResourceSchema};
use sqlx::PgPool;

fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// CREATE TABLE for one resource. Required fields are NOT NULL, unique fields get a UNIQUE
/// constraint (named `{table}_{column}_key` by PostgreSQL), booleans carry their default.
pub fn create_table_sql(schema: &ResourceSchema) -> String {
    let mut defs = vec![format!("{} BIGSERIAL PRIMARY KEY", quote("id"))];
    for f in schema.fields {
        let mut def = format!("{} {}", quote(&f.column()), f.kind.pg_type());
        if f.required {
            def.push_str(" NOT NULL");
        }
        if let Some(FieldDefault::Bool(b)) = f.default {
            def.push_str(&format!(" NOT NULL DEFAULT {}", b));
        }
        if f.unique.is_some() {
            def.push_str(" UNIQUE");
        }
        defs.push(def);
    }
    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n  {}\n)",
        quote(schema.table),
        defs.join(",\n  ")
    )
}

/// Secondary indexes for the lookups the API serves.
pub fn index_sql() -> Vec<String> {
    let index = |table: &str, cols: &[&str]| {
        format!(
            "CREATE INDEX IF NOT EXISTS {} ON {} ({})",
            quote(&format!("{}_{}_idx", table, cols.join("_"))),
            quote(table),
            cols.iter().map(|c| quote(c)).collect::<Vec<_>>().join(", ")
        )
    };
    vec![
        index("memberships", &["user_id"]),
        index("routines", &["pet_type", "apartment_size"]),
        index("blog_posts", &["created_at"]),
        index("products", &["created_at"]),
    ]
}

/// Create every resource table and index.
pub async fn apply_migrations(pool: &PgPool) -> Result<(), StoreError> {
    for kind in ResourceKind::ALL {
        let schema = kind.schema();
        sqlx::query(&create_table_sql(schema)).execute(pool).await?;
        tracing::debug!(table = schema.table, "table ensured");
    }
    for sql in index_sql() {
        sqlx::query(&sql).execute(pool).await?;
    }
    tracing::info!("migrations applied");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{BLOG_POSTS, EMAIL_LEADS, MEMBERSHIPS};

    #[test]
    fn blog_posts_table_has_constraints_from_schema() {
        let sql = create_table_sql(&BLOG_POSTS);
        assert!(sql.starts_with(r#"CREATE TABLE IF NOT EXISTS "blog_posts""#));
        assert!(sql.contains(r#""id" BIGSERIAL PRIMARY KEY"#));
        assert!(sql.contains(r#""slug" text NOT NULL UNIQUE"#));
        assert!(sql.contains(r#""excerpt" text,"#));
        assert!(sql.contains(r#""published" boolean NOT NULL DEFAULT false"#));
        assert!(sql.contains(r#""published_at" timestamptz,"#));
        assert!(sql.contains(r#""updated_at" timestamptz NOT NULL"#));
    }

    #[test]
    fn email_leads_default_to_subscribed() {
        let sql = create_table_sql(&EMAIL_LEADS);
        assert!(sql.contains(r#""email" text NOT NULL UNIQUE"#));
        assert!(sql.contains(r#""subscribed" boolean NOT NULL DEFAULT true"#));
    }

    #[test]
    fn memberships_allow_many_rows_per_user() {
        let sql = create_table_sql(&MEMBERSHIPS);
        assert!(sql.contains(r#""user_id" text NOT NULL,"#));
        assert!(!sql.contains("UNIQUE"));
        assert!(index_sql()[0].contains(r#"ON "memberships" ("user_id")"#));
    }
}
