//! Schema introspection - read the actual database schema

use crate::Result;
use sqlx::sqlite::SqliteConnection;

/// Queries against `sqlite_master`
pub struct SchemaIntrospector;

impl SchemaIntrospector {
    /// Check if table exists
    pub async fn table_exists(conn: &mut SqliteConnection, table_name: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM sqlite_master
                WHERE type='table' AND name = ?
            )
            "#,
        )
        .bind(table_name)
        .fetch_one(&mut *conn)
        .await?;

        Ok(exists)
    }

    /// Names of all user tables, sorted
    pub async fn list_tables(conn: &mut SqliteConnection) -> Result<Vec<String>> {
        let tables: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT name FROM sqlite_master
            WHERE type='table' AND name NOT LIKE 'sqlite_%'
            ORDER BY name
            "#,
        )
        .fetch_all(&mut *conn)
        .await?;

        Ok(tables)
    }

    /// Row count of a table
    pub async fn count_rows(conn: &mut SqliteConnection, table_name: &str) -> Result<i64> {
        let query = format!("SELECT COUNT(*) FROM \"{}\"", table_name);
        let count: i64 = sqlx::query_scalar(&query).fetch_one(&mut *conn).await?;
        Ok(count)
    }
}
