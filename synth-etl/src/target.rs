//! Row writer for the analysis schema

use crate::error::EtlResult;
use chrono::NaiveDateTime;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use synth_common::db::TargetTable;

/// A value bound into a target insert
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Bool(bool),
    Text(String),
    Timestamp(NaiveDateTime),
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Integer(value)
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        SqlValue::Real(value)
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Bool(value)
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<NaiveDateTime> for SqlValue {
    fn from(value: NaiveDateTime) -> Self {
        SqlValue::Timestamp(value)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(SqlValue::Null)
    }
}

/// One row destined for an analysis table
///
/// ```rust,ignore
/// TargetRow::new(TargetTable::Category)
///     .set("id", 1)
///     .set("name", "Loans")
///     .insert(&mut *ctx.target)
///     .await?;
/// ```
#[derive(Debug, Clone)]
pub struct TargetRow {
    table: TargetTable,
    values: Vec<(&'static str, SqlValue)>,
}

impl TargetRow {
    pub fn new(table: TargetTable) -> Self {
        Self {
            table,
            values: Vec::new(),
        }
    }

    /// Set a column value
    pub fn set(mut self, column: &'static str, value: impl Into<SqlValue>) -> Self {
        self.values.push((column, value.into()));
        self
    }

    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.values.iter().find(|(c, _)| *c == column).map(|(_, v)| v)
    }

    /// Insert the row
    pub async fn insert(self, conn: &mut SqliteConnection) -> EtlResult<()> {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("INSERT INTO \"{}\" (", self.table.name()));

        {
            let mut columns = builder.separated(", ");
            for (column, _) in &self.values {
                columns.push(format!("\"{}\"", column));
            }
        }

        builder.push(") VALUES (");
        {
            let mut binds = builder.separated(", ");
            for (_, value) in self.values {
                match value {
                    SqlValue::Null => binds.push_bind(None::<i64>),
                    SqlValue::Integer(v) => binds.push_bind(v),
                    SqlValue::Real(v) => binds.push_bind(v),
                    SqlValue::Bool(v) => binds.push_bind(v),
                    SqlValue::Text(v) => binds.push_bind(v),
                    SqlValue::Timestamp(v) => binds.push_bind(v),
                };
            }
        }
        builder.push(")");

        builder.build().execute(&mut *conn).await?;
        Ok(())
    }
}
