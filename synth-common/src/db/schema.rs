//! Declarative table definitions
//!
//! Single source of truth for the analysis schema: each table is described
//! once as data and the DDL is generated from it.
//!
//! # Usage
//!
//! ```rust,ignore
//! let table = TableDefinition::new("Call", vec![
//!     ColumnDefinition::new("id", "INTEGER").primary_key(),
//!     ColumnDefinition::new("round", "INTEGER").not_null().references("Round"),
//! ]);
//! sqlx::query(&table.create_sql()).execute(&mut *conn).await?;
//! ```

/// Column definition with SQL constraints
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDefinition {
    /// Column name
    pub name: String,
    /// SQL type (e.g., "TEXT", "INTEGER", "REAL", "TIMESTAMP")
    pub sql_type: String,
    /// NOT NULL constraint
    pub not_null: bool,
    /// PRIMARY KEY constraint
    pub primary_key: bool,
    /// UNIQUE constraint
    pub unique: bool,
    /// Referenced table (foreign key onto its `id` column)
    pub references: Option<String>,
}

impl ColumnDefinition {
    /// Create new column definition
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
            not_null: false,
            primary_key: false,
            unique: false,
            references: None,
        }
    }

    /// Mark column as PRIMARY KEY
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Mark column as NOT NULL
    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    /// Mark column as UNIQUE
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Mark column as a foreign key onto `table(id)`
    pub fn references(mut self, table: impl Into<String>) -> Self {
        self.references = Some(table.into());
        self
    }

    fn to_sql(&self) -> String {
        let mut sql = format!("\"{}\" {}", self.name, self.sql_type);
        if self.primary_key {
            sql.push_str(" PRIMARY KEY");
        }
        if self.not_null {
            sql.push_str(" NOT NULL");
        }
        if self.unique {
            sql.push_str(" UNIQUE");
        }
        if let Some(table) = &self.references {
            sql.push_str(&format!(" REFERENCES \"{}\"(id)", table));
        }
        sql
    }
}

/// One table of the analysis schema
#[derive(Debug, Clone, PartialEq)]
pub struct TableDefinition {
    pub name: String,
    pub columns: Vec<ColumnDefinition>,
}

impl TableDefinition {
    pub fn new(name: impl Into<String>, columns: Vec<ColumnDefinition>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }

    /// `CREATE TABLE IF NOT EXISTS` statement (idempotent)
    pub fn create_sql(&self) -> String {
        let columns: Vec<String> = self.columns.iter().map(ColumnDefinition::to_sql).collect();
        format!(
            "CREATE TABLE IF NOT EXISTS \"{}\" (\n    {}\n)",
            self.name,
            columns.join(",\n    ")
        )
    }

    /// `DROP TABLE IF EXISTS` statement (idempotent)
    pub fn drop_sql(&self) -> String {
        format!("DROP TABLE IF EXISTS \"{}\"", self.name)
    }

    /// Names of the tables this table holds foreign keys onto
    pub fn dependencies(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter_map(|c| c.references.as_deref())
            .collect()
    }
}
