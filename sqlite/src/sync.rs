//! Commit and synchronization between a [`SchemaCache`] and a database.
//!
//! [`SchemaSync`] pushes generated SQL to a [`Database`] (commit) or rebuilds
//! the cache from the database's catalog (synchronize). Every round trip is
//! issued sequentially and attempted once.
//!
//! # Example
//!
//! ```no_run
//! use mason_core::{FieldSpec, SchemaCache};
//! use mason_sqlite::SchemaSync;
//! use rusqlite::Connection;
//!
//! let conn = Connection::open("app.db").unwrap();
//! let sync = SchemaSync::new(&conn);
//!
//! let mut cache = SchemaCache::new();
//! cache.create_table("users").unwrap();
//! cache.add_field("users", FieldSpec::named("id").primary_key()).unwrap();
//! sync.commit_table_schema(&cache, "users").unwrap();
//!
//! // Throw the cache away and mirror the database instead.
//! let report = sync.synchronize_from_database(&mut cache).unwrap();
//! println!("{} tables, {} records", report.tables, report.records);
//! ```

use std::collections::HashSet;

use mason_core::{FieldSpec, SchemaCache, Value, generate_create_table, normalize_declared_type};
use tracing::{debug, info};

use crate::database::{Database, Row};
use crate::error::{Result, SqliteError};

const LIST_TABLES_SQL: &str = r"SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite\_%' ESCAPE '\' ORDER BY name";
const TABLE_INFO_SQL: &str =
    r#"SELECT name, type, "notnull", dflt_value, pk FROM pragma_table_info(?1) ORDER BY cid"#;
const INDEX_LIST_SQL: &str = r#"SELECT name, "unique", origin FROM pragma_index_list(?1)"#;
const INDEX_INFO_SQL: &str = "SELECT name FROM pragma_index_info(?1)";

/// Bridges a schema cache and a [`Database`].
pub struct SchemaSync<'a, D: Database + ?Sized> {
    db: &'a D,
}

impl<'a, D: Database + ?Sized> SchemaSync<'a, D> {
    pub fn new(db: &'a D) -> Self {
        Self { db }
    }

    /// Executes the `CREATE TABLE IF NOT EXISTS` statement for a cached
    /// table.
    ///
    /// Returns `false` without touching the database when the table has no
    /// fields yet.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteError::UnknownTable`] if the table is not cached, or
    /// the database error from `execute`.
    pub fn commit_table_schema(&self, cache: &SchemaCache, table: &str) -> Result<bool> {
        let definition = cache
            .table(table)
            .ok_or_else(|| SqliteError::UnknownTable(table.to_string()))?;

        let sql = generate_create_table(definition);
        if sql.is_empty() {
            debug!(table, "no fields cached, skipping create");
            return Ok(false);
        }

        self.db.execute(&sql)?;
        info!(table, fields = definition.fields().len(), "committed table schema");
        Ok(true)
    }

    /// Executes one `INSERT OR REPLACE` for all of a table's cached records.
    ///
    /// With no cached records nothing is executed and `false` is returned.
    /// Committed records stay in the cache.
    pub fn commit_table_records(&self, cache: &SchemaCache, table: &str) -> Result<bool> {
        let definition = cache
            .table(table)
            .ok_or_else(|| SqliteError::UnknownTable(table.to_string()))?;

        let sql = cache.bulk_insert_sql(table, None);
        if sql.is_empty() {
            debug!(table, "no records cached, skipping insert");
            return Ok(false);
        }

        self.db.execute(&sql)?;
        info!(table, records = definition.records().len(), "committed table records");
        Ok(true)
    }

    /// Commits the schema and then the records of every cached table, in
    /// table-name order. Stops at the first database error.
    pub fn commit_all(&self, cache: &SchemaCache) -> Result<CommitReport> {
        let mut report = CommitReport::default();

        for definition in cache.tables() {
            if self.commit_table_schema(cache, definition.name())? {
                report.schemas_committed += 1;
            }
            if self.commit_table_records(cache, definition.name())? {
                report.tables_with_records += 1;
                report.records_committed += definition.records().len();
            }
        }

        Ok(report)
    }

    /// Names of user tables in the database, excluding SQLite's internal
    /// `sqlite_*` tables.
    pub fn list_tables(&self) -> Result<Vec<String>> {
        self.db
            .query_all(LIST_TABLES_SQL, &[])?
            .iter()
            .map(|row| text_column(row, "name"))
            .collect()
    }

    /// Number of rows currently stored in a database table.
    pub fn row_count(&self, table: &str) -> Result<u64> {
        let sql = format!("SELECT COUNT(*) AS row_count FROM {}", quote_identifier(table));
        let row = self.db.query_one(&sql, &[])?.ok_or_else(|| {
            SqliteError::ConversionError(format!("COUNT(*) on {table} returned no row"))
        })?;
        let count = integer_column(&row, "row_count")?;
        u64::try_from(count)
            .map_err(|_| SqliteError::ConversionError(format!("negative row count: {count}")))
    }

    /// Replaces the whole cache with the database's current tables, fields,
    /// and rows.
    ///
    /// The cache is wiped before the first query. If any step fails, the
    /// error is returned and the cache holds only the tables loaded so far;
    /// callers should treat it as empty. On success the cache is marked
    /// clean.
    pub fn synchronize_from_database(&self, cache: &mut SchemaCache) -> Result<SyncReport> {
        cache.clear();
        let mut report = SyncReport::default();

        for table in self.list_tables()? {
            self.load_table(cache, &table, &mut report)?;
            report.tables += 1;
        }

        cache.mark_clean();
        info!(
            tables = report.tables,
            fields = report.fields,
            records = report.records,
            "synchronized cache from database"
        );
        Ok(report)
    }

    fn load_table(&self, cache: &mut SchemaCache, table: &str, report: &mut SyncReport) -> Result<()> {
        let table_param = [Value::Text(table.to_string())];
        let unique = self.unique_columns(table)?;

        cache.create_table(table)?;

        let mut selected = Vec::new();
        for column in self.db.query_all(TABLE_INFO_SQL, &table_param)? {
            let name = text_column(&column, "name")?;
            selected.push(quote_identifier(&name));
            let declared = match column.get("type") {
                Some(Value::Text(t)) => t.as_str(),
                _ => "",
            };
            let default_value = match column.get("dflt_value") {
                Some(Value::Null) | None => None,
                Some(value) => Some(value.to_string()),
            };

            let spec = FieldSpec {
                field_type: Some(normalize_declared_type(declared)),
                primary: Some(integer_column(&column, "pk")? > 0),
                not_null: Some(integer_column(&column, "notnull")? != 0),
                unique: Some(unique.contains(&name)),
                conflict: None,
                default_value,
                name: Some(name),
            };
            cache.add_field(table, spec)?;
            report.fields += 1;
        }

        if selected.is_empty() {
            return Ok(());
        }

        // Only the catalog's columns; generated and hidden ones stay out.
        let sql = format!(
            "SELECT {} FROM {}",
            selected.join(", "),
            quote_identifier(table)
        );
        let rows = self.db.query_all(&sql, &[])?;
        debug!(table, rows = rows.len(), "loaded table rows");
        for row in rows {
            cache.add_record(table, row.into_record())?;
            report.records += 1;
        }

        Ok(())
    }

    /// Columns covered by a single-column `UNIQUE` constraint.
    fn unique_columns(&self, table: &str) -> Result<HashSet<String>> {
        let mut columns = HashSet::new();

        for index in self.db.query_all(INDEX_LIST_SQL, &[Value::Text(table.to_string())])? {
            let is_unique = integer_column(&index, "unique")? != 0;
            let origin = text_column(&index, "origin")?;
            if !is_unique || origin != "u" {
                continue;
            }

            let index_name = text_column(&index, "name")?;
            let covered = self.db.query_all(INDEX_INFO_SQL, &[Value::Text(index_name)])?;
            if let [row] = covered.as_slice() {
                columns.insert(text_column(row, "name")?);
            }
        }

        Ok(columns)
    }
}

/// Counts from [`SchemaSync::commit_all`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitReport {
    /// Tables whose `CREATE TABLE` statement was executed.
    pub schemas_committed: usize,
    /// Tables whose records were inserted.
    pub tables_with_records: usize,
    /// Total records inserted.
    pub records_committed: usize,
}

/// Counts from [`SchemaSync::synchronize_from_database`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub tables: usize,
    pub fields: usize,
    pub records: usize,
}

/// Double-quotes an identifier for use in an internal query.
fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn text_column(row: &Row, column: &str) -> Result<String> {
    match row.get(column) {
        Some(Value::Text(s)) => Ok(s.clone()),
        other => Err(SqliteError::ConversionError(format!(
            "expected text in column '{column}', got {other:?}"
        ))),
    }
}

fn integer_column(row: &Row, column: &str) -> Result<i64> {
    row.get(column).and_then(Value::as_integer).ok_or_else(|| {
        SqliteError::ConversionError(format!("expected integer in column '{column}'"))
    })
}
