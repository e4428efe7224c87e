//! The database collaborator seen by the orchestrator.
//!
//! [`Database`] is the only I/O boundary: run a statement, fetch one row,
//! fetch all rows. [`rusqlite::Connection`] implements it; tests can supply
//! their own implementation to observe the statements issued.

use mason_core::{Record, Value};
use rusqlite::{Connection, params_from_iter};
use tracing::debug;

use crate::convert::{from_value_ref, to_sql_value};
use crate::error::Result;

/// One result row: column names with their values, in select order.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Row {
    /// Builds a row. Extra columns or values beyond the shorter list are
    /// dropped.
    pub fn new(mut columns: Vec<String>, mut values: Vec<Value>) -> Self {
        let len = columns.len().min(values.len());
        columns.truncate(len);
        values.truncate(len);
        Self { columns, values }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Looks up a value by column name.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|idx| &self.values[idx])
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Converts the row into a cache record keyed by column name.
    pub fn into_record(self) -> Record {
        self.columns.into_iter().zip(self.values).collect()
    }
}

/// Statement execution used by [`SchemaSync`](crate::SchemaSync).
///
/// Errors are returned as-is; implementations should not retry.
pub trait Database {
    /// Runs a statement that returns no rows.
    fn execute(&self, sql: &str) -> Result<()>;

    /// Runs a query and returns its first row, if any.
    fn query_one(&self, sql: &str, params: &[Value]) -> Result<Option<Row>>;

    /// Runs a query and returns every row in result order.
    fn query_all(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>>;
}

impl Database for Connection {
    fn execute(&self, sql: &str) -> Result<()> {
        debug!(sql, "executing statement");
        self.execute_batch(sql)?;
        Ok(())
    }

    fn query_one(&self, sql: &str, params: &[Value]) -> Result<Option<Row>> {
        let mut rows = run_query(self, sql, params, Some(1))?;
        Ok(rows.pop())
    }

    fn query_all(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        run_query(self, sql, params, None)
    }
}

fn run_query(
    conn: &Connection,
    sql: &str,
    params: &[Value],
    limit: Option<usize>,
) -> Result<Vec<Row>> {
    debug!(sql, params = params.len(), "running query");
    let mut stmt = conn.prepare(sql)?;
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

    let mut rows = stmt.query(params_from_iter(params.iter().map(to_sql_value)))?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let mut values = Vec::with_capacity(columns.len());
        for idx in 0..columns.len() {
            values.push(from_value_ref(row.get_ref(idx)?));
        }
        out.push(Row::new(columns.clone(), values));

        if limit.is_some_and(|max| out.len() >= max) {
            break;
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn_with_people() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE people (id INTEGER, name TEXT, score REAL, photo BLOB);
             INSERT INTO people VALUES (1, 'Ann', 2.5, NULL);
             INSERT INTO people VALUES (2, 'Bob', NULL, x'6869');",
        )
        .unwrap();
        conn
    }

    #[test]
    fn test_query_all_returns_rows_in_order() {
        let conn = conn_with_people();
        let rows = conn
            .query_all("SELECT id, name, score, photo FROM people ORDER BY id", &[])
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].columns(), ["id", "name", "score", "photo"]);
        assert_eq!(rows[0].get("name"), Some(&Value::Text("Ann".into())));
        assert_eq!(rows[0].get("photo"), Some(&Value::Null));
        assert_eq!(rows[1].get("score"), Some(&Value::Null));
        assert_eq!(rows[1].get("photo"), Some(&Value::Text("hi".into())));
    }

    #[test]
    fn test_query_one_binds_params() {
        let conn = conn_with_people();
        let row = Database::query_one(
            &conn,
            "SELECT name FROM people WHERE id = ?1",
            &[Value::Integer(2)],
        )
        .unwrap()
        .unwrap();
        assert_eq!(row.get("name"), Some(&Value::Text("Bob".into())));

        let none = Database::query_one(
            &conn,
            "SELECT name FROM people WHERE id = ?1",
            &[Value::Integer(99)],
        )
        .unwrap();
        assert!(none.is_none());
    }

    #[test]
    fn test_execute_reports_errors() {
        let conn = Connection::open_in_memory().unwrap();
        Database::execute(&conn, "CREATE TABLE t (a INTEGER);").unwrap();
        assert!(Database::execute(&conn, "CREATE TABLE t (a INTEGER);").is_err());
        assert!(Database::execute(&conn, "CREATE TABLE IF NOT EXISTS t (a INTEGER);").is_ok());
    }

    #[test]
    fn test_row_into_record() {
        let row = Row::new(
            vec!["a".into(), "b".into()],
            vec![Value::Integer(1), Value::Boolean(true)],
        );
        assert_eq!(row.len(), 2);
        let record = row.into_record();
        assert_eq!(record["a"], Value::Integer(1));
        assert_eq!(record["b"], Value::Boolean(true));
    }

    #[test]
    fn test_row_new_truncates_to_shorter_list() {
        let row = Row::new(vec!["a".into(), "b".into()], vec![Value::Null]);
        assert_eq!(row.len(), 1);
        assert!(row.get("b").is_none());
    }
}
