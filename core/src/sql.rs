//! SQL text generation from cached table definitions.
//!
//! Both generators are pure: they read a [`TableDefinition`] and return a
//! `String`, and the same input always yields byte-identical output. Column
//! order always follows the table's field order.
//!
//! # Output format
//!
//! ```text
//! CREATE TABLE IF NOT EXISTS [users] (
//!     [id] BIGINT PRIMARY KEY ON CONFLICT ABORT NOT NULL UNIQUE,
//!     [name] TEXT
//! );
//!
//! INSERT OR REPLACE INTO users (id, name) VALUES
//! (1,'Ann'),
//! (2,'Bob');
//! ```
//!
//! Text-kind values are wrapped in single quotes. With the default
//! [`ValueQuoting::Literal`] policy embedded quotes are copied through
//! unchanged, so a value containing `'` produces broken SQL.

use serde::{Deserialize, Serialize};

use crate::cache::TableDefinition;
use crate::registry::TypeKind;
use crate::types::{FieldDefinition, Record, Value};

/// How text values are written between single quotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueQuoting {
    /// Copy the value verbatim (historical output).
    #[default]
    Literal,
    /// Double every embedded `'`.
    Escaped,
}

/// Options that affect generated statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SqlOptions {
    pub quoting: ValueQuoting,
}

/// Generates the `CREATE TABLE IF NOT EXISTS` statement for a table.
///
/// Each column line carries its flags in a fixed order:
/// `PRIMARY KEY ON CONFLICT ABORT`, `NOT NULL`, `UNIQUE`, then `DEFAULT`
/// (omitted for unique columns). Returns an empty string for a table without fields.
pub fn generate_create_table(table: &TableDefinition) -> String {
    if table.fields().is_empty() {
        return String::new();
    }

    let columns: Vec<String> = table.fields().iter().map(column_clause).collect();

    format!(
        "CREATE TABLE IF NOT EXISTS [{}] (\n{}\n);",
        table.name(),
        columns.join(",\n")
    )
}

fn column_clause(field: &FieldDefinition) -> String {
    let mut clause = format!("    [{}] {}", field.name, field.field_type);

    if field.primary {
        clause.push_str(" PRIMARY KEY ON CONFLICT ABORT");
    }
    if field.not_null {
        clause.push_str(" NOT NULL");
    }
    if field.unique {
        clause.push_str(" UNIQUE");
    }
    if field.emits_default() {
        clause.push_str(" DEFAULT ");
        clause.push_str(&field.default_value);
    }

    clause
}

/// Generates one `INSERT OR REPLACE` statement covering a set of records.
///
/// Uses `records` when given, otherwise the table's cached records. Returns
/// an empty string when there is nothing to insert, so callers never see a
/// `VALUES` keyword without tuples. A field missing from an override record
/// is written as `NULL`.
pub fn generate_bulk_insert(
    table: &TableDefinition,
    records: Option<&[Record]>,
    options: &SqlOptions,
) -> String {
    let records = records.unwrap_or(table.records());
    if records.is_empty() || table.fields().is_empty() {
        return String::new();
    }

    let columns: Vec<&str> = table.fields().iter().map(|f| f.name.as_str()).collect();

    let tuples: Vec<String> = records
        .iter()
        .map(|record| {
            let values: Vec<String> = table
                .fields()
                .iter()
                .map(|field| match record.get(&field.name) {
                    Some(value) => render_value(field, value, options),
                    None => "NULL".to_string(),
                })
                .collect();
            format!("({})", values.join(","))
        })
        .collect();

    format!(
        "INSERT OR REPLACE INTO {} ({}) VALUES\n{};",
        table.name(),
        columns.join(", "),
        tuples.join(",\n")
    )
}

fn render_value(field: &FieldDefinition, value: &Value, options: &SqlOptions) -> String {
    if value.is_null() || field.kind() != Some(TypeKind::Text) {
        return value.to_string();
    }

    let text = value.to_string();
    match options.quoting {
        ValueQuoting::Literal => format!("'{text}'"),
        ValueQuoting::Escaped => format!("'{}'", text.replace('\'', "''")),
    }
}
