//! The schema cache: table definitions, their fields, and pending records.
//!
//! [`SchemaCache`] is an ordinary owned value; nothing is global. Tables and
//! fields only ever grow. The one exception is [`SchemaCache::clear`], which
//! a full resynchronization uses to wipe everything before rebuilding.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Rejection, Result, SchemaError};
use crate::registry::resolve_type;
use crate::sql::{self, SqlOptions};
use crate::types::{FieldDefinition, FieldSpec, Record};

/// A cached table: ordered fields plus records waiting to be committed.
#[derive(Debug, Clone, PartialEq)]
pub struct TableDefinition {
    name: String,
    fields: Vec<FieldDefinition>,
    records: Vec<Record>,
}

impl TableDefinition {
    fn new(name: String) -> Self {
        Self {
            name,
            fields: Vec::new(),
            records: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in the order they were added.
    pub fn fields(&self) -> &[FieldDefinition] {
        &self.fields
    }

    /// Records in the order they were added.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    fn matches_fields(&self, record: &Record) -> bool {
        record.len() == self.fields.len()
            && self.fields.iter().all(|f| record.contains_key(&f.name))
    }

    /// Copies the table into a serializable [`TableSnapshot`].
    pub fn snapshot(&self) -> TableSnapshot {
        TableSnapshot {
            name: self.name.clone(),
            fields: self.fields.clone(),
            records: self.records.clone(),
        }
    }
}

/// Serializable copy of one table, used for diagnostics and JSON export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSnapshot {
    pub name: String,
    pub fields: Vec<FieldDefinition>,
    pub records: Vec<Record>,
}

impl TableSnapshot {
    /// Renders the snapshot as compact JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Renders the snapshot as indented JSON.
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// In-memory mirror of a database's tables.
///
/// Mutations report soft failures as [`SchemaError::Rejected`] and leave the
/// cache untouched. Every successful mutation sets the [`edited`] flag; the
/// cache never reads it itself.
///
/// [`edited`]: SchemaCache::is_edited
///
/// # Examples
///
/// ```
/// use mason_core::{FieldSpec, SchemaCache, Value, record};
///
/// let mut cache = SchemaCache::new();
/// cache.create_table("users").unwrap();
/// cache
///     .add_field(
///         "users",
///         FieldSpec::named("id").with_type("BIGINT").primary_key().unique().not_null(),
///     )
///     .unwrap();
/// cache.add_field("users", FieldSpec::named("name").with_type("TEXT")).unwrap();
/// cache
///     .add_record("users", record([("id", Value::from(1)), ("name", Value::from("Ann"))]))
///     .unwrap();
///
/// assert_eq!(
///     cache.create_table_sql("users"),
///     "CREATE TABLE IF NOT EXISTS [users] (\n    [id] BIGINT PRIMARY KEY ON CONFLICT ABORT NOT NULL UNIQUE,\n    [name] TEXT\n);"
/// );
/// assert_eq!(
///     cache.bulk_insert_sql("users", None),
///     "INSERT OR REPLACE INTO users (id, name) VALUES\n(1,'Ann');"
/// );
/// assert!(cache.is_edited());
/// ```
#[derive(Debug, Clone, Default)]
pub struct SchemaCache {
    tables: BTreeMap<String, TableDefinition>,
    edited: bool,
    options: SqlOptions,
}

impl SchemaCache {
    /// Creates an empty cache with default [`SqlOptions`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty cache whose generators use `options`.
    pub fn with_options(options: SqlOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn options(&self) -> &SqlOptions {
        &self.options
    }

    pub fn set_options(&mut self, options: SqlOptions) {
        self.options = options;
    }

    /// Adds an empty table.
    ///
    /// # Errors
    ///
    /// Returns [`Rejection::TableExists`] if the name is taken; the existing
    /// table keeps its fields and records.
    pub fn create_table(&mut self, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        if self.tables.contains_key(&name) {
            return Err(Rejection::TableExists(name).into());
        }

        debug!(table = %name, "creating cached table");
        self.tables.insert(name.clone(), TableDefinition::new(name));
        self.edited = true;
        Ok(())
    }

    /// Appends a field to a table, filling unset attributes from
    /// [`FIELD_DEFAULTS`](crate::FIELD_DEFAULTS).
    ///
    /// # Errors
    ///
    /// - [`Rejection::UnknownTable`], [`Rejection::MissingFieldName`], or
    ///   [`Rejection::DuplicateField`] as soft rejections.
    /// - [`SchemaError::InvalidType`] if the supplied type is not in the
    ///   registry.
    pub fn add_field(&mut self, table_name: &str, spec: FieldSpec) -> Result<()> {
        let table = self
            .tables
            .get_mut(table_name)
            .ok_or_else(|| Rejection::UnknownTable(table_name.to_string()))?;

        let name = spec.name.clone().ok_or(Rejection::MissingFieldName)?;

        if table.field(&name).is_some() {
            return Err(Rejection::DuplicateField {
                table: table_name.to_string(),
                field: name,
            }
            .into());
        }

        if let Some(type_name) = spec.field_type.as_ref().filter(|t| resolve_type(t).is_none()) {
            return Err(SchemaError::InvalidType {
                field: name,
                type_name: type_name.clone(),
            });
        }

        let field = FieldDefinition::from_spec(name, &spec);
        debug!(table = %table_name, field = %field.name, field_type = %field.field_type, "adding field");
        table.fields.push(field);
        self.edited = true;
        Ok(())
    }

    /// Appends a record to a table.
    ///
    /// # Errors
    ///
    /// - [`Rejection::UnknownTable`] as a soft rejection.
    /// - [`SchemaError::FieldMismatch`] if the record's keys are not exactly
    ///   the table's field names.
    pub fn add_record(&mut self, table_name: &str, record: Record) -> Result<()> {
        let table = self
            .tables
            .get_mut(table_name)
            .ok_or_else(|| Rejection::UnknownTable(table_name.to_string()))?;

        if !table.matches_fields(&record) {
            return Err(SchemaError::FieldMismatch {
                table: table_name.to_string(),
                expected: table.field_names().map(String::from).collect(),
                found: record.keys().cloned().collect(),
            });
        }

        table.records.push(record);
        self.edited = true;
        Ok(())
    }

    pub fn table(&self, name: &str) -> Option<&TableDefinition> {
        self.tables.get(name)
    }

    pub fn contains_table(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    /// Tables in name order.
    pub fn tables(&self) -> impl Iterator<Item = &TableDefinition> {
        self.tables.values()
    }

    pub fn table_names(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Returns a snapshot of one table, or `None` if it is not cached.
    pub fn export_table_snapshot(&self, name: &str) -> Option<TableSnapshot> {
        self.tables.get(name).map(TableDefinition::snapshot)
    }

    /// `CREATE TABLE` text for a cached table; empty if the table is unknown.
    pub fn create_table_sql(&self, name: &str) -> String {
        self.tables
            .get(name)
            .map(sql::generate_create_table)
            .unwrap_or_default()
    }

    /// `INSERT OR REPLACE` text for a cached table's records, or for
    /// `records` when given. Empty if the table is unknown or there is
    /// nothing to insert.
    pub fn bulk_insert_sql(&self, name: &str, records: Option<&[Record]>) -> String {
        self.tables
            .get(name)
            .map(|table| sql::generate_bulk_insert(table, records, &self.options))
            .unwrap_or_default()
    }

    /// Whether any mutation happened since creation or the last
    /// [`mark_clean`](Self::mark_clean).
    pub fn is_edited(&self) -> bool {
        self.edited
    }

    pub fn mark_clean(&mut self) {
        self.edited = false;
    }

    /// Drops every table and resets the dirty flag.
    pub fn clear(&mut self) {
        self.tables.clear();
        self.edited = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Value, record};

    fn cache_with_users() -> SchemaCache {
        let mut cache = SchemaCache::new();
        cache.create_table("users").unwrap();
        cache
            .add_field("users", FieldSpec::named("id").with_type("BIGINT"))
            .unwrap();
        cache
            .add_field("users", FieldSpec::named("name").with_type("TEXT"))
            .unwrap();
        cache
    }

    #[test]
    fn test_new_cache_is_clean_and_empty() {
        let cache = SchemaCache::new();
        assert!(cache.is_empty());
        assert!(!cache.is_edited());
        assert_eq!(cache.create_table_sql("missing"), "");
        assert_eq!(cache.bulk_insert_sql("missing", None), "");
    }

    #[test]
    fn test_create_table_twice_is_rejected_without_reset() {
        let mut cache = cache_with_users();
        cache
            .add_record("users", record([("id", Value::from(1)), ("name", Value::from("Ann"))]))
            .unwrap();

        let err = cache.create_table("users").unwrap_err();
        assert_eq!(err, SchemaError::Rejected(Rejection::TableExists("users".into())));

        let table = cache.table("users").unwrap();
        assert_eq!(table.fields().len(), 2);
        assert_eq!(table.records().len(), 1);
    }

    #[test]
    fn test_add_field_to_unknown_table() {
        let mut cache = SchemaCache::new();
        let err = cache.add_field("nope", FieldSpec::named("a")).unwrap_err();
        assert_eq!(err.rejection(), Some(&Rejection::UnknownTable("nope".into())));
    }

    #[test]
    fn test_add_field_without_name() {
        let mut cache = cache_with_users();
        let err = cache
            .add_field("users", FieldSpec::default().with_type("TEXT"))
            .unwrap_err();
        assert_eq!(err.rejection(), Some(&Rejection::MissingFieldName));
    }

    #[test]
    fn test_duplicate_field_leaves_original() {
        let mut cache = cache_with_users();
        let err = cache
            .add_field("users", FieldSpec::named("name").with_type("INTEGER").unique())
            .unwrap_err();
        assert!(err.is_soft_rejection());

        let field = cache.table("users").unwrap().field("name").unwrap();
        assert_eq!(field.field_type, "TEXT");
        assert!(!field.unique);
    }

    #[test]
    fn test_invalid_type_is_fatal_and_not_stored() {
        let mut cache = cache_with_users();
        cache.mark_clean();
        let err = cache
            .add_field("users", FieldSpec::named("discord_id").with_type("BLOB_TEXT"))
            .unwrap_err();
        assert_eq!(
            err,
            SchemaError::InvalidType {
                field: "discord_id".into(),
                type_name: "BLOB_TEXT".into(),
            }
        );
        assert!(!err.is_soft_rejection());
        assert!(cache.table("users").unwrap().field("discord_id").is_none());
        assert!(!cache.is_edited());
    }

    #[test]
    fn test_field_order_follows_insertion() {
        let mut cache = SchemaCache::new();
        cache.create_table("t").unwrap();
        for name in ["zeta", "alpha", "mid"] {
            cache.add_field("t", FieldSpec::named(name)).unwrap();
        }
        let names: Vec<&str> = cache.table("t").unwrap().field_names().collect();
        assert_eq!(names, ["zeta", "alpha", "mid"]);

        let sql = cache.create_table_sql("t");
        let zeta = sql.find("[zeta]").unwrap();
        let alpha = sql.find("[alpha]").unwrap();
        let mid = sql.find("[mid]").unwrap();
        assert!(zeta < alpha && alpha < mid);
    }

    #[test]
    fn test_add_record_key_set_must_match() {
        let mut cache = cache_with_users();

        let missing = cache
            .add_record("users", record([("id", Value::from(1))]))
            .unwrap_err();
        assert!(matches!(missing, SchemaError::FieldMismatch { .. }));

        let extra = cache
            .add_record(
                "users",
                record([
                    ("id", Value::from(1)),
                    ("name", Value::from("Ann")),
                    ("age", Value::from(30)),
                ]),
            )
            .unwrap_err();
        assert!(matches!(extra, SchemaError::FieldMismatch { .. }));
        assert!(cache.table("users").unwrap().records().is_empty());

        cache
            .add_record("users", record([("name", Value::from("Ann")), ("id", Value::from(1))]))
            .unwrap();
        assert_eq!(cache.table("users").unwrap().records().len(), 1);
    }

    #[test]
    fn test_add_record_to_unknown_table() {
        let mut cache = SchemaCache::new();
        let err = cache.add_record("ghost", Record::new()).unwrap_err();
        assert_eq!(err.rejection(), Some(&Rejection::UnknownTable("ghost".into())));
    }

    #[test]
    fn test_generation_is_idempotent() {
        let mut cache = cache_with_users();
        cache
            .add_record("users", record([("id", Value::from(1)), ("name", Value::from("Ann"))]))
            .unwrap();
        assert_eq!(cache.create_table_sql("users"), cache.create_table_sql("users"));
        assert_eq!(
            cache.bulk_insert_sql("users", None),
            cache.bulk_insert_sql("users", None)
        );
        assert_eq!(cache.table("users").unwrap().records().len(), 1);
    }

    #[test]
    fn test_edited_flag_tracks_mutations() {
        let mut cache = SchemaCache::new();
        cache.create_table("t").unwrap();
        assert!(cache.is_edited());

        cache.mark_clean();
        assert!(cache.create_table("t").is_err());
        assert!(!cache.is_edited());

        cache.add_field("t", FieldSpec::named("a")).unwrap();
        assert!(cache.is_edited());

        cache.clear();
        assert!(cache.is_empty());
        assert!(!cache.is_edited());
    }

    #[test]
    fn test_snapshot_preserves_field_order() {
        let mut cache = cache_with_users();
        cache
            .add_record("users", record([("id", Value::from(1)), ("name", Value::from("Ann"))]))
            .unwrap();
        let snapshot = cache.export_table_snapshot("users").unwrap();
        assert_eq!(snapshot.fields[0].name, "id");
        assert_eq!(snapshot.fields[1].name, "name");

        let json = snapshot.to_json().unwrap();
        let parsed: TableSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, snapshot);
        assert!(json.find(r#""name":"id""#).unwrap() < json.find(r#""name":"name""#).unwrap());

        assert!(cache.export_table_snapshot("missing").is_none());
    }

    #[test]
    fn test_options_apply_to_generation() {
        let mut cache = SchemaCache::with_options(SqlOptions {
            quoting: crate::sql::ValueQuoting::Escaped,
        });
        cache.create_table("q").unwrap();
        cache
            .add_field("q", FieldSpec::named("s").with_type("VARCHAR"))
            .unwrap();
        cache
            .add_record("q", record([("s", Value::from("o'k"))]))
            .unwrap();
        assert!(cache.bulk_insert_sql("q", None).ends_with("('o''k');"));
    }
}
