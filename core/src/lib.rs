//! In-memory SQLite schema cache and SQL text generation.
//!
//! This crate mirrors a database's table structure in memory and turns it
//! back into SQL:
//!
//! - [`resolve_type`]: fixed registry from declared column type to
//!   [`TypeKind`].
//! - [`SchemaCache`]: owns [`TableDefinition`]s; tables and their contents
//!   are only ever appended.
//! - [`generate_create_table`] / [`generate_bulk_insert`]: pure generators
//!   for `CREATE TABLE IF NOT EXISTS` and `INSERT OR REPLACE` statements.
//! - [`SchemaLayout`]: YAML description of tables and seed records.
//!
//! Talking to a real database lives in the `mason-sqlite` crate.
//!
//! # Example
//!
//! ```
//! use mason_core::*;
//!
//! let mut cache = SchemaCache::new();
//! cache.create_table("users").unwrap();
//! cache
//!     .add_field("users", FieldSpec::named("id").with_type("BIGINT").primary_key())
//!     .unwrap();
//! cache.add_field("users", FieldSpec::named("name").with_type("TEXT")).unwrap();
//!
//! // Soft rejection: the field already exists.
//! let err = cache.add_field("users", FieldSpec::named("name")).unwrap_err();
//! assert!(err.is_soft_rejection());
//!
//! // Fatal: unknown column type.
//! let err = cache
//!     .add_field("users", FieldSpec::named("x").with_type("BLOB_TEXT"))
//!     .unwrap_err();
//! assert!(matches!(err, SchemaError::InvalidType { .. }));
//!
//! cache
//!     .add_record("users", record([("id", Value::from(1)), ("name", Value::from("Ann"))]))
//!     .unwrap();
//! assert_eq!(
//!     cache.bulk_insert_sql("users", None),
//!     "INSERT OR REPLACE INTO users (id, name) VALUES\n(1,'Ann');"
//! );
//! ```

mod cache;
mod error;
mod layout;
mod registry;
mod sql;
mod types;

pub use cache::{SchemaCache, TableDefinition, TableSnapshot};
pub use error::{LayoutError, Rejection, Result, SchemaError};
pub use layout::{ApplyReport, SchemaLayout, TableLayout};
pub use registry::{DATA_TYPES, TypeKind, normalize_declared_type, resolve_type};
pub use sql::{SqlOptions, ValueQuoting, generate_bulk_insert, generate_create_table};
pub use types::{
    ConflictResponse, FIELD_DEFAULTS, FieldDefaults, FieldDefinition, FieldSpec, Record, Value,
    record,
};
