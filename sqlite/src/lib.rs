//! SQLite commit and synchronization for the mason schema cache.
//!
//! This crate connects a [`SchemaCache`](mason_core::SchemaCache) to a live
//! database through the [`Database`] trait:
//!
//! - **`database`**: the three-operation collaborator (`execute`,
//!   `query_one`, `query_all`) and its [`rusqlite::Connection`] implementation
//! - **`convert`**: cache value ↔ SQLite value conversion
//! - **`sync`**: [`SchemaSync`], which commits generated SQL and rebuilds the
//!   cache from the database catalog
//!
//! # Quick start: commit
//!
//! ```no_run
//! use mason_core::{FieldSpec, SchemaCache, Value, record};
//! use mason_sqlite::SchemaSync;
//! use rusqlite::Connection;
//!
//! let conn = Connection::open("app.db").unwrap();
//! let mut cache = SchemaCache::new();
//! cache.create_table("users").unwrap();
//! cache.add_field("users", FieldSpec::named("id").primary_key()).unwrap();
//! cache.add_field("users", FieldSpec::named("name").with_type("TEXT")).unwrap();
//! cache
//!     .add_record("users", record([("id", Value::from(1)), ("name", Value::from("Ann"))]))
//!     .unwrap();
//!
//! let report = SchemaSync::new(&conn).commit_all(&cache).unwrap();
//! println!("{} records committed", report.records_committed);
//! ```
//!
//! # Quick start: synchronize
//!
//! ```no_run
//! use mason_core::SchemaCache;
//! use mason_sqlite::SchemaSync;
//! use rusqlite::Connection;
//!
//! let conn = Connection::open("app.db").unwrap();
//! let mut cache = SchemaCache::new();
//! SchemaSync::new(&conn).synchronize_from_database(&mut cache).unwrap();
//!
//! for table in cache.tables() {
//!     println!("{}", cache.create_table_sql(table.name()));
//! }
//! ```

mod convert;
mod database;
mod error;
mod sync;

pub use database::{Database, Row};
pub use error::{Result, SqliteError};
pub use sync::{CommitReport, SchemaSync, SyncReport};
