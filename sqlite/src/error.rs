//! Error types for SQLite commit and synchronization.
//!
//! Database failures pass through untranslated; cache failures keep their
//! [`SchemaError`] kind.

use mason_core::SchemaError;
use thiserror::Error;

/// Errors that can occur while committing to or syncing from SQLite.
#[derive(Debug, Error)]
pub enum SqliteError {
    /// SQLite database operation failure.
    #[error("database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    /// The cache refused an operation during synchronization.
    #[error("schema error: {0}")]
    SchemaError(#[from] SchemaError),

    /// The requested table is not in the cache.
    #[error("table not cached: {0}")]
    UnknownTable(String),

    /// A metadata row did not have the expected shape.
    #[error("conversion error: {0}")]
    ConversionError(String),
}

/// Convenience alias for results with [`SqliteError`].
pub type Result<T> = std::result::Result<T, SqliteError>;
