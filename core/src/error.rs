//! Error types for schema cache operations.
//!
//! [`SchemaError`] keeps recoverable rejections ([`Rejection`]) apart from
//! the two fatal validation failures, so callers can match on the kind of
//! failure instead of guessing from a boolean.

use thiserror::Error;

/// A recoverable refusal to mutate the cache. Cache state is unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    /// A table with this name is already cached.
    #[error("table already exists: {0}")]
    TableExists(String),

    /// The referenced table is not cached.
    #[error("unknown table: {0}")]
    UnknownTable(String),

    /// A field spec was supplied without a name.
    #[error("field spec has no name")]
    MissingFieldName,

    /// The table already has a field with this name.
    #[error("field already exists: {table}.{field}")]
    DuplicateField { table: String, field: String },
}

/// Errors that can occur while mutating a [`SchemaCache`](crate::SchemaCache).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// Soft rejection; see [`Rejection`].
    #[error("rejected: {0}")]
    Rejected(#[from] Rejection),

    /// A field declared a type missing from the type registry.
    #[error("invalid type '{type_name}' for field '{field}'")]
    InvalidType { field: String, type_name: String },

    /// A record's keys differ from the table's field names.
    #[error(
        "field mismatch in table '{table}': expected [{}], got [{}]",
        .expected.join(", "),
        .found.join(", ")
    )]
    FieldMismatch {
        table: String,
        expected: Vec<String>,
        found: Vec<String>,
    },
}

impl SchemaError {
    /// Returns `true` for recoverable rejections.
    pub fn is_soft_rejection(&self) -> bool {
        matches!(self, SchemaError::Rejected(_))
    }

    /// Returns the rejection reason, if this is one.
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            SchemaError::Rejected(r) => Some(r),
            _ => None,
        }
    }
}

/// Errors that can occur while loading or applying a layout file.
#[derive(Debug, Error)]
pub enum LayoutError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// A fatal schema error raised while applying the layout.
    #[error("schema error: {0}")]
    SchemaError(#[from] SchemaError),
}

/// Convenience alias for results with [`SchemaError`].
pub type Result<T> = std::result::Result<T, SchemaError>;
