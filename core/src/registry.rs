//! Declared column type registry.
//!
//! Maps the SQL type names a field may declare to the [`TypeKind`] that
//! decides how values of that column are written into generated SQL. The
//! table is a compile-time constant, so it cannot be altered at runtime.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Semantic kind of a declared column type.
///
/// Only [`TypeKind::Text`] changes generated output: text values are wrapped
/// in single quotes, numeric and boolean values are written bare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeKind {
    /// Integer, real, and decimal affinities.
    Numeric,
    /// Character, text, blob, and date-like types.
    Text,
    /// `BOOLEAN`.
    Boolean,
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TypeKind::Numeric => "numeric",
            TypeKind::Text => "text",
            TypeKind::Boolean => "boolean",
        };
        f.write_str(name)
    }
}

/// Every declared type name the cache accepts, with its kind.
///
/// Names are matched exactly (upper case, single spaces).
pub const DATA_TYPES: &[(&str, TypeKind)] = &[
    ("INT", TypeKind::Numeric),
    ("INTEGER", TypeKind::Numeric),
    ("TINYINT", TypeKind::Numeric),
    ("SMALLINT", TypeKind::Numeric),
    ("MEDIUMINT", TypeKind::Numeric),
    ("BIGINT", TypeKind::Numeric),
    ("UNSIGNED BIG INT", TypeKind::Numeric),
    ("INT2", TypeKind::Numeric),
    ("INT8", TypeKind::Numeric),
    ("CHARACTER", TypeKind::Text),
    ("VARCHAR", TypeKind::Text),
    ("VARYING CHARACTER", TypeKind::Text),
    ("NCHAR", TypeKind::Text),
    ("NATIVE CHARACTER", TypeKind::Text),
    ("NVARCHAR", TypeKind::Text),
    ("TEXT", TypeKind::Text),
    ("CLOB", TypeKind::Text),
    ("BLOB", TypeKind::Text),
    ("REAL", TypeKind::Numeric),
    ("DOUBLE", TypeKind::Numeric),
    ("DOUBLE PRECISION", TypeKind::Numeric),
    ("FLOAT", TypeKind::Numeric),
    ("NUMERIC", TypeKind::Numeric),
    ("DECIMAL", TypeKind::Numeric),
    ("BOOLEAN", TypeKind::Boolean),
    ("DATE", TypeKind::Text),
    ("DATETIME", TypeKind::Text),
];

/// Resolves a declared type name to its [`TypeKind`].
///
/// Returns `None` for names outside [`DATA_TYPES`].
///
/// # Examples
///
/// ```
/// use mason_core::{TypeKind, resolve_type};
///
/// assert_eq!(resolve_type("BIGINT"), Some(TypeKind::Numeric));
/// assert_eq!(resolve_type("TEXT"), Some(TypeKind::Text));
/// assert_eq!(resolve_type("BLOB_TEXT"), None);
/// ```
pub fn resolve_type(type_name: &str) -> Option<TypeKind> {
    DATA_TYPES
        .iter()
        .find(|(name, _)| *name == type_name)
        .map(|(_, kind)| *kind)
}

/// Normalizes a type name as declared in a live database.
///
/// Upper-cases, drops any `(length, precision)` suffix, and collapses runs of
/// whitespace. An empty declaration becomes `BLOB`, the affinity SQLite gives
/// untyped columns.
pub fn normalize_declared_type(declared: &str) -> String {
    let base = match declared.find('(') {
        Some(idx) => &declared[..idx],
        None => declared,
    };
    let normalized = base
        .split_whitespace()
        .map(str::to_ascii_uppercase)
        .collect::<Vec<_>>()
        .join(" ");
    if normalized.is_empty() {
        "BLOB".to_string()
    } else {
        normalized
    }
}
