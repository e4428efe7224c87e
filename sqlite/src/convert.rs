//! Conversion between cache [`Value`]s and SQLite values.
//!
//! SQLite has no boolean storage class, so booleans bind as `0`/`1`. Blobs
//! read back as lossy UTF-8 text, matching the registry's text kind for
//! `BLOB` columns.

use mason_core::Value;
use rusqlite::types::{Value as SqlValue, ValueRef};

/// Converts a cache value into an owned SQLite value for parameter binding.
pub(crate) fn to_sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Boolean(b) => SqlValue::Integer(i64::from(*b)),
        Value::Integer(i) => SqlValue::Integer(*i),
        Value::Real(r) => SqlValue::Real(*r),
        Value::Text(s) => SqlValue::Text(s.clone()),
    }
}

/// Converts a borrowed column value from a result row into a cache value.
pub(crate) fn from_value_ref(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(r) => Value::Real(r),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            Value::Text(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}
