//! Cache data model: scalar values, records, and field definitions.
//!
//! These types are plain data with [`serde`] derives so they can be loaded
//! from layout files and exported as table snapshots.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::registry::{TypeKind, resolve_type};

/// A scalar value held in a cached record.
///
/// Deserializes untagged, so layout files can write plain YAML/JSON scalars.
///
/// # Examples
///
/// ```
/// use mason_core::Value;
///
/// assert_eq!(Value::from(1).to_string(), "1");
/// assert_eq!(Value::from(2.5).to_string(), "2.5");
/// assert_eq!(Value::from(false).to_string(), "false");
/// assert_eq!(Value::from("Ann").to_string(), "Ann");
/// assert_eq!(Value::Null.to_string(), "NULL");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// SQL `NULL`, as read back from a live table.
    Null,
    Boolean(bool),
    Integer(i64),
    Real(f64),
    Text(String),
}

impl Value {
    /// Returns the string slice for [`Value::Text`].
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer for [`Value::Integer`] and `0`/`1` for booleans.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::Boolean(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

/// Literal textual form, exactly as it is spliced into generated SQL.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Integer(i) => write!(f, "{i}"),
            // SQLite reads 9e999 back as infinity; `inf` is not a literal.
            Value::Real(r) if r.is_infinite() => {
                f.write_str(if r.is_sign_positive() { "9e999" } else { "-9e999" })
            }
            Value::Real(r) => write!(f, "{r}"),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Real(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

/// One prospective row: field name to value.
///
/// Key order is irrelevant; generated statements follow the table's field
/// order.
pub type Record = BTreeMap<String, Value>;

/// Builds a [`Record`] from `(field, value)` pairs.
///
/// # Examples
///
/// ```
/// use mason_core::{Value, record};
///
/// let row = record([("id", Value::from(1)), ("name", Value::from("Ann"))]);
/// assert_eq!(row.len(), 2);
/// assert_eq!(row["name"], Value::from("Ann"));
/// ```
pub fn record<K, I>(pairs: I) -> Record
where
    K: Into<String>,
    I: IntoIterator<Item = (K, Value)>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v)).collect()
}

/// Conflict resolution algorithm recorded on a field.
///
/// Kept as field metadata only; generated primary key clauses always use
/// `ABORT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConflictResponse {
    Rollback,
    #[default]
    Abort,
    Fail,
    Ignore,
    Replace,
}

impl ConflictResponse {
    /// SQL keyword used after `ON CONFLICT`.
    pub fn as_sql(self) -> &'static str {
        match self {
            ConflictResponse::Rollback => "ROLLBACK",
            ConflictResponse::Abort => "ABORT",
            ConflictResponse::Fail => "FAIL",
            ConflictResponse::Ignore => "IGNORE",
            ConflictResponse::Replace => "REPLACE",
        }
    }
}

impl fmt::Display for ConflictResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Attribute values a field takes when its [`FieldSpec`] leaves them out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDefaults {
    pub field_type: &'static str,
    pub primary: bool,
    pub not_null: bool,
    pub unique: bool,
    pub conflict: ConflictResponse,
    pub default_value: &'static str,
}

/// Defaults applied by [`SchemaCache::add_field`](crate::SchemaCache::add_field).
pub const FIELD_DEFAULTS: FieldDefaults = FieldDefaults {
    field_type: "BIGINT",
    primary: false,
    not_null: false,
    unique: false,
    conflict: ConflictResponse::Abort,
    default_value: "",
};

/// Partial description of a new field.
///
/// Every attribute is optional; missing ones fall back to [`FIELD_DEFAULTS`].
/// A spec without a name is rejected when added.
///
/// # Examples
///
/// ```
/// use mason_core::FieldSpec;
///
/// let spec = FieldSpec::named("id")
///     .with_type("BIGINT")
///     .primary_key()
///     .not_null()
///     .unique();
/// assert_eq!(spec.name.as_deref(), Some("id"));
/// assert_eq!(spec.primary, Some(true));
/// assert_eq!(spec.default_value, None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldSpec {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub field_type: Option<String>,
    pub primary: Option<bool>,
    pub not_null: Option<bool>,
    pub unique: Option<bool>,
    pub conflict: Option<ConflictResponse>,
    #[serde(alias = "default")]
    pub default_value: Option<String>,
}

impl FieldSpec {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_type(mut self, field_type: impl Into<String>) -> Self {
        self.field_type = Some(field_type.into());
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary = Some(true);
        self
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = Some(true);
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = Some(true);
        self
    }

    pub fn on_conflict(mut self, conflict: ConflictResponse) -> Self {
        self.conflict = Some(conflict);
        self
    }

    pub fn with_default(mut self, default_value: impl Into<String>) -> Self {
        self.default_value = Some(default_value.into());
        self
    }
}

/// A column stored in a cached table.
///
/// Built once from a [`FieldSpec`] and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    pub primary: bool,
    pub not_null: bool,
    pub unique: bool,
    pub conflict: ConflictResponse,
    pub default_value: String,
}

impl FieldDefinition {
    /// Fills the unset attributes of `spec` from [`FIELD_DEFAULTS`].
    pub(crate) fn from_spec(name: String, spec: &FieldSpec) -> Self {
        Self {
            name,
            field_type: spec
                .field_type
                .clone()
                .unwrap_or_else(|| FIELD_DEFAULTS.field_type.to_string()),
            primary: spec.primary.unwrap_or(FIELD_DEFAULTS.primary),
            not_null: spec.not_null.unwrap_or(FIELD_DEFAULTS.not_null),
            unique: spec.unique.unwrap_or(FIELD_DEFAULTS.unique),
            conflict: spec.conflict.unwrap_or(FIELD_DEFAULTS.conflict),
            default_value: spec
                .default_value
                .clone()
                .unwrap_or_else(|| FIELD_DEFAULTS.default_value.to_string()),
        }
    }

    /// Kind of the declared type, `None` only for definitions built outside
    /// the cache.
    pub fn kind(&self) -> Option<TypeKind> {
        resolve_type(&self.field_type)
    }

    /// Whether a `DEFAULT` clause is emitted. Unique columns never get one.
    pub fn emits_default(&self) -> bool {
        !self.default_value.is_empty() && !self.unique
    }
}
