//! Declarative table layouts loaded from YAML.
//!
//! A layout lists tables, their fields, and seed records, and is applied to
//! a [`SchemaCache`] in file order.
//!
//! # Example YAML
//!
//! ```yaml
//! quoting: literal
//! tables:
//!   - name: users
//!     fields:
//!       - { name: id, type: BIGINT, primary: true, unique: true, not_null: true }
//!       - { name: name, type: TEXT }
//!     records:
//!       - { id: 1, name: Ann }
//! ```

use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::cache::SchemaCache;
use crate::error::{LayoutError, Rejection, SchemaError};
use crate::sql::{SqlOptions, ValueQuoting};
use crate::types::{FieldSpec, Record};

/// One table in a [`SchemaLayout`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableLayout {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
    #[serde(default)]
    pub records: Vec<Record>,
}

/// Top-level layout file.
///
/// # Examples
///
/// ```
/// use mason_core::SchemaLayout;
///
/// let yaml = r#"
/// tables:
///   - name: users
///     fields:
///       - { name: id, type: BIGINT, primary: true }
///       - { name: name, type: TEXT }
///     records:
///       - { id: 1, name: Ann }
/// "#;
/// let layout = SchemaLayout::from_yaml_str(yaml).unwrap();
/// let cache = layout.build_cache().unwrap();
/// assert_eq!(
///     cache.bulk_insert_sql("users", None),
///     "INSERT OR REPLACE INTO users (id, name) VALUES\n(1,'Ann');"
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaLayout {
    pub quoting: ValueQuoting,
    pub tables: Vec<TableLayout>,
}

/// Outcome of [`SchemaLayout::apply`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplyReport {
    pub tables_created: usize,
    pub fields_added: usize,
    pub records_added: usize,
    /// Soft rejections encountered; the layout kept going past each one.
    pub rejected: Vec<Rejection>,
}

impl SchemaLayout {
    /// Loads a layout from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::IoError`] if the file cannot be read, or
    /// [`LayoutError::YamlError`] if parsing fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LayoutError> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let layout = serde_yaml::from_reader(reader)?;
        Ok(layout)
    }

    /// Parses a layout from a YAML string.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, LayoutError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Saves the layout as YAML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), LayoutError> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }

    pub fn sql_options(&self) -> SqlOptions {
        SqlOptions {
            quoting: self.quoting,
        }
    }

    /// Applies every table, field, and record to `cache`.
    ///
    /// Soft rejections (an already cached table, a duplicate field) are
    /// logged and collected in the report; fatal errors stop the apply and
    /// leave whatever was applied before them in place.
    pub fn apply(&self, cache: &mut SchemaCache) -> Result<ApplyReport, SchemaError> {
        let mut report = ApplyReport::default();

        for table in &self.tables {
            match cache.create_table(table.name.as_str()) {
                Ok(()) => report.tables_created += 1,
                Err(err) => report.soft(err)?,
            }

            for spec in &table.fields {
                match cache.add_field(&table.name, spec.clone()) {
                    Ok(()) => report.fields_added += 1,
                    Err(err) => report.soft(err)?,
                }
            }

            for record in &table.records {
                match cache.add_record(&table.name, record.clone()) {
                    Ok(()) => report.records_added += 1,
                    Err(err) => report.soft(err)?,
                }
            }
        }

        Ok(report)
    }

    /// Builds a fresh cache from this layout, using its quoting policy.
    pub fn build_cache(&self) -> Result<SchemaCache, SchemaError> {
        let mut cache = SchemaCache::with_options(self.sql_options());
        self.apply(&mut cache)?;
        Ok(cache)
    }
}

impl ApplyReport {
    /// Records a soft rejection, or hands back a fatal error.
    fn soft(&mut self, err: SchemaError) -> Result<(), SchemaError> {
        match err {
            SchemaError::Rejected(rejection) => {
                warn!(%rejection, "layout entry rejected");
                self.rejected.push(rejection);
                Ok(())
            }
            fatal => Err(fatal),
        }
    }
}
