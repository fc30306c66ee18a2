//! Record classes
//!
//! A record class binds a name to a table and an ordered list of field
//! descriptors. Classes are read-only once registered and shared as
//! `Arc<RecordClass>`.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::Deserialize;

use super::field::{ColumnType, FieldDefinition, FieldType, Storage, StoreLocation};
use super::instance::Record;
use super::value::Value;
use crate::core::constants::{DEFAULT_PRIMARY_KEY, METADATA_COLUMN};
use crate::data::DataError;

/// Per-record access predicate
pub type AccessPolicy = Arc<dyn Fn(&Record) -> bool + Send + Sync>;

fn default_primary_key() -> String {
    DEFAULT_PRIMARY_KEY.to_string()
}

#[derive(Clone, Deserialize)]
pub struct RecordClass {
    pub name: String,
    pub table: String,
    #[serde(default = "default_primary_key")]
    primary_key: String,
    #[serde(default)]
    fields: Vec<FieldDefinition>,
    #[serde(skip)]
    access: Option<AccessPolicy>,
}

impl RecordClass {
    /// New class with an integer primary key named `id`
    pub fn new(name: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            table: table.into(),
            primary_key: default_primary_key(),
            fields: vec![FieldDefinition::new(DEFAULT_PRIMARY_KEY, FieldType::Integer)],
            access: None,
        }
    }

    /// Add a field, replacing any field with the same name
    pub fn with_field(mut self, field: FieldDefinition) -> Self {
        match self.fields.iter_mut().find(|f| f.name == field.name) {
            Some(existing) => *existing = field,
            None => self.fields.push(field),
        }
        self
    }

    pub fn with_access<F>(mut self, policy: F) -> Self
    where
        F: Fn(&Record) -> bool + Send + Sync + 'static,
    {
        self.access = Some(Arc::new(policy));
        self
    }

    pub fn primary_key(&self) -> &str {
        &self.primary_key
    }

    pub fn fields(&self) -> &[FieldDefinition] {
        &self.fields
    }

    pub fn field_definition(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// First column-stored single reference pointing at `class`
    pub fn reference_to(&self, class: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| {
            f.column().is_some()
                && matches!(&f.field_type, FieldType::Reference { foreign_class } if foreign_class == class)
        })
    }

    /// External access predicate; classes without one allow everything
    pub fn can_access(&self, record: &Record) -> bool {
        self.access.as_ref().is_none_or(|policy| policy(record))
    }

    /// Check identifiers and make sure the primary key field exists
    pub fn normalize(&mut self) -> Result<(), DataError> {
        for ident in [&self.name, &self.table, &self.primary_key] {
            if !is_identifier(ident) {
                return Err(DataError::Schema(format!(
                    "Invalid identifier '{}' in class '{}'",
                    ident, self.name
                )));
            }
        }

        match self.field_definition(&self.primary_key) {
            None => self.fields.insert(
                0,
                FieldDefinition::new(self.primary_key.clone(), FieldType::Integer),
            ),
            Some(pk) if !matches!(pk.field_type, FieldType::Integer) || pk.column().is_none() => {
                return Err(DataError::Schema(format!(
                    "Primary key '{}' of class '{}' must be an integer column",
                    self.primary_key, self.name
                )));
            }
            Some(_) => {}
        }

        let mut seen = rustc_hash::FxHashSet::default();
        for field in &self.fields {
            if !is_identifier(&field.name) || field.name == METADATA_COLUMN {
                return Err(DataError::Schema(format!(
                    "Invalid field name '{}' in class '{}'",
                    field.name, self.name
                )));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(DataError::Schema(format!(
                    "Duplicate field '{}' in class '{}'",
                    field.name, self.name
                )));
            }
            if let Storage::SubFields(subs) = &field.storage
                && (subs.is_empty() || !subs.iter().all(|s| is_identifier(s)))
            {
                return Err(DataError::Schema(format!(
                    "Field '{}' in class '{}' has invalid sub-fields",
                    field.name, self.name
                )));
            }
        }
        Ok(())
    }

    fn has_metadata(&self) -> bool {
        self.fields
            .iter()
            .any(|f| f.store_location() == StoreLocation::Metadata)
    }

    /// Physical columns in the order records are read and written
    pub fn columns(&self) -> Vec<(String, ColumnType)> {
        let mut columns: Vec<(String, ColumnType)> =
            self.fields.iter().flat_map(FieldDefinition::columns).collect();
        if self.has_metadata() {
            columns.push((METADATA_COLUMN.to_string(), ColumnType::Text));
        }
        columns
    }

    pub fn column_types(&self) -> Vec<ColumnType> {
        self.columns().into_iter().map(|(_, t)| t).collect()
    }

    pub fn select_list(&self) -> String {
        self.columns()
            .into_iter()
            .map(|(name, _)| name)
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn create_table_sql(&self) -> String {
        let columns: Vec<String> = self
            .columns()
            .into_iter()
            .map(|(name, column_type)| {
                if name == self.primary_key {
                    format!("{} {} PRIMARY KEY", name, column_type.sql_type())
                } else {
                    format!("{} {}", name, column_type.sql_type())
                }
            })
            .collect();
        format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            self.table,
            columns.join(", ")
        )
    }

    /// Build a record from raw column values ordered as [`Self::columns`]
    pub fn hydrate(self: &Arc<Self>, row: Vec<Value>) -> Record {
        let mut raw = row.into_iter();
        let mut values = BTreeMap::new();

        for field in &self.fields {
            match (&field.storage, field.store_location()) {
                (_, StoreLocation::Database) => {
                    let value = field.decode_column(raw.next().unwrap_or_default());
                    values.insert(field.name.clone(), value);
                }
                (Storage::SubFields(subs), StoreLocation::SubFields) => {
                    let map = subs
                        .iter()
                        .map(|sub| (sub.clone(), field.decode_column(raw.next().unwrap_or_default())))
                        .collect();
                    values.insert(field.name.clone(), Value::Map(map));
                }
                _ => {}
            }
        }

        if self.has_metadata() {
            let blob = match raw.next() {
                Some(Value::Text(json)) => serde_json::from_str(&json).unwrap_or_else(|e| {
                    tracing::warn!(class = %self.name, error = %e, "Unreadable metadata column");
                    serde_json::Value::Null
                }),
                _ => serde_json::Value::Null,
            };
            for field in self
                .fields
                .iter()
                .filter(|f| f.store_location() == StoreLocation::Metadata)
            {
                let json = blob.get(&field.name).unwrap_or(&serde_json::Value::Null);
                values.insert(field.name.clone(), field.decode_metadata(json));
            }
        }

        Record::loaded(self, values)
    }

    pub fn insert_sql(&self, record: &Record) -> String {
        let mut literals = Vec::new();
        let mut metadata = serde_json::Map::new();

        for field in &self.fields {
            let value = record.stored(&field.name);
            match (&field.storage, field.store_location()) {
                (_, StoreLocation::Database) => literals.push(field.storage_literal(&value)),
                (Storage::SubFields(subs), StoreLocation::SubFields) => {
                    for sub in subs {
                        let sub_value = match value.as_ref() {
                            Value::Map(map) => map.get(sub).cloned().unwrap_or_default(),
                            _ => Value::Null,
                        };
                        literals.push(field.storage_literal(&sub_value));
                    }
                }
                (_, StoreLocation::Metadata) => {
                    metadata.insert(field.name.clone(), field.storage_json(&value));
                }
                _ => {}
            }
        }
        if self.has_metadata() {
            literals.push(crate::utils::sql::quote_literal(
                &serde_json::Value::Object(metadata).to_string(),
            ));
        }

        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.table,
            self.select_list(),
            literals.join(", ")
        )
    }

    pub fn delete_sql(&self, ids: &[i64]) -> Option<String> {
        if ids.is_empty() {
            return None;
        }
        let ids: Vec<String> = ids.iter().map(i64::to_string).collect();
        Some(format!(
            "DELETE FROM {} WHERE {} IN ({})",
            self.table,
            self.primary_key,
            ids.join(", ")
        ))
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl fmt::Debug for RecordClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordClass")
            .field("name", &self.name)
            .field("table", &self.table)
            .field("primary_key", &self.primary_key)
            .field("fields", &self.fields)
            .field("access_policy", &self.access.is_some())
            .finish()
    }
}
