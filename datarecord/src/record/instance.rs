//! Record instances

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::class::RecordClass;
use super::value::Value;

static NULL: Value = Value::Null;

/// A single record of a [`RecordClass`]
#[derive(Clone)]
pub struct Record {
    class: Arc<RecordClass>,
    values: BTreeMap<String, Value>,
    in_database: bool,
}

impl Record {
    /// New, unsaved record with no values
    pub fn new(class: &Arc<RecordClass>) -> Self {
        Self {
            class: Arc::clone(class),
            values: BTreeMap::new(),
            in_database: false,
        }
    }

    /// Present-but-empty sentinel returned when a lookup finds nothing
    pub fn empty(class: &Arc<RecordClass>) -> Self {
        Self::new(class)
    }

    pub(crate) fn loaded(class: &Arc<RecordClass>, values: BTreeMap<String, Value>) -> Self {
        Self {
            class: Arc::clone(class),
            values,
            in_database: true,
        }
    }

    pub fn class(&self) -> &Arc<RecordClass> {
        &self.class
    }

    /// True for records that were never loaded from or saved to storage
    pub fn is_empty(&self) -> bool {
        !self.in_database
    }

    pub(crate) fn mark_saved(&mut self) {
        self.in_database = true;
    }

    /// Builder-style setter
    pub fn with(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: &str, value: impl Into<Value>) {
        self.values.insert(field.to_string(), value.into());
    }

    /// Value of a field, evaluating computed fields
    pub fn get(&self, field: &str) -> Cow<'_, Value> {
        match self.class.field_definition(field) {
            Some(definition) => definition.value_of(self),
            None => self.stored(field),
        }
    }

    /// Stored value of a field, `Null` when absent
    pub fn stored(&self, field: &str) -> Cow<'_, Value> {
        Cow::Borrowed(self.values.get(field).unwrap_or(&NULL))
    }

    /// Primary key value
    pub fn id(&self) -> Option<i64> {
        self.values.get(self.class.primary_key()).and_then(Value::as_i64)
    }

    /// All field values (computed fields included) as a JSON object
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.class
                .fields()
                .iter()
                .map(|field| (field.name.clone(), field.get_json_value(&field.value_of(self))))
                .collect(),
        )
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("class", &self.class.name)
            .field("values", &self.values)
            .field("in_database", &self.in_database)
            .finish()
    }
}

/// A record used as a comparison operand resolves to its primary key
impl From<&Record> for Value {
    fn from(record: &Record) -> Self {
        record.id().map(Value::Int).unwrap_or(Value::Null)
    }
}
