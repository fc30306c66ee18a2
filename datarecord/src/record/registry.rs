//! Registry of record classes by name

use std::sync::Arc;

use rustc_hash::FxHashMap;

use super::class::RecordClass;
use crate::data::DataError;

#[derive(Debug, Default)]
pub struct Registry {
    classes: FxHashMap<String, Arc<RecordClass>>,
}

impl Registry {
    /// Normalize and register a class; names must be unique
    pub fn register(&mut self, mut class: RecordClass) -> Result<Arc<RecordClass>, DataError> {
        class.normalize()?;
        if self.classes.contains_key(&class.name) {
            return Err(DataError::Schema(format!(
                "Class '{}' is already registered",
                class.name
            )));
        }
        tracing::debug!(class = %class.name, table = %class.table, fields = class.fields().len(), "Registered record class");
        let class = Arc::new(class);
        self.classes.insert(class.name.clone(), Arc::clone(&class));
        Ok(class)
    }

    pub fn get(&self, name: &str) -> Option<Arc<RecordClass>> {
        self.classes.get(name).cloned()
    }

    /// All classes sorted by name
    pub fn classes(&self) -> Vec<Arc<RecordClass>> {
        let mut classes: Vec<_> = self.classes.values().cloned().collect();
        classes.sort_by(|a, b| a.name.cmp(&b.name));
        classes
    }

    /// Check that every reference field points at a registered class
    pub fn check_references(&self) -> Result<(), DataError> {
        for class in self.classes.values() {
            for field in class.fields() {
                if let Some(foreign) = field.field_type.foreign_class()
                    && !self.classes.contains_key(foreign)
                {
                    return Err(DataError::Schema(format!(
                        "Field '{}.{}' references unknown class '{}'",
                        class.name, field.name, foreign
                    )));
                }
            }
        }
        Ok(())
    }
}
