//! Datastore: class registry plus storage backend

use std::fmt;
use std::sync::Arc;

use super::duckdb::DuckdbBackend;
use super::error::DataError;
use crate::core::constants::DEFAULT_MAX_SCAN_ROWS;
use crate::record::{Collection, ColumnType, Record, RecordClass, Registry, Value};

/// SQL execution backend consumed by the datastore
pub trait StorageBackend: Send + Sync {
    fn backend_name(&self) -> &'static str;

    /// Run a SELECT and read each row as raw values of the given column types
    fn fetch_rows(&self, sql: &str, columns: &[ColumnType]) -> Result<Vec<Vec<Value>>, DataError>;

    /// Run a single-value COUNT query
    fn query_count(&self, sql: &str) -> Result<usize, DataError>;

    /// Run a statement and return the number of affected rows
    fn execute(&self, sql: &str) -> Result<usize, DataError>;

    fn execute_batch(&self, sql: &str) -> Result<(), DataError>;
}

/// Settings applied to every filter created against a datastore
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreSettings {
    /// Cap on rows fetched by one reconciliation run (`None` = unbounded)
    pub max_scan_rows: Option<usize>,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            max_scan_rows: Some(DEFAULT_MAX_SCAN_ROWS),
        }
    }
}

/// Record classes plus the backend that stores them
pub struct Datastore {
    registry: Registry,
    backend: Box<dyn StorageBackend>,
    settings: StoreSettings,
}

impl Datastore {
    pub fn new(backend: impl StorageBackend + 'static) -> Self {
        Self {
            registry: Registry::default(),
            backend: Box::new(backend),
            settings: StoreSettings::default(),
        }
    }

    /// Datastore over a private in-memory DuckDB database
    pub fn in_memory() -> Result<Self, DataError> {
        Ok(Self::new(DuckdbBackend::open_in_memory()?))
    }

    pub fn with_settings(mut self, settings: StoreSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> StoreSettings {
        self.settings
    }

    pub fn register(&mut self, class: RecordClass) -> Result<Arc<RecordClass>, DataError> {
        self.registry.register(class)
    }

    /// Register a class and create its table
    pub fn register_and_create(&mut self, class: RecordClass) -> Result<Arc<RecordClass>, DataError> {
        let class = self.register(class)?;
        self.backend.execute_batch(&class.create_table_sql())?;
        Ok(class)
    }

    pub fn class(&self, name: &str) -> Option<Arc<RecordClass>> {
        self.registry.get(name)
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Create tables for every registered class
    pub fn create_tables(&self) -> Result<(), DataError> {
        self.registry.check_references()?;
        for class in self.registry.classes() {
            self.backend.execute_batch(&class.create_table_sql())?;
            tracing::debug!(class = %class.name, table = %class.table, "Table ready");
        }
        Ok(())
    }

    /// Execute a SELECT over the class's columns and hydrate the rows
    pub fn query(&self, class: &Arc<RecordClass>, sql: &str) -> Result<Collection, DataError> {
        tracing::trace!(class = %class.name, sql = %sql, "Query");
        let rows = self.backend.fetch_rows(sql, &class.column_types())?;
        Ok(rows.into_iter().map(|row| class.hydrate(row)).collect())
    }

    pub fn count(&self, sql: &str) -> Result<usize, DataError> {
        tracing::trace!(sql = %sql, "Count");
        self.backend.query_count(sql)
    }

    /// Insert a record; a missing primary key gets the next free id
    pub fn save(&self, record: &mut Record) -> Result<i64, DataError> {
        let class = Arc::clone(record.class());
        let id = match record.id() {
            Some(id) => id,
            None => {
                let next = self.count(&format!(
                    "SELECT COALESCE(MAX({}), 0) + 1 FROM {}",
                    class.primary_key(),
                    class.table
                ))?;
                let next = i64::try_from(next)
                    .map_err(|_| DataError::Schema(format!("Key space exhausted for {}", class.name)))?;
                record.set(class.primary_key(), next);
                next
            }
        };
        self.backend.execute(&class.insert_sql(record))?;
        record.mark_saved();
        Ok(id)
    }

    pub fn delete(&self, class: &Arc<RecordClass>, ids: &[i64]) -> Result<usize, DataError> {
        let Some(sql) = class.delete_sql(ids) else {
            return Ok(0);
        };
        let deleted = self.backend.execute(&sql)?;
        tracing::debug!(class = %class.name, deleted, "Deleted records");
        Ok(deleted)
    }
}

impl fmt::Debug for Datastore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Datastore")
            .field("backend", &self.backend.backend_name())
            .field("registry", &self.registry)
            .field("settings", &self.settings)
            .finish()
    }
}
