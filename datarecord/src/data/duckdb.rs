//! DuckDB storage backend
//!
//! Uses a single shared connection protected by a mutex. All calls are
//! synchronous and block the caller for the duration of the statement.

use std::path::Path;

use duckdb::Connection;
use parking_lot::Mutex;

use super::error::DataError;
use super::store::StorageBackend;
use crate::record::{ColumnType, Value};

pub struct DuckdbBackend {
    conn: Mutex<Option<Connection>>,
}

impl Drop for DuckdbBackend {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.get_mut().take() {
            // Best-effort close - log but don't panic on error
            if let Err((_, e)) = conn.close() {
                tracing::warn!("DuckDB connection close failed during drop: {}", e);
            }
        }
    }
}

impl DuckdbBackend {
    /// Open (or create) a database file
    pub fn open(path: &Path) -> Result<Self, DataError> {
        let conn = Connection::open(path)?;
        tracing::debug!(path = %path.display(), "DuckDB backend opened");
        Ok(Self {
            conn: Mutex::new(Some(conn)),
        })
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self, DataError> {
        let conn = Connection::open_in_memory()?;
        tracing::debug!("DuckDB in-memory backend opened");
        Ok(Self {
            conn: Mutex::new(Some(conn)),
        })
    }

    fn with_conn<T, F>(&self, f: F) -> Result<T, DataError>
    where
        F: FnOnce(&Connection) -> Result<T, duckdb::Error>,
    {
        let guard = self.conn.lock();
        let conn = guard.as_ref().ok_or(DataError::ConnectionClosed)?;
        f(conn).map_err(DataError::from)
    }

    /// Close the connection; later calls fail with `ConnectionClosed`
    pub fn close(&self) -> Result<(), DataError> {
        if let Some(conn) = self.conn.lock().take() {
            conn.close().map_err(|(_, e)| DataError::Duckdb(e))?;
            tracing::debug!("DuckDB connection closed");
        }
        Ok(())
    }
}

fn read_column(row: &duckdb::Row<'_>, index: usize, column_type: ColumnType) -> duckdb::Result<Value> {
    let value = match column_type {
        ColumnType::Text => row.get::<_, Option<String>>(index)?.map(Value::Text),
        ColumnType::BigInt => row.get::<_, Option<i64>>(index)?.map(Value::Int),
        ColumnType::Double => row.get::<_, Option<f64>>(index)?.map(Value::Float),
        ColumnType::Boolean => row.get::<_, Option<bool>>(index)?.map(Value::Bool),
    };
    Ok(value.unwrap_or(Value::Null))
}

impl StorageBackend for DuckdbBackend {
    fn backend_name(&self) -> &'static str {
        "duckdb"
    }

    fn fetch_rows(&self, sql: &str, columns: &[ColumnType]) -> Result<Vec<Vec<Value>>, DataError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(sql)?;
            let rows = stmt.query_map([], |row| {
                columns
                    .iter()
                    .enumerate()
                    .map(|(index, column_type)| read_column(row, index, *column_type))
                    .collect::<duckdb::Result<Vec<Value>>>()
            })?;
            rows.collect()
        })
    }

    fn query_count(&self, sql: &str) -> Result<usize, DataError> {
        let count: i64 = self.with_conn(|conn| conn.query_row(sql, [], |row| row.get(0)))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    fn execute(&self, sql: &str) -> Result<usize, DataError> {
        self.with_conn(|conn| conn.execute(sql, []))
    }

    fn execute_batch(&self, sql: &str) -> Result<(), DataError> {
        self.with_conn(|conn| conn.execute_batch(sql))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_rows_reads_typed_columns() {
        let backend = DuckdbBackend::open_in_memory().unwrap();
        backend
            .execute_batch(
                "CREATE TABLE t (a BIGINT, b VARCHAR, c DOUBLE, d BOOLEAN);
                 INSERT INTO t VALUES (1, 'x', 1.5, TRUE), (NULL, NULL, NULL, NULL);",
            )
            .unwrap();
        let rows = backend
            .fetch_rows(
                "SELECT a, b, c, d FROM t ORDER BY a NULLS LAST",
                &[
                    ColumnType::BigInt,
                    ColumnType::Text,
                    ColumnType::Double,
                    ColumnType::Boolean,
                ],
            )
            .unwrap();
        assert_eq!(
            rows,
            vec![
                vec![Value::Int(1), Value::from("x"), Value::Float(1.5), Value::Bool(true)],
                vec![Value::Null, Value::Null, Value::Null, Value::Null],
            ]
        );
        assert_eq!(backend.query_count("SELECT COUNT(*) FROM t").unwrap(), 2);
    }

    #[test]
    fn closed_connection_is_an_error() {
        let backend = DuckdbBackend::open_in_memory().unwrap();
        backend.close().unwrap();
        assert!(matches!(
            backend.execute("SELECT 1"),
            Err(DataError::ConnectionClosed)
        ));
    }

    #[test]
    fn malformed_sql_propagates() {
        let backend = DuckdbBackend::open_in_memory().unwrap();
        assert!(matches!(
            backend.fetch_rows("SELEKT nothing", &[]),
            Err(DataError::Duckdb(_))
        ));
    }
}
