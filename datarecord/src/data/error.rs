//! Error type for the storage layer

use thiserror::Error;

/// Storage layer error
///
/// Transport-level failures are surfaced as-is; the filter engine does not
/// retry them.
#[derive(Error, Debug)]
pub enum DataError {
    /// DuckDB database error
    #[error("DuckDB error: {0}")]
    Duckdb(#[from] duckdb::Error),

    /// Invalid record class or schema definition
    #[error("Schema error: {0}")]
    Schema(String),

    /// Connection was used after `close()`
    #[error("Database connection is closed")]
    ConnectionClosed,
}
