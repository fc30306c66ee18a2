//! Data storage layer
//!
//! - `store` - Datastore (class registry + backend) and the backend trait
//! - `duckdb` - Embedded DuckDB backend
//! - `error` - Error type for the storage layer

pub mod duckdb;
pub mod error;
pub mod store;

pub use self::duckdb::DuckdbBackend;
pub use error::DataError;
pub use store::{Datastore, StorageBackend, StoreSettings};
