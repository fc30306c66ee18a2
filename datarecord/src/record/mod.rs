//! Datarecord model
//!
//! - `value` - Field values and their JSON form
//! - `field` - Field descriptors: storage, coercion, SQL compilers, matchers
//! - `class` - Record classes (schema for one table)
//! - `instance` - Record instances
//! - `collection` - Ordered query results
//! - `registry` - Class lookup by name

mod class;
mod collection;
mod field;
mod instance;
mod registry;
mod value;

pub use class::{AccessPolicy, RecordClass};
pub use collection::Collection;
pub use field::{
    ColumnType, Comparison, ComputeFn, CustomMatchFn, CustomPredicate, CustomSqlFn,
    FieldDefinition, FieldType, Predicate, Storage, StoreLocation,
};
pub use instance::Record;
pub use registry::Registry;
pub use value::{DATETIME_FORMAT, Value, parse_datetime};
