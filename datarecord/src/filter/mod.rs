//! Filter engine
//!
//! - `condition` - Condition trees: SQL compilation, manual matching, validation
//! - `engine` - Filter: condition assembly, settings, SQL generation
//! - `execute` - Execution and the reconciliation loop for post-filtered results
//! - `serialize` - Array/JSON round-trip
//! - `builders` - Condition constructors
//! - `error` - Error type

mod builders;
mod condition;
mod engine;
mod error;
mod execute;
mod serialize;

pub use builders::{
    condition_and, condition_custom, condition_greater, condition_greater_equal,
    condition_in_filter, condition_is_set, condition_lesser, condition_lesser_equal,
    condition_like, condition_match, condition_not, condition_one_of, condition_or,
};
pub use condition::{Condition, FieldCondition, InFilterCondition, MatchContext};
pub use engine::{Filter, SortOrder};
pub use error::FilterError;
pub use serialize::{ConditionDef, FilterDef};
