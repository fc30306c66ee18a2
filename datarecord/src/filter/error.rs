//! Error type for filter construction and execution

use thiserror::Error;

use crate::data::DataError;

#[derive(Error, Debug)]
pub enum FilterError {
    /// Filter bound to a class name that is not registered
    #[error("Unknown record class: {0}")]
    UnknownClass(String),

    /// Malformed serialized filter or condition, including unknown `type`
    /// discriminators
    #[error("Invalid filter definition: {0}")]
    Decode(String),

    #[error("Filter JSON exceeds maximum size of {max} bytes")]
    TooLarge { max: usize },

    /// Execution refused because validation found problems
    #[error("Invalid filter: {}", .0.join("; "))]
    Invalid(Vec<String>),

    /// Count stopped by the scan limit; raise it for an exact count
    #[error("Scan limit reached after counting {counted} matching records")]
    Truncated { counted: usize },

    #[error(transparent)]
    Data(#[from] DataError),
}

impl From<serde_json::Error> for FilterError {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(e.to_string())
    }
}
