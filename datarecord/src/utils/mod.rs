//! Shared helpers

pub mod sql;
