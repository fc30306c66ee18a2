//! Convenience constructors for condition trees
//!
//! Operands accept anything convertible to [`Value`]; passing a `&Record`
//! compares against its primary key.

use super::condition::{Condition, FieldCondition, InFilterCondition};
use super::engine::Filter;
use crate::record::{Comparison, Predicate, Value};

fn field(predicate: Predicate, fieldname: &str, value: Value) -> Condition {
    Condition::Field(FieldCondition::new(predicate, fieldname, value))
}

pub fn condition_match(fieldname: &str, value: impl Into<Value>) -> Condition {
    field(Predicate::Match, fieldname, value.into())
}

/// Case-insensitive substring match
pub fn condition_like(fieldname: &str, value: impl Into<Value>) -> Condition {
    field(Predicate::Like, fieldname, value.into())
}

/// Membership in a list of values; an empty list matches nothing
pub fn condition_one_of<T: Into<Value>>(fieldname: &str, values: Vec<T>) -> Condition {
    field(Predicate::OneOf, fieldname, Value::from(values))
}

pub fn condition_greater(fieldname: &str, value: impl Into<Value>) -> Condition {
    field(Predicate::Compare(Comparison::Greater), fieldname, value.into())
}

pub fn condition_greater_equal(fieldname: &str, value: impl Into<Value>) -> Condition {
    field(Predicate::Compare(Comparison::GreaterEqual), fieldname, value.into())
}

pub fn condition_lesser(fieldname: &str, value: impl Into<Value>) -> Condition {
    field(Predicate::Compare(Comparison::Lesser), fieldname, value.into())
}

pub fn condition_lesser_equal(fieldname: &str, value: impl Into<Value>) -> Condition {
    field(Predicate::Compare(Comparison::LesserEqual), fieldname, value.into())
}

pub fn condition_is_set(fieldname: &str) -> Condition {
    field(Predicate::IsSet, fieldname, Value::Null)
}

/// `fieldname` must reference the sub-filter's class, or be the primary key
/// of the filtered class when the sub-filter's class references it back
pub fn condition_in_filter(fieldname: &str, filter: Filter) -> Condition {
    Condition::InFilter(InFilterCondition::new(fieldname, filter))
}

/// Named predicate registered on the field
pub fn condition_custom(fieldname: &str, predicate: &str, value: impl Into<Value>) -> Condition {
    field(Predicate::Custom(predicate.to_string()), fieldname, value.into())
}

pub fn condition_and(a: Condition, b: Condition) -> Condition {
    Condition::And(Box::new(a), Box::new(b))
}

pub fn condition_or(a: Condition, b: Condition) -> Condition {
    Condition::Or(Box::new(a), Box::new(b))
}

pub fn condition_not(condition: Condition) -> Condition {
    Condition::Not(Box::new(condition))
}
