//! Array/JSON round-trip for conditions and filters
//!
//! Conditions are tagged by a `type` discriminator. Composite nodes carry
//! `condition1`/`condition2` (`condition` for NOT); InFilter nests a complete
//! filter definition.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::condition::{Condition, FieldCondition, InFilterCondition};
use super::engine::{Filter, SortOrder};
use super::error::FilterError;
use crate::core::constants::MAX_FILTER_JSON_SIZE;
use crate::data::Datastore;
use crate::record::{Comparison, Predicate, Value};

/// Serialized condition node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ConditionDef {
    #[serde(rename = "AND")]
    And {
        condition1: Box<ConditionDef>,
        condition2: Box<ConditionDef>,
    },
    #[serde(rename = "OR")]
    Or {
        condition1: Box<ConditionDef>,
        condition2: Box<ConditionDef>,
    },
    #[serde(rename = "NOT")]
    Not { condition: Box<ConditionDef> },
    Match {
        fieldname: String,
        #[serde(default)]
        value: serde_json::Value,
    },
    Like {
        fieldname: String,
        #[serde(default)]
        value: serde_json::Value,
    },
    Greater {
        fieldname: String,
        #[serde(default)]
        value: serde_json::Value,
    },
    GreaterEqual {
        fieldname: String,
        #[serde(default)]
        value: serde_json::Value,
    },
    Lesser {
        fieldname: String,
        #[serde(default)]
        value: serde_json::Value,
    },
    LesserEqual {
        fieldname: String,
        #[serde(default)]
        value: serde_json::Value,
    },
    OneOf {
        fieldname: String,
        #[serde(default)]
        value: serde_json::Value,
    },
    IsSet {
        fieldname: String,
    },
    InFilter {
        fieldname: String,
        filter: Box<FilterDef>,
    },
    Custom {
        fieldname: String,
        predicate: String,
        #[serde(default)]
        value: serde_json::Value,
    },
}

/// Serialized filter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterDef {
    pub base_class: String,
    #[serde(default)]
    pub base_condition: Option<ConditionDef>,
    #[serde(default)]
    pub limit_results: Option<usize>,
    #[serde(default)]
    pub start_at_result: usize,
    #[serde(default)]
    pub sort: Option<SortOrder>,
    #[serde(default)]
    pub perform_access_check: bool,
}

fn leaf_def(leaf: &FieldCondition) -> ConditionDef {
    let fieldname = leaf.fieldname().to_string();
    let value = leaf.value().to_json();
    match leaf.predicate() {
        Predicate::Match => ConditionDef::Match { fieldname, value },
        Predicate::Like => ConditionDef::Like { fieldname, value },
        Predicate::Compare(Comparison::Greater) => ConditionDef::Greater { fieldname, value },
        Predicate::Compare(Comparison::GreaterEqual) => {
            ConditionDef::GreaterEqual { fieldname, value }
        }
        Predicate::Compare(Comparison::Lesser) => ConditionDef::Lesser { fieldname, value },
        Predicate::Compare(Comparison::LesserEqual) => {
            ConditionDef::LesserEqual { fieldname, value }
        }
        Predicate::OneOf => ConditionDef::OneOf { fieldname, value },
        Predicate::IsSet => ConditionDef::IsSet { fieldname },
        Predicate::Custom(name) => ConditionDef::Custom {
            fieldname,
            predicate: name.clone(),
            value,
        },
    }
}

fn leaf(predicate: Predicate, fieldname: String, value: &serde_json::Value) -> Condition {
    Condition::Field(FieldCondition::new(predicate, fieldname, Value::from_json(value)))
}

fn check_size(json: &str) -> Result<(), FilterError> {
    if json.len() > MAX_FILTER_JSON_SIZE {
        return Err(FilterError::TooLarge {
            max: MAX_FILTER_JSON_SIZE,
        });
    }
    Ok(())
}

impl Condition {
    pub fn to_def(&self) -> ConditionDef {
        match self {
            Self::Field(leaf) => leaf_def(leaf),
            Self::InFilter(leaf) => ConditionDef::InFilter {
                fieldname: leaf.fieldname().to_string(),
                filter: Box::new(leaf.filter().to_def()),
            },
            Self::And(a, b) => ConditionDef::And {
                condition1: Box::new(a.to_def()),
                condition2: Box::new(b.to_def()),
            },
            Self::Or(a, b) => ConditionDef::Or {
                condition1: Box::new(a.to_def()),
                condition2: Box::new(b.to_def()),
            },
            Self::Not(inner) => ConditionDef::Not {
                condition: Box::new(inner.to_def()),
            },
        }
    }

    /// Build an unattached condition tree. InFilter sub-filters are resolved
    /// against `store`.
    pub fn from_def(store: &Arc<Datastore>, def: ConditionDef) -> Result<Self, FilterError> {
        Ok(match def {
            ConditionDef::And {
                condition1,
                condition2,
            } => Self::And(
                Box::new(Self::from_def(store, *condition1)?),
                Box::new(Self::from_def(store, *condition2)?),
            ),
            ConditionDef::Or {
                condition1,
                condition2,
            } => Self::Or(
                Box::new(Self::from_def(store, *condition1)?),
                Box::new(Self::from_def(store, *condition2)?),
            ),
            ConditionDef::Not { condition } => {
                Self::Not(Box::new(Self::from_def(store, *condition)?))
            }
            ConditionDef::Match { fieldname, value } => leaf(Predicate::Match, fieldname, &value),
            ConditionDef::Like { fieldname, value } => leaf(Predicate::Like, fieldname, &value),
            ConditionDef::Greater { fieldname, value } => {
                leaf(Predicate::Compare(Comparison::Greater), fieldname, &value)
            }
            ConditionDef::GreaterEqual { fieldname, value } => {
                leaf(Predicate::Compare(Comparison::GreaterEqual), fieldname, &value)
            }
            ConditionDef::Lesser { fieldname, value } => {
                leaf(Predicate::Compare(Comparison::Lesser), fieldname, &value)
            }
            ConditionDef::LesserEqual { fieldname, value } => {
                leaf(Predicate::Compare(Comparison::LesserEqual), fieldname, &value)
            }
            ConditionDef::OneOf { fieldname, value } => leaf(Predicate::OneOf, fieldname, &value),
            ConditionDef::IsSet { fieldname } => {
                leaf(Predicate::IsSet, fieldname, &serde_json::Value::Null)
            }
            ConditionDef::Custom {
                fieldname,
                predicate,
                value,
            } => leaf(Predicate::Custom(predicate), fieldname, &value),
            ConditionDef::InFilter { fieldname, filter } => Self::InFilter(
                InFilterCondition::new(fieldname, Filter::from_def(store, *filter)?),
            ),
        })
    }

    pub fn get_as_array(&self) -> serde_json::Value {
        // plain data with string keys always serializes
        serde_json::to_value(self.to_def()).unwrap_or_default()
    }

    pub fn get_as_json(&self) -> String {
        self.get_as_array().to_string()
    }

    pub fn from_array(store: &Arc<Datastore>, array: &serde_json::Value) -> Result<Self, FilterError> {
        Self::from_def(store, ConditionDef::deserialize(array)?)
    }

    pub fn from_json(store: &Arc<Datastore>, json: &str) -> Result<Self, FilterError> {
        check_size(json)?;
        Self::from_def(store, serde_json::from_str(json)?)
    }
}

impl Filter {
    pub fn to_def(&self) -> FilterDef {
        FilterDef {
            base_class: self.class().name.clone(),
            base_condition: self.base_condition().map(Condition::to_def),
            limit_results: self.result_limit(),
            start_at_result: self.result_start(),
            sort: self.sort().cloned(),
            perform_access_check: self.performs_access_check(),
        }
    }

    pub fn from_def(store: &Arc<Datastore>, def: FilterDef) -> Result<Self, FilterError> {
        let mut filter = Filter::new(store, &def.base_class)?;
        if let Some(condition) = def.base_condition {
            filter.add_condition(Condition::from_def(store, condition)?);
        }
        filter
            .set_result_limit(def.limit_results.unwrap_or(0))
            .set_result_start(def.start_at_result)
            .set_perform_access_check(def.perform_access_check);
        if let Some(sort) = def.sort {
            filter.set_order_column(&sort.field, sort.ascending);
        }
        Ok(filter)
    }

    pub fn get_as_array(&self) -> serde_json::Value {
        serde_json::to_value(self.to_def()).unwrap_or_default()
    }

    pub fn get_as_json(&self) -> String {
        self.get_as_array().to_string()
    }

    pub fn from_array(store: &Arc<Datastore>, array: &serde_json::Value) -> Result<Self, FilterError> {
        Self::from_def(store, FilterDef::deserialize(array)?)
    }

    pub fn from_json(store: &Arc<Datastore>, json: &str) -> Result<Self, FilterError> {
        check_size(json)?;
        Self::from_def(store, serde_json::from_str(json)?)
    }
}
