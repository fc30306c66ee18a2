//! Condition trees
//!
//! Leaves test one field of the filtered class; composites combine children.
//! A condition is attached to the class of the filter that owns it. Attaching
//! resolves the field descriptor and decides, per node, whether SQL can
//! express it. Nodes that SQL cannot express compile to `TRUE` and are
//! re-checked in memory after the fetch.

use std::collections::hash_map::Entry;

use rustc_hash::{FxHashMap, FxHashSet};

use super::engine::Filter;
use super::error::FilterError;
use crate::core::constants::MAX_SUBFILTER_DEPTH;
use crate::record::{FieldDefinition, FieldType, Predicate, Record, RecordClass, Value};

#[derive(Debug, Clone)]
pub enum Condition {
    Field(FieldCondition),
    InFilter(InFilterCondition),
    And(Box<Condition>, Box<Condition>),
    Or(Box<Condition>, Box<Condition>),
    Not(Box<Condition>),
}

/// Per-execution state shared by all nodes of one evaluation
#[derive(Debug, Default)]
pub struct MatchContext {
    /// Key sets produced by InFilter sub-filters, by node address
    keys: FxHashMap<usize, FxHashSet<i64>>,
    /// Set when a sub-filter hit its scan limit and its key set is partial
    truncated: bool,
}

impl MatchContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when some InFilter matched against a truncated sub-filter result
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }
}

impl Condition {
    /// Bind this tree to `class`. Attaching again to the same class is a no-op.
    pub fn attach(&mut self, class: &RecordClass) {
        match self {
            Self::Field(leaf) => leaf.attach(class),
            Self::InFilter(leaf) => leaf.attach(class),
            Self::And(a, b) | Self::Or(a, b) => {
                a.attach(class);
                b.attach(class);
            }
            Self::Not(inner) => inner.attach(class),
        }
    }

    /// True when this node or a descendant must be evaluated in memory
    pub fn no_sql(&self) -> bool {
        match self {
            Self::Field(leaf) => leaf.no_sql(),
            Self::InFilter(leaf) => leaf.no_sql(),
            Self::And(a, b) | Self::Or(a, b) => a.no_sql() || b.no_sql(),
            Self::Not(inner) => inner.no_sql(),
        }
    }

    /// Boolean SQL expression for this node.
    ///
    /// Manual nodes compile to `TRUE` so the query over-selects. A NOT over a
    /// manual child is manual itself, since `NOT (TRUE)` would drop every row.
    pub fn to_sql_fragment(&self) -> String {
        match self {
            Self::Field(leaf) => leaf.to_sql_fragment(),
            Self::InFilter(leaf) => leaf.to_sql_fragment(),
            Self::And(a, b) => format!("({} AND {})", a.to_sql_fragment(), b.to_sql_fragment()),
            Self::Or(a, b) => format!("({} OR {})", a.to_sql_fragment(), b.to_sql_fragment()),
            Self::Not(inner) if inner.no_sql() => "TRUE".to_string(),
            // NULL counts as false so SQL agrees with manual matching
            Self::Not(inner) => format!("NOT COALESCE({}, FALSE)", inner.to_sql_fragment()),
        }
    }

    /// Evaluate against a loaded record.
    ///
    /// With `is_prefiltered`, nodes that SQL already enforced report `true`
    /// without looking at the record. OR and NOT only trust SQL as a whole:
    /// their children are evaluated in full once the node itself is manual.
    pub fn matches(
        &self,
        record: &Record,
        is_prefiltered: bool,
        ctx: &mut MatchContext,
    ) -> Result<bool, FilterError> {
        if is_prefiltered && !self.no_sql() {
            return Ok(true);
        }
        match self {
            Self::Field(leaf) => Ok(leaf.matches(record)),
            Self::InFilter(leaf) => leaf.matches(record, ctx),
            Self::And(a, b) => {
                Ok(a.matches(record, is_prefiltered, ctx)? && b.matches(record, is_prefiltered, ctx)?)
            }
            Self::Or(a, b) => Ok(a.matches(record, false, ctx)? || b.matches(record, false, ctx)?),
            Self::Not(inner) => Ok(!inner.matches(record, false, ctx)?),
        }
    }

    /// All problems in this tree, or `Ok` when it can be executed
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();
        self.collect_errors(0, &mut errors);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub(crate) fn collect_errors(&self, depth: usize, errors: &mut Vec<String>) {
        match self {
            Self::Field(leaf) => leaf.collect_errors(errors),
            Self::InFilter(leaf) => leaf.collect_errors(depth, errors),
            Self::And(a, b) | Self::Or(a, b) => {
                a.collect_errors(depth, errors);
                b.collect_errors(depth, errors);
            }
            Self::Not(inner) => inner.collect_errors(depth, errors),
        }
    }
}

// -----------------------------------------------------------------------------
// Field predicates
// -----------------------------------------------------------------------------

/// Resolution recorded when a leaf is attached to a class
#[derive(Debug, Clone)]
struct FieldBinding {
    class: String,
    field: Option<FieldDefinition>,
    no_sql: bool,
}

/// Single-field predicate: Match, Like, comparisons, OneOf, IsSet, Custom
#[derive(Debug, Clone)]
pub struct FieldCondition {
    predicate: Predicate,
    fieldname: String,
    value: Value,
    binding: Option<FieldBinding>,
}

impl FieldCondition {
    pub fn new(predicate: Predicate, fieldname: impl Into<String>, value: Value) -> Self {
        Self {
            predicate,
            fieldname: fieldname.into(),
            value,
            binding: None,
        }
    }

    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    pub fn fieldname(&self) -> &str {
        &self.fieldname
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Field descriptor resolved at attach time
    pub fn field(&self) -> Option<&FieldDefinition> {
        self.binding.as_ref()?.field.as_ref()
    }

    fn attach(&mut self, class: &RecordClass) {
        if self.binding.as_ref().is_some_and(|b| b.class == class.name) {
            return;
        }
        let field = class.field_definition(&self.fieldname).cloned();
        let no_sql = field
            .as_ref()
            .is_some_and(|f| f.predicate_sql(&self.predicate, &self.value).is_none());
        if no_sql {
            tracing::trace!(
                class = %class.name,
                field = %self.fieldname,
                predicate = self.predicate.name(),
                "Condition needs manual matching"
            );
        }
        self.binding = Some(FieldBinding {
            class: class.name.clone(),
            field,
            no_sql,
        });
    }

    fn no_sql(&self) -> bool {
        self.binding.as_ref().is_some_and(|b| b.no_sql)
    }

    fn to_sql_fragment(&self) -> String {
        match &self.binding {
            Some(binding) if binding.no_sql => "TRUE".to_string(),
            Some(FieldBinding {
                field: Some(field), ..
            }) => field
                .predicate_sql(&self.predicate, &self.value)
                .unwrap_or_else(|| "TRUE".to_string()),
            // unattached or unknown field
            _ => "FALSE".to_string(),
        }
    }

    fn matches(&self, record: &Record) -> bool {
        let Some(field) = self.field() else {
            return false;
        };
        field.predicate_matches(&self.predicate, &field.value_of(record), &self.value)
    }

    fn collect_errors(&self, errors: &mut Vec<String>) {
        let Some(binding) = &self.binding else {
            errors.push(format!(
                "Condition on '{}' is not attached to a filter",
                self.fieldname
            ));
            return;
        };
        let Some(field) = &binding.field else {
            errors.push(format!(
                "Unknown field '{}' in class '{}'",
                self.fieldname, binding.class
            ));
            return;
        };
        match &self.predicate {
            Predicate::Custom(name) if field.custom_predicate(name).is_none() => {
                errors.push(format!(
                    "Field '{}' has no custom predicate '{}'",
                    field.name, name
                ));
            }
            predicate if !field.supports(predicate) => {
                errors.push(format!(
                    "{} is not supported on {} field '{}'",
                    predicate.name(),
                    field.field_type,
                    field.name
                ));
            }
            Predicate::OneOf if self.value.as_list().is_none() => {
                errors.push(format!("OneOf on '{}' expects a list of values", field.name));
            }
            _ => {}
        }
    }
}

// -----------------------------------------------------------------------------
// InFilter
// -----------------------------------------------------------------------------

/// How an InFilter connects the filtered class to the sub-filter's class
#[derive(Debug, Clone)]
struct InFilterTarget {
    /// Field of the filtered class holding the compared key
    field: FieldDefinition,
    /// Column of the sub-filter class selected as the key set
    sub_column: String,
    multi: bool,
}

#[derive(Debug, Clone)]
struct InFilterBinding {
    class: String,
    target: Result<InFilterTarget, String>,
    no_sql: bool,
}

/// Membership of a reference in the result of another filter
#[derive(Debug, Clone)]
pub struct InFilterCondition {
    fieldname: String,
    filter: Box<Filter>,
    binding: Option<InFilterBinding>,
}

impl InFilterCondition {
    pub fn new(fieldname: impl Into<String>, filter: Filter) -> Self {
        Self {
            fieldname: fieldname.into(),
            filter: Box::new(filter),
            binding: None,
        }
    }

    pub fn fieldname(&self) -> &str {
        &self.fieldname
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    fn attach(&mut self, class: &RecordClass) {
        if self.binding.as_ref().is_some_and(|b| b.class == class.name) {
            return;
        }
        let target = resolve_target(class, &self.fieldname, self.filter.class());
        let no_sql = match &target {
            Ok(target) => {
                target.multi
                    || target.field.column().is_none()
                    || self.filter.needs_post_filtering()
            }
            Err(_) => false,
        };
        self.binding = Some(InFilterBinding {
            class: class.name.clone(),
            target,
            no_sql,
        });
    }

    fn no_sql(&self) -> bool {
        self.binding.as_ref().is_some_and(|b| b.no_sql)
    }

    fn to_sql_fragment(&self) -> String {
        match &self.binding {
            Some(binding) if binding.no_sql => "TRUE".to_string(),
            Some(InFilterBinding {
                target: Ok(target), ..
            }) => target.field.column().map_or_else(
                || "TRUE".to_string(),
                |column| {
                    format!(
                        "{} IN (SELECT DISTINCT {} FROM {} WHERE {})",
                        column,
                        target.sub_column,
                        self.filter.class().table,
                        self.filter.get_sql_where()
                    )
                },
            ),
            _ => "FALSE".to_string(),
        }
    }

    fn matches(&self, record: &Record, ctx: &mut MatchContext) -> Result<bool, FilterError> {
        let Some(InFilterBinding {
            target: Ok(target), ..
        }) = &self.binding
        else {
            return Ok(false);
        };

        // The sub-filter runs once per evaluation context
        let keys = match ctx.keys.entry(self as *const Self as usize) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let (keys, truncated) = self.filter.reference_keys(&target.sub_column)?;
                ctx.truncated |= truncated;
                entry.insert(keys)
            }
        };

        let value = target.field.value_of(record);
        Ok(if target.multi {
            value.as_list().is_some_and(|ids| {
                ids.iter()
                    .filter_map(Value::as_i64)
                    .any(|id| keys.contains(&id))
            })
        } else {
            value.as_i64().is_some_and(|id| keys.contains(&id))
        })
    }

    fn collect_errors(&self, depth: usize, errors: &mut Vec<String>) {
        let Some(binding) = &self.binding else {
            errors.push(format!(
                "Condition on '{}' is not attached to a filter",
                self.fieldname
            ));
            return;
        };
        if let Err(problem) = &binding.target {
            errors.push(problem.clone());
        }
        if depth >= MAX_SUBFILTER_DEPTH {
            errors.push(format!(
                "InFilter on '{}': sub-filters nested deeper than {} levels",
                self.fieldname, MAX_SUBFILTER_DEPTH
            ));
            return;
        }
        for problem in self.filter.validation_errors(depth + 1) {
            errors.push(format!("InFilter on '{}': {}", self.fieldname, problem));
        }
    }
}

/// Work out which keys an InFilter compares.
///
/// A reference field must point at the sub-filter's class and is compared
/// against its primary keys. The primary key itself is compared against the
/// sub-filter class's reference back to the filtered class.
fn resolve_target(
    class: &RecordClass,
    fieldname: &str,
    sub: &RecordClass,
) -> Result<InFilterTarget, String> {
    let Some(field) = class.field_definition(fieldname) else {
        return Err(format!(
            "Unknown field '{}' in class '{}'",
            fieldname, class.name
        ));
    };

    if fieldname == class.primary_key() {
        return match sub.reference_to(&class.name) {
            Some(back) => Ok(InFilterTarget {
                field: field.clone(),
                sub_column: back.name.clone(),
                multi: false,
            }),
            None => Err(format!(
                "InFilter on '{}': class '{}' has no reference to '{}'",
                fieldname, sub.name, class.name
            )),
        };
    }

    match field.field_type.foreign_class() {
        Some(foreign) if foreign == sub.name => Ok(InFilterTarget {
            field: field.clone(),
            sub_column: sub.primary_key().to_string(),
            multi: matches!(field.field_type, FieldType::ReferenceMulti { .. }),
        }),
        Some(foreign) => Err(format!(
            "InFilter on '{}': field references '{}' but the sub-filter selects '{}'",
            fieldname, foreign, sub.name
        )),
        None => Err(format!(
            "InFilter on '{}': {} field is not a reference",
            fieldname, field.field_type
        )),
    }
}
