//! Field descriptors
//!
//! A field descriptor knows where a value is stored, how to coerce operands
//! to the field's type, how to compile each predicate kind to SQL, and how to
//! evaluate the same predicate against an in-memory value.
//!
//! SQL compilers return `None` when the predicate cannot be expressed in SQL
//! for this field (non-column storage, computed fields, or an unsupported
//! predicate). Callers fall back to manual matching in that case.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;

use serde::Deserialize;

use super::instance::Record;
use super::value::{DATETIME_FORMAT, Value};
use crate::utils::sql::{contains_literal, quote_literal};

/// Computes the value of a computed field from the rest of the record
pub type ComputeFn = fn(&Record) -> Value;

/// Compiles a custom predicate for a column, `None` if it has no SQL form
pub type CustomSqlFn = fn(column: &str, operand: &Value) -> Option<String>;

/// Evaluates a custom predicate against a stored value
pub type CustomMatchFn = fn(value: &Value, operand: &Value) -> bool;

/// Ordering predicates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Greater,
    GreaterEqual,
    Lesser,
    LesserEqual,
}

impl Comparison {
    pub fn sql_operator(self) -> &'static str {
        match self {
            Self::Greater => ">",
            Self::GreaterEqual => ">=",
            Self::Lesser => "<",
            Self::LesserEqual => "<=",
        }
    }

    /// Whether `value.cmp(operand) == ordering` satisfies this comparison
    pub fn holds(self, ordering: Ordering) -> bool {
        match self {
            Self::Greater => ordering == Ordering::Greater,
            Self::GreaterEqual => ordering != Ordering::Less,
            Self::Lesser => ordering == Ordering::Less,
            Self::LesserEqual => ordering != Ordering::Greater,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Greater => "Greater",
            Self::GreaterEqual => "GreaterEqual",
            Self::Lesser => "Lesser",
            Self::LesserEqual => "LesserEqual",
        }
    }
}

/// Single-field predicate kinds
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    Match,
    Like,
    Compare(Comparison),
    OneOf,
    IsSet,
    Custom(String),
}

impl Predicate {
    pub fn name(&self) -> &str {
        match self {
            Self::Match => "Match",
            Self::Like => "Like",
            Self::Compare(op) => op.name(),
            Self::OneOf => "OneOf",
            Self::IsSet => "IsSet",
            Self::Custom(_) => "Custom",
        }
    }
}

/// Where a field's value physically lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreLocation {
    Database,
    Metadata,
    SubFields,
    None,
}

/// Declared storage of a field
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Storage {
    /// Plain database column named after the field
    #[default]
    Column,
    /// Key inside the record's JSON metadata column
    Metadata,
    /// One column per sub-field, named `<field>_<sub>`
    #[serde(rename = "subfields")]
    SubFields(Vec<String>),
}

/// SQL column types used by the storage backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    BigInt,
    Double,
    Boolean,
}

impl ColumnType {
    pub fn sql_type(self) -> &'static str {
        match self {
            Self::Text => "VARCHAR",
            Self::BigInt => "BIGINT",
            Self::Double => "DOUBLE",
            Self::Boolean => "BOOLEAN",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldType {
    Text,
    Integer,
    Float,
    #[serde(rename = "datetime")]
    DateTime,
    Enumeration {
        options: Vec<String>,
    },
    Boolean,
    Reference {
        foreign_class: String,
    },
    ReferenceMulti {
        foreign_class: String,
    },
    #[serde(skip)]
    Computed {
        compute: ComputeFn,
    },
}

impl FieldType {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::DateTime => "datetime",
            Self::Enumeration { .. } => "enumeration",
            Self::Boolean => "boolean",
            Self::Reference { .. } => "reference",
            Self::ReferenceMulti { .. } => "reference_multi",
            Self::Computed { .. } => "computed",
        }
    }

    fn column_type(&self) -> Option<ColumnType> {
        match self {
            Self::Text | Self::Enumeration { .. } | Self::DateTime | Self::ReferenceMulti { .. } => {
                Some(ColumnType::Text)
            }
            Self::Integer | Self::Reference { .. } => Some(ColumnType::BigInt),
            Self::Float => Some(ColumnType::Double),
            Self::Boolean => Some(ColumnType::Boolean),
            Self::Computed { .. } => None,
        }
    }

    /// Class referenced by a reference field
    pub fn foreign_class(&self) -> Option<&str> {
        match self {
            Self::Reference { foreign_class } | Self::ReferenceMulti { foreign_class } => {
                Some(foreign_class)
            }
            _ => None,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A named predicate registered on a field for `Custom` conditions
#[derive(Debug, Clone)]
pub struct CustomPredicate {
    pub name: String,
    pub sql: Option<CustomSqlFn>,
    pub matcher: CustomMatchFn,
}

impl CustomPredicate {
    pub fn new(name: impl Into<String>, sql: Option<CustomSqlFn>, matcher: CustomMatchFn) -> Self {
        Self {
            name: name.into(),
            sql,
            matcher,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FieldDefinition {
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(flatten)]
    pub field_type: FieldType,
    #[serde(default)]
    pub storage: Storage,
    #[serde(skip)]
    pub custom: Vec<CustomPredicate>,
}

impl FieldDefinition {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            title: None,
            field_type,
            storage: Storage::Column,
            custom: Vec::new(),
        }
    }

    pub fn computed(name: impl Into<String>, compute: ComputeFn) -> Self {
        Self::new(name, FieldType::Computed { compute })
    }

    pub fn in_metadata(mut self) -> Self {
        self.storage = Storage::Metadata;
        self
    }

    pub fn with_subfields(mut self, subfields: &[&str]) -> Self {
        self.storage = Storage::SubFields(subfields.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn with_custom(mut self, predicate: CustomPredicate) -> Self {
        self.custom.push(predicate);
        self
    }

    pub fn store_location(&self) -> StoreLocation {
        if matches!(self.field_type, FieldType::Computed { .. }) {
            return StoreLocation::None;
        }
        match self.storage {
            Storage::Column => StoreLocation::Database,
            Storage::Metadata => StoreLocation::Metadata,
            Storage::SubFields(_) => StoreLocation::SubFields,
        }
    }

    /// Column name when the field lives in a plain database column
    pub fn column(&self) -> Option<&str> {
        (self.store_location() == StoreLocation::Database).then_some(self.name.as_str())
    }

    /// Physical columns backing this field, in storage order
    pub fn columns(&self) -> Vec<(String, ColumnType)> {
        let Some(column_type) = self.field_type.column_type() else {
            return Vec::new();
        };
        match &self.storage {
            Storage::Column => vec![(self.name.clone(), column_type)],
            Storage::Metadata => Vec::new(),
            Storage::SubFields(subs) => subs
                .iter()
                .map(|sub| (format!("{}_{}", self.name, sub), column_type))
                .collect(),
        }
    }

    fn is_subfields(&self) -> bool {
        matches!(self.storage, Storage::SubFields(_))
    }

    fn is_multi_reference(&self) -> bool {
        matches!(self.field_type, FieldType::ReferenceMulti { .. })
    }

    pub fn custom_predicate(&self, name: &str) -> Option<&CustomPredicate> {
        self.custom.iter().find(|p| p.name == name)
    }

    /// Whether this field accepts a predicate kind at all
    pub fn supports(&self, predicate: &Predicate) -> bool {
        if self.is_subfields() {
            return matches!(predicate, Predicate::Match | Predicate::Like | Predicate::IsSet)
                || matches!(predicate, Predicate::Custom(name) if self.custom_predicate(name).is_some());
        }
        match predicate {
            Predicate::Match | Predicate::OneOf | Predicate::IsSet => true,
            Predicate::Like => matches!(
                self.field_type,
                FieldType::Text
                    | FieldType::Enumeration { .. }
                    | FieldType::Integer
                    | FieldType::DateTime
                    | FieldType::Computed { .. }
            ),
            Predicate::Compare(_) => !matches!(
                self.field_type,
                FieldType::Boolean | FieldType::ReferenceMulti { .. }
            ),
            Predicate::Custom(name) => self.custom_predicate(name).is_some(),
        }
    }

    // -------------------------------------------------------------------------
    // Value coercion
    // -------------------------------------------------------------------------

    /// Coerce an operand to this field's type.
    ///
    /// Returns `None` when the operand cannot represent a value of this field;
    /// such operands match nothing. For multi-references the result is a single
    /// referenced id.
    pub fn parse_value(&self, value: &Value) -> Option<Value> {
        if value.is_null() {
            return Some(Value::Null);
        }
        if self.is_subfields() {
            return match value {
                Value::Map(map) => Some(Value::Map(
                    map.iter()
                        .map(|(k, v)| Some((k.clone(), self.parse_scalar(v)?)))
                        .collect::<Option<_>>()?,
                )),
                _ => None,
            };
        }
        self.parse_scalar(value)
    }

    fn parse_scalar(&self, value: &Value) -> Option<Value> {
        if value.is_null() {
            return Some(Value::Null);
        }
        match &self.field_type {
            FieldType::Text | FieldType::Enumeration { .. } => match value {
                Value::List(_) | Value::Map(_) => None,
                other => Some(Value::Text(other.to_string())),
            },
            FieldType::Integer | FieldType::Reference { .. } | FieldType::ReferenceMulti { .. } => {
                value.as_i64().map(Value::Int)
            }
            FieldType::Float => value.as_f64().filter(|f| f.is_finite()).map(Value::Float),
            FieldType::DateTime => value.as_datetime().map(Value::DateTime),
            FieldType::Boolean => value.as_bool().map(Value::Bool),
            FieldType::Computed { .. } => Some(value.clone()),
        }
    }

    /// JSON form of a stored value
    pub fn get_json_value(&self, value: &Value) -> serde_json::Value {
        value.to_json()
    }

    /// Decode a raw column value read from storage
    pub fn decode_column(&self, raw: Value) -> Value {
        match (&self.field_type, raw) {
            (_, Value::Null) if self.is_multi_reference() => Value::List(Vec::new()),
            (_, Value::Null) => Value::Null,
            (FieldType::DateTime, raw) => raw.as_datetime().map(Value::DateTime).unwrap_or(Value::Null),
            (FieldType::ReferenceMulti { .. }, Value::Text(encoded)) => Value::List(
                encoded
                    .split('|')
                    .filter_map(|id| id.parse::<i64>().ok())
                    .map(Value::Int)
                    .collect(),
            ),
            (_, raw) => raw,
        }
    }

    /// Decode a value found in the metadata blob
    pub fn decode_metadata(&self, json: &serde_json::Value) -> Value {
        let raw = Value::from_json(json);
        if self.is_multi_reference() {
            return match raw {
                Value::List(items) => {
                    Value::List(items.iter().filter_map(|v| v.as_i64().map(Value::Int)).collect())
                }
                _ => Value::List(Vec::new()),
            };
        }
        self.parse_value(&raw).unwrap_or(Value::Null)
    }

    /// SQL literal for a value of this field, as stored in its column
    pub fn sql_literal(&self, value: &Value) -> String {
        match value {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => (if *b { "TRUE" } else { "FALSE" }).to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) if f.is_finite() => format!("{:?}", f),
            Value::Float(_) => "NULL".to_string(),
            Value::Text(s) => quote_literal(s),
            Value::DateTime(dt) => quote_literal(&dt.format(DATETIME_FORMAT).to_string()),
            Value::List(items) if self.is_multi_reference() => {
                if items.is_empty() {
                    "NULL".to_string()
                } else {
                    let ids: Vec<String> = items.iter().map(|v| v.to_string()).collect();
                    quote_literal(&format!("|{}|", ids.join("|")))
                }
            }
            Value::List(_) | Value::Map(_) => quote_literal(&value.to_json().to_string()),
        }
    }

    /// SQL literal used when writing `value` into this field's column
    pub fn storage_literal(&self, value: &Value) -> String {
        if self.is_multi_reference() {
            let ids = value
                .as_list()
                .map(|items| items.iter().filter_map(Value::as_i64).map(Value::Int).collect())
                .unwrap_or_default();
            return self.sql_literal(&Value::List(ids));
        }
        self.sql_literal(&self.parse_scalar(value).unwrap_or(Value::Null))
    }

    /// JSON written into the metadata blob for `value`
    pub fn storage_json(&self, value: &Value) -> serde_json::Value {
        if self.is_multi_reference() {
            return value.to_json();
        }
        self.parse_value(value).unwrap_or(Value::Null).to_json()
    }

    // -------------------------------------------------------------------------
    // SQL compilers
    // -------------------------------------------------------------------------

    /// Compile any single-field predicate
    pub fn predicate_sql(&self, predicate: &Predicate, operand: &Value) -> Option<String> {
        if !self.supports(predicate) {
            return None;
        }
        match predicate {
            Predicate::Match => self.filter_match_sql(operand),
            Predicate::Like => self.filter_like_sql(operand),
            Predicate::Compare(op) => self.filter_compare_sql(*op, operand),
            Predicate::OneOf => self.filter_one_of_sql(operand),
            Predicate::IsSet => self.filter_is_set_sql(),
            Predicate::Custom(name) => self.filter_custom_sql(name, operand),
        }
    }

    pub fn filter_match_sql(&self, operand: &Value) -> Option<String> {
        let column = self.column()?;
        Some(match self.parse_value(operand) {
            None => "FALSE".to_string(),
            Some(Value::Null) => self.null_sql(column),
            Some(Value::Int(id)) if self.is_multi_reference() => {
                format!("{} LIKE '%|{}|%'", column, id)
            }
            Some(value) => format!("{} = {}", column, self.sql_literal(&value)),
        })
    }

    pub fn filter_like_sql(&self, operand: &Value) -> Option<String> {
        let column = self.column()?;
        if operand.is_null() {
            return Some("FALSE".to_string());
        }
        let pattern = contains_literal(&operand.to_string());
        Some(match self.field_type {
            FieldType::Integer => format!("CAST({} AS VARCHAR) ILIKE {} ESCAPE '\\'", column, pattern),
            _ => format!("{} ILIKE {} ESCAPE '\\'", column, pattern),
        })
    }

    pub fn filter_compare_sql(&self, op: Comparison, operand: &Value) -> Option<String> {
        let column = self.column()?;
        Some(match self.parse_value(operand) {
            None | Some(Value::Null) => "FALSE".to_string(),
            Some(value) => format!("{} {} {}", column, op.sql_operator(), self.sql_literal(&value)),
        })
    }

    pub fn filter_one_of_sql(&self, operand: &Value) -> Option<String> {
        let column = self.column()?;
        let Some(items) = operand.as_list() else {
            return Some("FALSE".to_string());
        };
        let parts: Vec<String> = items
            .iter()
            .filter_map(|item| self.parse_value(item))
            .map(|value| match value {
                Value::Null => self.null_sql(column),
                Value::Int(id) if self.is_multi_reference() => {
                    format!("{} LIKE '%|{}|%'", column, id)
                }
                value => format!("{} = {}", column, self.sql_literal(&value)),
            })
            .collect();
        if parts.is_empty() {
            return Some("FALSE".to_string());
        }
        Some(format!("({})", parts.join(" OR ")))
    }

    /// Absence test; an empty multi-reference is stored as NULL
    fn null_sql(&self, column: &str) -> String {
        if self.is_multi_reference() {
            format!("({} IS NULL OR {} = '')", column, column)
        } else {
            format!("{} IS NULL", column)
        }
    }

    pub fn filter_is_set_sql(&self) -> Option<String> {
        let column = self.column()?;
        Some(match self.field_type {
            FieldType::Text
            | FieldType::Enumeration { .. }
            | FieldType::DateTime
            | FieldType::ReferenceMulti { .. } => {
                format!("({} IS NOT NULL AND {} <> '')", column, column)
            }
            FieldType::Boolean => format!("{} = TRUE", column),
            _ => format!("{} IS NOT NULL", column),
        })
    }

    pub fn filter_custom_sql(&self, name: &str, operand: &Value) -> Option<String> {
        let column = self.column()?;
        let sql = self.custom_predicate(name)?.sql?;
        sql(column, operand)
    }

    // -------------------------------------------------------------------------
    // In-memory matchers
    // -------------------------------------------------------------------------

    /// Evaluate any single-field predicate against a stored value
    pub fn predicate_matches(&self, predicate: &Predicate, value: &Value, operand: &Value) -> bool {
        match predicate {
            Predicate::Match => self.filter_match(value, operand),
            Predicate::Like => self.filter_like(value, operand),
            Predicate::Compare(op) => self.filter_compare(*op, value, operand),
            Predicate::OneOf => self.filter_one_of(value, operand),
            Predicate::IsSet => self.filter_is_set(value),
            Predicate::Custom(name) => self.filter_custom(name, value, operand),
        }
    }

    pub fn filter_match(&self, value: &Value, operand: &Value) -> bool {
        match self.parse_value(operand) {
            None => false,
            Some(Value::Null) if self.is_multi_reference() => {
                value.as_list().is_none_or(<[Value]>::is_empty)
            }
            Some(Value::Null) => value.is_null(),
            Some(expected) if self.is_multi_reference() => value
                .as_list()
                .is_some_and(|ids| ids.iter().any(|id| values_equal(id, &expected))),
            Some(expected) => values_equal(value, &expected),
        }
    }

    /// Case-insensitive substring containment
    pub fn filter_like(&self, value: &Value, operand: &Value) -> bool {
        if operand.is_null() {
            return false;
        }
        let needle = operand.to_string().to_lowercase();
        match value {
            Value::Null => false,
            Value::Map(map) => map
                .values()
                .any(|v| !v.is_null() && v.to_string().to_lowercase().contains(&needle)),
            other => other.to_string().to_lowercase().contains(&needle),
        }
    }

    pub fn filter_compare(&self, op: Comparison, value: &Value, operand: &Value) -> bool {
        let Some(expected) = self.parse_value(operand).filter(|v| !v.is_null()) else {
            return false;
        };
        value.compare(&expected).is_some_and(|ord| op.holds(ord))
    }

    pub fn filter_one_of(&self, value: &Value, operand: &Value) -> bool {
        operand
            .as_list()
            .is_some_and(|items| items.iter().any(|item| self.filter_match(value, item)))
    }

    pub fn filter_is_set(&self, value: &Value) -> bool {
        match value {
            Value::Null => false,
            Value::Text(s) => !s.is_empty(),
            Value::List(items) => !items.is_empty(),
            Value::Map(map) => map.values().any(|v| !v.is_null()),
            Value::Bool(b) => *b,
            _ => true,
        }
    }

    pub fn filter_custom(&self, name: &str, value: &Value, operand: &Value) -> bool {
        self.custom_predicate(name)
            .is_some_and(|predicate| (predicate.matcher)(value, operand))
    }

    /// Value of this field on a record, evaluating computed fields
    pub fn value_of<'a>(&self, record: &'a Record) -> Cow<'a, Value> {
        match self.field_type {
            FieldType::Computed { compute } => Cow::Owned(compute(record)),
            _ => record.stored(&self.name),
        }
    }
}

/// Equality with numeric tolerance between Int and Float
fn values_equal(a: &Value, b: &Value) -> bool {
    a.compare(b).map_or(a == b, |ord| ord == Ordering::Equal)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(name: &str) -> FieldDefinition {
        FieldDefinition::new(name, FieldType::Text)
    }

    #[test]
    fn match_sql_quotes_text() {
        let field = text("name");
        assert_eq!(
            field.filter_match_sql(&Value::from("O'Brien")).unwrap(),
            "name = 'O''Brien'"
        );
        assert_eq!(field.filter_match_sql(&Value::Null).unwrap(), "name IS NULL");
    }

    #[test]
    fn match_sql_unparseable_operand_matches_nothing() {
        let field = FieldDefinition::new("age", FieldType::Integer);
        assert_eq!(field.filter_match_sql(&Value::from("abc")).unwrap(), "FALSE");
        assert!(!field.filter_match(&Value::Int(3), &Value::from("abc")));
        assert!(field.filter_match(&Value::Int(3), &Value::from("3")));
        assert_eq!(field.filter_match_sql(&Value::Float(1e20)).unwrap(), "FALSE");
        assert!(!field.filter_match(&Value::Int(i64::MAX), &Value::Float(1e20)));
    }

    #[test]
    fn like_sql_is_case_insensitive_and_escaped() {
        let field = text("name");
        assert_eq!(
            field.filter_like_sql(&Value::from("50%")).unwrap(),
            r"name ILIKE '%50\%%' ESCAPE '\'"
        );
        assert!(field.filter_like(&Value::from("Smith A"), &Value::from("smith")));
        assert!(!field.filter_like(&Value::Null, &Value::from("smith")));
    }

    #[test]
    fn non_column_storage_has_no_sql() {
        let meta = text("nickname").in_metadata();
        assert_eq!(meta.store_location(), StoreLocation::Metadata);
        assert!(meta.filter_match_sql(&Value::from("x")).is_none());
        assert!(meta.columns().is_empty());

        let computed = FieldDefinition::computed("double", |_| Value::Int(2));
        assert_eq!(computed.store_location(), StoreLocation::None);
        assert!(computed.filter_is_set_sql().is_none());
    }

    #[test]
    fn one_of_sql() {
        let field = FieldDefinition::new("id", FieldType::Integer);
        assert_eq!(field.filter_one_of_sql(&Value::List(vec![])).unwrap(), "FALSE");
        assert_eq!(
            field.filter_one_of_sql(&Value::from(vec![1, 2])).unwrap(),
            "(id = 1 OR id = 2)"
        );
        assert!(!field.filter_one_of(&Value::Int(1), &Value::List(vec![])));
        assert!(field.filter_one_of(&Value::Int(2), &Value::from(vec![1, 2])));
    }

    #[test]
    fn multi_reference_uses_encoded_pattern() {
        let field = FieldDefinition::new(
            "tags",
            FieldType::ReferenceMulti {
                foreign_class: "tag".into(),
            },
        );
        assert_eq!(field.filter_match_sql(&Value::Int(4)).unwrap(), "tags LIKE '%|4|%'");
        assert_eq!(field.sql_literal(&Value::from(vec![1, 4])), "'|1|4|'");
        let decoded = field.decode_column(Value::from("|1|4|"));
        assert_eq!(decoded, Value::from(vec![1, 4]));
        assert!(field.filter_match(&decoded, &Value::Int(4)));
        assert!(!field.filter_match(&decoded, &Value::Int(2)));
        assert!(!field.supports(&Predicate::Compare(Comparison::Greater)));
    }

    #[test]
    fn multi_reference_null_operand_means_no_references() {
        let field = FieldDefinition::new(
            "tags",
            FieldType::ReferenceMulti {
                foreign_class: "tag".into(),
            },
        );
        assert_eq!(field.sql_literal(&Value::List(vec![])), "NULL");
        assert_eq!(
            field.filter_match_sql(&Value::Null).unwrap(),
            "(tags IS NULL OR tags = '')"
        );
        let empty = field.decode_column(Value::Null);
        assert!(field.filter_match(&empty, &Value::Null));
        assert!(!field.filter_match(&Value::from(vec![1]), &Value::Null));
        assert!(field.filter_one_of(&empty, &Value::List(vec![Value::Null, Value::Int(3)])));
    }

    #[test]
    fn compare_on_datetime() {
        let field = FieldDefinition::new("created", FieldType::DateTime);
        assert_eq!(
            field
                .filter_compare_sql(Comparison::GreaterEqual, &Value::from("2024-01-01"))
                .unwrap(),
            "created >= '2024-01-01 00:00:00'"
        );
        let stored = field.decode_column(Value::from("2024-02-01 08:00:00"));
        assert!(field.filter_compare(Comparison::GreaterEqual, &stored, &Value::from("2024-01-01")));
        assert!(!field.filter_compare(Comparison::Lesser, &stored, &Value::from("2024-01-01")));
    }

    #[test]
    fn is_set_rules() {
        let flag = FieldDefinition::new("active", FieldType::Boolean);
        assert_eq!(flag.filter_is_set_sql().unwrap(), "active = TRUE");
        assert!(!flag.filter_is_set(&Value::Bool(false)));
        assert!(text("name").filter_is_set(&Value::from("x")));
        assert!(!text("name").filter_is_set(&Value::from("")));
    }

    #[test]
    fn subfields_match_maps() {
        let field = FieldDefinition::new("position", FieldType::Float).with_subfields(&["lat", "lng"]);
        assert_eq!(field.store_location(), StoreLocation::SubFields);
        assert_eq!(
            field.columns(),
            vec![
                ("position_lat".to_string(), ColumnType::Double),
                ("position_lng".to_string(), ColumnType::Double)
            ]
        );
        let stored = Value::from_json(&serde_json::json!({"lat": 1.5, "lng": 2.0}));
        assert!(field.filter_match(&stored, &Value::from_json(&serde_json::json!({"lat": 1.5, "lng": 2}))));
        assert!(!field.supports(&Predicate::OneOf));
    }

    #[test]
    fn custom_predicate_dispatch() {
        fn even_sql(column: &str, _: &Value) -> Option<String> {
            Some(format!("{} % 2 = 0", column))
        }
        fn even(value: &Value, _: &Value) -> bool {
            value.as_i64().is_some_and(|v| v % 2 == 0)
        }
        let field = FieldDefinition::new("n", FieldType::Integer)
            .with_custom(CustomPredicate::new("even", Some(even_sql), even));
        let predicate = Predicate::Custom("even".into());
        assert_eq!(field.predicate_sql(&predicate, &Value::Null).unwrap(), "n % 2 = 0");
        assert!(field.predicate_matches(&predicate, &Value::Int(4), &Value::Null));
        assert!(!field.supports(&Predicate::Custom("odd".into())));
    }

    #[test]
    fn deserializes_from_config() {
        let field: FieldDefinition = serde_json::from_value(serde_json::json!({
            "name": "status",
            "type": "enumeration",
            "options": ["active", "inactive"],
            "storage": "metadata"
        }))
        .unwrap();
        assert_eq!(field.field_type.name(), "enumeration");
        assert_eq!(field.storage, Storage::Metadata);

        let field: FieldDefinition = serde_json::from_value(serde_json::json!({
            "name": "position",
            "type": "float",
            "storage": {"subfields": ["lat", "lng"]}
        }))
        .unwrap();
        assert_eq!(field.store_location(), StoreLocation::SubFields);
    }
}
