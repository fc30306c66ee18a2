//! Field values
//!
//! A closed set of value shapes that can live in a record or be used as a
//! condition operand.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDateTime;

/// Storage and wire format for date/time values. Fixed width, so the
/// lexical order of the text form equals chronological order.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Range of floats that convert to `i64` without saturating; upper bound exclusive
const I64_MIN_F: f64 = i64::MIN as f64;
const I64_MAX_F: f64 = i64::MAX as f64;

/// Input formats accepted when parsing date/time operands
const DATETIME_INPUT_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%SZ",
    "%Y-%m-%d %H:%M",
];

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    DateTime(NaiveDateTime),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Integer view of the value, accepting integral floats and numeric text
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::Float(f) if f.fract() == 0.0 && (I64_MIN_F..I64_MAX_F).contains(f) => {
                Some(*f as i64)
            }
            Self::Text(s) => s.trim().parse().ok(),
            Self::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            Self::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Int(i) => Some(*i != 0),
            Self::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => Some(true),
                "false" | "0" | "no" | "" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            Self::DateTime(dt) => Some(*dt),
            Self::Text(s) => parse_datetime(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Ordering between two values of compatible shape.
    ///
    /// Numbers compare numerically across Int/Float, text lexically,
    /// date/times chronologically. Mismatched shapes are unordered.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => Some(a.cmp(b)),
            (Self::Int(_) | Self::Float(_), Self::Int(_) | Self::Float(_)) => {
                self.as_f64()?.partial_cmp(&other.as_f64()?)
            }
            (Self::Text(a), Self::Text(b)) => Some(a.cmp(b)),
            (Self::DateTime(a), Self::DateTime(b)) => Some(a.cmp(b)),
            (Self::Bool(a), Self::Bool(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Convert to the JSON representation used on the wire
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Int(i) => serde_json::Value::from(*i),
            Self::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Self::Text(s) => serde_json::Value::String(s.clone()),
            Self::DateTime(dt) => serde_json::Value::String(dt.format(DATETIME_FORMAT).to_string()),
            Self::List(items) => serde_json::Value::Array(items.iter().map(Value::to_json).collect()),
            Self::Map(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }

    /// Build an untyped value from JSON. Field-specific coercion happens later
    /// through the field descriptor.
    pub fn from_json(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => n.as_f64().map(Self::Float).unwrap_or(Self::Null),
            },
            serde_json::Value::String(s) => Self::Text(s.clone()),
            serde_json::Value::Array(items) => Self::List(items.iter().map(Value::from_json).collect()),
            serde_json::Value::Object(map) => Self::Map(
                map.iter().map(|(k, v)| (k.clone(), Value::from_json(v))).collect(),
            ),
        }
    }
}

/// Parse a date/time in any of the accepted input formats; a bare date
/// resolves to midnight.
pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    DATETIME_INPUT_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Int(i) => write!(f, "{}", i),
            Self::Float(v) => write!(f, "{}", v),
            Self::Text(s) => f.write_str(s),
            Self::DateTime(dt) => write!(f, "{}", dt.format(DATETIME_FORMAT)),
            Self::List(_) | Self::Map(_) => write!(f, "{}", self.to_json()),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Self::DateTime(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Self::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_numbers_keep_int_and_float_apart() {
        assert_eq!(Value::from_json(&serde_json::json!(3)), Value::Int(3));
        assert_eq!(Value::from_json(&serde_json::json!(2.5)), Value::Float(2.5));
        assert_eq!(Value::Float(2.0).to_json(), serde_json::json!(2.0));
    }

    #[test]
    fn datetime_serializes_in_storage_format() {
        let dt = parse_datetime("2024-03-01T10:20:30").unwrap();
        assert_eq!(Value::DateTime(dt).to_json(), serde_json::json!("2024-03-01 10:20:30"));
        assert_eq!(
            parse_datetime("2024-03-01").unwrap().format(DATETIME_FORMAT).to_string(),
            "2024-03-01 00:00:00"
        );
        assert!(parse_datetime("yesterday").is_none());
    }

    #[test]
    fn compare_mixes_int_and_float() {
        assert_eq!(Value::Int(2).compare(&Value::Float(2.5)), Some(Ordering::Less));
        assert_eq!(Value::Text("b".into()).compare(&Value::Text("a".into())), Some(Ordering::Greater));
        assert_eq!(Value::Int(1).compare(&Value::Text("1".into())), None);
    }

    #[test]
    fn coercions() {
        assert_eq!(Value::Text(" 42 ".into()).as_i64(), Some(42));
        assert_eq!(Value::Float(3.0).as_i64(), Some(3));
        assert_eq!(Value::Float(3.5).as_i64(), None);
        assert_eq!(Value::Float(1e20).as_i64(), None);
        assert_eq!(Value::Float(-1e19).as_i64(), None);
        assert_eq!(Value::Float(f64::INFINITY).as_i64(), None);
        assert_eq!(Value::Text("yes".into()).as_bool(), Some(true));
        assert_eq!(Value::Text("maybe".into()).as_bool(), None);
    }

    #[test]
    fn nested_json_round_trip() {
        let json = serde_json::json!({"lat": 55.6, "tags": ["a", "b"], "n": null});
        assert_eq!(Value::from_json(&json).to_json(), json);
    }
}
