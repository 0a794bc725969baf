use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use serde_json::{Map, Number, Value};
use std::cmp::Ordering;

use crate::object_id::ObjectId;

/// A stored document: a JSON object whose `_id` holds the internal identifier.
pub type Document = Map<String, Value>;

/// Store-native typed value produced by casting a raw value against a field's
/// declared type.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
    Date(DateTime<Utc>),
    ObjectId(ObjectId),
    Array(Vec<FieldValue>),
    Document(Document),
}

impl FieldValue {
    /// Untyped conversion, used for fields without a declared type.
    #[must_use]
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => n
                .as_i64()
                .map_or_else(|| Self::Double(n.as_f64().unwrap_or(f64::NAN)), Self::Int),
            Value::String(s) => Self::String(s),
            Value::Array(items) => Self::Array(items.into_iter().map(Self::from_json).collect()),
            Value::Object(map) => Self::Document(map),
        }
    }

    /// Renders the value the way the store persists it: dates as RFC 3339
    /// with millisecond precision, object ids as hex strings.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Int(i) => Value::from(*i),
            Self::Double(f) => Number::from_f64(*f).map_or(Value::Null, Value::Number),
            Self::String(s) => Value::String(s.clone()),
            Self::Date(d) => Value::String(d.to_rfc3339_opts(SecondsFormat::Millis, true)),
            Self::ObjectId(id) => Value::String(id.to_hex()),
            Self::Array(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            Self::Document(map) => Value::Object(map.clone()),
        }
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            #[allow(clippy::cast_precision_loss)]
            Self::Int(i) => Some(*i as f64),
            Self::Double(f) => Some(*f),
            _ => None,
        }
    }

    /// Type bracket used for ordering values of different kinds:
    /// null < numbers < strings < documents < arrays < object ids < booleans < dates.
    #[must_use]
    pub const fn type_rank(&self) -> u8 {
        match self {
            Self::Null => 0,
            Self::Int(_) | Self::Double(_) => 1,
            Self::String(_) => 2,
            Self::Document(_) => 3,
            Self::Array(_) => 4,
            Self::ObjectId(_) => 5,
            Self::Bool(_) => 6,
            Self::Date(_) => 7,
        }
    }

    /// Compares two values of the same type bracket. Returns `None` across
    /// brackets, so range comparators never match mixed types.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Null, Self::Null) => Some(Ordering::Equal),
            (Self::Int(a), Self::Int(b)) => Some(a.cmp(b)),
            (a, b) if a.type_rank() == 1 && b.type_rank() == 1 => {
                a.as_f64()?.partial_cmp(&b.as_f64()?)
            }
            (Self::String(a), Self::String(b)) => Some(a.cmp(b)),
            (Self::ObjectId(a), Self::ObjectId(b)) => Some(a.cmp(b)),
            (Self::Bool(a), Self::Bool(b)) => Some(a.cmp(b)),
            (Self::Date(a), Self::Date(b)) => Some(a.cmp(b)),
            (Self::Array(a), Self::Array(b)) => {
                for (x, y) in a.iter().zip(b) {
                    match x.sort_cmp(y) {
                        Ordering::Equal => {}
                        other => return Some(other),
                    }
                }
                Some(a.len().cmp(&b.len()))
            }
            (Self::Document(a), Self::Document(b)) => {
                let (a, b) = (Value::Object(a.clone()), Value::Object(b.clone()));
                Some(a.to_string().cmp(&b.to_string()))
            }
            _ => None,
        }
    }

    /// Total ordering used for sorting result sets.
    #[must_use]
    pub fn sort_cmp(&self, other: &Self) -> Ordering {
        self.type_rank()
            .cmp(&other.type_rank())
            .then_with(|| self.compare(other).unwrap_or(Ordering::Equal))
    }

    /// Equality that treats `Int(1)` and `Double(1.0)` as the same number.
    #[must_use]
    pub fn loose_eq(&self, other: &Self) -> bool {
        self.compare(other) == Some(Ordering::Equal)
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}
