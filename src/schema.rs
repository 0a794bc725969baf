//! Field schema descriptors and the casting capability the filter pipeline
//! consults.
//!
//! The translator never invents types: it asks a [`SchemaCaster`] for the
//! declared [`FieldType`] of a field and then for a cast in that category.
//! [`CollectionSchema`] is the provided implementation; custom schemas only
//! need `field_type` and can override individual cast categories.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;

use crate::filtering::cast::{CastMode, cast_value};
use crate::ids::INTERNAL_ID;
use crate::object_id::ObjectId;
use crate::value::{Document, FieldValue};

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Date,
    ObjectId,
    /// Anything goes; raw JSON passes through unchanged.
    Mixed,
    Array(Box<FieldType>),
}

impl FieldType {
    #[must_use]
    pub fn array_of(inner: Self) -> Self {
        Self::Array(Box::new(inner))
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => f.write_str("String"),
            Self::Number => f.write_str("Number"),
            Self::Boolean => f.write_str("Boolean"),
            Self::Date => f.write_str("Date"),
            Self::ObjectId => f.write_str("ObjectId"),
            Self::Mixed => f.write_str("Mixed"),
            Self::Array(inner) => write!(f, "[{inner}]"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct FieldSpec {
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Creating a document without this field (or with `null`) fails.
    #[serde(default)]
    pub required: bool,
    /// Left out of query results unless projected with `+field`.
    #[serde(default)]
    pub hidden: bool,
}

impl FieldSpec {
    #[must_use]
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            required: false,
            hidden: false,
        }
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }
}

/// Casting capability, one method per type category.
///
/// `field_type` returns `None` for undeclared fields, which are treated as
/// [`FieldType::Mixed`]. The category methods return `None` when the raw
/// value cannot be represented in that type; the caller turns that into a
/// [`CastError`](crate::filtering::CastError) naming the field.
pub trait SchemaCaster: Send + Sync {
    fn field_type(&self, field: &str) -> Option<FieldType>;

    fn cast_string(&self, raw: &Value) -> Option<FieldValue> {
        match raw {
            Value::String(s) => Some(FieldValue::String(s.clone())),
            Value::Number(n) => Some(FieldValue::String(n.to_string())),
            Value::Bool(b) => Some(FieldValue::String(b.to_string())),
            _ => None,
        }
    }

    fn cast_number(&self, raw: &Value) -> Option<FieldValue> {
        match raw {
            Value::Number(n) => Some(
                n.as_i64().map_or_else(
                    || FieldValue::Double(n.as_f64().unwrap_or(f64::NAN)),
                    FieldValue::Int,
                ),
            ),
            Value::String(s) => parse_number(s.trim()),
            Value::Bool(b) => Some(FieldValue::Int(i64::from(*b))),
            _ => None,
        }
    }

    fn cast_boolean(&self, raw: &Value) -> Option<FieldValue> {
        match raw {
            Value::Bool(b) => Some(FieldValue::Bool(*b)),
            Value::String(s) => match s.as_str() {
                "true" | "1" | "yes" => Some(FieldValue::Bool(true)),
                "false" | "0" | "no" => Some(FieldValue::Bool(false)),
                _ => None,
            },
            Value::Number(n) => match n.as_i64() {
                Some(1) => Some(FieldValue::Bool(true)),
                Some(0) => Some(FieldValue::Bool(false)),
                _ => None,
            },
            _ => None,
        }
    }

    fn cast_date(&self, raw: &Value) -> Option<FieldValue> {
        match raw {
            Value::Number(n) => n
                .as_i64()
                .and_then(DateTime::from_timestamp_millis)
                .map(FieldValue::Date),
            Value::String(s) => parse_date(s.trim()).map(FieldValue::Date),
            _ => None,
        }
    }

    fn cast_object_id(&self, raw: &Value) -> Option<FieldValue> {
        match raw {
            Value::String(s) => ObjectId::parse_str(s).ok().map(FieldValue::ObjectId),
            _ => None,
        }
    }
}

fn parse_number(input: &str) -> Option<FieldValue> {
    if input.is_empty() {
        return None;
    }
    if let Ok(int) = input.parse::<i64>() {
        return Some(FieldValue::Int(int));
    }
    input
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .map(FieldValue::Double)
}

/// Accepts RFC 3339, `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM:SS[.fff]` and epoch
/// milliseconds. Timestamps without an offset are read as UTC.
pub(crate) fn parse_date(input: &str) -> Option<DateTime<Utc>> {
    if let Ok(date) = DateTime::parse_from_rfc3339(input) {
        return Some(date.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    input
        .parse::<i64>()
        .ok()
        .and_then(DateTime::from_timestamp_millis)
}

/// Declared fields of one collection.
///
/// `_id` is always declared as [`FieldType::ObjectId`]. In strict mode (the
/// default) undeclared fields are dropped from written documents; filters on
/// undeclared fields are still accepted and compared as raw JSON.
#[derive(Clone, Debug, Deserialize)]
pub struct CollectionSchema {
    #[serde(default)]
    fields: IndexMap<String, FieldSpec>,
    #[serde(default = "default_strict")]
    strict: bool,
}

const fn default_strict() -> bool {
    true
}

impl Default for CollectionSchema {
    fn default() -> Self {
        Self {
            fields: IndexMap::new(),
            strict: true,
        }
    }
}

impl CollectionSchema {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn field(self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.field_spec(name, FieldSpec::new(field_type))
    }

    #[must_use]
    pub fn field_spec(mut self, name: impl Into<String>, spec: FieldSpec) -> Self {
        self.fields.insert(name.into(), spec);
        self
    }

    /// Keep undeclared fields on write instead of dropping them.
    #[must_use]
    pub fn non_strict(mut self) -> Self {
        self.strict = false;
        self
    }

    #[must_use]
    pub fn spec(&self, field: &str) -> Option<&FieldSpec> {
        self.fields.get(field)
    }

    pub fn hidden_fields(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|(_, spec)| spec.hidden)
            .map(|(name, _)| name.as_str())
    }

    fn is_declared(&self, field: &str) -> bool {
        field == INTERNAL_ID || self.fields.contains_key(field)
    }

    /// Validates and casts a complete document for insertion. A missing
    /// `_id` is generated.
    ///
    /// # Errors
    ///
    /// Returns every validation message found: cast failures and missing
    /// required fields.
    pub fn cast_document(&self, document: Document) -> Result<Document, Vec<String>> {
        let mut errors = Vec::new();
        let mut cast = self.cast_fields(document, &mut errors);

        for (name, spec) in &self.fields {
            if spec.required && cast.get(name).is_none_or(Value::is_null) {
                errors.push(format!("Path `{name}` is required."));
            }
        }

        if !cast.contains_key(INTERNAL_ID) {
            cast.insert(
                INTERNAL_ID.to_string(),
                Value::String(ObjectId::generate().to_hex()),
            );
        }

        if errors.is_empty() { Ok(cast) } else { Err(errors) }
    }

    /// Validates and casts the fields of a partial update. Only the provided
    /// fields are checked; a required field may not be set to `null`.
    ///
    /// # Errors
    ///
    /// Returns every validation message found.
    pub fn cast_partial(&self, update: Document) -> Result<Document, Vec<String>> {
        let mut errors = Vec::new();
        let cast = self.cast_fields(update, &mut errors);

        for (name, value) in &cast {
            if value.is_null() && self.spec(name).is_some_and(|spec| spec.required) {
                errors.push(format!("Path `{name}` is required."));
            }
        }

        if errors.is_empty() { Ok(cast) } else { Err(errors) }
    }

    /// Normalizes a stored document through the schema: declared fields are
    /// re-cast, undeclared ones dropped in strict mode. Values that no longer
    /// cast are kept as stored.
    #[must_use]
    pub fn hydrate(&self, document: Document) -> Document {
        document
            .into_iter()
            .filter(|(name, _)| !self.strict || self.is_declared(name))
            .map(|(name, raw)| {
                let value = cast_value(self, &name, &raw, CastMode::Document)
                    .map_or(raw, |typed| typed.to_json());
                (name, value)
            })
            .collect()
    }

    fn cast_fields(&self, document: Document, errors: &mut Vec<String>) -> Document {
        let mut cast = Document::new();
        for (name, raw) in document {
            if self.strict && !self.is_declared(&name) {
                tracing::debug!(field = %name, "dropping undeclared field");
                continue;
            }
            match cast_value(self, &name, &raw, CastMode::Document) {
                Ok(value) => {
                    cast.insert(name, value.to_json());
                }
                Err(err) => errors.push(err.to_string()),
            }
        }
        cast
    }
}

impl SchemaCaster for CollectionSchema {
    fn field_type(&self, field: &str) -> Option<FieldType> {
        if field == INTERNAL_ID {
            return Some(FieldType::ObjectId);
        }
        self.fields.get(field).map(|spec| spec.field_type.clone())
    }
}
