use serde_json::Value;

use crate::schema::{FieldType, SchemaCaster};
use crate::value::FieldValue;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CastError {
    #[error("Cast to {expected} failed for value {value} at path \"{field}\"")]
    InvalidValueForField {
        field: String,
        expected: FieldType,
        value: Value,
    },
}

/// How array-typed fields treat their elements.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CastMode {
    /// Filter values: failed array elements are dropped and a scalar matches
    /// as "array contains".
    Query,
    /// Stored values: every element must cast and a scalar is wrapped.
    Document,
}

/// Casts `raw` against the declared type of `field`.
///
/// Fields the schema does not declare are cast as [`FieldType::Mixed`].
///
/// # Errors
///
/// Returns [`CastError::InvalidValueForField`] when the schema rejects the
/// value for the field's type.
pub fn cast_field(
    schema: &dyn SchemaCaster,
    field: &str,
    raw: &Value,
) -> Result<FieldValue, CastError> {
    cast_value(schema, field, raw, CastMode::Query)
}

/// Casts each element against `field`, keeping only the survivors.
pub fn cast_elements(schema: &dyn SchemaCaster, field: &str, items: &[Value]) -> Vec<FieldValue> {
    items
        .iter()
        .filter_map(|item| match cast_field(schema, field, item) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::debug!(error = %err, "dropping list element");
                None
            }
        })
        .collect()
}

pub(crate) fn cast_value(
    schema: &dyn SchemaCaster,
    field: &str,
    raw: &Value,
    mode: CastMode,
) -> Result<FieldValue, CastError> {
    if raw.is_null() {
        return Ok(FieldValue::Null);
    }

    let field_type = schema.field_type(field).unwrap_or(FieldType::Mixed);
    let failed = || CastError::InvalidValueForField {
        field: field.to_string(),
        expected: field_type.clone(),
        value: raw.clone(),
    };

    match (&field_type, raw, mode) {
        (FieldType::Array(inner), Value::Array(items), CastMode::Query) => Ok(FieldValue::Array(
            items
                .iter()
                .filter_map(|item| cast_as(schema, inner, item))
                .collect(),
        )),
        (FieldType::Array(inner), Value::Array(items), CastMode::Document) => items
            .iter()
            .map(|item| cast_as(schema, inner, item).ok_or_else(failed))
            .collect::<Result<Vec<_>, _>>()
            .map(FieldValue::Array),
        (FieldType::Array(inner), scalar, CastMode::Query) => {
            cast_as(schema, inner, scalar).ok_or_else(failed)
        }
        (FieldType::Array(inner), scalar, CastMode::Document) => cast_as(schema, inner, scalar)
            .map(|value| FieldValue::Array(vec![value]))
            .ok_or_else(failed),
        (scalar_type, raw, _) => cast_as(schema, scalar_type, raw).ok_or_else(failed),
    }
}

fn cast_as(schema: &dyn SchemaCaster, field_type: &FieldType, raw: &Value) -> Option<FieldValue> {
    if raw.is_null() {
        return Some(FieldValue::Null);
    }
    match field_type {
        FieldType::String => schema.cast_string(raw),
        FieldType::Number => schema.cast_number(raw),
        FieldType::Boolean => schema.cast_boolean(raw),
        FieldType::Date => schema.cast_date(raw),
        FieldType::ObjectId => schema.cast_object_id(raw),
        FieldType::Mixed => Some(FieldValue::from_json(raw.clone())),
        FieldType::Array(inner) => match raw {
            Value::Array(items) => items
                .iter()
                .map(|item| cast_as(schema, inner, item))
                .collect::<Option<Vec<_>>>()
                .map(FieldValue::Array),
            scalar => cast_as(schema, inner, scalar),
        },
    }
}
