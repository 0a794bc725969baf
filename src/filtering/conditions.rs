use indexmap::IndexMap;
use serde::{Serialize, Serializer, ser::SerializeMap};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::cast::{cast_elements, cast_field};
use super::operators::{Comparator, Operator, split_operator};
use super::search::{Pattern, to_pattern};
use crate::schema::SchemaCaster;
use crate::value::FieldValue;

/// Raw key carrying a disjunction, `{"$or": [{...}, {...}]}`.
pub const OR_KEY: &str = "$or";

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Operand {
    Value(FieldValue),
    List(Vec<FieldValue>),
}

/// Comparator expression for one field, e.g. `{"$gte": 10, "$lt": 20}`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Comparison(BTreeMap<Comparator, Operand>);

impl Comparison {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, comparator: Comparator, operand: Operand) {
        self.0.insert(comparator, operand);
    }

    #[must_use]
    pub fn with(mut self, comparator: Comparator, operand: Operand) -> Self {
        self.set(comparator, operand);
        self
    }

    #[must_use]
    pub fn get(&self, comparator: Comparator) -> Option<&Operand> {
        self.0.get(&comparator)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Comparator, &Operand)> {
        self.0.iter().map(|(comparator, operand)| (*comparator, operand))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for Comparison {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (comparator, operand) in &self.0 {
            map.serialize_entry(comparator.as_str(), operand)?;
        }
        map.end()
    }
}

/// What a single field must satisfy.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldCondition {
    Equals(FieldValue),
    Pattern(Pattern),
    Comparison(Comparison),
}

/// Typed, store-native filter. All field conditions must hold; when `or` is
/// set, at least one of its clauses must hold as well.
///
/// `or: None` and `or: Some(vec![])` are different states: the first means
/// no disjunction was ever requested.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Filter {
    pub fields: IndexMap<String, FieldCondition>,
    pub or: Option<Vec<Filter>>,
}

impl Filter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, field: impl Into<String>, condition: FieldCondition) -> Self {
        self.fields.insert(field.into(), condition);
        self
    }

    #[must_use]
    pub fn with_or(mut self, clauses: Vec<Filter>) -> Self {
        self.or = Some(clauses);
        self
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&FieldCondition> {
        self.fields.get(field)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.or.is_none()
    }

    /// Layers `overrides` on top of `self`: a field present in both takes
    /// the value from `overrides`, and so does `or` when `overrides` has one.
    #[must_use]
    pub fn merge(mut self, overrides: Filter) -> Filter {
        for (field, condition) in overrides.fields {
            self.fields.insert(field, condition);
        }
        if overrides.or.is_some() {
            self.or = overrides.or;
        }
        self
    }
}

impl Serialize for Filter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = self.fields.len() + usize::from(self.or.is_some());
        let mut map = serializer.serialize_map(Some(len))?;
        for (field, condition) in &self.fields {
            map.serialize_entry(field, condition)?;
        }
        if let Some(clauses) = &self.or {
            map.serialize_entry(OR_KEY, clauses)?;
        }
        map.end()
    }
}

/// Translates a raw query mapping into a typed [`Filter`].
///
/// Keys are processed in order. `field_operator` keys become comparator
/// expressions on `field`; plain keys become pattern matches (string values
/// on fields in `allowed_regex_fields`), inclusion lists (array values) or
/// equality. A value that does not cast drops its key and nothing else.
/// `$or` holding an array of mappings is translated recursively, any other
/// `$`-prefixed key is dropped.
#[must_use]
pub fn cast_filter(
    raw: Map<String, Value>,
    schema: &dyn SchemaCaster,
    allowed_regex_fields: &[String],
    regex_flags: &str,
) -> Filter {
    let mut filter = Filter::new();

    for (key, value) in raw {
        if key == OR_KEY {
            apply_disjunction(&mut filter, value, schema, allowed_regex_fields, regex_flags);
            continue;
        }
        if key.starts_with('$') {
            tracing::debug!(key = %key, "dropping raw operator key");
            continue;
        }

        if let Some((field, operator)) = split_operator(&key) {
            apply_operator(&mut filter, field, operator, &value, schema);
            continue;
        }

        if matches!(filter.fields.get(&key), Some(FieldCondition::Comparison(_))) {
            tracing::debug!(field = %key, "field already has a comparison, ignoring plain value");
            continue;
        }
        if let Some(condition) =
            plain_condition(&key, value, schema, allowed_regex_fields, regex_flags)
        {
            filter.fields.insert(key, condition);
        }
    }

    filter
}

fn apply_disjunction(
    filter: &mut Filter,
    value: Value,
    schema: &dyn SchemaCaster,
    allowed_regex_fields: &[String],
    regex_flags: &str,
) {
    let Value::Array(raw_clauses) = value else {
        tracing::debug!("dropping $or, expected an array of mappings");
        return;
    };

    let clauses = filter.or.get_or_insert_with(Vec::new);
    for raw_clause in raw_clauses {
        let Value::Object(raw_clause) = raw_clause else {
            tracing::debug!("dropping $or clause that is not a mapping");
            continue;
        };
        let clause = cast_filter(raw_clause, schema, allowed_regex_fields, regex_flags);
        if clause.is_empty() {
            tracing::debug!("dropping empty $or clause");
            continue;
        }
        clauses.push(clause);
    }
}

fn apply_operator(
    filter: &mut Filter,
    field: &str,
    operator: Operator,
    raw: &Value,
    schema: &dyn SchemaCaster,
) {
    let operand = match (operator.takes_list(), raw) {
        (true, Value::Array(items)) => Operand::List(cast_elements(schema, field, items)),
        (true, scalar) => match cast_field(schema, field, scalar) {
            Ok(value) => Operand::List(vec![value]),
            Err(err) => {
                tracing::debug!(error = %err, operator = operator.suffix(), "dropping filter key");
                return;
            }
        },
        (false, raw) => match cast_field(schema, field, raw) {
            Ok(value) => Operand::Value(value),
            Err(err) => {
                tracing::debug!(error = %err, operator = operator.suffix(), "dropping filter key");
                return;
            }
        },
    };

    let entry = filter
        .fields
        .entry(field.to_string())
        .or_insert_with(|| FieldCondition::Comparison(Comparison::new()));
    if !matches!(entry, FieldCondition::Comparison(_)) {
        *entry = FieldCondition::Comparison(Comparison::new());
    }
    if let FieldCondition::Comparison(comparison) = entry {
        comparison.set(operator.comparator(), operand);
    }
}

fn plain_condition(
    field: &str,
    value: Value,
    schema: &dyn SchemaCaster,
    allowed_regex_fields: &[String],
    regex_flags: &str,
) -> Option<FieldCondition> {
    match value {
        Value::String(term) if allowed_regex_fields.iter().any(|allowed| allowed == field) => {
            match to_pattern(&term, regex_flags) {
                Ok(pattern) => Some(FieldCondition::Pattern(pattern)),
                Err(err) => {
                    tracing::debug!(field = %field, error = %err, "dropping search pattern");
                    None
                }
            }
        }
        Value::Array(items) => Some(FieldCondition::Comparison(Comparison::new().with(
            Comparator::In,
            Operand::List(cast_elements(schema, field, &items)),
        ))),
        scalar => match cast_field(schema, field, &scalar) {
            Ok(value) => Some(FieldCondition::Equals(value)),
            Err(err) => {
                tracing::debug!(error = %err, "dropping filter key");
                None
            }
        },
    }
}
