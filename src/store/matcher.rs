//! In-process evaluation of typed filters against JSON documents.
//!
//! Stored values are re-cast through the schema before comparing, so a date
//! stored as an RFC 3339 string compares as a date. A field holding an array
//! matches when the array itself or any of its elements matches. Missing
//! fields compare as `null`.

use std::cmp::Ordering;

use crate::filtering::cast::{CastMode, cast_value};
use crate::filtering::{Comparator, FieldCondition, Filter, Operand, SortDirection, SortSpec};
use crate::schema::SchemaCaster;
use crate::value::{Document, FieldValue};

#[must_use]
pub fn matches(filter: &Filter, document: &Document, schema: &dyn SchemaCaster) -> bool {
    let fields_hold = filter.fields.iter().all(|(field, condition)| {
        let stored = stored_value(document, field, schema);
        condition_holds(condition, &stored)
    });

    // An empty disjunction imposes nothing.
    let or_holds = filter.or.as_ref().is_none_or(|clauses| {
        clauses.is_empty() || clauses.iter().any(|clause| matches(clause, document, schema))
    });

    fields_hold && or_holds
}

fn stored_value(document: &Document, field: &str, schema: &dyn SchemaCaster) -> FieldValue {
    match document.get(field) {
        None => FieldValue::Null,
        Some(raw) => cast_value(schema, field, raw, CastMode::Query)
            .unwrap_or_else(|_| FieldValue::from_json(raw.clone())),
    }
}

/// The value itself, plus its elements when it is an array.
fn candidates(stored: &FieldValue) -> Vec<&FieldValue> {
    let mut all = vec![stored];
    if let FieldValue::Array(items) = stored {
        all.extend(items);
    }
    all
}

fn condition_holds(condition: &FieldCondition, stored: &FieldValue) -> bool {
    match condition {
        FieldCondition::Equals(expected) => equals(stored, expected),
        FieldCondition::Pattern(pattern) => candidates(stored)
            .into_iter()
            .any(|candidate| matches!(candidate, FieldValue::String(s) if pattern.is_match(s))),
        FieldCondition::Comparison(comparison) => comparison
            .iter()
            .all(|(comparator, operand)| comparator_holds(comparator, operand, stored)),
    }
}

fn equals(stored: &FieldValue, expected: &FieldValue) -> bool {
    candidates(stored).into_iter().any(|candidate| candidate.loose_eq(expected))
}

fn comparator_holds(comparator: Comparator, operand: &Operand, stored: &FieldValue) -> bool {
    match (comparator, operand) {
        (Comparator::In, Operand::List(list)) => {
            list.iter().any(|expected| equals(stored, expected))
        }
        (Comparator::In, Operand::Value(expected)) => equals(stored, expected),
        (_, Operand::List(list)) => {
            comparator_holds(comparator, &Operand::Value(FieldValue::Array(list.clone())), stored)
        }
        (Comparator::Eq, Operand::Value(expected)) => equals(stored, expected),
        (Comparator::Ne, Operand::Value(expected)) => !equals(stored, expected),
        (range, Operand::Value(expected)) => candidates(stored).into_iter().any(|candidate| {
            candidate
                .compare(expected)
                .is_some_and(|ordering| range_accepts(range, ordering))
        }),
    }
}

fn range_accepts(comparator: Comparator, ordering: Ordering) -> bool {
    match comparator {
        Comparator::Gt => ordering == Ordering::Greater,
        Comparator::Gte => ordering != Ordering::Less,
        Comparator::Lt => ordering == Ordering::Less,
        Comparator::Lte => ordering != Ordering::Greater,
        Comparator::Eq | Comparator::In => ordering == Ordering::Equal,
        Comparator::Ne => ordering != Ordering::Equal,
    }
}

/// Stable sort by one field using the cross-type ordering of
/// [`FieldValue::sort_cmp`].
pub fn sort_documents(documents: &mut [Document], sort: &SortSpec, schema: &dyn SchemaCaster) {
    documents.sort_by(|a, b| {
        let a = stored_value(a, &sort.field, schema);
        let b = stored_value(b, &sort.field, schema);
        let ordering = a.sort_cmp(&b);
        match sort.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    });
}
