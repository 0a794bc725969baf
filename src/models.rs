use serde::Deserialize;
use serde_json::{Map, Value};
use url::form_urlencoded;
use utoipa::IntoParams;

/// Query keys that control paging and sorting and never reach the filter.
pub const RESERVED_KEYS: [&str; 4] = ["_sort", "_order", "_start", "_end"];

/// Paging and sorting parameters of a list request, in the react-admin
/// `simple-rest` convention.
///
/// Every other query parameter is a filter: `field=value` for equality,
/// `field_gte=10` style keys for comparisons (`eq`, `gt`, `gte`, `lt`, `lte`,
/// `ne`, `in`, `nin`) and `q` for free-text search.
///
/// Example: `GET /posts?_start=0&_end=25&_sort=title&_order=ASC&views_gte=10`
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListParams {
    /// Field to sort on. `id` sorts on the internal identifier.
    #[serde(rename = "_sort")]
    #[param(example = "title")]
    pub sort: Option<String>,
    /// `ASC` for ascending, anything else for descending.
    #[serde(rename = "_order")]
    #[param(example = "ASC")]
    pub order: Option<String>,
    /// Offset of the first row.
    #[serde(rename = "_start")]
    #[param(example = "0")]
    pub start: Option<String>,
    /// Offset one past the last row.
    #[serde(rename = "_end")]
    #[param(example = "25")]
    pub end: Option<String>,
}

impl ListParams {
    /// Picks the reserved keys out of a parsed query. Non-string values
    /// (repeated keys) are ignored.
    #[must_use]
    pub fn from_query(query: &Map<String, Value>) -> Self {
        let text = |key: &str| query.get(key).and_then(Value::as_str).map(str::to_string);
        Self {
            sort: text("_sort"),
            order: text("_order"),
            start: text("_start"),
            end: text("_end"),
        }
    }
}

/// Parses a raw query string into a mapping.
///
/// Repeated keys and `key[]` collect into arrays; `key[sub]` builds a nested
/// mapping one level deep. Values stay strings; typing is left to the
/// filter casting.
#[must_use]
pub fn parse_query_string(query: &str) -> Map<String, Value> {
    let mut parsed = Map::new();

    for (key, value) in form_urlencoded::parse(query.as_bytes()) {
        let value = Value::String(value.into_owned());

        if let Some(base) = key.strip_suffix("[]") {
            append(&mut parsed, base, value, true);
        } else if let Some((base, sub)) = nested_key(&key) {
            match parsed
                .entry(base.to_string())
                .or_insert_with(|| Value::Object(Map::new()))
            {
                Value::Object(nested) => {
                    nested.insert(sub.to_string(), value);
                }
                _ => tracing::debug!(key = %key, "ignoring nested key for a non-object value"),
            }
        } else {
            append(&mut parsed, &key, value, false);
        }
    }

    parsed
}

fn nested_key(key: &str) -> Option<(&str, &str)> {
    let (base, rest) = key.split_once('[')?;
    let sub = rest.strip_suffix(']')?;
    if base.is_empty() || sub.is_empty() || sub.contains(['[', ']']) {
        return None;
    }
    Some((base, sub))
}

fn append(parsed: &mut Map<String, Value>, key: &str, value: Value, force_array: bool) {
    match parsed.get_mut(key) {
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None if force_array => {
            parsed.insert(key.to_string(), Value::Array(vec![value]));
        }
        None => {
            parsed.insert(key.to_string(), value);
        }
    }
}

/// Returns the query without its paging and sorting keys.
#[must_use]
pub fn filter_get_list(mut query: Map<String, Value>) -> Map<String, Value> {
    for key in RESERVED_KEYS {
        query.shift_remove(key);
    }
    query
}
