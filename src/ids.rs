//! Mapping between the public `id` the admin UI works with and the store's
//! internal `_id`. Only top-level keys are touched.

use serde_json::{Map, Value};

pub const PUBLIC_ID: &str = "id";
pub const INTERNAL_ID: &str = "_id";

/// Renames a top-level `id` to `_id`, keeping its position. When both are
/// present, `id` wins.
#[must_use]
pub fn convert_id(map: Map<String, Value>) -> Map<String, Value> {
    if !map.contains_key(PUBLIC_ID) {
        return map;
    }

    map.into_iter()
        .filter(|(key, _)| key != INTERNAL_ID)
        .map(|(key, value)| {
            if key == PUBLIC_ID {
                (INTERNAL_ID.to_string(), value)
            } else {
                (key, value)
            }
        })
        .collect()
}

/// Exposes `_id` as `id`, placed first. An `id` the document already carries
/// is kept; a document without `_id` gets no `id`.
#[must_use]
pub fn virtual_id(mut document: Map<String, Value>) -> Map<String, Value> {
    let Some(internal) = document.shift_remove(INTERNAL_ID) else {
        return document;
    };
    if document.contains_key(PUBLIC_ID) {
        return document;
    }

    let mut exposed = Map::with_capacity(document.len() + 1);
    exposed.insert(PUBLIC_ID.to_string(), internal);
    exposed.extend(document);
    exposed
}

#[must_use]
pub fn virtual_ids(documents: Vec<Map<String, Value>>) -> Vec<Map<String, Value>> {
    documents.into_iter().map(virtual_id).collect()
}
