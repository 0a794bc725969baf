use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::errors::ApiError;

/// Removes the read-only fields from a write payload. With no list
/// configured the payload is returned unchanged.
#[must_use]
pub fn filter_read_only(
    mut payload: Map<String, Value>,
    read_only: Option<&[String]>,
) -> Map<String, Value> {
    for field in read_only.unwrap_or_default() {
        payload.shift_remove(field);
    }
    payload
}

/// Rewrites create and update payloads before they are stored.
///
/// Runs after read-only fields are stripped and before `id` is renamed to
/// `_id`. Returning an error aborts the request with that error.
#[async_trait]
pub trait InputTransformer: Send + Sync {
    async fn transform(&self, input: Map<String, Value>) -> Result<Map<String, Value>, ApiError>;
}
