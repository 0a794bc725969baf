use axum::http::header::{HeaderMap, HeaderName, HeaderValue};

use crate::models::ListParams;

/// Page size used when a mount does not configure one.
pub const DEFAULT_MAX_ROWS: u64 = 100;

pub static TOTAL_COUNT_HEADER: HeaderName = HeaderName::from_static("x-total-count");

/// Rows to skip and rows to return.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Window {
    pub skip: u64,
    pub limit: u64,
}

/// Resolves `_start`/`_end` into a window.
///
/// `skip` is `_start` (0 when absent or unparsable). With `_end` the limit is
/// `_end - _start` clamped to `0..=max_rows`; without it the limit is
/// `max_rows`.
#[must_use]
pub fn parse_window(params: &ListParams, max_rows: u64) -> Window {
    let start = params.start.as_deref().and_then(parse_leading_int).unwrap_or(0);
    let skip = u64::try_from(start).unwrap_or(0);

    let limit = match params.end.as_deref().and_then(parse_leading_int) {
        Some(end) => {
            u64::try_from(end.saturating_sub(start)).map_or(0, |width| width.min(max_rows))
        }
        None => max_rows,
    };

    Window { skip, limit }
}

/// Leading integer of a string, ignoring surrounding whitespace and any
/// trailing garbage: `"10px"` is 10, `"px"` is nothing.
fn parse_leading_int(input: &str) -> Option<i64> {
    let trimmed = input.trim_start();
    let digits_start = usize::from(trimmed.starts_with(['+', '-']));
    let digits_end = trimmed[digits_start..]
        .find(|c: char| !c.is_ascii_digit())
        .map_or(trimmed.len(), |offset| digits_start + offset);

    if digits_end == digits_start {
        return None;
    }
    trimmed[..digits_end].parse().ok()
}

/// Builds the header carrying the total number of matches.
#[must_use]
pub fn total_count_header(total: u64) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(&TOTAL_COUNT_HEADER, HeaderValue::from(total));
    headers
}
