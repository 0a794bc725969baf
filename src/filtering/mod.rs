//! Query-string filtering for list endpoints.
//!
//! A list request's query is parsed into a raw mapping (see
//! [`parse_query_string`](crate::models::parse_query_string)) and translated
//! into a typed [`Filter`]:
//!
//! - `field=value` casts `value` against the field's declared type and
//!   becomes equality.
//! - `field=a&field=b` becomes an inclusion list.
//! - `field_gte=10`, `field_ne=x`, `field_in[]=a` etc. become comparator
//!   expressions on `field`.
//! - `field=text` on a regex-enabled field becomes an escaped,
//!   case-insensitive substring match.
//! - `q=text` is expanded over the configured search fields as a
//!   disjunction.
//!
//! Values that fail to cast are dropped with a `debug` log. Filtering is
//! best-effort: a bad key never fails the request.

pub mod cast;
pub mod conditions;
pub mod operators;
pub mod pagination;
pub mod search;
pub mod sort;

pub use cast::{CastError, cast_field};
pub use conditions::{Comparison, FieldCondition, Filter, Operand, cast_filter};
pub use operators::{Comparator, Operator, split_operator};
pub use pagination::{
    DEFAULT_MAX_ROWS, TOTAL_COUNT_HEADER, Window, parse_window, total_count_header,
};
pub use search::{
    DEFAULT_REGEX_FLAGS, Pattern, PatternError, SEARCH_KEY, parse_query, to_pattern,
    unsupported_regex_flags,
};
pub use sort::{SortDirection, SortSpec, parse_sorting};
