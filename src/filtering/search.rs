use regex::{Regex, RegexBuilder};
use serde::{Serialize, Serializer, ser::SerializeMap};
use serde_json::{Map, Value};

use super::conditions::{FieldCondition, Filter, cast_filter};
use crate::schema::SchemaCaster;
use crate::value::FieldValue;

pub const DEFAULT_REGEX_FLAGS: &str = "i";
/// Query key holding the free-text search term.
pub const SEARCH_KEY: &str = "q";
/// Longest search term accepted, in bytes.
pub const MAX_PATTERN_LENGTH: usize = 10_000;

#[derive(Debug, thiserror::Error)]
pub enum PatternError {
    #[error("search term is too long ({0} bytes)")]
    TooLong(usize),
    #[error(transparent)]
    Regex(#[from] regex::Error),
}

/// A literal substring match. The source is always escaped, so user input
/// never contributes pattern syntax.
#[derive(Clone, Debug)]
pub struct Pattern {
    source: String,
    flags: String,
    regex: Regex,
}

impl Pattern {
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn flags(&self) -> &str {
        &self.flags
    }

    #[must_use]
    pub fn is_match(&self, haystack: &str) -> bool {
        self.regex.is_match(haystack)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source && self.flags == other.flags
    }
}

impl Serialize for Pattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("$regex", &self.source)?;
        map.serialize_entry("$options", &self.flags)?;
        map.end()
    }
}

/// Flags in `flags` that [`to_pattern`] keeps but does not act on.
#[must_use]
pub fn unsupported_regex_flags(flags: &str) -> Vec<char> {
    flags.chars().filter(|flag| !matches!(flag, 'i' | 'm' | 's')).collect()
}

/// Builds an escaped pattern from user input.
///
/// `i`, `m` and `s` configure the matcher; any other flag is kept in
/// [`Pattern::flags`] and has no effect. An empty flag string is
/// case-sensitive.
///
/// # Errors
///
/// Fails when the input exceeds [`MAX_PATTERN_LENGTH`] or the escaped
/// pattern exceeds the regex size limit.
pub fn to_pattern(raw: &str, flags: &str) -> Result<Pattern, PatternError> {
    if raw.len() > MAX_PATTERN_LENGTH {
        return Err(PatternError::TooLong(raw.len()));
    }

    let source = regex::escape(raw);
    let mut builder = RegexBuilder::new(&source);
    for flag in flags.chars() {
        match flag {
            'i' => {
                builder.case_insensitive(true);
            }
            'm' => {
                builder.multi_line(true);
            }
            's' => {
                builder.dot_matches_new_line(true);
            }
            _ => {}
        }
    }

    Ok(Pattern {
        regex: builder.build()?,
        source,
        flags: flags.to_string(),
    })
}

/// Expands the `q` term of an already cast filter into one disjunct per
/// search field.
///
/// With `fields` unset the filter is returned untouched, `q` included.
/// Otherwise `q` is removed, and a non-empty term appends one clause per
/// field, in order, after any disjuncts the filter already had. A clause
/// whose value failed to cast is skipped. An empty or missing term leaves
/// `or` exactly as it was.
#[must_use]
pub fn parse_query(
    mut filter: Filter,
    schema: &dyn SchemaCaster,
    allowed_regex_fields: &[String],
    fields: Option<&[String]>,
    regex_flags: &str,
) -> Filter {
    let Some(fields) = fields else {
        return filter;
    };

    let term = match filter.fields.shift_remove(SEARCH_KEY) {
        Some(FieldCondition::Equals(FieldValue::String(term))) if !term.is_empty() => term,
        _ => return filter,
    };

    let clauses = filter.or.get_or_insert_with(Vec::new);
    for field in fields {
        let mut raw = Map::new();
        raw.insert(field.clone(), Value::String(term.clone()));

        let clause = cast_filter(raw, schema, allowed_regex_fields, regex_flags);
        if clause.is_empty() {
            tracing::debug!(field = %field, "skipping search field, term does not cast");
            continue;
        }
        clauses.push(clause);
    }

    filter
}
