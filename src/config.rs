//! Per-collection configuration.
//!
//! [`CollectionOptions`] is built in code and holds everything a mount needs,
//! including trait objects. [`CollectionSettings`] is its data-only subset,
//! loadable from JSON:
//!
//! ```rust,ignore
//! let settings: CollectionSettings = serde_json::from_str(r#"{
//!     "q": ["title", "body"],
//!     "acl_name": "posts",
//!     "allowed_regex_fields": ["title"],
//!     "max_rows": 50,
//!     "capabilities": {"delete": false}
//! }"#)?;
//! let options = CollectionOptions::default()
//!     .with_settings(settings)
//!     .authorizer(Arc::new(MyAuthorizer));
//! ```

use serde::Deserialize;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

use crate::acl::Authorizer;
use crate::filtering::{DEFAULT_MAX_ROWS, DEFAULT_REGEX_FLAGS, Filter};
use crate::payload::InputTransformer;

/// Which operations a collection exposes. All are on by default.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Capabilities {
    pub list: bool,
    pub get: bool,
    pub create: bool,
    pub update: bool,
    pub delete: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            list: true,
            get: true,
            create: true,
            update: true,
            delete: true,
        }
    }
}

impl Capabilities {
    #[must_use]
    pub const fn read_only() -> Self {
        Self {
            list: true,
            get: true,
            create: false,
            update: false,
            delete: false,
        }
    }
}

#[derive(Clone)]
pub struct CollectionOptions {
    /// Fields searched by `?q=`. `None` leaves `q` as an ordinary filter key.
    pub q: Option<Vec<String>>,
    /// Base name for permissions, e.g. `posts` asks for `posts.list`.
    pub acl_name: Option<String>,
    /// Fields whose string filters match as case-insensitive substrings.
    pub allowed_regex_fields: Vec<String>,
    pub regex_flags: String,
    /// Stripped from create and update payloads.
    pub read_only_fields: Option<Vec<String>>,
    pub input_transformer: Option<Arc<dyn InputTransformer>>,
    /// Always applied to list queries; request filters override its keys.
    pub list_query: Filter,
    pub max_rows: u64,
    /// Projection applied to list and get, e.g. `"+secret"` to reveal a
    /// hidden field.
    pub extra_selects: Option<String>,
    pub capabilities: Capabilities,
    /// Return stored documents as is instead of hydrating them through the
    /// schema.
    pub use_lean: bool,
    pub authorizer: Option<Arc<dyn Authorizer>>,
    raw_list_query: Option<Map<String, Value>>,
}

impl Default for CollectionOptions {
    fn default() -> Self {
        Self {
            q: None,
            acl_name: None,
            allowed_regex_fields: Vec::new(),
            regex_flags: DEFAULT_REGEX_FLAGS.to_string(),
            read_only_fields: None,
            input_transformer: None,
            list_query: Filter::default(),
            max_rows: DEFAULT_MAX_ROWS,
            extra_selects: None,
            capabilities: Capabilities::default(),
            use_lean: true,
            authorizer: None,
            raw_list_query: None,
        }
    }
}

impl fmt::Debug for CollectionOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionOptions")
            .field("q", &self.q)
            .field("acl_name", &self.acl_name)
            .field("allowed_regex_fields", &self.allowed_regex_fields)
            .field("regex_flags", &self.regex_flags)
            .field("read_only_fields", &self.read_only_fields)
            .field("input_transformer", &self.input_transformer.is_some())
            .field("list_query", &self.list_query)
            .field("max_rows", &self.max_rows)
            .field("extra_selects", &self.extra_selects)
            .field("capabilities", &self.capabilities)
            .field("use_lean", &self.use_lean)
            .field("authorizer", &self.authorizer.is_some())
            .finish_non_exhaustive()
    }
}

impl CollectionOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn search_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.q = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn acl_name(mut self, name: impl Into<String>) -> Self {
        self.acl_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn allowed_regex_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_regex_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn regex_flags(mut self, flags: impl Into<String>) -> Self {
        self.regex_flags = flags.into();
        self
    }

    #[must_use]
    pub fn read_only_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.read_only_fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn input_transformer(mut self, transformer: Arc<dyn InputTransformer>) -> Self {
        self.input_transformer = Some(transformer);
        self
    }

    #[must_use]
    pub fn list_query(mut self, filter: Filter) -> Self {
        self.list_query = filter;
        self
    }

    #[must_use]
    pub fn max_rows(mut self, max_rows: u64) -> Self {
        self.max_rows = max_rows;
        self
    }

    #[must_use]
    pub fn extra_selects(mut self, projection: impl Into<String>) -> Self {
        self.extra_selects = Some(projection.into());
        self
    }

    #[must_use]
    pub fn capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    #[must_use]
    pub fn use_lean(mut self, use_lean: bool) -> Self {
        self.use_lean = use_lean;
        self
    }

    #[must_use]
    pub fn authorizer(mut self, authorizer: Arc<dyn Authorizer>) -> Self {
        self.authorizer = Some(authorizer);
        self
    }

    /// Overwrites every option the settings specify. A raw `list_query` is
    /// cast against the collection schema when the router is built and then
    /// layered over [`CollectionOptions::list_query`].
    #[must_use]
    pub fn with_settings(mut self, settings: CollectionSettings) -> Self {
        if settings.q.is_some() {
            self.q = settings.q;
        }
        if settings.acl_name.is_some() {
            self.acl_name = settings.acl_name;
        }
        if let Some(fields) = settings.allowed_regex_fields {
            self.allowed_regex_fields = fields;
        }
        if let Some(flags) = settings.regex_flags {
            self.regex_flags = flags;
        }
        if settings.read_only_fields.is_some() {
            self.read_only_fields = settings.read_only_fields;
        }
        if settings.list_query.is_some() {
            self.raw_list_query = settings.list_query;
        }
        if let Some(max_rows) = settings.max_rows {
            self.max_rows = max_rows;
        }
        if settings.extra_selects.is_some() {
            self.extra_selects = settings.extra_selects;
        }
        if let Some(capabilities) = settings.capabilities {
            self.capabilities = capabilities;
        }
        if let Some(use_lean) = settings.use_lean {
            self.use_lean = use_lean;
        }
        self
    }

    pub(crate) fn take_raw_list_query(&mut self) -> Option<Map<String, Value>> {
        self.raw_list_query.take()
    }
}

/// Data-only collection options. Every field is optional; unset fields keep
/// the [`CollectionOptions`] value they are applied to.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct CollectionSettings {
    pub q: Option<Vec<String>>,
    pub acl_name: Option<String>,
    pub allowed_regex_fields: Option<Vec<String>>,
    pub regex_flags: Option<String>,
    pub read_only_fields: Option<Vec<String>>,
    /// Raw filter in query form, e.g. `{"deleted": "false"}`.
    pub list_query: Option<Map<String, Value>>,
    pub max_rows: Option<u64>,
    pub extra_selects: Option<String>,
    pub capabilities: Option<Capabilities>,
    pub use_lean: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let options = CollectionOptions::default();
        assert_eq!(options.max_rows, 100);
        assert!(options.use_lean);
        assert_eq!(options.regex_flags, "i");
        assert_eq!(options.capabilities, Capabilities::default());
        assert!(options.q.is_none());
        assert!(options.list_query.is_empty());
    }

    #[test]
    fn test_settings_from_json() {
        let settings: CollectionSettings = serde_json::from_value(json!({
            "q": ["title"],
            "max_rows": 25,
            "capabilities": {"delete": false},
            "list_query": {"deleted": "false"}
        }))
        .unwrap();

        let mut options = CollectionOptions::default()
            .acl_name("posts")
            .with_settings(settings);
        assert_eq!(options.q, Some(vec!["title".to_string()]));
        assert_eq!(options.max_rows, 25);
        assert_eq!(options.acl_name.as_deref(), Some("posts"));
        assert!(!options.capabilities.delete);
        assert!(options.capabilities.list);
        assert_eq!(
            options.take_raw_list_query().map(Value::Object),
            Some(json!({"deleted": "false"}))
        );
    }

    #[test]
    fn test_builder_chain() {
        let options = CollectionOptions::new()
            .search_fields(["title", "body"])
            .read_only_fields(["created_at"])
            .allowed_regex_fields(["title"])
            .regex_flags("")
            .max_rows(10)
            .use_lean(false)
            .capabilities(Capabilities::read_only());

        assert_eq!(options.q.as_ref().map(Vec::len), Some(2));
        assert_eq!(options.read_only_fields, Some(vec!["created_at".to_string()]));
        assert_eq!(options.regex_flags, "");
        assert!(!options.use_lean);
        assert!(!options.capabilities.create);
    }
}
