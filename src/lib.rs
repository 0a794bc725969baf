//! # doccrate
//!
//! Expose a document collection as a react-admin compatible REST API in Axum.
//!
//! The router speaks the `simple-rest` data provider's dialect: `_start` and
//! `_end` for paging, `_sort` and `_order` for sorting, a total count in
//! `X-Total-Count`, `id` on the wire mapped to the store's `_id`. Any other
//! query parameter is a filter. Filters are typed against the collection's
//! schema before they reach the store, and values that do not fit are
//! dropped instead of failing the request.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use doccrate::{CollectionOptions, CollectionSchema, FieldType, SeaOrmStore, collection_router};
//!
//! let store = SeaOrmStore::connect("sqlite::memory:").await?;
//! let posts = store.collection(
//!     "posts",
//!     CollectionSchema::new()
//!         .field("title", FieldType::String)
//!         .field("views", FieldType::Number),
//! );
//!
//! let app = axum::Router::new().nest(
//!     "/posts",
//!     collection_router(
//!         posts,
//!         CollectionOptions::new()
//!             .search_fields(["title"])
//!             .allowed_regex_fields(["title"]),
//!     ),
//! );
//! ```
//!
//! `GET /posts?views_gte=10&q=rust&_sort=views&_order=DESC&_start=0&_end=25`
//! then returns posts with at least ten views whose title contains "rust",
//! most viewed first.
//!
//! ## Filtering
//!
//! See [`filtering`] for the full set of query forms. The building blocks
//! ([`cast_filter`], [`parse_query`], [`convert_id`], [`virtual_id`],
//! [`filter_read_only`]) are public for use in custom handlers.
//!
//! ## Access control
//!
//! Set both [`CollectionOptions::acl_name`] and an [`Authorizer`]; each route
//! then asks for `{acl_name}.list`, `.create`, `.edit` or `.delete`.

pub mod acl;
pub mod config;
pub mod errors;
pub mod filtering;
pub mod ids;
pub mod models;
pub mod object_id;
pub mod payload;
pub mod routes;
pub mod schema;
pub mod store;
pub mod value;

pub use acl::{AclAction, Authorizer};
pub use config::{Capabilities, CollectionOptions, CollectionSettings};
pub use errors::ApiError;
pub use filtering::{
    CastError, FieldCondition, Filter, Pattern, cast_field, cast_filter, parse_query, to_pattern,
};
pub use ids::{convert_id, virtual_id, virtual_ids};
pub use models::{ListParams, filter_get_list, parse_query_string};
pub use object_id::ObjectId;
pub use payload::{InputTransformer, filter_read_only};
pub use routes::collection_router;
pub use schema::{CollectionSchema, FieldSpec, FieldType, SchemaCaster};
pub use store::{CollectionStore, DocumentStore, FindOptions, SeaOrmStore, StoreError};
pub use value::{Document, FieldValue};
