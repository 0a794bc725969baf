//! The document store seam.
//!
//! Routes talk to a [`DocumentStore`]; [`SeaOrmStore`] is the bundled
//! backend. Stores receive filters already typed and cast, and return plain
//! JSON documents keyed by `_id`.

use async_trait::async_trait;

use crate::filtering::{Filter, SortSpec};
use crate::schema::SchemaCaster;
use crate::value::Document;

pub mod entity;
pub mod matcher;
pub mod projection;
mod sql;

pub use projection::Projection;
pub use sql::{CollectionStore, SeaOrmStore};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("invalid document id: {0}")]
    InvalidId(String),
    #[error("validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
    #[error("duplicate document: {0}")]
    Duplicate(String),
    #[error("document not found")]
    NotFound,
    #[error(transparent)]
    Database(#[from] sea_orm::DbErr),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Messages safe to show to the caller.
    #[must_use]
    pub fn user_details(&self) -> Vec<String> {
        match self {
            Self::InvalidId(id) => vec![format!(
                "Cast to ObjectId failed for value \"{id}\" at path \"_id\""
            )],
            Self::Validation(messages) => messages.clone(),
            Self::Duplicate(detail) => vec![detail.clone()],
            Self::NotFound => vec!["Element does not exist".to_string()],
            Self::Database(_) | Self::Serialization(_) => Vec::new(),
        }
    }

    /// Details that are logged but never sent.
    #[must_use]
    pub fn internal_details(&self) -> Option<String> {
        match self {
            Self::Database(_) | Self::Serialization(_) => Some(self.to_string()),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FindOptions {
    pub sort: Option<SortSpec>,
    pub skip: u64,
    pub limit: Option<u64>,
    pub projection: Option<Projection>,
    /// `false` hydrates documents through the schema before returning them.
    pub lean: bool,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Schema the filter pipeline casts against.
    fn schema(&self) -> &dyn SchemaCaster;

    async fn find(
        &self,
        filter: &Filter,
        options: &FindOptions,
    ) -> Result<Vec<Document>, StoreError>;

    async fn count(&self, filter: &Filter) -> Result<u64, StoreError>;

    /// # Errors
    ///
    /// [`StoreError::InvalidId`] for a malformed id, [`StoreError::NotFound`]
    /// when nothing matches.
    async fn find_by_id(
        &self,
        id: &str,
        projection: Option<&Projection>,
        lean: bool,
    ) -> Result<Document, StoreError>;

    /// Validates and inserts a document, returning it as stored.
    async fn create(&self, document: Document) -> Result<Document, StoreError>;

    /// Sets the given fields and returns the updated document.
    async fn find_and_update(
        &self,
        id: &str,
        update: Document,
        lean: bool,
    ) -> Result<Document, StoreError>;

    /// Removes a document and returns it.
    async fn find_and_delete(&self, id: &str, lean: bool) -> Result<Document, StoreError>;
}
