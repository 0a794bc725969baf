use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, Database, DatabaseConnection, DbErr,
    EntityTrait, QueryFilter, QueryOrder, Schema, Set, SqlErr, TransactionTrait,
    sea_query::Index,
};
use serde_json::Value;
use std::sync::Arc;

use super::entity::{self, Column, Entity};
use super::matcher::{matches, sort_documents};
use super::projection::{Projection, project};
use super::{DocumentStore, FindOptions, StoreError};
use crate::filtering::Filter;
use crate::ids::INTERNAL_ID;
use crate::object_id::ObjectId;
use crate::schema::{CollectionSchema, SchemaCaster};
use crate::value::Document;

const DOCUMENT_INDEX: &str = "idx_documents_collection_doc_id";

/// Document collections stored in a single SQL table through sea-orm.
///
/// Filters are evaluated in process after loading a collection, which keeps
/// the backend portable across SQLite, Postgres and MySQL at the cost of
/// scanning. Use it for small collections, tests and demos.
#[derive(Clone, Debug)]
pub struct SeaOrmStore {
    db: DatabaseConnection,
}

impl SeaOrmStore {
    /// Connects and creates the backing table if needed.
    ///
    /// # Errors
    ///
    /// Fails when the connection or the table creation fails.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let db = Database::connect(url).await?;
        Self::new(db).await
    }

    /// Wraps an existing connection and creates the backing table if needed.
    ///
    /// # Errors
    ///
    /// Fails when the table or its index cannot be created.
    pub async fn new(db: DatabaseConnection) -> Result<Self, StoreError> {
        let backend = db.get_database_backend();

        let mut table = Schema::new(backend).create_table_from_entity(Entity);
        table.if_not_exists();
        db.execute(backend.build(&table)).await?;

        let index = Index::create()
            .name(DOCUMENT_INDEX)
            .table(Entity)
            .col(Column::Collection)
            .col(Column::DocId)
            .unique()
            .if_not_exists()
            .to_owned();
        db.execute(backend.build(&index)).await?;

        Ok(Self { db })
    }

    #[must_use]
    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Handle on one named collection.
    #[must_use]
    pub fn collection(&self, name: impl Into<String>, schema: CollectionSchema) -> CollectionStore {
        CollectionStore {
            db: self.db.clone(),
            name: name.into(),
            schema: Arc::new(schema),
        }
    }
}

/// One collection of a [`SeaOrmStore`].
#[derive(Clone, Debug)]
pub struct CollectionStore {
    db: DatabaseConnection,
    name: String,
    schema: Arc<CollectionSchema>,
}

impl CollectionStore {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    async fn load_all(&self) -> Result<Vec<Document>, StoreError> {
        let rows = Entity::find()
            .filter(Column::Collection.eq(self.name.as_str()))
            .order_by_asc(Column::Seq)
            .all(&self.db)
            .await?;

        rows.iter().map(decode).collect()
    }

    async fn load_one<C: ConnectionTrait>(
        &self,
        conn: &C,
        id: &str,
    ) -> Result<(entity::Model, Document), StoreError> {
        let id = parse_id(id)?;
        let row = Entity::find()
            .filter(Column::Collection.eq(self.name.as_str()))
            .filter(Column::DocId.eq(id.to_hex()))
            .one(conn)
            .await?
            .ok_or(StoreError::NotFound)?;

        let document = decode(&row)?;
        Ok((row, document))
    }

    fn present(&self, document: Document, projection: Option<&Projection>, lean: bool) -> Document {
        let document = if lean {
            document
        } else {
            self.schema.hydrate(document)
        };
        project(document, projection, self.schema.hidden_fields())
    }
}

/// Path ids are matched case-insensitively; filter values are not.
fn parse_id(id: &str) -> Result<ObjectId, StoreError> {
    ObjectId::parse_str(&id.to_ascii_lowercase())
        .map_err(|_| StoreError::InvalidId(id.to_string()))
}

fn decode(row: &entity::Model) -> Result<Document, StoreError> {
    Ok(serde_json::from_str(&row.body)?)
}

fn write_error(err: DbErr) -> StoreError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => StoreError::Duplicate(detail),
        _ => StoreError::Database(err),
    }
}

#[async_trait]
impl DocumentStore for CollectionStore {
    fn schema(&self) -> &dyn SchemaCaster {
        self.schema.as_ref()
    }

    async fn find(
        &self,
        filter: &Filter,
        options: &FindOptions,
    ) -> Result<Vec<Document>, StoreError> {
        let mut documents: Vec<Document> = self
            .load_all()
            .await?
            .into_iter()
            .filter(|document| matches(filter, document, self.schema.as_ref()))
            .collect();

        if let Some(sort) = &options.sort {
            sort_documents(&mut documents, sort, self.schema.as_ref());
        }

        let skip = usize::try_from(options.skip).unwrap_or(usize::MAX);
        let limit = options
            .limit
            .map_or(usize::MAX, |limit| usize::try_from(limit).unwrap_or(usize::MAX));

        Ok(documents
            .into_iter()
            .skip(skip)
            .take(limit)
            .map(|document| self.present(document, options.projection.as_ref(), options.lean))
            .collect())
    }

    async fn count(&self, filter: &Filter) -> Result<u64, StoreError> {
        let total = self
            .load_all()
            .await?
            .iter()
            .filter(|document| matches(filter, document, self.schema.as_ref()))
            .count();
        Ok(u64::try_from(total).unwrap_or(u64::MAX))
    }

    async fn find_by_id(
        &self,
        id: &str,
        projection: Option<&Projection>,
        lean: bool,
    ) -> Result<Document, StoreError> {
        let (_, document) = self.load_one(&self.db, id).await?;
        Ok(self.present(document, projection, lean))
    }

    async fn create(&self, document: Document) -> Result<Document, StoreError> {
        let document = self.schema.cast_document(document).map_err(StoreError::Validation)?;
        let doc_id = document
            .get(INTERNAL_ID)
            .and_then(Value::as_str)
            .ok_or_else(|| StoreError::InvalidId(String::new()))?
            .to_string();

        entity::ActiveModel {
            collection: Set(self.name.clone()),
            doc_id: Set(doc_id.clone()),
            body: Set(serde_json::to_string(&document)?),
            ..Default::default()
        }
        .insert(&self.db)
        .await
        .map_err(write_error)?;

        tracing::debug!(collection = %self.name, id = %doc_id, "document created");
        Ok(document)
    }

    async fn find_and_update(
        &self,
        id: &str,
        update: Document,
        lean: bool,
    ) -> Result<Document, StoreError> {
        let mut update = self.schema.cast_partial(update).map_err(StoreError::Validation)?;

        let txn = self.db.begin().await?;
        let (row, mut document) = self.load_one(&txn, id).await?;

        if let Some(new_id) = update.shift_remove(INTERNAL_ID) {
            if document.get(INTERNAL_ID) != Some(&new_id) {
                return Err(StoreError::Validation(vec![format!(
                    "Performing an update on the path '{INTERNAL_ID}' would modify the immutable field '{INTERNAL_ID}'"
                )]));
            }
        }
        for (field, value) in update {
            document.insert(field, value);
        }

        let mut active: entity::ActiveModel = row.into();
        active.body = Set(serde_json::to_string(&document)?);
        active.update(&txn).await.map_err(write_error)?;
        txn.commit().await?;

        Ok(self.present(document, None, lean))
    }

    async fn find_and_delete(&self, id: &str, lean: bool) -> Result<Document, StoreError> {
        let txn = self.db.begin().await?;
        let (row, document) = self.load_one(&txn, id).await?;
        Entity::delete_by_id(row.seq).exec(&txn).await?;
        txn.commit().await?;

        tracing::debug!(collection = %self.name, id = %id, "document deleted");
        Ok(self.present(document, None, lean))
    }
}
