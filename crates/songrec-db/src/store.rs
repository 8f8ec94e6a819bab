//! Document store trait
//!
//! A schemaless key/document store addressed by collection name. Each
//! document carries its primary key under `_id`. Every single-document
//! mutation is atomic; nothing spans documents.

use async_trait::async_trait;
use bson::{Bson, Document};

use crate::error::{Result, StoreError};

/// Primary key field of every document
pub const ID_FIELD: &str = "_id";

/// Equality filter on one top-level field
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub field: String,
    pub value: Bson,
}

impl Filter {
    pub fn id(value: impl Into<Bson>) -> Self {
        Self::eq(ID_FIELD, value)
    }

    pub fn eq(field: &str, value: impl Into<Bson>) -> Self {
        Self {
            field: field.to_string(),
            value: value.into(),
        }
    }

    pub fn is_id(&self) -> bool {
        self.field == ID_FIELD
    }
}

/// Unique constraint over a combination of top-level fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueIndex {
    pub name: String,
    pub fields: Vec<String>,
}

impl UniqueIndex {
    pub fn new(name: &str, fields: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
        }
    }
}

/// Abstract document store
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Append `items` to the array `field` of the document `id`, creating
    /// the document (and the array) if absent. One atomic mutation.
    async fn push_upsert(&self, collection: &str, id: Bson, field: &str, items: Vec<Bson>)
        -> Result<()>;

    /// Insert a new document. The document must carry `_id`.
    ///
    /// Fails with `DuplicateKey` when `_id` or a unique index collides.
    async fn insert_one(&self, collection: &str, document: Document) -> Result<()>;

    /// First document matching `filter`, `None` when there is none
    async fn find_one(&self, collection: &str, filter: &Filter) -> Result<Option<Document>>;

    /// Delete at most one matching document; returns how many were deleted
    async fn delete_one(&self, collection: &str, filter: &Filter) -> Result<u64>;

    /// Number of documents in the collection (0 if it does not exist)
    async fn count(&self, collection: &str) -> Result<u64>;

    /// Create the unique index if it does not exist yet
    async fn create_unique_index(&self, collection: &str, index: &UniqueIndex) -> Result<()>;

    /// Drop the collection with all documents and indexes
    async fn drop_collection(&self, collection: &str) -> Result<()>;
}

/// Names end up inside SQL identifiers, so only `[A-Za-z0-9_]` is accepted
pub(crate) fn validate_name(name: &str) -> Result<&str> {
    let valid = !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(name)
    } else {
        Err(StoreError::InvalidName(name.to_string()))
    }
}
