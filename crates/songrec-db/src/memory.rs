//! In-process document store
//!
//! Used by tests and local runs. One mutex guards all collections, which
//! gives every single-document mutation the same atomicity the PostgreSQL
//! backend gets from row locks.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use bson::{Bson, Document};

use crate::error::{Result, StoreError};
use crate::store::{validate_name, DocumentStore, Filter, UniqueIndex, ID_FIELD};

#[derive(Debug, Default)]
struct Collection {
    /// Insertion order
    documents: Vec<Document>,
    indexes: Vec<UniqueIndex>,
}

impl Collection {
    fn position(&self, filter: &Filter) -> Option<usize> {
        self.documents
            .iter()
            .position(|doc| doc.get(&filter.field).is_some_and(|v| same_value(v, &filter.value)))
    }

    /// Name of the first unique constraint `candidate` would violate
    fn violated_index(&self, candidate: &Document) -> Option<String> {
        if let Some(id) = candidate.get(ID_FIELD) {
            if self.documents.iter().any(|doc| doc.get(ID_FIELD).is_some_and(|v| same_value(v, id))) {
                return Some(ID_FIELD.to_string());
            }
        }
        self.indexes
            .iter()
            .find(|index| {
                self.documents.iter().any(|doc| {
                    index.fields.iter().all(|field| {
                        same_value(
                            doc.get(field).unwrap_or(&Bson::Null),
                            candidate.get(field).unwrap_or(&Bson::Null),
                        )
                    })
                })
            })
            .map(|index| index.name.clone())
    }
}

/// Equality that ignores integer width, matching how JSONB compares numbers
fn same_value(a: &Bson, b: &Bson) -> bool {
    fn as_i64(value: &Bson) -> Option<i64> {
        match value {
            Bson::Int32(v) => Some(i64::from(*v)),
            Bson::Int64(v) => Some(*v),
            _ => None,
        }
    }
    match (as_i64(a), as_i64(b)) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<String, Collection>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Collection>> {
        // A panicking holder cannot leave a half-applied mutation behind:
        // every mutation below completes before the guard is dropped
        self.collections
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn push_upsert(
        &self,
        collection: &str,
        id: Bson,
        field: &str,
        items: Vec<Bson>,
    ) -> Result<()> {
        let name = validate_name(collection)?;
        let field = validate_name(field)?;
        let mut collections = self.lock();
        let coll = collections.entry(name.to_string()).or_default();

        match coll.position(&Filter::id(id.clone())) {
            Some(pos) => {
                let document = &mut coll.documents[pos];
                if !document.contains_key(field) {
                    document.insert(field, Bson::Array(Vec::new()));
                }
                match document.get_mut(field) {
                    Some(Bson::Array(existing)) => existing.extend(items),
                    other => {
                        return Err(StoreError::InvalidDocument {
                            collection: name.to_string(),
                            reason: format!(
                                "field '{}' must be an array but is {:?}",
                                field,
                                other.map(|value| value.element_type())
                            ),
                        })
                    }
                }
            }
            None => {
                let mut document = Document::new();
                document.insert(ID_FIELD, id);
                document.insert(field, Bson::Array(items));
                coll.documents.push(document);
            }
        }
        Ok(())
    }

    async fn insert_one(&self, collection: &str, document: Document) -> Result<()> {
        let name = validate_name(collection)?;
        if !document.contains_key(ID_FIELD) {
            return Err(StoreError::InvalidDocument {
                collection: name.to_string(),
                reason: format!("document has no '{}'", ID_FIELD),
            });
        }

        let mut collections = self.lock();
        let coll = collections.entry(name.to_string()).or_default();
        if let Some(index) = coll.violated_index(&document) {
            return Err(StoreError::DuplicateKey {
                collection: name.to_string(),
                index,
            });
        }
        coll.documents.push(document);
        Ok(())
    }

    async fn find_one(&self, collection: &str, filter: &Filter) -> Result<Option<Document>> {
        let name = validate_name(collection)?;
        validate_name(&filter.field)?;
        let collections = self.lock();
        Ok(collections
            .get(name)
            .and_then(|coll| coll.position(filter).map(|pos| coll.documents[pos].clone())))
    }

    async fn delete_one(&self, collection: &str, filter: &Filter) -> Result<u64> {
        let name = validate_name(collection)?;
        validate_name(&filter.field)?;
        let mut collections = self.lock();
        let Some(coll) = collections.get_mut(name) else {
            return Ok(0);
        };
        match coll.position(filter) {
            Some(pos) => {
                coll.documents.remove(pos);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn count(&self, collection: &str) -> Result<u64> {
        let name = validate_name(collection)?;
        let collections = self.lock();
        Ok(collections
            .get(name)
            .map_or(0, |coll| coll.documents.len() as u64))
    }

    async fn create_unique_index(&self, collection: &str, index: &UniqueIndex) -> Result<()> {
        let name = validate_name(collection)?;
        validate_name(&index.name)?;
        for field in &index.fields {
            validate_name(field)?;
        }

        let mut collections = self.lock();
        let coll = collections.entry(name.to_string()).or_default();
        if !coll.indexes.iter().any(|existing| existing.name == index.name) {
            coll.indexes.push(index.clone());
        }
        Ok(())
    }

    async fn drop_collection(&self, collection: &str) -> Result<()> {
        let name = validate_name(collection)?;
        self.lock().remove(name);
        Ok(())
    }
}
