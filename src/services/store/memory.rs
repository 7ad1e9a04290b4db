//! In-memory document store for development and tests.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{Collection, DocumentStore, StoreError, StoreQuery};

type Collections = HashMap<Collection, Vec<Value>>;

/// Insertion-ordered collections held behind a lock
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    collections: Arc<RwLock<Collections>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in a collection
    pub fn len(&self, collection: Collection) -> usize {
        self.read()
            .map(|c| c.get(&collection).map_or(0, Vec::len))
            .unwrap_or(0)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Collections>, StoreError> {
        self.collections
            .read()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Collections>, StoreError> {
        self.collections
            .write()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
    }
}

fn has_id(document: &Value, id: &str) -> bool {
    document.get("id").and_then(Value::as_str) == Some(id)
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find(&self, collection: Collection, query: &StoreQuery) -> Result<Vec<Value>, StoreError> {
        let collections = self.read()?;
        let documents = collections
            .get(&collection)
            .map(|docs| docs.iter().filter(|doc| query.matches(doc)).cloned().collect())
            .unwrap_or_default();
        Ok(documents)
    }

    async fn find_by_id(&self, collection: Collection, id: &str) -> Result<Option<Value>, StoreError> {
        let collections = self.read()?;
        Ok(collections
            .get(&collection)
            .and_then(|docs| docs.iter().find(|doc| has_id(doc, id)).cloned()))
    }

    async fn insert_one(&self, collection: Collection, id: &str, mut document: Value) -> Result<Value, StoreError> {
        let object = document
            .as_object_mut()
            .ok_or_else(|| StoreError::InvalidDocument("document must be a JSON object".into()))?;
        object.insert("id".to_string(), Value::String(id.to_string()));

        let mut collections = self.write()?;
        let docs = collections.entry(collection).or_default();
        if docs.iter().any(|doc| has_id(doc, id)) {
            return Err(StoreError::ApiError(format!("Document {} already exists", id)));
        }
        docs.push(document.clone());

        Ok(document)
    }

    async fn update_one(&self, collection: Collection, id: &str, changes: Value) -> Result<Option<Value>, StoreError> {
        let Value::Object(changes) = changes else {
            return Err(StoreError::InvalidDocument("changes must be a JSON object".into()));
        };

        let mut collections = self.write()?;
        let Some(document) = collections
            .get_mut(&collection)
            .and_then(|docs| docs.iter_mut().find(|doc| has_id(doc, id)))
        else {
            return Ok(None);
        };

        if let Some(object) = document.as_object_mut() {
            for (key, value) in changes {
                if key != "id" {
                    object.insert(key, value);
                }
            }
        }

        Ok(Some(document.clone()))
    }

    async fn ping(&self) -> Result<bool, StoreError> {
        self.read().map(|_| true)
    }
}
