//! In-process store. Used for tests and `memory://` URIs; contents die with the process.

use super::{Document, DocumentStore, StoredDocument};
use crate::error::StoreError;
use crate::id::DocumentId;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<StoredDocument>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents currently in `collection`.
    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .map(|c| c.get(collection).map_or(0, Vec::len))
            .unwrap_or(0)
    }

    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn insert_one(&self, collection: &str, body: Document) -> Result<DocumentId, StoreError> {
        let id = DocumentId::new();
        let mut collections = self.collections.write().map_err(|_| StoreError::Poisoned)?;
        collections
            .entry(collection.to_string())
            .or_default()
            .push(StoredDocument { id, body });
        Ok(id)
    }

    async fn find_all(&self, collection: &str) -> Result<Vec<StoredDocument>, StoreError> {
        let collections = self.collections.read().map_err(|_| StoreError::Poisoned)?;
        Ok(collections.get(collection).cloned().unwrap_or_default())
    }

    async fn find_by_id(&self, collection: &str, id: DocumentId) -> Result<Option<Document>, StoreError> {
        let collections = self.collections.read().map_err(|_| StoreError::Poisoned)?;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| d.id == id))
            .map(|d| d.body.clone()))
    }

    async fn replace_by_id(&self, collection: &str, id: DocumentId, body: Document) -> Result<u64, StoreError> {
        let mut collections = self.collections.write().map_err(|_| StoreError::Poisoned)?;
        let slot = collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|d| d.id == id));
        match slot {
            Some(doc) => {
                doc.body = body;
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_by_id(&self, collection: &str, id: DocumentId) -> Result<u64, StoreError> {
        let mut collections = self.collections.write().map_err(|_| StoreError::Poisoned)?;
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(0);
        };
        let before = docs.len();
        docs.retain(|d| d.id != id);
        Ok((before - docs.len()) as u64)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.collections.read().map(|_| ()).map_err(|_| StoreError::Poisoned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: serde_json::Value) -> Document {
        match value {
            serde_json::Value::Object(m) => m,
            _ => panic!("not an object"),
        }
    }

    #[tokio::test]
    async fn insert_then_find_keeps_order() {
        let store = MemoryStore::new();
        let a = store.insert_one("todos", doc(json!({"title": "a"}))).await.unwrap();
        let b = store.insert_one("todos", doc(json!({"title": "b"}))).await.unwrap();
        let all = store.find_all("todos").await.unwrap();
        assert_eq!(all.iter().map(|d| d.id).collect::<Vec<_>>(), vec![a, b]);
        assert_eq!(store.find_by_id("todos", b).await.unwrap(), Some(doc(json!({"title": "b"}))));
        assert!(store.find_all("boxes").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn replace_and_delete_report_match_counts() {
        let store = MemoryStore::new();
        let id = store.insert_one("todos", doc(json!({"title": "a"}))).await.unwrap();
        let other = DocumentId::new();

        assert_eq!(store.replace_by_id("todos", id, doc(json!({"title": "b"}))).await.unwrap(), 1);
        assert_eq!(store.replace_by_id("todos", other, doc(json!({}))).await.unwrap(), 0);
        assert_eq!(store.delete_by_id("todos", other).await.unwrap(), 0);
        assert_eq!(store.delete_by_id("todos", id).await.unwrap(), 1);
        assert!(store.is_empty("todos"));
    }
}
