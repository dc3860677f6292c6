//! Generic document CRUD for any [`Model`], bounded per call by [`OPERATION_TIMEOUT`].

use crate::error::{AppError, StoreError};
use crate::id::DocumentId;
use crate::model::Model;
use crate::store::{Document, DocumentStore};
use serde_json::Value;
use std::future::Future;
use std::time::Duration;

/// Deadline for a single store call.
pub const OPERATION_TIMEOUT: Duration = Duration::from_secs(2);

pub struct DocumentService;

impl DocumentService {
    /// Insert `model` into its collection. Any identifier already on `model` is ignored.
    pub async fn create<M: Model>(store: &dyn DocumentStore, model: &M) -> Result<DocumentId, AppError> {
        let collection = M::collection();
        let body = to_document(model)?;
        let id = bounded(store.insert_one(&collection, body)).await?;
        tracing::info!(collection = %collection, id = %id, "inserted document");
        Ok(id)
    }

    /// Every document of `M`'s collection; an empty collection gives an empty list.
    pub async fn read_all<M: Model>(store: &dyn DocumentStore) -> Result<Vec<M>, AppError> {
        let collection = M::collection();
        let rows = bounded(store.find_all(&collection)).await?;
        tracing::debug!(collection = %collection, count = rows.len(), "read all");
        rows.into_iter()
            .map(|row| from_document(row.id, row.body))
            .collect()
    }

    pub async fn read_one<M: Model>(store: &dyn DocumentStore, id: &str) -> Result<M, AppError> {
        let collection = M::collection();
        let oid = parse_id(id)?;
        let body = bounded(store.find_by_id(&collection, oid))
            .await?
            .ok_or_else(|| AppError::NotFound {
                collection: collection.clone(),
                id: id.to_string(),
            })?;
        from_document(oid, body)
    }

    /// Replace the stored document wholesale; fields missing from `model` are not carried over.
    pub async fn replace_one<M: Model>(store: &dyn DocumentStore, model: &M, id: &str) -> Result<(), AppError> {
        let collection = M::collection();
        let oid = parse_id(id)?;
        let body = to_document(model)?;
        let matched = bounded(store.replace_by_id(&collection, oid, body)).await?;
        if matched == 0 {
            return Err(AppError::NotFound {
                collection,
                id: id.to_string(),
            });
        }
        tracing::info!(collection = %collection, id = %oid, "replaced document");
        Ok(())
    }

    /// Remove one document. Nothing in other collections is touched, and deleting an id that
    /// is not there succeeds.
    pub async fn delete<M: Model>(store: &dyn DocumentStore, id: &str) -> Result<(), AppError> {
        let collection = M::collection();
        let oid = parse_id(id)?;
        let deleted = bounded(store.delete_by_id(&collection, oid)).await?;
        tracing::info!(collection = %collection, id = %oid, deleted, "deleted document");
        Ok(())
    }
}

fn parse_id(raw: &str) -> Result<DocumentId, AppError> {
    DocumentId::parse_str(raw).map_err(|_| AppError::InvalidIdentifier(raw.to_string()))
}

async fn bounded<T, F>(op: F) -> Result<T, AppError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(OPERATION_TIMEOUT, op).await {
        Ok(res) => Ok(res?),
        Err(_) => Err(AppError::Timeout(OPERATION_TIMEOUT)),
    }
}

/// Serialized model minus its identifier field.
fn to_document<M: Model>(model: &M) -> Result<Document, AppError> {
    match serde_json::to_value(model)? {
        Value::Object(mut body) => {
            body.remove(M::ID_FIELD);
            Ok(body)
        }
        _ => Err(AppError::Serialization(serde::ser::Error::custom(format!(
            "{} does not serialize to a JSON object",
            M::NAME
        )))),
    }
}

fn from_document<M: Model>(id: DocumentId, mut body: Document) -> Result<M, AppError> {
    body.insert(M::ID_FIELD.to_string(), Value::String(id.to_hex()));
    Ok(serde_json::from_value(Value::Object(body))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::testing::{Parcel, Todo};
    use crate::store::{MemoryStore, StoredDocument};
    use async_trait::async_trait;

    fn todo(title: &str, completed: bool) -> Todo {
        Todo {
            id: None,
            title: title.to_string(),
            completed,
        }
    }

    #[tokio::test]
    async fn create_then_read_one_round_trips() {
        let store = MemoryStore::new();
        let input = todo("Finish testing this.", false);
        let id = DocumentService::create(&store, &input).await.unwrap();

        let read: Todo = DocumentService::read_one(&store, &id.to_hex()).await.unwrap();
        assert_eq!(read, Todo { id: Some(id), ..input });
    }

    #[tokio::test]
    async fn create_ignores_client_supplied_id() {
        let store = MemoryStore::new();
        let supplied = DocumentId::new();
        let input = Todo {
            id: Some(supplied),
            ..todo("x", false)
        };
        let id = DocumentService::create(&store, &input).await.unwrap();
        assert_ne!(id, supplied);
        let stored = store.find_by_id("todos", id).await.unwrap().unwrap();
        assert!(!stored.contains_key("id"));
    }

    #[tokio::test]
    async fn read_all_of_empty_collection_is_empty() {
        let store = MemoryStore::new();
        let all: Vec<Todo> = DocumentService::read_all(&store).await.unwrap();
        assert!(all.is_empty());
    }

    #[tokio::test]
    async fn read_all_returns_every_document_in_order() {
        let store = MemoryStore::new();
        for t in ["a", "b", "c"] {
            DocumentService::create(&store, &todo(t, false)).await.unwrap();
        }
        let all: Vec<Todo> = DocumentService::read_all(&store).await.unwrap();
        let titles: Vec<_> = all.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, ["a", "b", "c"]);
        assert!(all.iter().all(|t| t.id.is_some()));
    }

    #[tokio::test]
    async fn custom_id_field_round_trips() {
        let store = MemoryStore::new();
        let parcel = Parcel {
            key: None,
            label: "fragile".into(),
        };
        let id = DocumentService::create(&store, &parcel).await.unwrap();
        assert_eq!(store.len("boxes"), 1);
        let read: Parcel = DocumentService::read_one(&store, &id.to_hex()).await.unwrap();
        assert_eq!(read.key, Some(id));
        assert_eq!(read.label, "fragile");
    }

    #[tokio::test]
    async fn read_one_rejects_malformed_id() {
        let store = MemoryStore::new();
        let err = DocumentService::read_one::<Todo>(&store, "nope").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidIdentifier(_)));
    }

    #[tokio::test]
    async fn read_one_missing_is_not_found() {
        let store = MemoryStore::new();
        let err = DocumentService::read_one::<Todo>(&store, &DocumentId::new().to_hex())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn replace_resets_omitted_fields() {
        let store = MemoryStore::new();
        let id = DocumentService::create(&store, &todo("keep", true)).await.unwrap();

        let partial: Todo = crate::service::decode_slice(br#"{"title": "changed"}"#).unwrap();
        DocumentService::replace_one(&store, &partial, &id.to_hex()).await.unwrap();

        let read: Todo = DocumentService::read_one(&store, &id.to_hex()).await.unwrap();
        assert_eq!(read.title, "changed");
        assert!(!read.completed);
    }

    #[tokio::test]
    async fn replace_of_missing_document_is_not_found() {
        let store = MemoryStore::new();
        let err = DocumentService::replace_one(&store, &todo("x", false), &DocumentId::new().to_hex())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn delete_is_idempotent_but_checks_the_id() {
        let store = MemoryStore::new();
        let id = DocumentService::create(&store, &todo("x", false)).await.unwrap();

        DocumentService::delete::<Todo>(&store, &id.to_hex()).await.unwrap();
        assert!(store.is_empty("todos"));
        DocumentService::delete::<Todo>(&store, &id.to_hex()).await.unwrap();

        let err = DocumentService::delete::<Todo>(&store, "xyz").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidIdentifier(_)));
    }

    struct StalledStore;

    #[async_trait]
    impl DocumentStore for StalledStore {
        async fn insert_one(&self, _: &str, _: Document) -> Result<DocumentId, StoreError> {
            std::future::pending().await
        }
        async fn find_all(&self, _: &str) -> Result<Vec<StoredDocument>, StoreError> {
            std::future::pending().await
        }
        async fn find_by_id(&self, _: &str, _: DocumentId) -> Result<Option<Document>, StoreError> {
            std::future::pending().await
        }
        async fn replace_by_id(&self, _: &str, _: DocumentId, _: Document) -> Result<u64, StoreError> {
            std::future::pending().await
        }
        async fn delete_by_id(&self, _: &str, _: DocumentId) -> Result<u64, StoreError> {
            std::future::pending().await
        }
        async fn ping(&self) -> Result<(), StoreError> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_store_times_out() {
        let err = DocumentService::read_all::<Todo>(&StalledStore).await.unwrap_err();
        assert!(matches!(err, AppError::Timeout(d) if d == OPERATION_TIMEOUT));
        let err = DocumentService::create(&StalledStore, &todo("x", false)).await.unwrap_err();
        assert!(matches!(err, AppError::Timeout(_)));
    }
}
