//! MongoDB backend. Collections map one-to-one; the identifier lives in `_id` as an ObjectId.

use super::{Document, DocumentStore, StoredDocument};
use crate::error::StoreError;
use crate::id::DocumentId;
use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::bson::{self, doc, oid::ObjectId, Bson};
use mongodb::{Client, Collection, Database};

const ID_KEY: &str = "_id";

#[derive(Clone)]
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    /// Connect and select `database`. The driver connects lazily; call [`DocumentStore::ping`]
    /// to force a round trip.
    pub async fn connect(uri: &str, database: &str) -> Result<Self, StoreError> {
        let client = Client::with_uri_str(uri).await?;
        Ok(Self::from_database(client.database(database)))
    }

    pub fn from_database(db: Database) -> Self {
        MongoStore { db }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    fn collection(&self, name: &str) -> Collection<bson::Document> {
        self.db.collection(name)
    }
}

fn by_id(id: DocumentId) -> bson::Document {
    doc! { "_id": ObjectId::from(id) }
}

fn to_bson(collection: &str, body: &Document) -> Result<bson::Document, StoreError> {
    bson::to_document(body).map_err(|e| StoreError::Corrupt {
        collection: collection.to_string(),
        reason: e.to_string(),
    })
}

fn from_bson(collection: &str, mut raw: bson::Document) -> Result<StoredDocument, StoreError> {
    let id = match raw.remove(ID_KEY) {
        Some(Bson::ObjectId(oid)) => DocumentId::from(oid),
        other => {
            return Err(StoreError::Corrupt {
                collection: collection.to_string(),
                reason: format!("_id is not an ObjectId: {:?}", other),
            })
        }
    };
    match Bson::Document(raw).into_relaxed_extjson() {
        serde_json::Value::Object(body) => Ok(StoredDocument { id, body }),
        _ => Err(StoreError::Corrupt {
            collection: collection.to_string(),
            reason: "document is not an object".into(),
        }),
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn insert_one(&self, collection: &str, body: Document) -> Result<DocumentId, StoreError> {
        let id = DocumentId::new();
        let mut raw = to_bson(collection, &body)?;
        raw.insert(ID_KEY, ObjectId::from(id));
        self.collection(collection).insert_one(raw).await?;
        tracing::debug!(collection = %collection, id = %id, "mongo insert_one");
        Ok(id)
    }

    async fn find_all(&self, collection: &str) -> Result<Vec<StoredDocument>, StoreError> {
        let cursor = self.collection(collection).find(doc! {}).await?;
        let rows: Vec<bson::Document> = cursor.try_collect().await?;
        tracing::debug!(collection = %collection, count = rows.len(), "mongo find");
        rows.into_iter().map(|raw| from_bson(collection, raw)).collect()
    }

    async fn find_by_id(&self, collection: &str, id: DocumentId) -> Result<Option<Document>, StoreError> {
        let found = self.collection(collection).find_one(by_id(id)).await?;
        found
            .map(|raw| from_bson(collection, raw).map(|d| d.body))
            .transpose()
    }

    async fn replace_by_id(&self, collection: &str, id: DocumentId, body: Document) -> Result<u64, StoreError> {
        let raw = to_bson(collection, &body)?;
        let res = self.collection(collection).replace_one(by_id(id), raw).await?;
        tracing::debug!(collection = %collection, id = %id, matched = res.matched_count, modified = res.modified_count, "mongo replace_one");
        Ok(res.matched_count)
    }

    async fn delete_by_id(&self, collection: &str, id: DocumentId) -> Result<u64, StoreError> {
        let res = self.collection(collection).delete_one(by_id(id)).await?;
        tracing::debug!(collection = %collection, id = %id, deleted = res.deleted_count, "mongo delete_one");
        Ok(res.deleted_count)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.db.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }
}
