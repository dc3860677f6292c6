//! Document store abstraction and its backends.
//!
//! A store holds named collections of JSON object documents keyed by [`DocumentId`]. Documents
//! handed to and returned by a store never contain the identifier; it travels alongside.

mod memory;
mod mongo;
mod postgres;

pub use memory::MemoryStore;
pub use mongo::MongoStore;
pub use postgres::PgStore;

use crate::error::StoreError;
use crate::id::DocumentId;
use async_trait::async_trait;

/// JSON object body of a stored document, identifier excluded.
pub type Document = serde_json::Map<String, serde_json::Value>;

/// A document together with its store-assigned identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: DocumentId,
    pub body: Document,
}

/// Collection-scoped operations. Implementations must be safe for concurrent use.
///
/// Callers bound every call with their own deadline; dropping a returned future abandons the
/// operation.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert one document and return its new identifier.
    async fn insert_one(&self, collection: &str, body: Document) -> Result<DocumentId, StoreError>;

    /// Every document in the collection in insertion order. A missing collection is empty.
    async fn find_all(&self, collection: &str) -> Result<Vec<StoredDocument>, StoreError>;

    async fn find_by_id(&self, collection: &str, id: DocumentId) -> Result<Option<Document>, StoreError>;

    /// Replace the whole document; returns the number of matched documents (0 or 1).
    async fn replace_by_id(&self, collection: &str, id: DocumentId, body: Document) -> Result<u64, StoreError>;

    /// Returns the number of deleted documents (0 or 1).
    async fn delete_by_id(&self, collection: &str, id: DocumentId) -> Result<u64, StoreError>;

    /// Round trip to the backend; used by readiness checks.
    async fn ping(&self) -> Result<(), StoreError>;
}
