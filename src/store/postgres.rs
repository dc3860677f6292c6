//! PostgreSQL backend: one JSONB table per collection inside a dedicated schema.
//! Tables are created on first insert; reads against a missing table see an empty collection.

use super::{Document, DocumentStore, StoredDocument};
use crate::error::StoreError;
use crate::id::DocumentId;
use async_trait::async_trait;
use regex::Regex;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// SQLSTATE for "relation does not exist".
const UNDEFINED_TABLE: &str = "42P01";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    schema: String,
}

/// Names are interpolated into SQL unquoted, so only plain lower-case identifiers pass.
const IDENTIFIER_PATTERN: &str = r"^[a-z_][a-z0-9_]{0,62}$";

fn check_identifier(name: &str) -> Result<(), StoreError> {
    let re = Regex::new(IDENTIFIER_PATTERN).map_err(|_| StoreError::InvalidCollection(name.to_string()))?;
    if re.is_match(name) {
        Ok(())
    } else {
        Err(StoreError::InvalidCollection(name.to_string()))
    }
}

fn is_undefined_table(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db.code().as_deref() == Some(UNDEFINED_TABLE),
        _ => false,
    }
}

impl PgStore {
    /// Connect and create `schema` if needed. `schema` must be a plain lower-case identifier.
    pub async fn connect(url: &str, schema: &str) -> Result<Self, StoreError> {
        check_identifier(schema)?;
        let pool = PgPoolOptions::new().max_connections(5).connect(url).await?;
        let store = Self::from_pool(pool, schema)?;
        sqlx::query(&format!("CREATE SCHEMA IF NOT EXISTS {}", store.schema))
            .execute(&store.pool)
            .await?;
        Ok(store)
    }

    pub fn from_pool(pool: PgPool, schema: &str) -> Result<Self, StoreError> {
        check_identifier(schema)?;
        Ok(PgStore {
            pool,
            schema: schema.to_string(),
        })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Schema-qualified table for a collection, e.g. `app.todos`.
    fn table(&self, collection: &str) -> Result<String, StoreError> {
        check_identifier(collection)?;
        Ok(format!("{}.{}", self.schema, collection))
    }

    async fn ensure_table(&self, table: &str) -> Result<(), StoreError> {
        let ddl = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                id TEXT PRIMARY KEY,
                doc JSONB NOT NULL,
                seq BIGSERIAL,
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
            table
        );
        sqlx::query(&ddl).execute(&self.pool).await?;
        Ok(())
    }
}

fn into_document(collection: &str, value: Value) -> Result<Document, StoreError> {
    match value {
        Value::Object(m) => Ok(m),
        other => Err(StoreError::Corrupt {
            collection: collection.to_string(),
            reason: format!("doc is not an object: {}", other),
        }),
    }
}

fn parse_id(collection: &str, raw: &str) -> Result<DocumentId, StoreError> {
    DocumentId::parse_str(raw).map_err(|e| StoreError::Corrupt {
        collection: collection.to_string(),
        reason: e.to_string(),
    })
}

#[async_trait]
impl DocumentStore for PgStore {
    async fn insert_one(&self, collection: &str, body: Document) -> Result<DocumentId, StoreError> {
        let table = self.table(collection)?;
        self.ensure_table(&table).await?;
        let id = DocumentId::new();
        let sql = format!("INSERT INTO {} (id, doc) VALUES ($1, $2)", table);
        tracing::debug!(sql = %sql, id = %id, "query");
        sqlx::query(&sql)
            .bind(id.to_hex())
            .bind(Value::Object(body))
            .execute(&self.pool)
            .await?;
        Ok(id)
    }

    async fn find_all(&self, collection: &str) -> Result<Vec<StoredDocument>, StoreError> {
        let table = self.table(collection)?;
        let sql = format!("SELECT id, doc FROM {} ORDER BY seq", table);
        tracing::debug!(sql = %sql, "query");
        let rows: Vec<(String, Value)> = match sqlx::query_as::<_, (String, Value)>(&sql).fetch_all(&self.pool).await {
            Ok(rows) => rows,
            Err(e) if is_undefined_table(&e) => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        rows.into_iter()
            .map(|(id, doc)| {
                Ok::<_, StoreError>(StoredDocument {
                    id: parse_id(collection, &id)?,
                    body: into_document(collection, doc)?,
                })
            })
            .collect()
    }

    async fn find_by_id(&self, collection: &str, id: DocumentId) -> Result<Option<Document>, StoreError> {
        let table = self.table(collection)?;
        let sql = format!("SELECT doc FROM {} WHERE id = $1", table);
        tracing::debug!(sql = %sql, id = %id, "query");
        let row: Option<(Value,)> = match sqlx::query_as::<_, (Value,)>(&sql)
            .bind(id.to_hex())
            .fetch_optional(&self.pool)
            .await
        {
            Ok(row) => row,
            Err(e) if is_undefined_table(&e) => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        row.map(|(doc,)| into_document(collection, doc)).transpose()
    }

    async fn replace_by_id(&self, collection: &str, id: DocumentId, body: Document) -> Result<u64, StoreError> {
        let table = self.table(collection)?;
        let sql = format!("UPDATE {} SET doc = $2, updated_at = NOW() WHERE id = $1", table);
        tracing::debug!(sql = %sql, id = %id, "query");
        match sqlx::query(&sql)
            .bind(id.to_hex())
            .bind(Value::Object(body))
            .execute(&self.pool)
            .await
        {
            Ok(res) => Ok(res.rows_affected()),
            Err(e) if is_undefined_table(&e) => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_by_id(&self, collection: &str, id: DocumentId) -> Result<u64, StoreError> {
        let table = self.table(collection)?;
        let sql = format!("DELETE FROM {} WHERE id = $1", table);
        tracing::debug!(sql = %sql, id = %id, "query");
        match sqlx::query(&sql).bind(id.to_hex()).execute(&self.pool).await {
            Ok(res) => Ok(res.rows_affected()),
            Err(e) if is_undefined_table(&e) => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").fetch_optional(&self.pool).await?;
        Ok(())
    }
}
