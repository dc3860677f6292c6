//! Initial store connection, bounded by [`CONNECT_TIMEOUT`].

use crate::config::{Backend, DatabaseSettings};
use crate::error::{AppError, StoreError};
use crate::store::{DocumentStore, MemoryStore, MongoStore, PgStore};
use std::sync::Arc;
use std::time::Duration;

pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Open the backend named by `settings.uri` and ping it once. Any failure here should stop the
/// process before it serves traffic.
pub async fn connect(settings: &DatabaseSettings) -> Result<Arc<dyn DocumentStore>, AppError> {
    let backend = settings.backend()?;
    let open = async {
        let store: Arc<dyn DocumentStore> = match backend {
            Backend::Mongo => Arc::new(MongoStore::connect(&settings.uri, &settings.name).await?),
            Backend::Postgres => Arc::new(PgStore::connect(&settings.uri, &settings.name).await?),
            Backend::Memory => Arc::new(MemoryStore::new()),
        };
        store.ping().await?;
        Ok::<_, StoreError>(store)
    };
    let store = match tokio::time::timeout(CONNECT_TIMEOUT, open).await {
        Ok(res) => res?,
        Err(_) => return Err(AppError::Timeout(CONNECT_TIMEOUT)),
    };
    tracing::info!(backend = ?backend, database = %settings.name, "connected to document store");
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_backend_connects() {
        let settings = DatabaseSettings {
            uri: "memory://".into(),
            name: "test_db".into(),
        };
        let store = connect(&settings).await.unwrap();
        assert!(store.find_all("todos").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unsupported_scheme_fails_before_connecting() {
        let settings = DatabaseSettings {
            uri: "ftp://example".into(),
            name: "x".into(),
        };
        assert!(matches!(connect(&settings).await, Err(AppError::Config(_))));
    }
}
