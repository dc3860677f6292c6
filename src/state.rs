//! Application context shared by every handler.

use crate::store::DocumentStore;
use std::sync::Arc;

/// Read-only after construction; cloning shares the same store client.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        AppState { store }
    }

    pub fn store(&self) -> &dyn DocumentStore {
        self.store.as_ref()
    }
}
