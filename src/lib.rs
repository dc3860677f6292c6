//! docrest: generic REST CRUD endpoints for serde models backed by a document store.

pub mod config;
pub mod db;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod id;
pub mod model;
pub mod naming;
pub mod response;
pub mod routes;
pub mod service;
pub mod state;
pub mod store;

pub use config::{load_database_settings, load_server_settings, DatabaseSettings, ServerSettings};
pub use db::connect;
pub use error::{AppError, ConfigError, StoreError};
pub use extractors::StrictJson;
pub use id::DocumentId;
pub use model::Model;
pub use naming::pluralize;
pub use routes::{common_routes, register_crud_routes, Scope};
pub use service::{DecodeError, DocumentService};
pub use state::AppState;
pub use store::{DocumentStore, MemoryStore, MongoStore, PgStore};
