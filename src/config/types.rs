//! Settings types.

use crate::error::ConfigError;
use std::net::SocketAddr;

/// Database used when settings are loaded in test mode.
pub const TEST_DATABASE_NAME: &str = "test_db";

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8001";

/// Store backend, chosen by the scheme of `DATABASE_URI`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backend {
    Mongo,
    Postgres,
    Memory,
}

impl Backend {
    pub fn from_uri(uri: &str) -> Result<Self, ConfigError> {
        let scheme = uri.split("://").next().unwrap_or_default();
        match scheme {
            "mongodb" | "mongodb+srv" => Ok(Backend::Mongo),
            "postgres" | "postgresql" => Ok(Backend::Postgres),
            "memory" => Ok(Backend::Memory),
            _ => Err(ConfigError::UnsupportedScheme(scheme.to_string())),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatabaseSettings {
    /// Connection string, e.g. `mongodb://localhost:27017`.
    pub uri: String,
    /// MongoDB database, or PostgreSQL schema holding the collection tables.
    pub name: String,
}

impl DatabaseSettings {
    pub fn backend(&self) -> Result<Backend, ConfigError> {
        Backend::from_uri(&self.uri)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerSettings {
    pub bind_addr: SocketAddr,
}
