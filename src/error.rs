//! Typed errors and HTTP mapping.

use crate::service::DecodeError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing environment variable: {0}")]
    MissingVar(&'static str),
    #[error("unsupported database uri scheme: {0}")]
    UnsupportedScheme(String),
    #[error("invalid {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

/// Failures reported by a [`DocumentStore`](crate::store::DocumentStore) backend.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("mongodb: {0}")]
    Mongo(#[from] mongodb::error::Error),
    #[error("postgres: {0}")]
    Postgres(#[from] sqlx::Error),
    #[error("invalid collection name: {0}")]
    InvalidCollection(String),
    #[error("corrupt document in {collection}: {reason}")]
    Corrupt { collection: String, reason: String },
    #[error("store lock poisoned")]
    Poisoned,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),
    #[error("not found: {id} in {collection}")]
    NotFound { collection: String, id: String },
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),
    #[error("serialization: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidIdentifier(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Decode(e) => e.status(),
            AppError::Config(_)
            | AppError::Store(_)
            | AppError::Timeout(_)
            | AppError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::InvalidIdentifier(id) => format!("Invalid object id: {}", id),
            AppError::NotFound { .. } => "Object not found.".to_string(),
            AppError::Decode(e) => e.message(),
            _ => {
                tracing::error!(error = %self, "request failed");
                return (
                    status,
                    status.canonical_reason().unwrap_or("Internal Server Error"),
                )
                    .into_response();
            }
        };
        tracing::warn!(status = status.as_u16(), error = %self, "request rejected");
        (status, message).into_response()
    }
}
