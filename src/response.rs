//! Plain-text success bodies for the generated write endpoints.

use crate::id::DocumentId;
use axum::http::StatusCode;

pub fn created(id: DocumentId) -> (StatusCode, String) {
    (StatusCode::OK, format!("Object created!, id: {}", id))
}

pub fn updated() -> (StatusCode, &'static str) {
    (StatusCode::OK, "Object updated!")
}

pub fn deleted() -> (StatusCode, &'static str) {
    (StatusCode::OK, "Object deleted.")
}
