//! HTTP handlers for generated model CRUD.

pub mod crud;
pub use crud::*;
