//! Router construction.

pub mod common;
pub mod crud;

pub use common::common_routes;
pub use crud::{register_crud_routes, Scope};
