//! Generic handlers behind the generated routes, one instantiation per model type.

use crate::error::AppError;
use crate::extractors::StrictJson;
use crate::model::Model;
use crate::response;
use crate::service::DocumentService;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};

/// GET / — every document of the collection.
pub async fn list<M: Model>(State(state): State<AppState>) -> Result<Json<Vec<M>>, AppError> {
    let objects = DocumentService::read_all::<M>(state.store()).await?;
    Ok(Json(objects))
}

/// GET /:id
pub async fn read<M: Model>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<M>, AppError> {
    let object = DocumentService::read_one::<M>(state.store(), &id).await?;
    Ok(Json(object))
}

/// POST / — body is the full object; any id in it is ignored.
pub async fn create<M: Model>(
    State(state): State<AppState>,
    StrictJson(object): StrictJson<M>,
) -> Result<impl IntoResponse, AppError> {
    let id = DocumentService::create(state.store(), &object).await?;
    Ok(response::created(id))
}

/// PUT /:id — body must be the entire object; omitted fields are reset.
pub async fn replace<M: Model>(
    State(state): State<AppState>,
    Path(id): Path<String>,
    StrictJson(object): StrictJson<M>,
) -> Result<impl IntoResponse, AppError> {
    DocumentService::replace_one(state.store(), &object, &id).await?;
    Ok(response::updated())
}

/// DELETE /:id — no cascade to documents that reference this one.
pub async fn delete<M: Model>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    DocumentService::delete::<M>(state.store(), &id).await?;
    Ok(response::deleted())
}
