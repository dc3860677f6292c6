//! Extract a model from the request body with strict JSON decoding.

use crate::service::{decode, DecodeError};
use async_trait::async_trait;
use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;

/// Like `axum::Json`, but rejects unknown fields at any depth and answers failures with the
/// classified [`DecodeError`] status and message. Must be the last extractor of a handler.
#[derive(Clone, Debug)]
pub struct StrictJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for StrictJson<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = DecodeError;

    async fn from_request(req: Request, _state: &S) -> Result<Self, Self::Rejection> {
        let value = decode(req.into_body()).await?;
        Ok(StrictJson(value))
    }
}
