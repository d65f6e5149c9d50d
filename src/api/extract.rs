//! Extractors that reject with the JSON envelope instead of axum's plain text.

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;

use crate::{FieldErrors, StorefrontError};

fn rejected(detail: String) -> StorefrontError {
    let mut errors = FieldErrors::new();
    errors.insert("_error".into(), vec![detail]);
    StorefrontError::Validation { message: "Invalid request data".into(), errors }
}

/// JSON request body.
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = StorefrontError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await.map_err(|e| rejected(e.body_text()))?;
        Ok(Self(value))
    }
}

/// Query string parameters.
pub struct QueryParams<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for QueryParams<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = StorefrontError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await.map_err(|e| rejected(e.body_text()))?;
        Ok(Self(value))
    }
}
