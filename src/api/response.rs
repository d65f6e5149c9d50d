//! JSON envelope shared by every endpoint:
//! `{ success, data?, message?, errors? }`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{FieldErrors, StorefrontError};

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self { Self { success: true, data: Some(data), message: None, errors: None } }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl ApiResponse<()> {
    pub fn failure(message: impl Into<String>, errors: Option<FieldErrors>) -> Self {
        Self { success: false, data: None, message: Some(message.into()), errors }
    }

    pub fn done(message: impl Into<String>) -> Self {
        Self { success: true, data: None, message: Some(message.into()), errors: None }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response { Json(self).into_response() }
}

impl IntoResponse for StorefrontError {
    fn into_response(self) -> Response {
        let (status, message, errors) = match self {
            StorefrontError::Validation { message, errors } => {
                (StatusCode::BAD_REQUEST, message, Some(errors).filter(|e| !e.is_empty()))
            }
            StorefrontError::NotFound(what) => (StatusCode::NOT_FOUND, what.to_string(), None),
            StorefrontError::Conflict(msg) => (StatusCode::CONFLICT, msg, None),
            StorefrontError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.to_string(), None),
            StorefrontError::Database(err) => {
                tracing::error!("Database error: {:?}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string(), None)
            }
            StorefrontError::Storage(msg) => {
                tracing::error!("Storage error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string(), None)
            }
        };
        (status, ApiResponse::failure(message, errors)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_omits_empty_parts() {
        let json = serde_json::to_value(ApiResponse::ok(vec![1, 2]).message("Done")).unwrap();
        assert_eq!(json, serde_json::json!({"success": true, "data": [1, 2], "message": "Done"}));
    }

    #[test]
    fn test_error_status_mapping() {
        let status = |e: StorefrontError| e.into_response().status();
        assert_eq!(status(StorefrontError::invalid("x")), StatusCode::BAD_REQUEST);
        assert_eq!(status(StorefrontError::NotFound("Order not found")), StatusCode::NOT_FOUND);
        assert_eq!(status(StorefrontError::Conflict("taken".into())), StatusCode::CONFLICT);
        assert_eq!(status(StorefrontError::Unauthorized("Authentication required")), StatusCode::UNAUTHORIZED);
        assert_eq!(status(StorefrontError::Storage("disk full".into())), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
