//! Product image upload.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
};

use super::response::ApiResponse;
use super::AppState;
use crate::storage::{validate_upload, StoredImage, MAX_IMAGE_BYTES};
use crate::{Result, StorefrontError};

/// Request body ceiling for uploads: the image plus multipart framing.
pub const UPLOAD_BODY_LIMIT: usize = MAX_IMAGE_BYTES + 64 * 1024;

fn multipart_error(err: axum::extract::multipart::MultipartError) -> StorefrontError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        StorefrontError::invalid("File too large. Maximum size is 5MB.")
    } else {
        StorefrontError::invalid(err.body_text())
    }
}

/// Multipart form with the file in the `image` field.
pub async fn upload_image(State(state): State<AppState>, mut multipart: Multipart) -> Result<ApiResponse<StoredImage>> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some("image") {
            continue;
        }
        let content_type = field.content_type().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(multipart_error)?;
        validate_upload(&content_type, bytes.len())?;
        let stored = state.images.save(&content_type, &bytes).await?;
        return Ok(ApiResponse::ok(stored).message("File uploaded successfully"));
    }
    Err(StorefrontError::invalid("No file provided"))
}
