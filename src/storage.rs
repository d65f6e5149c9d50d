//! Product image uploads.

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use std::path::PathBuf;
use uuid::Uuid;

use crate::{Result, StorefrontError};

pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Accepted content types and the extension stored files get.
const ALLOWED_TYPES: &[(&str, &str)] =
    &[("image/jpeg", "jpg"), ("image/png", "png"), ("image/gif", "gif"), ("image/webp", "webp")];

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredImage {
    pub url: String,
    pub file_name: String,
}

/// Checks the content type and size, returning the extension to store under.
pub fn validate_upload(content_type: &str, len: usize) -> Result<&'static str> {
    let ext = ALLOWED_TYPES
        .iter()
        .find(|(mime, _)| mime.eq_ignore_ascii_case(content_type.trim()))
        .map(|(_, ext)| *ext)
        .ok_or_else(|| StorefrontError::invalid("Invalid file type. Only JPEG, PNG, GIF, and WebP are allowed."))?;
    if len > MAX_IMAGE_BYTES {
        return Err(StorefrontError::invalid("File too large. Maximum size is 5MB."));
    }
    Ok(ext)
}

#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn save(&self, content_type: &str, bytes: &[u8]) -> Result<StoredImage>;
}

/// Writes images to a directory served under `/uploads`.
pub struct LocalImageStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalImageStore {
    pub const URL_PREFIX: &'static str = "/uploads";

    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self { root: root.into(), public_base_url: public_base_url.into() }
    }

    pub fn root(&self) -> &std::path::Path { &self.root }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn save(&self, content_type: &str, bytes: &[u8]) -> Result<StoredImage> {
        let ext = validate_upload(content_type, bytes.len())?;
        let file_name = format!("{}-{}.{}", Utc::now().timestamp_millis(), Uuid::new_v4().simple(), ext);

        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| StorefrontError::Storage(format!("create {}: {e}", self.root.display())))?;
        let path = self.root.join(&file_name);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| StorefrontError::Storage(format!("write {}: {e}", path.display())))?;

        tracing::info!(file = %file_name, bytes = bytes.len(), "image stored");
        Ok(StoredImage { url: format!("{}{}/{}", self.public_base_url, Self::URL_PREFIX, file_name), file_name })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_upload() {
        assert_eq!(validate_upload("image/png", 10).unwrap(), "png");
        assert_eq!(validate_upload("IMAGE/JPEG", 10).unwrap(), "jpg");
        assert!(validate_upload("application/pdf", 10).is_err());
        assert!(validate_upload("image/webp", MAX_IMAGE_BYTES).is_ok());
        assert!(validate_upload("image/webp", MAX_IMAGE_BYTES + 1).is_err());
    }

    #[tokio::test]
    async fn test_local_store_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalImageStore::new(dir.path().join("uploads"), "https://shop.example");
        let stored = store.save("image/gif", b"GIF89a").await.unwrap();

        assert!(stored.file_name.ends_with(".gif"));
        assert_eq!(stored.url, format!("https://shop.example/uploads/{}", stored.file_name));
        let written = tokio::fs::read(store.root().join(&stored.file_name)).await.unwrap();
        assert_eq!(written, b"GIF89a");
    }

    #[tokio::test]
    async fn test_rejected_upload_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalImageStore::new(dir.path().join("uploads"), "");
        assert!(store.save("text/plain", b"hello").await.is_err());
        assert!(!store.root().exists());
    }
}
