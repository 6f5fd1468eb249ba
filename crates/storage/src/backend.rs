use crate::StorageResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Content type used when neither the caller nor the key says otherwise.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// What the store knows about a single blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectInfo {
    pub key: String,
    pub size: u64,
    pub content_type: Option<String>,
}

/// A flat key/blob store.
///
/// Writes are last-writer-wins: storing under an existing key replaces the
/// blob. `list` returns every object in the store's natural order.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    async fn store(
        &self,
        key: &str,
        data: &[u8],
        content_type: Option<&str>,
    ) -> StorageResult<ObjectInfo>;
    async fn retrieve(&self, key: &str) -> StorageResult<Vec<u8>>;
    async fn exists(&self, key: &str) -> StorageResult<bool>;
    async fn list(&self) -> StorageResult<Vec<ObjectInfo>>;
    async fn metadata(&self, key: &str) -> StorageResult<ObjectInfo>;
}

/// Guess a content type from the key's extension.
pub fn guess_content_type(key: &str) -> &'static str {
    let extension = std::path::Path::new(key)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase());

    match extension.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("json") => "application/json",
        Some("txt") => "text/plain",
        _ => DEFAULT_CONTENT_TYPE,
    }
}
