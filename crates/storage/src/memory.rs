use crate::{guess_content_type, ObjectInfo, StorageBackend, StorageError, StorageResult};
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Clone)]
struct StoredObject {
    data: Vec<u8>,
    content_type: String,
}

/// Process-local object store. Keys list in lexicographic order, like S3.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    objects: RwLock<BTreeMap<String, StoredObject>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }

    fn validate_key(key: &str) -> StorageResult<String> {
        let clean_key = key.trim_start_matches('/');
        if clean_key.is_empty() {
            return Err(StorageError::InvalidPath("Empty key".to_string()));
        }
        Ok(clean_key.to_string())
    }
}

#[async_trait]
impl StorageBackend for MemoryStorage {
    async fn store(
        &self,
        key: &str,
        data: &[u8],
        content_type: Option<&str>,
    ) -> StorageResult<ObjectInfo> {
        let key = Self::validate_key(key)?;
        let content_type = content_type
            .map(str::to_string)
            .unwrap_or_else(|| guess_content_type(&key).to_string());

        debug!("Storing object in memory: key={}, {} bytes", key, data.len());

        let info = ObjectInfo {
            key: key.clone(),
            size: data.len() as u64,
            content_type: Some(content_type.clone()),
        };

        self.objects.write().await.insert(
            key,
            StoredObject {
                data: data.to_vec(),
                content_type,
            },
        );

        Ok(info)
    }

    async fn retrieve(&self, key: &str) -> StorageResult<Vec<u8>> {
        let key = Self::validate_key(key)?;
        self.objects
            .read()
            .await
            .get(&key)
            .map(|object| object.data.clone())
            .ok_or(StorageError::NotFound(key))
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        let key = Self::validate_key(key)?;
        Ok(self.objects.read().await.contains_key(&key))
    }

    async fn list(&self) -> StorageResult<Vec<ObjectInfo>> {
        let objects = self.objects.read().await;
        Ok(objects
            .iter()
            .map(|(key, object)| ObjectInfo {
                key: key.clone(),
                size: object.data.len() as u64,
                content_type: Some(object.content_type.clone()),
            })
            .collect())
    }

    async fn metadata(&self, key: &str) -> StorageResult<ObjectInfo> {
        let key = Self::validate_key(key)?;
        let objects = self.objects.read().await;
        let object = objects
            .get(&key)
            .ok_or_else(|| StorageError::NotFound(key.clone()))?;

        Ok(ObjectInfo {
            key,
            size: object.data.len() as u64,
            content_type: Some(object.content_type.clone()),
        })
    }
}
