use crate::{ObjectInfo, StorageBackend, StorageError, StorageResult};
use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tracing::{debug, error};

pub struct S3Storage {
    client: Client,
    bucket: String,
    region: String,
}

impl S3Storage {
    pub fn new(client: Client, bucket: String, region: String) -> Self {
        debug!(
            "Initializing S3 storage client for bucket '{}' in region '{}'",
            bucket, region
        );

        Self {
            client,
            bucket,
            region,
        }
    }

    /// Validate and sanitize the S3 object key
    fn validate_key(&self, key: &str) -> StorageResult<String> {
        let clean_key = key.trim_start_matches('/');

        if clean_key.is_empty() {
            return Err(StorageError::InvalidPath("Empty key".to_string()));
        }

        if clean_key.split('/').any(|segment| segment == "..") {
            return Err(StorageError::InvalidPath(format!(
                "Key contains invalid sequences: {}",
                key
            )));
        }

        Ok(clean_key.to_string())
    }
}

#[async_trait]
impl StorageBackend for S3Storage {
    async fn store(
        &self,
        key: &str,
        data: &[u8],
        content_type: Option<&str>,
    ) -> StorageResult<ObjectInfo> {
        let key = self.validate_key(key)?;
        let content_type = content_type
            .map(str::to_string)
            .unwrap_or_else(|| crate::guess_content_type(&key).to_string());

        debug!(
            "Storing object in S3: bucket={}, region={}, key={}",
            self.bucket, self.region, key
        );

        let result = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type(&content_type)
            .body(ByteStream::from(data.to_vec()))
            .send()
            .await
            .map_err(|e| {
                error!("Failed to store object in S3: {}", e);
                StorageError::Backend(format!("S3 put_object failed: {}", e))
            })?;

        debug!(
            "Stored object in S3: {} bytes, etag: {:?}",
            data.len(),
            result.e_tag()
        );

        Ok(ObjectInfo {
            key,
            size: data.len() as u64,
            content_type: Some(content_type),
        })
    }

    async fn retrieve(&self, key: &str) -> StorageResult<Vec<u8>> {
        let key = self.validate_key(key)?;

        debug!(
            "Retrieving object from S3: bucket={}, region={}, key={}",
            self.bucket, self.region, key
        );

        let result = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().is_some_and(|se| se.is_no_such_key()) {
                    StorageError::NotFound(key.clone())
                } else {
                    error!("Failed to retrieve object from S3: {}", e);
                    StorageError::Backend(format!("S3 get_object failed: {}", e))
                }
            })?;

        let data = result
            .body
            .collect()
            .await
            .map_err(|e| {
                error!("Failed to read S3 object body: {}", e);
                StorageError::Backend(format!("Failed to read S3 body: {}", e))
            })?
            .into_bytes()
            .to_vec();

        debug!("Retrieved object from S3: {} bytes", data.len());
        Ok(data)
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        match self.metadata(key).await {
            Ok(_) => Ok(true),
            Err(StorageError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn list(&self) -> StorageResult<Vec<ObjectInfo>> {
        debug!("Listing objects in S3: bucket={}", self.bucket);

        let mut objects = Vec::new();
        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .into_paginator()
            .send();

        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| {
                error!("Failed to list objects in S3: {}", e);
                StorageError::Backend(format!("S3 list_objects_v2 failed: {}", e))
            })?;

            for object in page.contents() {
                if let Some(key) = object.key() {
                    objects.push(ObjectInfo {
                        key: key.to_string(),
                        size: object.size().unwrap_or_default().max(0) as u64,
                        // Listing does not carry content types; use `metadata` for that.
                        content_type: None,
                    });
                }
            }
        }

        debug!("Listed {} objects in S3", objects.len());
        Ok(objects)
    }

    async fn metadata(&self, key: &str) -> StorageResult<ObjectInfo> {
        let key = self.validate_key(key)?;

        debug!(
            "Fetching object metadata from S3: bucket={}, key={}",
            self.bucket, key
        );

        let head = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().is_some_and(|se| se.is_not_found()) {
                    debug!("Object does not exist in S3: {}", key);
                    StorageError::NotFound(key.clone())
                } else {
                    error!("Failed to check object metadata in S3: {}", e);
                    StorageError::Backend(format!("S3 head_object failed: {}", e))
                }
            })?;

        Ok(ObjectInfo {
            size: head.content_length().unwrap_or_default().max(0) as u64,
            content_type: head.content_type().map(str::to_string),
            key,
        })
    }
}
