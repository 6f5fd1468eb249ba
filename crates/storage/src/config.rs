use crate::{LocalStorage, MemoryStorage, StorageBackend, StorageError, StorageResult};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

#[cfg(feature = "s3")]
use crate::S3Storage;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageType {
    Local {
        path: PathBuf,
    },
    Memory,
    #[cfg(feature = "s3")]
    S3 {
        bucket: String,
        region: String,
        access_key_id: Option<String>,
        secret_access_key: Option<String>,
        endpoint: Option<String>,
    },
}

impl Default for StorageType {
    fn default() -> Self {
        Self::Local {
            path: PathBuf::from("data/photos"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(flatten)]
    pub storage_type: StorageType,
}

impl StorageConfig {
    pub fn new(storage_type: StorageType) -> Self {
        Self { storage_type }
    }

    /// Create a storage backend from the configuration
    pub async fn create_backend(&self) -> StorageResult<Arc<dyn StorageBackend>> {
        match &self.storage_type {
            StorageType::Local { path } => {
                if !path.exists() {
                    tokio::fs::create_dir_all(path).await.map_err(|e| {
                        StorageError::Backend(format!("Failed to create storage directory: {}", e))
                    })?;
                }

                Ok(Arc::new(LocalStorage::new(path.clone())))
            }

            StorageType::Memory => Ok(Arc::new(MemoryStorage::new())),

            #[cfg(feature = "s3")]
            StorageType::S3 {
                bucket,
                region,
                access_key_id,
                secret_access_key,
                endpoint,
            } => {
                let mut config_builder = aws_sdk_s3::config::Builder::new()
                    .behavior_version(aws_sdk_s3::config::BehaviorVersion::latest())
                    .region(aws_sdk_s3::config::Region::new(region.clone()));

                // S3-compatible services (MinIO, R2, GCS interop) need path-style addressing
                if let Some(endpoint_url) = endpoint {
                    config_builder = config_builder
                        .endpoint_url(endpoint_url)
                        .force_path_style(true);
                }

                if let (Some(access_key), Some(secret_key)) = (access_key_id, secret_access_key) {
                    let credentials = aws_sdk_s3::config::Credentials::new(
                        access_key,
                        secret_key,
                        None,
                        None,
                        "galleria-config",
                    );
                    config_builder = config_builder.credentials_provider(credentials);
                }

                let client = aws_sdk_s3::Client::from_conf(config_builder.build());

                Ok(Arc::new(S3Storage::new(
                    client,
                    bucket.clone(),
                    region.clone(),
                )))
            }
        }
    }
}
