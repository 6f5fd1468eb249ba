use galleria_core::{
    models::{UNREADABLE_DESCRIPTION, UNTITLED},
    naming, normalize, GalleryEntry, ImageDetail, MetadataRecord, StoredMetadata,
    DESCRIPTION_PROMPT,
};
use galleria_storage::{
    guess_content_type, ObjectInfo, StorageBackend, StorageError, StorageResult,
    DEFAULT_CONTENT_TYPE,
};
use galleria_vision::{VisionClient, VisionError};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{ServerError, ServerResult};

/// Raw image bytes plus the content type they are served with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub data: Vec<u8>,
    pub content_type: String,
}

/// Longest wait for a description unless configured otherwise
pub const DEFAULT_VISION_TIMEOUT: Duration = Duration::from_secs(60);

/// Upload, listing and lookup logic shared by the HTTP handlers.
///
/// Holds the injected store and vision client; nothing here is global.
pub struct GalleryService {
    storage: Arc<dyn StorageBackend>,
    vision: Arc<dyn VisionClient>,
    vision_timeout: Duration,
}

impl GalleryService {
    pub fn new(storage: Arc<dyn StorageBackend>, vision: Arc<dyn VisionClient>) -> Self {
        Self {
            storage,
            vision,
            vision_timeout: DEFAULT_VISION_TIMEOUT,
        }
    }

    /// Bound every vision call; a late answer becomes the `Error` record.
    pub fn with_vision_timeout(mut self, timeout: Duration) -> Self {
        self.vision_timeout = timeout;
        self
    }

    pub fn storage(&self) -> &Arc<dyn StorageBackend> {
        &self.storage
    }

    /// Store an image, describe it, and store the description next to it.
    ///
    /// Rejected filenames write nothing. Vision failures are folded into a
    /// placeholder record; only store failures make this return an error,
    /// and an image written before such a failure is left in place.
    pub async fn upload(
        &self,
        filename: &str,
        data: &[u8],
        content_type: Option<&str>,
    ) -> ServerResult<MetadataRecord> {
        naming::validate_image_filename(filename)?;

        let image_type = guess_content_type(filename);
        let declared = content_type
            .filter(|ct| !ct.is_empty() && *ct != DEFAULT_CONTENT_TYPE)
            .unwrap_or(image_type);

        let stored = self.storage.store(filename, data, Some(declared)).await?;
        info!("Stored image {} ({} bytes)", stored.key, stored.size);

        let record = self.describe(data, image_type).await;

        let metadata_key = naming::metadata_key(filename);
        let bytes = record
            .to_json_bytes()
            .map_err(galleria_core::CoreError::from)?;
        self.storage
            .store(&metadata_key, &bytes, Some("application/json"))
            .await?;
        info!("Stored description {} for {}", metadata_key, filename);

        Ok(record)
    }

    /// Ask the vision model for a record. Never fails.
    pub async fn describe(&self, data: &[u8], mime_type: &str) -> MetadataRecord {
        let response = tokio::time::timeout(
            self.vision_timeout,
            self.vision.generate(data, mime_type, DESCRIPTION_PROMPT),
        )
        .await
        .unwrap_or(Err(VisionError::Timeout(self.vision_timeout)));
        if let Err(e) = &response {
            warn!("Vision request failed: {}", e);
        }
        normalize(response)
    }

    /// Every image in listing order, paired with its title and description.
    ///
    /// Only a failure to list at all is an error; unreadable descriptions
    /// degrade their own entry.
    pub async fn list_entries(&self) -> StorageResult<Vec<GalleryEntry>> {
        let objects = self.storage.list().await?;

        let descriptions: HashMap<&str, &ObjectInfo> = objects
            .iter()
            .filter(|object| naming::is_metadata_key(&object.key))
            .map(|object| (object.key.as_str(), object))
            .collect();

        debug!(
            "Listed {} objects, {} descriptions",
            objects.len(),
            descriptions.len()
        );

        let mut entries = Vec::new();
        for image in objects.iter().filter(|object| naming::is_allowed_image(&object.key)) {
            let metadata_key = naming::metadata_key(&image.key);
            let record = match descriptions.get(metadata_key.as_str()) {
                Some(description) => self.read_listing_record(&image.key, &description.key).await,
                None => MetadataRecord::placeholder(),
            };
            entries.push(GalleryEntry::new(image.key.clone(), record));
        }

        Ok(entries)
    }

    async fn read_listing_record(&self, image_key: &str, metadata_key: &str) -> MetadataRecord {
        let parsed = match self.storage.retrieve(metadata_key).await {
            Ok(bytes) => StoredMetadata::from_slice(&bytes).map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };

        match parsed {
            Ok(stored) => stored.into_record(),
            Err(e) => {
                warn!("Error fetching description for {}: {}", image_key, e);
                MetadataRecord::new(UNTITLED, UNREADABLE_DESCRIPTION)
            }
        }
    }

    /// Best-effort title and description for the detail page. Never fails.
    pub async fn image_detail(&self, filename: &str) -> ImageDetail {
        match self.read_metadata(filename).await {
            Ok(Some(bytes)) => match StoredMetadata::from_slice(&bytes) {
                Ok(stored) => ImageDetail::new(filename, stored.into_record()),
                Err(e) => {
                    warn!("Malformed description for {}: {}", filename, e);
                    ImageDetail::unreadable(filename, e)
                }
            },
            Ok(None) => ImageDetail::missing(filename),
            Err(e) => {
                warn!("Could not read description for {}: {}", filename, e);
                ImageDetail::unreadable(filename, e)
            }
        }
    }

    /// The stored description as JSON, for the API.
    pub async fn description_json(&self, filename: &str) -> ServerResult<Value> {
        let bytes = self.read_metadata(filename).await?.ok_or_else(|| {
            ServerError::NotFound(format!("No description found for '{}'", filename))
        })?;

        serde_json::from_slice(&bytes).map_err(|e| {
            ServerError::Corrupt(format!(
                "Description for '{}' is not valid JSON: {}",
                filename, e
            ))
        })
    }

    pub async fn image(&self, filename: &str) -> ServerResult<StoredImage> {
        if !self.storage.exists(filename).await? {
            return Err(ServerError::NotFound(format!("Image '{}' not found", filename)));
        }

        let info = self.storage.metadata(filename).await?;
        let data = self.storage.retrieve(filename).await?;

        Ok(StoredImage {
            data,
            content_type: info
                .content_type
                .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
        })
    }

    async fn read_metadata(&self, image_key: &str) -> StorageResult<Option<Vec<u8>>> {
        match self.storage.retrieve(&naming::metadata_key(image_key)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(StorageError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
#[path = "gallery_test.rs"]
mod tests;
