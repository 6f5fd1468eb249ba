use crate::{guess_content_type, ObjectInfo, StorageBackend, StorageError, StorageResult};
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Stores blobs as plain files below a base directory.
///
/// The filesystem keeps no per-file content type, so it is derived from the
/// key's extension on every read.
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    /// Validate and sanitize the key to prevent directory traversal
    fn validate_path(&self, key: &str) -> StorageResult<PathBuf> {
        let clean_key = key.trim_start_matches('/');

        if clean_key.is_empty() {
            return Err(StorageError::InvalidPath("Empty key".to_string()));
        }

        // Dots inside a name are fine; only `..`, `.` or rooted segments escape
        let traverses = Path::new(clean_key)
            .components()
            .any(|component| !matches!(component, Component::Normal(_)));

        if traverses || clean_key.contains('\\') {
            return Err(StorageError::InvalidPath(format!(
                "Key contains invalid sequences: {}",
                key
            )));
        }

        let full_path = self.base_path.join(clean_key);

        if !full_path.starts_with(&self.base_path) {
            return Err(StorageError::InvalidPath(format!(
                "Key outside base directory: {}",
                key
            )));
        }

        Ok(full_path)
    }

    async fn ensure_parent_dir(&self, file_path: &Path) -> StorageResult<()> {
        if let Some(parent) = file_path.parent() {
            if !parent.exists() {
                debug!("Creating directory: {:?}", parent);
                fs::create_dir_all(parent).await?;
            }
        }
        Ok(())
    }

    fn key_for(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.base_path).ok()?;
        let parts: Vec<&str> = relative
            .components()
            .map(|component| component.as_os_str().to_str())
            .collect::<Option<_>>()?;
        Some(parts.join("/"))
    }

    fn info(&self, key: &str, size: u64) -> ObjectInfo {
        ObjectInfo {
            key: key.trim_start_matches('/').to_string(),
            size,
            content_type: Some(guess_content_type(key).to_string()),
        }
    }
}

#[async_trait]
impl StorageBackend for LocalStorage {
    async fn store(
        &self,
        key: &str,
        data: &[u8],
        content_type: Option<&str>,
    ) -> StorageResult<ObjectInfo> {
        let file_path = self.validate_path(key)?;

        debug!(
            "Storing file at: {:?} (requested content-type: {:?})",
            file_path, content_type
        );

        self.ensure_parent_dir(&file_path).await?;
        fs::write(&file_path, data).await?;

        let metadata = fs::metadata(&file_path).await?;
        let info = self.info(key, metadata.len());

        debug!(
            "Stored file: {} bytes, content-type: {:?}",
            info.size, info.content_type
        );

        Ok(info)
    }

    async fn retrieve(&self, key: &str) -> StorageResult<Vec<u8>> {
        let file_path = self.validate_path(key)?;

        debug!("Retrieving file from: {:?}", file_path);

        if !file_path.is_file() {
            return Err(StorageError::NotFound(key.to_string()));
        }

        let data = fs::read(&file_path).await?;
        debug!("Retrieved file: {} bytes", data.len());

        Ok(data)
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        let file_path = self.validate_path(key)?;
        Ok(file_path.is_file())
    }

    async fn list(&self) -> StorageResult<Vec<ObjectInfo>> {
        let mut objects = Vec::new();

        if !self.base_path.exists() {
            return Ok(objects);
        }

        let mut pending = vec![self.base_path.clone()];
        while let Some(dir) = pending.pop() {
            let mut entries = fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let file_type = entry.file_type().await?;
                let path = entry.path();

                if file_type.is_dir() {
                    pending.push(path);
                } else if file_type.is_file() {
                    match self.key_for(&path) {
                        Some(key) => {
                            let size = entry.metadata().await?.len();
                            objects.push(self.info(&key, size));
                        }
                        None => debug!("Skipping non UTF-8 path: {:?}", path),
                    }
                }
            }
        }

        objects.sort_by(|a, b| a.key.cmp(&b.key));
        debug!("Listed {} files under {:?}", objects.len(), self.base_path);

        Ok(objects)
    }

    async fn metadata(&self, key: &str) -> StorageResult<ObjectInfo> {
        let file_path = self.validate_path(key)?;

        if !file_path.is_file() {
            return Err(StorageError::NotFound(key.to_string()));
        }

        let metadata = fs::metadata(&file_path).await?;
        Ok(self.info(key, metadata.len()))
    }
}
