pub mod backend;
pub mod config;
pub mod error;
pub mod local;
pub mod memory;

#[cfg(feature = "s3")]
pub mod s3;

#[cfg(test)]
mod tests;

pub use backend::{guess_content_type, ObjectInfo, StorageBackend, DEFAULT_CONTENT_TYPE};
pub use config::{StorageConfig, StorageType};
pub use error::{StorageError, StorageResult};
pub use local::LocalStorage;
pub use memory::MemoryStorage;

#[cfg(feature = "s3")]
pub use s3::S3Storage;
