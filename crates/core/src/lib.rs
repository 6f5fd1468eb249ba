pub mod config;
pub mod describe;
pub mod error;
pub mod models;
pub mod naming;

pub use config::CoreConfig;
pub use describe::{fallback_record, normalize, parse_description, DescribeFailure, DESCRIPTION_PROMPT};
pub use error::{CoreError, CoreResult};
pub use models::{GalleryEntry, ImageDetail, MetadataRecord, StoredMetadata};
