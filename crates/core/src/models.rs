use serde::{Deserialize, Serialize};

pub const UNTITLED: &str = "Untitled";
pub const NO_DESCRIPTION: &str = "No description available";
pub const NO_DESCRIPTION_FILE: &str = "No description file found";
pub const UNREADABLE_DESCRIPTION: &str = "Description could not be read";
pub const PROCESSING_ERROR_TITLE: &str = "Processing Error";
pub const ERROR_TITLE: &str = "Error";

/// Generated title and description for one image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRecord {
    pub title: String,
    pub description: String,
}

impl MetadataRecord {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }

    pub fn placeholder() -> Self {
        Self::new(UNTITLED, NO_DESCRIPTION)
    }

    /// Serialized form written to the object store
    pub fn to_json_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec_pretty(self)
    }
}

/// Metadata as read back from the store.
///
/// Records may have been written by older revisions or edited by hand, so
/// both fields are optional here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StoredMetadata {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl StoredMetadata {
    pub fn from_slice(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }

    /// Fill missing fields with placeholders
    pub fn into_record(self) -> MetadataRecord {
        MetadataRecord {
            title: self.title.unwrap_or_else(|| UNTITLED.to_string()),
            description: self.description.unwrap_or_else(|| NO_DESCRIPTION.to_string()),
        }
    }
}

/// One tile in the gallery listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GalleryEntry {
    pub filename: String,
    pub title: String,
    pub description: String,
}

impl GalleryEntry {
    pub fn new(filename: impl Into<String>, record: MetadataRecord) -> Self {
        Self {
            filename: filename.into(),
            title: record.title,
            description: record.description,
        }
    }
}

/// Everything the detail page shows for one image
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageDetail {
    pub filename: String,
    pub title: String,
    pub description: String,
}

impl ImageDetail {
    pub fn new(filename: impl Into<String>, record: MetadataRecord) -> Self {
        Self {
            filename: filename.into(),
            title: record.title,
            description: record.description,
        }
    }

    pub fn missing(filename: impl Into<String>) -> Self {
        Self::new(filename, MetadataRecord::new(UNTITLED, NO_DESCRIPTION_FILE))
    }

    pub fn unreadable(filename: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::new(
            filename,
            MetadataRecord::new(UNTITLED, format!("Error reading description: {}", reason)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_serializes_both_fields() {
        let record = MetadataRecord::new("Cat", "A cat.");
        let bytes = record.to_json_bytes().unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(value["title"], "Cat");
        assert_eq!(value["description"], "A cat.");
    }

    #[test]
    fn test_stored_metadata_defaults() {
        let stored = StoredMetadata::from_slice(br#"{"description": "Only text"}"#).unwrap();
        assert_eq!(stored.into_record(), MetadataRecord::new(UNTITLED, "Only text"));

        let stored = StoredMetadata::from_slice(br#"{"title": "T", "extra": 1}"#).unwrap();
        assert_eq!(stored.into_record(), MetadataRecord::new("T", NO_DESCRIPTION));
    }

    #[test]
    fn test_stored_metadata_rejects_garbage() {
        assert!(StoredMetadata::from_slice(b"not json").is_err());
        assert!(StoredMetadata::from_slice(b"[1, 2]").is_err());
        assert!(StoredMetadata::from_slice(br#"{"title": 42}"#).is_err());
    }

    #[test]
    fn test_detail_placeholders() {
        let detail = ImageDetail::missing("cat.png");
        assert_eq!(detail.title, UNTITLED);
        assert_eq!(detail.description, NO_DESCRIPTION_FILE);

        let detail = ImageDetail::unreadable("cat.png", "expected value at line 1 column 1");
        assert_eq!(
            detail.description,
            "Error reading description: expected value at line 1 column 1"
        );
    }
}
