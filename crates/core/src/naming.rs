//! Key naming convention pairing each image blob with its metadata blob.
//!
//! `cat.png` is described by `cat_description.json`. Nothing is escaped, so an
//! image whose base name already ends in `_description` shares the scheme with
//! everything else and two uploads of the same name overwrite each other.

use crate::{CoreError, CoreResult};

/// Suffix appended to an image's base name to form its metadata key.
pub const METADATA_SUFFIX: &str = "_description.json";

/// Image extensions accepted for upload and shown in the gallery.
pub const ALLOWED_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "gif"];

/// Strip the final extension of the last path segment.
///
/// A leading dot is not an extension separator, so `.hidden` is unchanged.
pub fn strip_extension(key: &str) -> &str {
    let segment_start = key.rfind('/').map(|idx| idx + 1).unwrap_or(0);
    match key[segment_start..].rfind('.') {
        Some(dot) if dot > 0 => &key[..segment_start + dot],
        _ => key,
    }
}

/// Lowercase extension of the last path segment, if it has one.
pub fn extension(key: &str) -> Option<String> {
    let stem = strip_extension(key);
    if stem.len() == key.len() {
        return None;
    }
    Some(key[stem.len() + 1..].to_lowercase())
}

pub fn metadata_key(image_key: &str) -> String {
    format!("{}{}", strip_extension(image_key), METADATA_SUFFIX)
}

pub fn is_allowed_image(key: &str) -> bool {
    extension(key).is_some_and(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
}

pub fn is_metadata_key(key: &str) -> bool {
    key.ends_with(METADATA_SUFFIX)
}

/// Check an uploaded filename before anything is written.
///
/// The error text is shown to the user as-is.
pub fn validate_image_filename(filename: &str) -> CoreResult<()> {
    if filename.is_empty() {
        return Err(CoreError::validation("No selected file"));
    }
    if !is_allowed_image(filename) {
        return Err(CoreError::validation("Invalid file type"));
    }
    Ok(())
}
