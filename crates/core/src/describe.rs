//! Validation of the vision model's answer.
//!
//! The model is asked for a JSON object with `title` and `description`. Its
//! answer is parsed strictly; anything else becomes a [`DescribeFailure`] and
//! then a placeholder record, so an upload always ends up with metadata.

use crate::models::{MetadataRecord, ERROR_TITLE, NO_DESCRIPTION, PROCESSING_ERROR_TITLE, UNTITLED};
use serde_json::Value;
use std::fmt::Display;
use thiserror::Error;

/// Instruction sent along with every uploaded image.
pub const DESCRIPTION_PROMPT: &str =
    "Give me a simple title and description in json format for this image.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DescribeFailure {
    #[error("model returned an empty response")]
    Empty,

    #[error("model response is not a JSON object: {0}")]
    NotJson(String),

    #[error("model response lacks a string title and description: {0}")]
    MissingFields(String),

    #[error("vision client failed: {0}")]
    Client(String),
}

pub fn parse_description(text: &str) -> Result<MetadataRecord, DescribeFailure> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(DescribeFailure::Empty);
    }

    let value: Value =
        serde_json::from_str(trimmed).map_err(|_| DescribeFailure::NotJson(trimmed.to_string()))?;

    let object = value
        .as_object()
        .ok_or_else(|| DescribeFailure::NotJson(trimmed.to_string()))?;

    match (
        object.get("title").and_then(Value::as_str),
        object.get("description").and_then(Value::as_str),
    ) {
        (Some(title), Some(description)) => Ok(MetadataRecord::new(title, description)),
        _ => Err(DescribeFailure::MissingFields(trimmed.to_string())),
    }
}

/// Placeholder record explaining why no real description exists.
pub fn fallback_record(failure: &DescribeFailure) -> MetadataRecord {
    match failure {
        DescribeFailure::Empty => MetadataRecord::new(UNTITLED, NO_DESCRIPTION),
        DescribeFailure::NotJson(text) => MetadataRecord::new(
            PROCESSING_ERROR_TITLE,
            format!("The model did not return valid JSON. Raw response: {}", text),
        ),
        DescribeFailure::MissingFields(text) => MetadataRecord::new(
            PROCESSING_ERROR_TITLE,
            format!(
                "The model response did not contain a title and description. Raw response: {}",
                text
            ),
        ),
        DescribeFailure::Client(error) => {
            MetadataRecord::new(ERROR_TITLE, format!("Error processing image: {}", error))
        }
    }
}

/// Turn a vision call outcome into the record that gets stored.
pub fn normalize<E: Display>(response: Result<String, E>) -> MetadataRecord {
    let parsed = match response {
        Ok(text) => parse_description(&text),
        Err(error) => Err(DescribeFailure::Client(error.to_string())),
    };

    match parsed {
        Ok(record) => record,
        Err(failure) => {
            tracing::warn!("Using placeholder metadata: {}", failure);
            fallback_record(&failure)
        }
    }
}
