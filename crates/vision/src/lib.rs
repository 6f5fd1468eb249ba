//! Vision-description client.
//!
//! [`VisionClient`] is the seam the upload pipeline depends on;
//! [`GeminiClient`] talks to Google's `generateContent` endpoint.

pub mod client;
pub mod error;
pub mod gemini;

pub use client::VisionClient;
pub use error::{VisionError, VisionResult};
pub use gemini::{GeminiClient, GeminiOptions};
