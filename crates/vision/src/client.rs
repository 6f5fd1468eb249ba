use crate::VisionResult;
use async_trait::async_trait;

#[async_trait]
pub trait VisionClient: Send + Sync {
    /// Ask the model about `image` and return its raw text answer.
    ///
    /// An empty string means the model produced no text at all.
    async fn generate(&self, image: &[u8], mime_type: &str, prompt: &str) -> VisionResult<String>;
}
