use async_trait::async_trait;

use crate::error::InferenceResult;

/// Vision model that turns a text prompt plus one image into free text.
///
/// The Gemini client is the production implementation; tests script their own.
#[async_trait]
pub trait VisionProvider: Send + Sync {
    async fn infer(&self, prompt: &str, image: &[u8], mime_type: &str) -> InferenceResult<String>;

    /// Model identifier reported in analysis metadata
    fn model_id(&self) -> &str;
}
