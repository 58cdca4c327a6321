//! ContentGenerator trait definition.

use socialdesk_types::content::{GeneratedImage, GenerationOptions};
use socialdesk_types::error::ContentError;

/// Trait for generative AI backends (Gemini).
///
/// Implementations live in socialdesk-infra (e.g., `GeminiClient`).
pub trait ContentGenerator: Send + Sync {
    /// Generate text for a prompt.
    fn generate_text(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> impl std::future::Future<Output = Result<String, ContentError>> + Send;

    /// Generate an image for a prompt. `Ok(None)` means the model answered
    /// without an image (e.g. it refused or returned only text).
    fn generate_image(
        &self,
        prompt: &str,
    ) -> impl std::future::Future<Output = Result<Option<GeneratedImage>, ContentError>> + Send;
}

/// A missing provider: every call fails with `ContentError::NotConfigured`.
impl<T: ContentGenerator> ContentGenerator for Option<T> {
    async fn generate_text(&self, prompt: &str, options: &GenerationOptions) -> Result<String, ContentError> {
        match self {
            Some(generator) => generator.generate_text(prompt, options).await,
            None => Err(ContentError::NotConfigured),
        }
    }

    async fn generate_image(&self, prompt: &str) -> Result<Option<GeneratedImage>, ContentError> {
        match self {
            Some(generator) => generator.generate_image(prompt).await,
            None => Err(ContentError::NotConfigured),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeGenerator;

    #[tokio::test]
    async fn test_missing_generator_is_not_configured() {
        let generator: Option<FakeGenerator> = None;
        let err = generator
            .generate_text("hi", &GenerationOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ContentError::NotConfigured));
        assert!(matches!(
            generator.generate_image("hi").await,
            Err(ContentError::NotConfigured)
        ));
    }
}
