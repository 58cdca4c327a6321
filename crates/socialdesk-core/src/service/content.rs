//! AI-assisted content: captions, hashtags, reply suggestions, and images.
//!
//! Prompts are kept to the minimum the model needs. Output is cleaned up
//! with the helpers in [`crate::ai::text`] so it fits the target platform.

use std::sync::Arc;

use socialdesk_types::account::Platform;
use socialdesk_types::content::{CaptionDraft, CaptionRequest, GeneratedImage, GenerationOptions};
use socialdesk_types::error::ContentError;
use socialdesk_types::inbox::{Conversation, Message, MessageDirection};
use socialdesk_types::media::Rgb;

use crate::ai::generator::ContentGenerator;
use crate::ai::text::{fit_caption, parse_hashtag_list, split_caption, truncate_at_word};
use crate::service::storage::SlideRenderer;

/// Messages of a thread included when drafting a reply.
const REPLY_CONTEXT_MESSAGES: usize = 10;

/// Upper bound for a suggested reply.
const REPLY_MAX_CHARS: usize = 1_000;

/// Gradient used when no image can be generated.
pub const FALLBACK_FROM: Rgb = Rgb(0x3a, 0x1c, 0x71);
pub const FALLBACK_TO: Rgb = Rgb(0xff, 0xaf, 0x7b);

/// An image for a post, possibly a gradient placeholder.
#[derive(Debug, Clone)]
pub struct ImageResult {
    pub image: GeneratedImage,
    /// True when the generator failed and a gradient was rendered instead.
    pub fallback: bool,
}

pub struct ContentService<G: ContentGenerator, R: SlideRenderer + 'static> {
    generator: G,
    renderer: Arc<R>,
    options: GenerationOptions,
    image_size: (u32, u32),
}

impl<G: ContentGenerator, R: SlideRenderer + 'static> ContentService<G, R> {
    pub fn new(generator: G, renderer: Arc<R>, options: GenerationOptions, image_size: (u32, u32)) -> Self {
        Self {
            generator,
            renderer,
            options,
            image_size,
        }
    }

    /// Draft a caption for a platform.
    pub async fn caption(&self, request: &CaptionRequest) -> Result<CaptionDraft, ContentError> {
        let brief = request.brief.trim();
        if brief.is_empty() {
            return Err(ContentError::InvalidRequest("brief cannot be empty".to_string()));
        }
        let platform = request.platform;

        let mut prompt = format!(
            "Write a {tone} {platform} caption about: {brief}\n\
             Keep it under {limit} characters. End with up to {tags} relevant hashtags on the last line.",
            tone = request.tone,
            limit = platform.caption_limit(),
            tags = platform.hashtag_limit().min(10),
        );
        if let Some(context) = request.context.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
            prompt.push_str("\nContext: ");
            prompt.push_str(context);
        }

        let raw = self.generator.generate_text(&prompt, &self.options).await?;
        let (body, mut hashtags) = split_caption(&raw);
        if body.is_empty() && hashtags.is_empty() {
            return Err(ContentError::EmptyResponse);
        }
        hashtags.truncate(platform.hashtag_limit());
        let (content, hashtags) = fit_caption(&body, &hashtags, platform.caption_limit());

        Ok(CaptionDraft { content, hashtags })
    }

    /// Suggest up to `count` hashtags for a topic.
    pub async fn hashtags(
        &self,
        topic: &str,
        count: usize,
        platform: Platform,
    ) -> Result<Vec<String>, ContentError> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(ContentError::InvalidRequest("topic cannot be empty".to_string()));
        }
        let count = count.clamp(1, platform.hashtag_limit());
        let prompt = format!(
            "List {count} popular {platform} hashtags for: {topic}\nReturn only the hashtags, separated by spaces."
        );
        let raw = self.generator.generate_text(&prompt, &self.options).await?;
        let mut tags = parse_hashtag_list(&raw);
        if tags.is_empty() {
            return Err(ContentError::EmptyResponse);
        }
        tags.truncate(count);
        Ok(tags)
    }

    /// Draft a reply to the latest messages of a conversation.
    pub async fn suggest_reply(
        &self,
        conversation: &Conversation,
        messages: &[Message],
        platform: Option<Platform>,
    ) -> Result<String, ContentError> {
        if messages.is_empty() {
            return Err(ContentError::InvalidRequest("conversation has no messages".to_string()));
        }
        let start = messages.len().saturating_sub(REPLY_CONTEXT_MESSAGES);
        let transcript: Vec<String> = messages[start..]
            .iter()
            .map(|m| {
                let who = match m.direction {
                    MessageDirection::Inbound => m.sender_handle.as_deref().unwrap_or("customer"),
                    MessageDirection::Outbound => "us",
                };
                format!("{who}: {}", m.body.trim())
            })
            .collect();

        let prompt = format!(
            "You manage a brand's social media inbox. Write one short, friendly reply to this {kind}{on}.\n\
             Reply with the message text only.\n\n{transcript}",
            kind = conversation.kind.to_string().replace('_', " "),
            on = platform.map(|p| format!(" on {p}")).unwrap_or_default(),
            transcript = transcript.join("\n"),
        );
        let raw = self.generator.generate_text(&prompt, &self.options).await?;
        let (body, _) = split_caption(&raw);
        if body.is_empty() {
            return Err(ContentError::EmptyResponse);
        }
        let limit = platform.map_or(REPLY_MAX_CHARS, |p| p.caption_limit().min(REPLY_MAX_CHARS));
        Ok(truncate_at_word(&body, limit))
    }

    /// Generate an image, falling back to a rendered gradient when the
    /// generator fails or returns no image.
    pub async fn image(&self, prompt: &str) -> Result<ImageResult, ContentError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(ContentError::InvalidRequest("prompt cannot be empty".to_string()));
        }

        match self.generator.generate_image(prompt).await {
            Ok(Some(image)) if !image.bytes.is_empty() => {
                return Ok(ImageResult {
                    image,
                    fallback: false,
                });
            }
            Ok(_) => tracing::warn!("image model returned no image, using gradient"),
            Err(e) => tracing::warn!(error = %e, "image generation failed, using gradient"),
        }

        let renderer = Arc::clone(&self.renderer);
        let (width, height) = self.image_size;
        let bytes = tokio::task::spawn_blocking(move || {
            renderer.gradient(width, height, FALLBACK_FROM, FALLBACK_TO)
        })
        .await
        .map_err(|e| ContentError::Provider(format!("gradient task failed: {e}")))?
        .map_err(|e| ContentError::Provider(e.to_string()))?;

        Ok(ImageResult {
            image: GeneratedImage {
                bytes,
                mime_type: "image/png".to_string(),
            },
            fallback: true,
        })
    }
}
