//! GeminiClient -- [`ContentGenerator`] backed by the Google Generative
//! Language API.
//!
//! The API key is held as a [`SecretString`] and only exposed when building
//! the request URL query.

use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use secrecy::{ExposeSecret, SecretString};

use socialdesk_core::ai::generator::ContentGenerator;
use socialdesk_types::config::AiConfig;
use socialdesk_types::content::{GeneratedImage, GenerationOptions};
use socialdesk_types::error::ContentError;

use super::types::{ApiErrorBody, GenerateContentRequest, GenerateContentResponse, GenerationConfig};

pub struct GeminiClient {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
    model: String,
    image_model: String,
}

impl GeminiClient {
    pub fn new(api_key: SecretString, config: &AiConfig) -> Self {
        let client = crate::http::client_with_timeout(Duration::from_secs(120));
        Self {
            client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            image_model: config.image_model.clone(),
        }
    }

    /// Override the base URL (tests, proxies).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, ContentError> {
        let url = format!("{}/v1beta/models/{model}:generateContent", self.base_url);
        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.expose_secret())])
            .json(request)
            .send()
            .await
            .map_err(|e| ContentError::Provider(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or(body);
            return Err(match status.as_u16() {
                401 | 403 => ContentError::AuthenticationFailed,
                429 => ContentError::RateLimited,
                400 => ContentError::InvalidRequest(message),
                _ => ContentError::Provider(format!("HTTP {status}: {message}")),
            });
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ContentError::Provider(format!("failed to parse response: {e}")))?;

        if let Some(reason) = parsed.prompt_feedback.as_ref().and_then(|f| f.block_reason.clone()) {
            return Err(ContentError::Blocked(reason));
        }
        Ok(parsed)
    }
}

impl ContentGenerator for GeminiClient {
    async fn generate_text(&self, prompt: &str, options: &GenerationOptions) -> Result<String, ContentError> {
        let request = GenerateContentRequest::user_prompt(
            prompt,
            GenerationConfig {
                temperature: Some(options.temperature),
                max_output_tokens: Some(options.max_output_tokens),
                response_modalities: None,
            },
        );
        let response = self.generate_content(&self.model, &request).await?;

        let Some(candidate) = response.candidates.into_iter().next() else {
            return Err(ContentError::EmptyResponse);
        };
        let text = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect::<Vec<_>>().join(""))
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(match candidate.finish_reason.as_deref() {
                Some("SAFETY") | Some("PROHIBITED_CONTENT") | Some("BLOCKLIST") => {
                    ContentError::Blocked(candidate.finish_reason.unwrap_or_default())
                }
                _ => ContentError::EmptyResponse,
            });
        }
        tracing::debug!(model = %self.model, chars = text.len(), "generated text");
        Ok(text.trim().to_string())
    }

    async fn generate_image(&self, prompt: &str) -> Result<Option<GeneratedImage>, ContentError> {
        let request = GenerateContentRequest::user_prompt(
            prompt,
            GenerationConfig {
                response_modalities: Some(vec!["TEXT".to_string(), "IMAGE".to_string()]),
                ..GenerationConfig::default()
            },
        );
        let response = self.generate_content(&self.image_model, &request).await?;

        let inline = response
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .find_map(|p| p.inline_data);

        let Some(inline) = inline else {
            tracing::info!(model = %self.image_model, "image model returned no image");
            return Ok(None);
        };
        let bytes = STANDARD
            .decode(inline.data.as_bytes())
            .map_err(|e| ContentError::Provider(format!("invalid image data: {e}")))?;

        Ok(Some(GeneratedImage {
            bytes,
            mime_type: inline.mime_type,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> GeminiClient {
        GeminiClient::new(SecretString::from("test-key"), &AiConfig::default()).with_base_url(&server.uri())
    }

    #[tokio::test]
    async fn test_generate_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-1.5-flash:generateContent"))
            .and(query_param("key", "test-key"))
            .and(body_partial_json(json!({"generationConfig": {"maxOutputTokens": 1024}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": {"role": "model", "parts": [{"text": "Fresh picks "}, {"text": "for spring"}]},
                    "finishReason": "STOP"
                }]
            })))
            .mount(&server)
            .await;

        let text = client(&server)
            .generate_text("write a caption", &GenerationOptions::default())
            .await
            .unwrap();
        assert_eq!(text, "Fresh picks for spring");
    }

    #[tokio::test]
    async fn test_error_status_mapping() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": {"code": 400, "message": "API key not valid", "status": "INVALID_ARGUMENT"}
            })))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let c = client(&server);
        let err = c.generate_text("x", &GenerationOptions::default()).await.unwrap_err();
        assert!(matches!(err, ContentError::InvalidRequest(m) if m == "API key not valid"));
        let err = c.generate_text("x", &GenerationOptions::default()).await.unwrap_err();
        assert!(matches!(err, ContentError::RateLimited));
    }

    #[tokio::test]
    async fn test_blocked_prompt_and_empty_candidates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "promptFeedback": {"blockReason": "SAFETY"}
            })))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
            .mount(&server)
            .await;

        let c = client(&server);
        let err = c.generate_text("x", &GenerationOptions::default()).await.unwrap_err();
        assert!(matches!(err, ContentError::Blocked(r) if r == "SAFETY"));
        let err = c.generate_text("x", &GenerationOptions::default()).await.unwrap_err();
        assert!(matches!(err, ContentError::EmptyResponse));
    }

    #[tokio::test]
    async fn test_generate_image_decodes_inline_data() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/gemini-2.0-flash-preview-image-generation:generateContent"))
            .and(body_partial_json(json!({"generationConfig": {"responseModalities": ["TEXT", "IMAGE"]}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": [
                    {"text": "Here is your image"},
                    {"inlineData": {"mimeType": "image/png", "data": STANDARD.encode([137u8, 80, 78, 71])}}
                ]}}]
            })))
            .mount(&server)
            .await;

        let image = client(&server).generate_image("a lemon").await.unwrap().unwrap();
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.bytes, vec![137, 80, 78, 71]);
    }

    #[tokio::test]
    async fn test_generate_image_text_only_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{"content": {"parts": [{"text": "I can't draw that"}]}}]
            })))
            .mount(&server)
            .await;

        assert!(client(&server).generate_image("x").await.unwrap().is_none());
    }
}
