//! AI writing and image helpers. Nothing here is stored.

use axum::Json;
use axum::extract::State;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use socialdesk_types::account::Platform;
use socialdesk_types::content::{CaptionDraft, CaptionRequest};

use crate::http::error::AppError;
use crate::http::extractors::auth::Authenticated;
use crate::http::response::{ApiResponse, Timer};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct HashtagBody {
    pub topic: String,
    #[serde(default = "default_count")]
    pub count: usize,
    #[serde(default = "default_platform")]
    pub platform: Platform,
}

fn default_count() -> usize {
    10
}

fn default_platform() -> Platform {
    Platform::Instagram
}

#[derive(Debug, Deserialize)]
pub struct ImageBody {
    pub prompt: String,
}

#[derive(Debug, Serialize)]
pub struct ImagePayload {
    pub mime_type: String,
    /// Base64-encoded image bytes.
    pub data: String,
    pub fallback: bool,
}

/// POST /api/v1/ai/caption
pub async fn caption(
    State(state): State<AppState>,
    _auth: Authenticated,
    Json(body): Json<CaptionRequest>,
) -> Result<Json<ApiResponse<CaptionDraft>>, AppError> {
    let timer = Timer::start();
    let draft = state.content_service.caption(&body).await?;
    Ok(Json(timer.finish(draft)))
}

/// POST /api/v1/ai/hashtags
pub async fn hashtags(
    State(state): State<AppState>,
    _auth: Authenticated,
    Json(body): Json<HashtagBody>,
) -> Result<Json<ApiResponse<Vec<String>>>, AppError> {
    let timer = Timer::start();
    let tags = state
        .content_service
        .hashtags(&body.topic, body.count, body.platform)
        .await?;
    Ok(Json(timer.finish(tags)))
}

/// POST /api/v1/ai/image
pub async fn image(
    State(state): State<AppState>,
    _auth: Authenticated,
    Json(body): Json<ImageBody>,
) -> Result<Json<ApiResponse<ImagePayload>>, AppError> {
    let timer = Timer::start();
    let result = state.content_service.image(&body.prompt).await?;
    Ok(Json(timer.finish(ImagePayload {
        mime_type: result.image.mime_type,
        data: STANDARD.encode(&result.image.bytes),
        fallback: result.fallback,
    })))
}
