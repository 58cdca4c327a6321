//! Media library handlers: uploads, stock photos, carousels, generated images.

use axum::Json;
use axum::extract::{Path, Query, State};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use socialdesk_core::service::media::UploadRequest;
use socialdesk_types::id::MediaId;
use socialdesk_types::media::{CarouselSlide, MediaAsset, MediaKind, StockPhoto};

use crate::http::error::AppError;
use crate::http::extractors::auth::Authenticated;
use crate::http::extractors::query::{MediaListQuery, StockSearchQuery};
use crate::http::handlers::{parse_id, require_editor};
use crate::http::response::{ApiResponse, Timer};
use crate::state::AppState;

/// Upload body. The file travels base64-encoded in `data`.
#[derive(Debug, Deserialize)]
pub struct UploadBody {
    pub data: String,
    #[serde(default)]
    pub kind: Option<MediaKind>,
    pub alt_text: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct CarouselBody {
    pub slides: Vec<CarouselSlide>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateBody {
    pub prompt: String,
}

#[derive(Debug, Serialize)]
pub struct GeneratedAsset {
    pub asset: MediaAsset,
    /// The generator gave nothing usable and a gradient was stored instead.
    pub fallback: bool,
}

/// GET /api/v1/media
pub async fn list_media(
    State(state): State<AppState>,
    auth: Authenticated,
    Query(query): Query<MediaListQuery>,
) -> Result<Json<ApiResponse<Vec<MediaAsset>>>, AppError> {
    let timer = Timer::start();
    let assets = state
        .media_service
        .list(&auth.brand_id(), query.into_filter()?)
        .await?;
    Ok(Json(timer.finish(assets).with_link("self", "/api/v1/media")))
}

/// POST /api/v1/media
pub async fn upload_media(
    State(state): State<AppState>,
    auth: Authenticated,
    Json(body): Json<UploadBody>,
) -> Result<Json<ApiResponse<MediaAsset>>, AppError> {
    let timer = Timer::start();
    require_editor(&auth)?;
    let bytes = STANDARD
        .decode(body.data.trim())
        .map_err(|e| AppError::Validation(format!("data is not valid base64: {e}")))?;
    let asset = state
        .media_service
        .upload(
            &auth.brand_id(),
            UploadRequest {
                bytes,
                kind: body.kind.unwrap_or(MediaKind::Image),
                alt_text: body.alt_text,
                tags: body.tags,
            },
        )
        .await?;
    let href = format!("/api/v1/media/{}", asset.id);
    Ok(Json(timer.finish(asset).with_link("self", &href)))
}

/// GET /api/v1/media/{id}
pub async fn get_media(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<MediaAsset>>, AppError> {
    let timer = Timer::start();
    let id: MediaId = parse_id(&id, "media asset")?;
    let asset = state.media_service.get(&auth.brand_id(), &id).await?;
    Ok(Json(timer.finish(asset)))
}

/// DELETE /api/v1/media/{id}
pub async fn delete_media(
    State(state): State<AppState>,
    auth: Authenticated,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let timer = Timer::start();
    require_editor(&auth)?;
    let id: MediaId = parse_id(&id, "media asset")?;
    state.media_service.delete(&auth.brand_id(), &id).await?;
    Ok(Json(timer.finish(serde_json::json!({ "deleted": id }))))
}

/// GET /api/v1/media/stock?q=coffee
pub async fn search_stock(
    State(state): State<AppState>,
    _auth: Authenticated,
    Query(query): Query<StockSearchQuery>,
) -> Result<Json<ApiResponse<Vec<StockPhoto>>>, AppError> {
    let timer = Timer::start();
    let photos = state
        .media_service
        .search_stock(&query.q, query.per_page)
        .await?;
    Ok(Json(timer.finish(photos)))
}

/// POST /api/v1/media/stock/import - add a search hit to the library.
pub async fn import_stock(
    State(state): State<AppState>,
    auth: Authenticated,
    Json(photo): Json<StockPhoto>,
) -> Result<Json<ApiResponse<MediaAsset>>, AppError> {
    let timer = Timer::start();
    require_editor(&auth)?;
    let asset = state.media_service.import_stock(&auth.brand_id(), &photo).await?;
    Ok(Json(timer.finish(asset)))
}

/// POST /api/v1/media/carousel - render and host carousel slides.
pub async fn render_carousel(
    State(state): State<AppState>,
    auth: Authenticated,
    Json(body): Json<CarouselBody>,
) -> Result<Json<ApiResponse<Vec<MediaAsset>>>, AppError> {
    let timer = Timer::start();
    require_editor(&auth)?;
    let assets = state
        .media_service
        .render_carousel(&auth.brand_id(), &body.slides)
        .await?;
    Ok(Json(timer.finish(assets)))
}

/// POST /api/v1/media/generated - generate an image and keep it.
pub async fn generate_media(
    State(state): State<AppState>,
    auth: Authenticated,
    Json(body): Json<GenerateBody>,
) -> Result<Json<ApiResponse<GeneratedAsset>>, AppError> {
    let timer = Timer::start();
    require_editor(&auth)?;
    let generated = state.content_service.image(&body.prompt).await?;
    let asset = state
        .media_service
        .save_generated(&auth.brand_id(), &generated.image, &body.prompt)
        .await?;
    Ok(Json(timer.finish(GeneratedAsset {
        asset,
        fallback: generated.fallback,
    })))
}
