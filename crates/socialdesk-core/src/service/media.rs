//! Media library: uploads, stock photos, generated images, and carousel
//! slides rendered from text.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use socialdesk_types::content::GeneratedImage;
use socialdesk_types::error::{MediaError, RepositoryError};
use socialdesk_types::id::{BrandId, MediaId};
use socialdesk_types::media::{
    CarouselSlide, MediaAsset, MediaKind, MediaSource, Rgb, SlideSpec, StockPhoto, StoredMedia,
};
use socialdesk_types::post::normalize_hashtags;

use crate::repository::media::{MediaFilter, MediaRepository};
use crate::service::post::{CAROUSEL_MAX, CAROUSEL_MIN};
use crate::service::storage::{MediaFetcher, MediaStore, SlideRenderer, StockPhotoSearch};

/// Default slide accent.
pub const DEFAULT_ACCENT: Rgb = Rgb(0x1f, 0x2a, 0x44);
const TEXT_COLOR: Rgb = Rgb(0xff, 0xff, 0xff);
const MAX_STOCK_RESULTS: u32 = 30;

fn storage(e: RepositoryError) -> MediaError {
    MediaError::StorageError(e.to_string())
}

/// Darken a color towards black by `factor` (0 keeps it, 1 is black).
pub fn darken(color: Rgb, factor: f32) -> Rgb {
    let f = 1.0 - factor.clamp(0.0, 1.0);
    let scale = |c: u8| (f32::from(c) * f).round() as u8;
    Rgb(scale(color.0), scale(color.1), scale(color.2))
}

/// Uploaded file plus library metadata.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub bytes: Vec<u8>,
    pub kind: MediaKind,
    pub alt_text: Option<String>,
    pub tags: Vec<String>,
}

/// Size of rendered slides.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SlideSize {
    pub width: u32,
    pub height: u32,
}

pub struct MediaService<M, S, K, F, R>
where
    M: MediaRepository,
    S: MediaStore,
    K: StockPhotoSearch,
    F: MediaFetcher,
    R: SlideRenderer + 'static,
{
    assets: M,
    store: S,
    stock: K,
    fetcher: F,
    renderer: Arc<R>,
    folder: String,
    slide_size: SlideSize,
}

impl<M, S, K, F, R> MediaService<M, S, K, F, R>
where
    M: MediaRepository,
    S: MediaStore,
    K: StockPhotoSearch,
    F: MediaFetcher,
    R: SlideRenderer + 'static,
{
    pub fn new(
        assets: M,
        store: S,
        stock: K,
        fetcher: F,
        renderer: Arc<R>,
        folder: String,
        slide_size: SlideSize,
    ) -> Self {
        Self {
            assets,
            store,
            stock,
            fetcher,
            renderer,
            folder,
            slide_size,
        }
    }

    fn brand_folder(&self, brand_id: &BrandId) -> String {
        format!("{}/{}", self.folder.trim_end_matches('/'), brand_id)
    }

    #[allow(clippy::too_many_arguments)]
    async fn record(
        &self,
        brand_id: &BrandId,
        stored: StoredMedia,
        kind: MediaKind,
        source: MediaSource,
        alt_text: Option<String>,
        attribution: Option<String>,
        tags: Vec<String>,
    ) -> Result<MediaAsset, MediaError> {
        let asset = MediaAsset {
            id: MediaId::new(),
            brand_id: *brand_id,
            url: stored.url,
            public_id: Some(stored.public_id),
            kind,
            source,
            width: stored.width,
            height: stored.height,
            bytes: stored.bytes,
            alt_text,
            attribution,
            tags,
            created_at: Utc::now(),
        };
        self.assets.create(&asset).await.map_err(storage)
    }

    /// Host a user-provided file and add it to the library.
    pub async fn upload(&self, brand_id: &BrandId, request: UploadRequest) -> Result<MediaAsset, MediaError> {
        if request.bytes.is_empty() {
            return Err(MediaError::Validation("file is empty".to_string()));
        }
        let stored = self
            .store
            .upload(&request.bytes, &self.brand_folder(brand_id), None)
            .await?;
        let asset = self
            .record(
                brand_id,
                stored,
                request.kind,
                MediaSource::Upload,
                request.alt_text,
                None,
                normalize_tags(&request.tags),
            )
            .await?;
        tracing::info!(media_id = %asset.id, bytes = ?asset.bytes, "uploaded media");
        Ok(asset)
    }

    pub async fn search_stock(&self, query: &str, per_page: u32) -> Result<Vec<StockPhoto>, MediaError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(MediaError::Validation("search query cannot be empty".to_string()));
        }
        self.stock
            .search(query, per_page.clamp(1, MAX_STOCK_RESULTS))
            .await
    }

    /// Add a stock photo to the library. The photo stays hosted by the
    /// provider; the asset records the photographer credit.
    pub async fn import_stock(&self, brand_id: &BrandId, photo: &StockPhoto) -> Result<MediaAsset, MediaError> {
        if let Err(e) = self.stock.track_download(photo).await {
            tracing::warn!(photo_id = %photo.id, error = %e, "download tracking failed");
        }
        let asset = MediaAsset {
            id: MediaId::new(),
            brand_id: *brand_id,
            url: photo.url.clone(),
            public_id: None,
            kind: MediaKind::Image,
            source: MediaSource::Unsplash,
            width: Some(photo.width),
            height: Some(photo.height),
            bytes: None,
            alt_text: photo.description.clone(),
            attribution: Some(format!("Photo by {} on Unsplash", photo.photographer)),
            tags: vec![],
            created_at: Utc::now(),
        };
        self.assets.create(&asset).await.map_err(storage)
    }

    /// Store an AI-generated (or fallback) image.
    pub async fn save_generated(
        &self,
        brand_id: &BrandId,
        image: &GeneratedImage,
        prompt: &str,
    ) -> Result<MediaAsset, MediaError> {
        let stored = self
            .store
            .upload(&image.bytes, &self.brand_folder(brand_id), None)
            .await?;
        self.record(
            brand_id,
            stored,
            MediaKind::Image,
            MediaSource::Generated,
            Some(prompt.trim().to_string()).filter(|p| !p.is_empty()),
            None,
            vec!["generated".to_string()],
        )
        .await
    }

    async fn background(&self, url: Option<&str>) -> Option<Vec<u8>> {
        let url = url.map(str::trim).filter(|u| !u.is_empty())?;
        match self.fetcher.fetch(url).await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                tracing::warn!(url, error = %e, "slide background unavailable, using gradient");
                None
            }
        }
    }

    /// Render slides, host each one, and return them in order.
    ///
    /// A single slide is allowed (a plain image post); more than one must
    /// fit in an Instagram carousel.
    pub async fn render_carousel(
        &self,
        brand_id: &BrandId,
        slides: &[CarouselSlide],
    ) -> Result<Vec<MediaAsset>, MediaError> {
        if slides.is_empty() || slides.len() > CAROUSEL_MAX {
            return Err(MediaError::Validation(format!(
                "a carousel has 1 to {CAROUSEL_MAX} slides, got {}",
                slides.len()
            )));
        }
        if slides.iter().any(|s| s.headline.trim().is_empty()) {
            return Err(MediaError::Validation("every slide needs a headline".to_string()));
        }

        let total = slides.len();
        let folder = self.brand_folder(brand_id);
        let mut assets = Vec::with_capacity(total);
        for (index, slide) in slides.iter().enumerate() {
            let accent = slide
                .accent
                .as_deref()
                .and_then(Rgb::from_hex)
                .unwrap_or(DEFAULT_ACCENT);
            let spec = SlideSpec {
                width: self.slide_size.width,
                height: self.slide_size.height,
                headline: slide.headline.trim().to_string(),
                body: slide.body.as_deref().map(str::trim).filter(|b| !b.is_empty()).map(str::to_string),
                background: self.background(slide.background_url.as_deref()).await,
                gradient_from: accent,
                gradient_to: darken(accent, 0.6),
                text_color: TEXT_COLOR,
                footer: (total >= CAROUSEL_MIN).then(|| format!("{}/{}", index + 1, total)),
            };

            let renderer = Arc::clone(&self.renderer);
            let png = tokio::task::spawn_blocking(move || renderer.render(&spec))
                .await
                .map_err(|e| MediaError::Render(format!("render task failed: {e}")))??;

            let stored = self.store.upload(&png, &folder, None).await?;
            let asset = self
                .record(
                    brand_id,
                    stored,
                    MediaKind::Image,
                    MediaSource::Composited,
                    Some(slide.headline.trim().to_string()),
                    None,
                    vec!["carousel".to_string()],
                )
                .await?;
            tracing::debug!(media_id = %asset.id, slide = index + 1, total, "rendered slide");
            assets.push(asset);
        }
        tracing::info!(slides = total, "rendered carousel");
        Ok(assets)
    }

    pub async fn list(&self, brand_id: &BrandId, filter: MediaFilter) -> Result<Vec<MediaAsset>, MediaError> {
        self.assets.list(brand_id, filter).await.map_err(storage)
    }

    pub async fn get(&self, brand_id: &BrandId, id: &MediaId) -> Result<MediaAsset, MediaError> {
        self.assets
            .get_by_id(id)
            .await
            .map_err(storage)?
            .filter(|a| a.brand_id == *brand_id)
            .ok_or(MediaError::NotFound)
    }

    /// Remove an asset from the library and, when we host it, from storage.
    pub async fn delete(&self, brand_id: &BrandId, id: &MediaId) -> Result<(), MediaError> {
        let asset = self.get(brand_id, id).await?;
        if let Some(public_id) = &asset.public_id
            && let Err(e) = self.store.delete(public_id).await
        {
            tracing::warn!(media_id = %id, public_id, error = %e, "remote delete failed");
        }
        self.assets.delete(id).await.map_err(storage)
    }
}

fn normalize_tags(tags: &[String]) -> Vec<String> {
    normalize_hashtags(tags)
        .into_iter()
        .map(|t| t.trim_start_matches('#').to_lowercase())
        .collect()
}
