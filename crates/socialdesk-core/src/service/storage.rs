//! Media hosting, stock photo, download, and rendering ports.
//!
//! Implementations live in socialdesk-infra (Cloudinary, Unsplash, reqwest
//! downloader, `image`-based slide renderer).

use socialdesk_types::error::MediaError;
use socialdesk_types::media::{Rgb, SlideSpec, StockPhoto, StoredMedia};

/// Remote media host (Cloudinary).
pub trait MediaStore: Send + Sync {
    /// Upload encoded image bytes. `public_id` pins the stored name when set.
    fn upload(
        &self,
        bytes: &[u8],
        folder: &str,
        public_id: Option<&str>,
    ) -> impl std::future::Future<Output = Result<StoredMedia, MediaError>> + Send;

    fn delete(
        &self,
        public_id: &str,
    ) -> impl std::future::Future<Output = Result<(), MediaError>> + Send;
}

/// Stock photo provider (Unsplash).
pub trait StockPhotoSearch: Send + Sync {
    fn search(
        &self,
        query: &str,
        per_page: u32,
    ) -> impl std::future::Future<Output = Result<Vec<StockPhoto>, MediaError>> + Send;

    /// Report that a photo was used (required by the Unsplash API guidelines).
    fn track_download(
        &self,
        photo: &StockPhoto,
    ) -> impl std::future::Future<Output = Result<(), MediaError>> + Send;
}

/// Downloads remote images (slide backgrounds).
pub trait MediaFetcher: Send + Sync {
    fn fetch(
        &self,
        url: &str,
    ) -> impl std::future::Future<Output = Result<Vec<u8>, MediaError>> + Send;
}

/// CPU-bound raster renderer. Calls are synchronous; services run them on
/// the blocking thread pool.
pub trait SlideRenderer: Send + Sync {
    /// Render one slide to PNG bytes.
    fn render(&self, spec: &SlideSpec) -> Result<Vec<u8>, MediaError>;

    /// Render a plain diagonal gradient to PNG bytes.
    fn gradient(&self, width: u32, height: u32, from: Rgb, to: Rgb) -> Result<Vec<u8>, MediaError>;
}

/// An unconfigured store: every call fails with `NotConfigured`.
impl<T: MediaStore> MediaStore for Option<T> {
    async fn upload(&self, bytes: &[u8], folder: &str, public_id: Option<&str>) -> Result<StoredMedia, MediaError> {
        match self {
            Some(store) => store.upload(bytes, folder, public_id).await,
            None => Err(MediaError::NotConfigured("media storage".to_string())),
        }
    }

    async fn delete(&self, public_id: &str) -> Result<(), MediaError> {
        match self {
            Some(store) => store.delete(public_id).await,
            None => Err(MediaError::NotConfigured("media storage".to_string())),
        }
    }
}

impl<T: StockPhotoSearch> StockPhotoSearch for Option<T> {
    async fn search(&self, query: &str, per_page: u32) -> Result<Vec<StockPhoto>, MediaError> {
        match self {
            Some(stock) => stock.search(query, per_page).await,
            None => Err(MediaError::NotConfigured("stock photo search".to_string())),
        }
    }

    async fn track_download(&self, photo: &StockPhoto) -> Result<(), MediaError> {
        match self {
            Some(stock) => stock.track_download(photo).await,
            None => Ok(()),
        }
    }
}
