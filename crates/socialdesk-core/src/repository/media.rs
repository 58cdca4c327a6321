//! Media library and product catalog repository trait definitions.

use socialdesk_types::error::RepositoryError;
use socialdesk_types::id::{BrandId, MediaId, ProductId};
use socialdesk_types::media::{MediaAsset, MediaKind, MediaSource, Product};

/// Filter criteria for listing media assets.
#[derive(Debug, Clone, Default)]
pub struct MediaFilter {
    pub kind: Option<MediaKind>,
    pub source: Option<MediaSource>,
    /// Only assets carrying this tag.
    pub tag: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

pub trait MediaRepository: Send + Sync {
    fn create(
        &self,
        asset: &MediaAsset,
    ) -> impl std::future::Future<Output = Result<MediaAsset, RepositoryError>> + Send;

    fn get_by_id(
        &self,
        id: &MediaId,
    ) -> impl std::future::Future<Output = Result<Option<MediaAsset>, RepositoryError>> + Send;

    /// Newest first.
    fn list(
        &self,
        brand_id: &BrandId,
        filter: MediaFilter,
    ) -> impl std::future::Future<Output = Result<Vec<MediaAsset>, RepositoryError>> + Send;

    fn delete(
        &self,
        id: &MediaId,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}

pub trait ProductRepository: Send + Sync {
    fn create(
        &self,
        product: &Product,
    ) -> impl std::future::Future<Output = Result<Product, RepositoryError>> + Send;

    fn get_by_id(
        &self,
        id: &ProductId,
    ) -> impl std::future::Future<Output = Result<Option<Product>, RepositoryError>> + Send;

    /// Alphabetical by name.
    fn list(
        &self,
        brand_id: &BrandId,
    ) -> impl std::future::Future<Output = Result<Vec<Product>, RepositoryError>> + Send;

    fn update(
        &self,
        product: &Product,
    ) -> impl std::future::Future<Output = Result<Product, RepositoryError>> + Send;

    fn delete(
        &self,
        id: &ProductId,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
