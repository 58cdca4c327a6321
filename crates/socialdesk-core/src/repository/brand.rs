//! Brand and team member repository trait definitions.

use socialdesk_types::brand::{Brand, User};
use socialdesk_types::error::RepositoryError;
use socialdesk_types::id::{BrandId, UserId};

/// Repository trait for brand (tenant) persistence.
///
/// Uses native async fn in traits (Rust 2024 edition, no async_trait macro).
pub trait BrandRepository: Send + Sync {
    fn create(
        &self,
        brand: &Brand,
    ) -> impl std::future::Future<Output = Result<Brand, RepositoryError>> + Send;

    fn get_by_id(
        &self,
        id: &BrandId,
    ) -> impl std::future::Future<Output = Result<Option<Brand>, RepositoryError>> + Send;

    fn get_by_slug(
        &self,
        slug: &str,
    ) -> impl std::future::Future<Output = Result<Option<Brand>, RepositoryError>> + Send;

    fn list(&self) -> impl std::future::Future<Output = Result<Vec<Brand>, RepositoryError>> + Send;

    fn update(
        &self,
        brand: &Brand,
    ) -> impl std::future::Future<Output = Result<Brand, RepositoryError>> + Send;
}

/// Repository trait for brand team members.
pub trait UserRepository: Send + Sync {
    fn create(
        &self,
        user: &User,
    ) -> impl std::future::Future<Output = Result<User, RepositoryError>> + Send;

    fn get_by_id(
        &self,
        id: &UserId,
    ) -> impl std::future::Future<Output = Result<Option<User>, RepositoryError>> + Send;

    /// Look up a member of a brand by email (case-insensitive).
    fn get_by_email(
        &self,
        brand_id: &BrandId,
        email: &str,
    ) -> impl std::future::Future<Output = Result<Option<User>, RepositoryError>> + Send;

    fn list_by_brand(
        &self,
        brand_id: &BrandId,
    ) -> impl std::future::Future<Output = Result<Vec<User>, RepositoryError>> + Send;

    fn delete(
        &self,
        id: &UserId,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
