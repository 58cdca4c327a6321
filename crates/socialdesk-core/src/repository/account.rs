//! Social account repository trait definition.

use socialdesk_types::account::{Platform, SocialAccount};
use socialdesk_types::error::RepositoryError;
use socialdesk_types::id::{AccountId, BrandId};

/// Repository trait for connected social accounts.
///
/// Implementations are responsible for encrypting `access_token` at rest.
pub trait AccountRepository: Send + Sync {
    fn create(
        &self,
        account: &SocialAccount,
    ) -> impl std::future::Future<Output = Result<SocialAccount, RepositoryError>> + Send;

    fn get_by_id(
        &self,
        id: &AccountId,
    ) -> impl std::future::Future<Output = Result<Option<SocialAccount>, RepositoryError>> + Send;

    /// Find an account by its platform-side id. Used to route webhook events.
    fn get_by_external_id(
        &self,
        platform: Platform,
        external_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<SocialAccount>, RepositoryError>> + Send;

    fn list_by_brand(
        &self,
        brand_id: &BrandId,
    ) -> impl std::future::Future<Output = Result<Vec<SocialAccount>, RepositoryError>> + Send;

    /// All accounts across brands. Used by the token expiry sweep.
    fn list_all(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<SocialAccount>, RepositoryError>> + Send;

    fn update(
        &self,
        account: &SocialAccount,
    ) -> impl std::future::Future<Output = Result<SocialAccount, RepositoryError>> + Send;

    fn delete(
        &self,
        id: &AccountId,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;
}
