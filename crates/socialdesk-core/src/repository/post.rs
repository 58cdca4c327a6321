//! Post repository trait definition.

use chrono::{DateTime, Utc};

use socialdesk_types::error::RepositoryError;
use socialdesk_types::id::{BrandId, PostId};
use socialdesk_types::post::{Post, PostItem, PostStatus};

use super::SortOrder;

/// Filter criteria for listing posts.
#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    pub status: Option<PostStatus>,
    /// Field to sort by ("created_at", "scheduled_at", "updated_at").
    pub sort_by: Option<String>,
    pub sort_order: Option<SortOrder>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Repository trait for posts and their per-platform items.
///
/// A post is always loaded together with its items.
pub trait PostRepository: Send + Sync {
    /// Insert a post and all of its items.
    fn create(
        &self,
        post: &Post,
    ) -> impl std::future::Future<Output = Result<Post, RepositoryError>> + Send;

    fn get_by_id(
        &self,
        id: &PostId,
    ) -> impl std::future::Future<Output = Result<Option<Post>, RepositoryError>> + Send;

    fn list(
        &self,
        brand_id: &BrandId,
        filter: PostFilter,
    ) -> impl std::future::Future<Output = Result<Vec<Post>, RepositoryError>> + Send;

    /// Update post fields and replace its item set.
    fn update(
        &self,
        post: &Post,
    ) -> impl std::future::Future<Output = Result<Post, RepositoryError>> + Send;

    /// Update a single item in place (publish progress).
    fn update_item(
        &self,
        item: &PostItem,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Compare-and-set the status column. Returns false when the stored
    /// status no longer equals `expected`.
    fn transition_status(
        &self,
        id: &PostId,
        expected: PostStatus,
        next: PostStatus,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;

    fn delete(
        &self,
        id: &PostId,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Scheduled posts whose `scheduled_at` is at or before `now`, oldest first.
    fn list_due(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> impl std::future::Future<Output = Result<Vec<Post>, RepositoryError>> + Send;

    /// Posts of a brand scheduled or published within `[from, to)`.
    fn list_in_range(
        &self,
        brand_id: &BrandId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<Vec<Post>, RepositoryError>> + Send;
}
