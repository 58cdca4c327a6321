//! Publish pipeline.
//!
//! Sends every unpublished item of a post to its platform, one at a time,
//! and folds the per-item outcomes into the post status. A post is only
//! ever published by one task at a time: an in-process guard covers the
//! API and the scheduler running side by side, and a compare-and-set on the
//! status column covers separate processes sharing the database.

use chrono::Utc;
use dashmap::DashMap;

use socialdesk_types::account::AccountStatus;
use socialdesk_types::error::{PlatformError, PostError};
use socialdesk_types::id::{BrandId, PostId};
use socialdesk_types::post::{ItemStatus, Post, PostItem, PostStatus};

use crate::platform::publisher::SocialPublisher;
use crate::repository::account::AccountRepository;
use crate::repository::brand::BrandRepository;
use crate::repository::post::PostRepository;
use crate::service::Actor;
use crate::service::post::{approval_satisfied, storage};

/// Removes the post from the in-flight set when dropped.
struct InFlight<'a> {
    map: &'a DashMap<PostId, ()>,
    id: PostId,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.map.remove(&self.id);
    }
}

pub struct PublishService<P, A, B, S>
where
    P: PostRepository,
    A: AccountRepository,
    B: BrandRepository,
    S: SocialPublisher,
{
    posts: P,
    accounts: A,
    brands: B,
    publisher: S,
    in_flight: DashMap<PostId, ()>,
}

impl<P, A, B, S> PublishService<P, A, B, S>
where
    P: PostRepository,
    A: AccountRepository,
    B: BrandRepository,
    S: SocialPublisher,
{
    pub fn new(posts: P, accounts: A, brands: B, publisher: S) -> Self {
        Self {
            posts,
            accounts,
            brands,
            publisher,
            in_flight: DashMap::new(),
        }
    }

    pub fn posts(&self) -> &P {
        &self.posts
    }

    /// Publish a post on behalf of a user ("publish now" or retry).
    ///
    /// Honors the brand's approval policy: a post that still needs review
    /// can only be pushed out directly by an approver.
    pub async fn publish_now(
        &self,
        brand_id: &BrandId,
        id: &PostId,
        actor: Actor,
    ) -> Result<Post, PostError> {
        if !actor.role.can_edit() {
            return Err(PostError::Forbidden("viewers cannot publish".to_string()));
        }
        let post = self
            .posts
            .get_by_id(id)
            .await
            .map_err(storage)?
            .filter(|p| p.brand_id == *brand_id)
            .ok_or(PostError::NotFound)?;
        let brand = self
            .brands
            .get_by_id(brand_id)
            .await
            .map_err(storage)?
            .ok_or_else(|| PostError::Validation("unknown brand".to_string()))?;

        if !approval_satisfied(&post, &brand, actor) {
            return Err(PostError::ApprovalRequired);
        }
        self.publish_post(id).await
    }

    /// Run the pipeline for a post.
    ///
    /// Items already Published are skipped, so calling this on a Failed or
    /// PartiallyPublished post retries only what is missing.
    pub async fn publish_post(&self, id: &PostId) -> Result<Post, PostError> {
        if self.in_flight.insert(*id, ()).is_some() {
            return Err(PostError::AlreadyPublishing);
        }
        let _guard = InFlight {
            map: &self.in_flight,
            id: *id,
        };

        let mut post = self
            .posts
            .get_by_id(id)
            .await
            .map_err(storage)?
            .ok_or(PostError::NotFound)?;

        if !post.status.can_transition_to(PostStatus::Publishing) {
            return Err(PostError::InvalidTransition {
                from: post.status,
                to: PostStatus::Publishing,
            });
        }
        let claimed = self
            .posts
            .transition_status(id, post.status, PostStatus::Publishing)
            .await
            .map_err(storage)?;
        if !claimed {
            return Err(PostError::AlreadyPublishing);
        }
        post.status = PostStatus::Publishing;
        tracing::info!(post_id = %id, items = post.items.len(), "publishing post");

        match self.publish_items(&mut post).await {
            Ok(()) => Ok(post),
            Err(e) => {
                tracing::error!(post_id = %id, error = %e, "publish aborted");
                // items already live keep the post locked against deletion
                let fallback = if post.items.iter().any(|i| i.status == ItemStatus::Published) {
                    PostStatus::PartiallyPublished
                } else {
                    PostStatus::Failed
                };
                if let Err(reset) = self
                    .posts
                    .transition_status(id, PostStatus::Publishing, fallback)
                    .await
                {
                    tracing::error!(post_id = %id, status = %fallback, error = %reset, "could not reset post status");
                }
                Err(e)
            }
        }
    }

    async fn publish_items(&self, post: &mut Post) -> Result<(), PostError> {
        let now = Utc::now();
        for item in post.items.iter_mut() {
            if item.status == ItemStatus::Published {
                continue;
            }
            self.publish_item(item).await?;
        }

        let published = post
            .items
            .iter()
            .filter(|i| i.status == ItemStatus::Published)
            .count();
        let next = if !post.items.is_empty() && published == post.items.len() {
            PostStatus::Published
        } else if published > 0 {
            PostStatus::PartiallyPublished
        } else {
            PostStatus::Failed
        };

        post.status = next;
        if published > 0 && post.published_at.is_none() {
            post.published_at = Some(now);
        }
        post.updated_at = now;
        self.posts.update(post).await.map_err(storage)?;

        tracing::info!(
            post_id = %post.id,
            status = %next,
            published,
            total = post.items.len(),
            "publish finished"
        );
        Ok(())
    }

    async fn publish_item(&self, item: &mut PostItem) -> Result<(), PostError> {
        let now = Utc::now();
        let account = self
            .accounts
            .get_by_id(&item.social_account_id)
            .await
            .map_err(storage)?;

        let Some(mut account) = account.filter(|a| a.is_publishable(now)) else {
            tracing::warn!(item_id = %item.id, platform = %item.platform, "account unavailable, skipping item");
            item.status = ItemStatus::Failed;
            item.error = Some("account is disconnected or its token expired".to_string());
            return self.posts.update_item(item).await.map_err(storage);
        };

        item.status = ItemStatus::Publishing;
        item.error = None;
        self.posts.update_item(item).await.map_err(storage)?;

        match self.publisher.publish(&account, item).await {
            Ok(media) => {
                tracing::info!(
                    item_id = %item.id,
                    platform = %item.platform,
                    external_id = %media.external_id,
                    "item published"
                );
                item.status = ItemStatus::Published;
                item.external_id = Some(media.external_id);
                item.permalink = media.permalink;
                item.published_at = Some(Utc::now());
            }
            Err(e) => {
                tracing::warn!(item_id = %item.id, platform = %item.platform, error = %e, "item failed");
                item.status = ItemStatus::Failed;
                item.error = Some(e.to_string());
                if matches!(e, PlatformError::TokenExpired) {
                    account.status = AccountStatus::Expired;
                    account.updated_at = Utc::now();
                    if let Err(err) = self.accounts.update(&account).await {
                        tracing::error!(account_id = %account.id, error = %err, "could not flag expired account");
                    }
                }
            }
        }
        self.posts.update_item(item).await.map_err(storage)
    }
}
