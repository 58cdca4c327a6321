//! Post lifecycle service.
//!
//! Owns composition, validation, review, and scheduling of posts. Actual
//! publishing lives in [`crate::service::publish`]; this service only moves
//! posts between the states that precede it.

use chrono::{DateTime, Utc};

use socialdesk_types::account::Platform;
use socialdesk_types::brand::Brand;
use socialdesk_types::error::{PostError, RepositoryError};
use socialdesk_types::id::{AccountId, BrandId, PostId, PostItemId};
use socialdesk_types::post::{
    CreatePostRequest, ItemStatus, MediaType, Post, PostItem, PostStatus, ReviewDecision,
    UpdateItemRequest, UpdatePostRequest, normalize_hashtags,
};

use crate::repository::account::AccountRepository;
use crate::repository::brand::BrandRepository;
use crate::repository::post::{PostFilter, PostRepository};
use crate::service::Actor;

/// Instagram carousel bounds.
pub const CAROUSEL_MIN: usize = 2;
pub const CAROUSEL_MAX: usize = 10;

pub(crate) fn storage(e: RepositoryError) -> PostError {
    PostError::StorageError(e.to_string())
}

/// Check and apply a status change.
pub(crate) fn transition(post: &mut Post, next: PostStatus) -> Result<(), PostError> {
    if !post.status.can_transition_to(next) {
        return Err(PostError::InvalidTransition {
            from: post.status,
            to: next,
        });
    }
    post.status = next;
    Ok(())
}

/// Validate the media attached to an item against its platform's rules.
pub fn validate_media(
    platform: Platform,
    media_type: MediaType,
    media_urls: &[String],
) -> Result<(), PostError> {
    if platform.requires_media() && media_urls.is_empty() {
        return Err(PostError::Validation(format!(
            "{platform} posts require at least one image or video"
        )));
    }
    match media_type {
        MediaType::Text if !media_urls.is_empty() => Err(PostError::Validation(
            "text posts cannot carry media".to_string(),
        )),
        MediaType::Image if media_urls.len() != 1 => Err(PostError::Validation(
            "image posts take exactly one image".to_string(),
        )),
        MediaType::Carousel
            if !(CAROUSEL_MIN..=CAROUSEL_MAX).contains(&media_urls.len()) =>
        {
            Err(PostError::Validation(format!(
                "carousels take {CAROUSEL_MIN} to {CAROUSEL_MAX} items, got {}",
                media_urls.len()
            )))
        }
        MediaType::Video | MediaType::Reel if media_urls.len() != 1 => Err(
            PostError::Validation("video posts take exactly one video".to_string()),
        ),
        _ => Ok(()),
    }
}

/// Validate caption length and hashtag count for an item.
pub fn validate_caption(item: &PostItem) -> Result<(), PostError> {
    let limit = item.platform.caption_limit();
    let length = item.caption().chars().count();
    if length > limit {
        return Err(PostError::Validation(format!(
            "caption is {length} characters, {} allows {limit}",
            item.platform
        )));
    }
    let tags = normalize_hashtags(&item.hashtags).len();
    if tags > item.platform.hashtag_limit() {
        return Err(PostError::Validation(format!(
            "{tags} hashtags, {} allows {}",
            item.platform,
            item.platform.hashtag_limit()
        )));
    }
    Ok(())
}

/// Whether the post may go live under the brand's approval policy when
/// acted on by `actor`.
pub(crate) fn approval_satisfied(post: &Post, brand: &Brand, actor: Actor) -> bool {
    if !brand.requires_approval {
        return true;
    }
    match post.status {
        PostStatus::Approved
        | PostStatus::Scheduled
        | PostStatus::Failed
        | PostStatus::PartiallyPublished => true,
        PostStatus::Draft => actor.role.can_approve(),
        _ => false,
    }
}

/// Service managing post composition and the pre-publish lifecycle.
pub struct PostService<P: PostRepository, A: AccountRepository, B: BrandRepository> {
    posts: P,
    accounts: A,
    brands: B,
}

impl<P: PostRepository, A: AccountRepository, B: BrandRepository> PostService<P, A, B> {
    pub fn new(posts: P, accounts: A, brands: B) -> Self {
        Self {
            posts,
            accounts,
            brands,
        }
    }

    async fn brand(&self, brand_id: &BrandId) -> Result<Brand, PostError> {
        self.brands
            .get_by_id(brand_id)
            .await
            .map_err(storage)?
            .ok_or_else(|| PostError::Validation("unknown brand".to_string()))
    }

    /// Load a post of the given brand. Posts of other brands are reported as
    /// missing.
    pub async fn get(&self, brand_id: &BrandId, id: &PostId) -> Result<Post, PostError> {
        self.posts
            .get_by_id(id)
            .await
            .map_err(storage)?
            .filter(|p| p.brand_id == *brand_id)
            .ok_or(PostError::NotFound)
    }

    pub async fn list(&self, brand_id: &BrandId, filter: PostFilter) -> Result<Vec<Post>, PostError> {
        self.posts.list(brand_id, filter).await.map_err(storage)
    }

    /// Create a post with one item per target account.
    ///
    /// Without `scheduled_at` the post starts as Draft. With a schedule it
    /// becomes Scheduled, unless the brand requires approval and the actor
    /// cannot approve, in which case it waits in PendingApproval with the
    /// schedule kept.
    pub async fn create_post(
        &self,
        brand_id: &BrandId,
        actor: Actor,
        request: CreatePostRequest,
    ) -> Result<Post, PostError> {
        if !actor.role.can_edit() {
            return Err(PostError::Forbidden("viewers cannot create posts".to_string()));
        }
        let brand = self.brand(brand_id).await?;
        let now = Utc::now();

        if let Some(at) = request.scheduled_at
            && at <= now
        {
            return Err(PostError::ScheduledInPast);
        }

        let content = request.content.trim().to_string();
        let media_urls: Vec<String> = request
            .media_urls
            .iter()
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .collect();
        if content.is_empty() && media_urls.is_empty() {
            return Err(PostError::Validation(
                "a post needs content or media".to_string(),
            ));
        }
        let hashtags = normalize_hashtags(&request.hashtags);

        let mut account_ids: Vec<AccountId> = Vec::with_capacity(request.account_ids.len());
        for id in request.account_ids {
            if !account_ids.contains(&id) {
                account_ids.push(id);
            }
        }
        if account_ids.is_empty() {
            return Err(PostError::Validation(
                "select at least one account".to_string(),
            ));
        }

        let post_id = PostId::new();
        let media_type = request
            .media_type
            .unwrap_or_else(|| MediaType::infer(&media_urls));
        let mut items = Vec::with_capacity(account_ids.len());
        for account_id in &account_ids {
            let account = self
                .accounts
                .get_by_id(account_id)
                .await
                .map_err(storage)?
                .filter(|a| a.brand_id == *brand_id)
                .ok_or_else(|| PostError::AccountUnavailable(format!("account {account_id} not found")))?;
            if !account.is_publishable(now) {
                return Err(PostError::AccountUnavailable(format!(
                    "@{} on {} is not connected ({})",
                    account.handle, account.platform, account.status
                )));
            }
            validate_media(account.platform, media_type, &media_urls)?;

            let item = PostItem {
                id: PostItemId::new(),
                post_id,
                social_account_id: account.id,
                platform: account.platform,
                content: content.clone(),
                media_urls: media_urls.clone(),
                hashtags: hashtags.clone(),
                media_type,
                status: ItemStatus::Pending,
                external_id: None,
                permalink: None,
                error: None,
                published_at: None,
            };
            validate_caption(&item)?;
            items.push(item);
        }

        let (status, reviewed_by) = match request.scheduled_at {
            None => (PostStatus::Draft, None),
            Some(_) if !brand.requires_approval => (PostStatus::Scheduled, None),
            Some(_) if actor.role.can_approve() => (PostStatus::Scheduled, actor.user_id),
            Some(_) => (PostStatus::PendingApproval, None),
        };

        let post = Post {
            id: post_id,
            brand_id: *brand_id,
            title: request.title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()),
            content,
            media_urls,
            hashtags,
            status,
            scheduled_at: request.scheduled_at,
            published_at: None,
            created_by: actor.user_id,
            review_note: None,
            reviewed_by,
            items,
            created_at: now,
            updated_at: now,
        };

        let post = self.posts.create(&post).await.map_err(storage)?;
        tracing::info!(post_id = %post.id, status = %post.status, items = post.items.len(), "created post");
        Ok(post)
    }

    /// Create a post that should go out at `at`.
    pub async fn create_scheduled_post(
        &self,
        brand_id: &BrandId,
        actor: Actor,
        mut request: CreatePostRequest,
        at: DateTime<Utc>,
    ) -> Result<Post, PostError> {
        request.scheduled_at = Some(at);
        self.create_post(brand_id, actor, request).await
    }

    /// Edits by someone who cannot approve void an earlier approval when the
    /// brand requires one. Rejected posts always go back to Draft.
    fn reset_approval(post: &mut Post, brand: &Brand, actor: Actor) -> Result<(), PostError> {
        let reset = match post.status {
            PostStatus::Rejected => true,
            PostStatus::Approved | PostStatus::Scheduled => {
                brand.requires_approval && !actor.role.can_approve()
            }
            _ => false,
        };
        if reset {
            transition(post, PostStatus::Draft)?;
            post.reviewed_by = None;
        }
        Ok(())
    }

    fn check_editable(post: &Post, actor: Actor) -> Result<(), PostError> {
        if !actor.role.can_edit() {
            return Err(PostError::Forbidden("viewers cannot edit posts".to_string()));
        }
        if post.status.is_locked() {
            return Err(PostError::Locked(post.status));
        }
        Ok(())
    }

    /// Update base fields. Changing content, media, or hashtags rebuilds
    /// every item variant from the new base.
    pub async fn update_post(
        &self,
        brand_id: &BrandId,
        id: &PostId,
        actor: Actor,
        request: UpdatePostRequest,
    ) -> Result<Post, PostError> {
        let mut post = self.get(brand_id, id).await?;
        Self::check_editable(&post, actor)?;
        let brand = self.brand(brand_id).await?;

        if let Some(title) = request.title {
            let title = title.trim().to_string();
            post.title = (!title.is_empty()).then_some(title);
        }

        let media_changed = request.media_urls.is_some();
        let rebuild = request.content.is_some() || media_changed || request.hashtags.is_some();
        if let Some(content) = request.content {
            post.content = content.trim().to_string();
        }
        if let Some(urls) = request.media_urls {
            post.media_urls = urls
                .iter()
                .map(|u| u.trim().to_string())
                .filter(|u| !u.is_empty())
                .collect();
        }
        if let Some(tags) = request.hashtags {
            post.hashtags = normalize_hashtags(&tags);
        }
        if post.content.is_empty() && post.media_urls.is_empty() {
            return Err(PostError::Validation(
                "a post needs content or media".to_string(),
            ));
        }

        if rebuild {
            let inferred = MediaType::infer(&post.media_urls);
            for item in post.items.iter_mut().filter(|i| i.status != ItemStatus::Published) {
                item.content = post.content.clone();
                item.hashtags = post.hashtags.clone();
                if media_changed {
                    item.media_urls = post.media_urls.clone();
                    item.media_type = inferred;
                }
                validate_media(item.platform, item.media_type, &item.media_urls)?;
                validate_caption(item)?;
            }
        }

        Self::reset_approval(&mut post, &brand, actor)?;
        post.updated_at = Utc::now();
        let post = self.posts.update(&post).await.map_err(storage)?;
        tracing::debug!(post_id = %post.id, status = %post.status, "updated post");
        Ok(post)
    }

    /// Override the caption of a single platform variant.
    pub async fn update_item(
        &self,
        brand_id: &BrandId,
        id: &PostId,
        item_id: &PostItemId,
        actor: Actor,
        request: UpdateItemRequest,
    ) -> Result<Post, PostError> {
        let mut post = self.get(brand_id, id).await?;
        Self::check_editable(&post, actor)?;
        let brand = self.brand(brand_id).await?;

        let item = post
            .items
            .iter_mut()
            .find(|i| i.id == *item_id)
            .ok_or(PostError::NotFound)?;
        if item.status == ItemStatus::Published {
            return Err(PostError::Locked(PostStatus::Published));
        }
        if let Some(content) = request.content {
            item.content = content.trim().to_string();
        }
        if let Some(tags) = request.hashtags {
            item.hashtags = normalize_hashtags(&tags);
        }
        if item.content.is_empty() && item.media_urls.is_empty() {
            return Err(PostError::Validation("caption cannot be empty".to_string()));
        }
        validate_caption(item)?;

        Self::reset_approval(&mut post, &brand, actor)?;
        post.updated_at = Utc::now();
        self.posts.update(&post).await.map_err(storage)
    }

    /// Draft → PendingApproval.
    pub async fn submit_for_review(
        &self,
        brand_id: &BrandId,
        id: &PostId,
        actor: Actor,
    ) -> Result<Post, PostError> {
        let mut post = self.get(brand_id, id).await?;
        if !actor.role.can_edit() {
            return Err(PostError::Forbidden("viewers cannot submit posts".to_string()));
        }
        transition(&mut post, PostStatus::PendingApproval)?;
        post.review_note = None;
        post.updated_at = Utc::now();
        let post = self.posts.update(&post).await.map_err(storage)?;
        tracing::info!(post_id = %post.id, "submitted post for review");
        Ok(post)
    }

    /// Approve or reject a pending post. An approved post whose schedule is
    /// still in the future goes straight to Scheduled.
    pub async fn review(
        &self,
        brand_id: &BrandId,
        id: &PostId,
        actor: Actor,
        decision: ReviewDecision,
    ) -> Result<Post, PostError> {
        if !actor.role.can_approve() {
            return Err(PostError::Forbidden(format!(
                "role '{}' cannot review posts",
                actor.role
            )));
        }
        let mut post = self.get(brand_id, id).await?;
        let now = Utc::now();

        if decision.approve {
            transition(&mut post, PostStatus::Approved)?;
            if post.scheduled_at.is_some_and(|at| at > now) {
                transition(&mut post, PostStatus::Scheduled)?;
            }
        } else {
            transition(&mut post, PostStatus::Rejected)?;
        }
        post.reviewed_by = actor.user_id;
        post.review_note = decision
            .note
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        post.updated_at = now;

        let post = self.posts.update(&post).await.map_err(storage)?;
        tracing::info!(post_id = %post.id, status = %post.status, "reviewed post");
        Ok(post)
    }

    /// Schedule (or re-time) a post.
    pub async fn schedule(
        &self,
        brand_id: &BrandId,
        id: &PostId,
        actor: Actor,
        at: DateTime<Utc>,
    ) -> Result<Post, PostError> {
        let mut post = self.get(brand_id, id).await?;
        Self::check_editable(&post, actor)?;
        let now = Utc::now();
        if at <= now {
            return Err(PostError::ScheduledInPast);
        }
        let brand = self.brand(brand_id).await?;
        if !approval_satisfied(&post, &brand, actor) {
            return Err(PostError::ApprovalRequired);
        }
        if brand.requires_approval && post.status == PostStatus::Draft {
            post.reviewed_by = actor.user_id;
        }

        transition(&mut post, PostStatus::Scheduled)?;
        post.scheduled_at = Some(at);
        post.updated_at = now;
        let post = self.posts.update(&post).await.map_err(storage)?;
        tracing::info!(post_id = %post.id, scheduled_at = %at, "scheduled post");
        Ok(post)
    }

    /// Scheduled → Draft, clearing the publish time.
    pub async fn unschedule(
        &self,
        brand_id: &BrandId,
        id: &PostId,
        actor: Actor,
    ) -> Result<Post, PostError> {
        let mut post = self.get(brand_id, id).await?;
        Self::check_editable(&post, actor)?;
        if post.status != PostStatus::Scheduled {
            return Err(PostError::InvalidTransition {
                from: post.status,
                to: PostStatus::Draft,
            });
        }
        transition(&mut post, PostStatus::Draft)?;
        post.scheduled_at = None;
        post.updated_at = Utc::now();
        self.posts.update(&post).await.map_err(storage)
    }

    /// Delete a post that has not gone live.
    pub async fn delete_post(
        &self,
        brand_id: &BrandId,
        id: &PostId,
        actor: Actor,
    ) -> Result<(), PostError> {
        let post = self.get(brand_id, id).await?;
        if !actor.role.can_edit() {
            return Err(PostError::Forbidden("viewers cannot delete posts".to_string()));
        }
        if post.status.is_locked() {
            return Err(PostError::CannotDeletePublished);
        }
        self.posts.delete(id).await.map_err(|e| match e {
            RepositoryError::NotFound => PostError::NotFound,
            other => storage(other),
        })?;
        tracing::info!(post_id = %id, "deleted post");
        Ok(())
    }

    /// Copy a post (any status) into a fresh unscheduled Draft.
    pub async fn duplicate_post(
        &self,
        brand_id: &BrandId,
        id: &PostId,
        actor: Actor,
    ) -> Result<Post, PostError> {
        if !actor.role.can_edit() {
            return Err(PostError::Forbidden("viewers cannot create posts".to_string()));
        }
        let source = self.get(brand_id, id).await?;
        let now = Utc::now();
        let new_id = PostId::new();

        let items = source
            .items
            .iter()
            .map(|item| PostItem {
                id: PostItemId::new(),
                post_id: new_id,
                status: ItemStatus::Pending,
                external_id: None,
                permalink: None,
                error: None,
                published_at: None,
                ..item.clone()
            })
            .collect();

        let copy = Post {
            id: new_id,
            title: source.title.as_ref().map(|t| format!("{t} (copy)")),
            status: PostStatus::Draft,
            scheduled_at: None,
            published_at: None,
            created_by: actor.user_id,
            review_note: None,
            reviewed_by: None,
            items,
            created_at: now,
            updated_at: now,
            ..source
        };
        self.posts.create(&copy).await.map_err(storage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use socialdesk_types::account::AccountStatus;
    use socialdesk_types::brand::UserRole;
    use socialdesk_types::id::UserId;

    use crate::testing::{MemAccounts, MemBrands, MemPosts, account, brand};

    struct Fixture {
        service: PostService<MemPosts, MemAccounts, MemBrands>,
        posts: MemPosts,
        brand_id: BrandId,
        ig: AccountId,
        fb: AccountId,
    }

    fn fixture(requires_approval: bool) -> Fixture {
        let b = brand(requires_approval);
        let ig = account(b.id, Platform::Instagram, "1784");
        let fb = account(b.id, Platform::Facebook, "page-1");
        let posts = MemPosts::default();
        Fixture {
            service: PostService::new(posts.clone(), MemAccounts::with(&[&ig, &fb]), MemBrands::with(&b)),
            posts,
            brand_id: b.id,
            ig: ig.id,
            fb: fb.id,
        }
    }

    fn editor() -> Actor {
        Actor::user(UserId::new(), UserRole::Editor)
    }

    fn admin() -> Actor {
        Actor::user(UserId::new(), UserRole::Admin)
    }

    fn request(accounts: Vec<AccountId>) -> CreatePostRequest {
        CreatePostRequest {
            content: "Fresh roast today".to_string(),
            media_urls: vec!["https://cdn.example.com/roast.jpg".to_string()],
            hashtags: vec!["coffee".to_string(), "#Coffee".to_string()],
            account_ids: accounts,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_draft_with_item_per_account() {
        let f = fixture(false);
        let post = f
            .service
            .create_post(&f.brand_id, editor(), request(vec![f.ig, f.fb, f.ig]))
            .await
            .unwrap();

        assert_eq!(post.status, PostStatus::Draft);
        assert_eq!(post.items.len(), 2);
        assert_eq!(post.hashtags, vec!["#coffee".to_string()]);
        assert!(post.items.iter().all(|i| i.media_type == MediaType::Image));
    }

    #[tokio::test]
    async fn test_create_rejects_past_schedule() {
        let f = fixture(false);
        let mut req = request(vec![f.ig]);
        req.scheduled_at = Some(Utc::now() - Duration::minutes(5));
        let err = f.service.create_post(&f.brand_id, editor(), req).await.unwrap_err();
        assert!(matches!(err, PostError::ScheduledInPast));
        assert!(f.posts.posts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_scheduled_create_depends_on_approval() {
        let at = Utc::now() + Duration::hours(2);

        let open = fixture(false);
        let post = open
            .service
            .create_scheduled_post(&open.brand_id, editor(), request(vec![open.ig]), at)
            .await
            .unwrap();
        assert_eq!(post.status, PostStatus::Scheduled);

        let gated = fixture(true);
        let post = gated
            .service
            .create_scheduled_post(&gated.brand_id, editor(), request(vec![gated.ig]), at)
            .await
            .unwrap();
        assert_eq!(post.status, PostStatus::PendingApproval);
        assert_eq!(post.scheduled_at, Some(at));

        let post = gated
            .service
            .create_scheduled_post(&gated.brand_id, admin(), request(vec![gated.ig]), at)
            .await
            .unwrap();
        assert_eq!(post.status, PostStatus::Scheduled);
        assert!(post.reviewed_by.is_some());
    }

    #[tokio::test]
    async fn test_instagram_requires_media() {
        let f = fixture(false);
        let mut req = request(vec![f.ig]);
        req.media_urls.clear();
        let err = f.service.create_post(&f.brand_id, editor(), req).await.unwrap_err();
        assert!(matches!(err, PostError::Validation(msg) if msg.contains("instagram")));

        // Facebook is fine with text only
        let mut req = request(vec![f.fb]);
        req.media_urls.clear();
        let post = f.service.create_post(&f.brand_id, editor(), req).await.unwrap();
        assert_eq!(post.items[0].media_type, MediaType::Text);
    }

    #[tokio::test]
    async fn test_carousel_bounds() {
        let f = fixture(false);
        let mut req = request(vec![f.ig]);
        req.media_urls = (0..11).map(|i| format!("https://cdn.example.com/{i}.jpg")).collect();
        let err = f.service.create_post(&f.brand_id, editor(), req).await.unwrap_err();
        assert!(matches!(err, PostError::Validation(_)));

        assert!(validate_media(
            Platform::Instagram,
            MediaType::Carousel,
            &["a.jpg".to_string()]
        )
        .is_err());
        assert!(validate_media(
            Platform::Instagram,
            MediaType::Carousel,
            &["a.jpg".to_string(), "b.jpg".to_string()]
        )
        .is_ok());
    }

    #[tokio::test]
    async fn test_caption_limit_per_platform() {
        let b = brand(false);
        let x = account(b.id, Platform::Twitter, "x-1");
        let service = PostService::new(MemPosts::default(), MemAccounts::with(&[&x]), MemBrands::with(&b));
        let mut req = request(vec![x.id]);
        req.content = "word ".repeat(80);
        let err = service.create_post(&b.id, editor(), req).await.unwrap_err();
        assert!(matches!(err, PostError::Validation(msg) if msg.contains("280")));
    }

    #[tokio::test]
    async fn test_expired_account_rejected() {
        let b = brand(false);
        let mut ig = account(b.id, Platform::Instagram, "1784");
        ig.status = AccountStatus::Expired;
        let service = PostService::new(MemPosts::default(), MemAccounts::with(&[&ig]), MemBrands::with(&b));
        let err = service
            .create_post(&b.id, editor(), request(vec![ig.id]))
            .await
            .unwrap_err();
        assert!(matches!(err, PostError::AccountUnavailable(_)));
    }

    #[tokio::test]
    async fn test_account_of_other_brand_rejected() {
        let f = fixture(false);
        let stranger = account(BrandId::new(), Platform::Instagram, "999");
        let err = f
            .service
            .create_post(&f.brand_id, editor(), request(vec![stranger.id]))
            .await
            .unwrap_err();
        assert!(matches!(err, PostError::AccountUnavailable(_)));
    }

    #[tokio::test]
    async fn test_viewer_cannot_create() {
        let f = fixture(false);
        let viewer = Actor::user(UserId::new(), UserRole::Viewer);
        let err = f
            .service
            .create_post(&f.brand_id, viewer, request(vec![f.ig]))
            .await
            .unwrap_err();
        assert!(matches!(err, PostError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_review_flow() {
        let f = fixture(true);
        let post = f
            .service
            .create_post(&f.brand_id, editor(), request(vec![f.ig]))
            .await
            .unwrap();

        let err = f
            .service
            .schedule(&f.brand_id, &post.id, editor(), Utc::now() + Duration::hours(1))
            .await
            .unwrap_err();
        assert!(matches!(err, PostError::ApprovalRequired));

        f.service
            .submit_for_review(&f.brand_id, &post.id, editor())
            .await
            .unwrap();

        let err = f
            .service
            .review(&f.brand_id, &post.id, editor(), ReviewDecision { approve: true, note: None })
            .await
            .unwrap_err();
        assert!(matches!(err, PostError::Forbidden(_)));

        let rejected = f
            .service
            .review(
                &f.brand_id,
                &post.id,
                admin(),
                ReviewDecision {
                    approve: false,
                    note: Some("  fix the typo ".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(rejected.status, PostStatus::Rejected);
        assert_eq!(rejected.review_note.as_deref(), Some("fix the typo"));

        // editing a rejected post sends it back to draft
        let edited = f
            .service
            .update_post(
                &f.brand_id,
                &post.id,
                editor(),
                UpdatePostRequest {
                    content: Some("Fresh roast, no typo".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(edited.status, PostStatus::Draft);
        assert!(edited.items.iter().all(|i| i.content == "Fresh roast, no typo"));
    }

    #[tokio::test]
    async fn test_approve_with_future_schedule_goes_to_scheduled() {
        let f = fixture(true);
        let at = Utc::now() + Duration::days(1);
        let post = f
            .service
            .create_scheduled_post(&f.brand_id, editor(), request(vec![f.ig]), at)
            .await
            .unwrap();
        assert_eq!(post.status, PostStatus::PendingApproval);

        let approved = f
            .service
            .review(&f.brand_id, &post.id, admin(), ReviewDecision { approve: true, note: None })
            .await
            .unwrap();
        assert_eq!(approved.status, PostStatus::Scheduled);
        assert_eq!(approved.scheduled_at, Some(at));
    }

    #[tokio::test]
    async fn test_editor_edit_voids_approval() {
        let f = fixture(true);
        let at = Utc::now() + Duration::days(1);
        let post = f
            .service
            .create_scheduled_post(&f.brand_id, admin(), request(vec![f.ig]), at)
            .await
            .unwrap();
        assert_eq!(post.status, PostStatus::Scheduled);

        let by_admin = f
            .service
            .update_post(
                &f.brand_id,
                &post.id,
                admin(),
                UpdatePostRequest {
                    title: Some("Launch".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(by_admin.status, PostStatus::Scheduled);

        let by_editor = f
            .service
            .update_post(
                &f.brand_id,
                &post.id,
                editor(),
                UpdatePostRequest {
                    content: Some("New copy".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(by_editor.status, PostStatus::Draft);
        assert_eq!(by_editor.scheduled_at, Some(at));
        assert!(by_editor.reviewed_by.is_none());
    }

    #[tokio::test]
    async fn test_published_post_cannot_be_deleted_or_edited() {
        let f = fixture(false);
        let mut post = f
            .service
            .create_post(&f.brand_id, editor(), request(vec![f.ig]))
            .await
            .unwrap();
        post.status = PostStatus::Published;
        f.posts.insert(&post);

        let err = f.service.delete_post(&f.brand_id, &post.id, editor()).await.unwrap_err();
        assert!(matches!(err, PostError::CannotDeletePublished));

        let err = f
            .service
            .update_post(&f.brand_id, &post.id, editor(), UpdatePostRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PostError::Locked(PostStatus::Published)));
        assert!(f.posts.get(&post.id).is_some());
    }

    #[tokio::test]
    async fn test_delete_draft() {
        let f = fixture(false);
        let post = f
            .service
            .create_post(&f.brand_id, editor(), request(vec![f.ig]))
            .await
            .unwrap();
        f.service.delete_post(&f.brand_id, &post.id, editor()).await.unwrap();
        assert!(f.posts.get(&post.id).is_none());
    }

    #[tokio::test]
    async fn test_schedule_and_unschedule() {
        let f = fixture(false);
        let post = f
            .service
            .create_post(&f.brand_id, editor(), request(vec![f.ig]))
            .await
            .unwrap();

        let err = f
            .service
            .schedule(&f.brand_id, &post.id, editor(), Utc::now() - Duration::seconds(1))
            .await
            .unwrap_err();
        assert!(matches!(err, PostError::ScheduledInPast));

        let at = Utc::now() + Duration::hours(3);
        let scheduled = f.service.schedule(&f.brand_id, &post.id, editor(), at).await.unwrap();
        assert_eq!(scheduled.status, PostStatus::Scheduled);

        let draft = f.service.unschedule(&f.brand_id, &post.id, editor()).await.unwrap();
        assert_eq!(draft.status, PostStatus::Draft);
        assert!(draft.scheduled_at.is_none());

        let err = f.service.unschedule(&f.brand_id, &post.id, editor()).await.unwrap_err();
        assert!(matches!(err, PostError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn test_duplicate_resets_publish_state() {
        let f = fixture(false);
        let mut post = f
            .service
            .create_post(&f.brand_id, editor(), request(vec![f.ig]))
            .await
            .unwrap();
        post.status = PostStatus::Published;
        post.items[0].status = ItemStatus::Published;
        post.items[0].external_id = Some("1790".to_string());
        f.posts.insert(&post);

        let copy = f.service.duplicate_post(&f.brand_id, &post.id, editor()).await.unwrap();
        assert_ne!(copy.id, post.id);
        assert_eq!(copy.status, PostStatus::Draft);
        assert_eq!(copy.items[0].post_id, copy.id);
        assert_eq!(copy.items[0].status, ItemStatus::Pending);
        assert!(copy.items[0].external_id.is_none());
        assert_eq!(copy.content, post.content);
    }

    #[tokio::test]
    async fn test_other_brand_post_not_found() {
        let f = fixture(false);
        let post = f
            .service
            .create_post(&f.brand_id, editor(), request(vec![f.ig]))
            .await
            .unwrap();
        let err = f.service.get(&BrandId::new(), &post.id).await.unwrap_err();
        assert!(matches!(err, PostError::NotFound));
    }
}
