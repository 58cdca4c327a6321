//! In-memory implementations of the core ports for service tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use socialdesk_types::account::{AccountStatus, Platform, SocialAccount};
use socialdesk_types::brand::{Brand, User};
use socialdesk_types::content::{GeneratedImage, GenerationOptions};
use socialdesk_types::error::{ContentError, MediaError, PlatformError, RepositoryError};
use socialdesk_types::id::{
    AccountId, BrandId, ConversationId, MediaId, PostId, ProductId, UserId,
};
use socialdesk_types::inbox::{Conversation, InboundEvent, Message};
use socialdesk_types::media::{MediaAsset, Product, Rgb, SlideSpec, StockPhoto, StoredMedia};
use socialdesk_types::post::{Post, PostItem, PostStatus};

use crate::ai::generator::ContentGenerator;
use crate::platform::publisher::{PublishedMedia, ReplyTarget, SocialPublisher};
use crate::repository::account::AccountRepository;
use crate::repository::brand::{BrandRepository, UserRepository};
use crate::repository::conversation::{ConversationFilter, ConversationRepository};
use crate::repository::media::{MediaFilter, MediaRepository, ProductRepository};
use crate::repository::post::{PostFilter, PostRepository};
use crate::service::storage::{MediaFetcher, MediaStore, SlideRenderer, StockPhotoSearch};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

pub fn brand(requires_approval: bool) -> Brand {
    let now = Utc::now();
    Brand {
        id: BrandId::new(),
        slug: "acme".to_string(),
        name: "Acme".to_string(),
        industry: None,
        website: None,
        requires_approval,
        created_at: now,
        updated_at: now,
    }
}

pub fn account(brand_id: BrandId, platform: Platform, external_id: &str) -> SocialAccount {
    let now = Utc::now();
    SocialAccount {
        id: AccountId::new(),
        brand_id,
        platform,
        handle: format!("acme_{platform}"),
        external_id: external_id.to_string(),
        display_name: None,
        access_token: "token".to_string(),
        token_expires_at: None,
        status: AccountStatus::Active,
        connected_at: now,
        updated_at: now,
    }
}

// ---------------------------------------------------------------------------
// Repositories
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
pub struct MemBrands {
    pub brands: Arc<Mutex<HashMap<BrandId, Brand>>>,
}

impl MemBrands {
    pub fn with(brand: &Brand) -> Self {
        let repo = Self::default();
        repo.brands.lock().unwrap().insert(brand.id, brand.clone());
        repo
    }
}

impl BrandRepository for MemBrands {
    async fn create(&self, brand: &Brand) -> Result<Brand, RepositoryError> {
        let mut map = self.brands.lock().unwrap();
        if map.values().any(|b| b.slug == brand.slug) {
            return Err(RepositoryError::Conflict(brand.slug.clone()));
        }
        map.insert(brand.id, brand.clone());
        Ok(brand.clone())
    }

    async fn get_by_id(&self, id: &BrandId) -> Result<Option<Brand>, RepositoryError> {
        Ok(self.brands.lock().unwrap().get(id).cloned())
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Brand>, RepositoryError> {
        Ok(self
            .brands
            .lock()
            .unwrap()
            .values()
            .find(|b| b.slug == slug)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<Brand>, RepositoryError> {
        Ok(self.brands.lock().unwrap().values().cloned().collect())
    }

    async fn update(&self, brand: &Brand) -> Result<Brand, RepositoryError> {
        self.brands.lock().unwrap().insert(brand.id, brand.clone());
        Ok(brand.clone())
    }
}

#[derive(Clone, Default)]
pub struct MemUsers {
    pub users: Arc<Mutex<HashMap<UserId, User>>>,
}

impl UserRepository for MemUsers {
    async fn create(&self, user: &User) -> Result<User, RepositoryError> {
        self.users.lock().unwrap().insert(user.id, user.clone());
        Ok(user.clone())
    }

    async fn get_by_id(&self, id: &UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.users.lock().unwrap().get(id).cloned())
    }

    async fn get_by_email(
        &self,
        brand_id: &BrandId,
        email: &str,
    ) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.brand_id == *brand_id && u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn list_by_brand(&self, brand_id: &BrandId) -> Result<Vec<User>, RepositoryError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .filter(|u| u.brand_id == *brand_id)
            .cloned()
            .collect())
    }

    async fn delete(&self, id: &UserId) -> Result<(), RepositoryError> {
        self.users
            .lock()
            .unwrap()
            .remove(id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }
}

#[derive(Clone, Default)]
pub struct MemAccounts {
    pub accounts: Arc<Mutex<HashMap<AccountId, SocialAccount>>>,
    /// Accounts whose lookups fail with a query error.
    pub unreadable: Arc<Mutex<HashSet<AccountId>>>,
}

impl MemAccounts {
    pub fn with(accounts: &[&SocialAccount]) -> Self {
        let repo = Self::default();
        for a in accounts {
            repo.accounts.lock().unwrap().insert(a.id, (*a).clone());
        }
        repo
    }

    pub fn get(&self, id: &AccountId) -> Option<SocialAccount> {
        self.accounts.lock().unwrap().get(id).cloned()
    }

    pub fn break_reads(&self, id: AccountId) {
        self.unreadable.lock().unwrap().insert(id);
    }
}

impl AccountRepository for MemAccounts {
    async fn create(&self, account: &SocialAccount) -> Result<SocialAccount, RepositoryError> {
        self.accounts.lock().unwrap().insert(account.id, account.clone());
        Ok(account.clone())
    }

    async fn get_by_id(&self, id: &AccountId) -> Result<Option<SocialAccount>, RepositoryError> {
        if self.unreadable.lock().unwrap().contains(id) {
            return Err(RepositoryError::Query("database is locked".to_string()));
        }
        Ok(self.get(id))
    }

    async fn get_by_external_id(
        &self,
        platform: Platform,
        external_id: &str,
    ) -> Result<Option<SocialAccount>, RepositoryError> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .values()
            .find(|a| a.platform == platform && a.external_id == external_id)
            .cloned())
    }

    async fn list_by_brand(&self, brand_id: &BrandId) -> Result<Vec<SocialAccount>, RepositoryError> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .values()
            .filter(|a| a.brand_id == *brand_id)
            .cloned()
            .collect())
    }

    async fn list_all(&self) -> Result<Vec<SocialAccount>, RepositoryError> {
        Ok(self.accounts.lock().unwrap().values().cloned().collect())
    }

    async fn update(&self, account: &SocialAccount) -> Result<SocialAccount, RepositoryError> {
        self.accounts.lock().unwrap().insert(account.id, account.clone());
        Ok(account.clone())
    }

    async fn delete(&self, id: &AccountId) -> Result<(), RepositoryError> {
        self.accounts.lock().unwrap().remove(id);
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct MemPosts {
    pub posts: Arc<Mutex<HashMap<PostId, Post>>>,
}

impl MemPosts {
    pub fn get(&self, id: &PostId) -> Option<Post> {
        self.posts.lock().unwrap().get(id).cloned()
    }

    pub fn insert(&self, post: &Post) {
        self.posts.lock().unwrap().insert(post.id, post.clone());
    }
}

impl PostRepository for MemPosts {
    async fn create(&self, post: &Post) -> Result<Post, RepositoryError> {
        self.insert(post);
        Ok(post.clone())
    }

    async fn get_by_id(&self, id: &PostId) -> Result<Option<Post>, RepositoryError> {
        Ok(self.get(id))
    }

    async fn list(&self, brand_id: &BrandId, filter: PostFilter) -> Result<Vec<Post>, RepositoryError> {
        let mut posts: Vec<Post> = self
            .posts
            .lock()
            .unwrap()
            .values()
            .filter(|p| p.brand_id == *brand_id)
            .filter(|p| filter.status.is_none_or(|s| p.status == s))
            .cloned()
            .collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(posts)
    }

    async fn update(&self, post: &Post) -> Result<Post, RepositoryError> {
        self.insert(post);
        Ok(post.clone())
    }

    async fn update_item(&self, item: &PostItem) -> Result<(), RepositoryError> {
        let mut map = self.posts.lock().unwrap();
        let post = map.get_mut(&item.post_id).ok_or(RepositoryError::NotFound)?;
        let slot = post
            .items
            .iter_mut()
            .find(|i| i.id == item.id)
            .ok_or(RepositoryError::NotFound)?;
        *slot = item.clone();
        Ok(())
    }

    async fn transition_status(
        &self,
        id: &PostId,
        expected: PostStatus,
        next: PostStatus,
    ) -> Result<bool, RepositoryError> {
        let mut map = self.posts.lock().unwrap();
        let post = map.get_mut(id).ok_or(RepositoryError::NotFound)?;
        if post.status != expected {
            return Ok(false);
        }
        post.status = next;
        Ok(true)
    }

    async fn delete(&self, id: &PostId) -> Result<(), RepositoryError> {
        self.posts.lock().unwrap().remove(id);
        Ok(())
    }

    async fn list_due(&self, now: DateTime<Utc>, limit: i64) -> Result<Vec<Post>, RepositoryError> {
        let mut due: Vec<Post> = self
            .posts
            .lock()
            .unwrap()
            .values()
            .filter(|p| p.status == PostStatus::Scheduled && p.scheduled_at.is_some_and(|t| t <= now))
            .cloned()
            .collect();
        due.sort_by_key(|p| p.scheduled_at);
        due.truncate(limit as usize);
        Ok(due)
    }

    async fn list_in_range(
        &self,
        brand_id: &BrandId,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Post>, RepositoryError> {
        let in_range = |t: Option<DateTime<Utc>>| t.is_some_and(|t| t >= from && t < to);
        Ok(self
            .posts
            .lock()
            .unwrap()
            .values()
            .filter(|p| p.brand_id == *brand_id)
            .filter(|p| in_range(p.scheduled_at) || in_range(p.published_at))
            .cloned()
            .collect())
    }
}

#[derive(Clone, Default)]
pub struct MemConversations {
    pub conversations: Arc<Mutex<HashMap<ConversationId, Conversation>>>,
    pub messages: Arc<Mutex<Vec<Message>>>,
}

impl MemConversations {
    pub fn get(&self, id: &ConversationId) -> Option<Conversation> {
        self.conversations.lock().unwrap().get(id).cloned()
    }

    pub fn message_count(&self) -> usize {
        self.messages.lock().unwrap().len()
    }
}

impl ConversationRepository for MemConversations {
    async fn create(&self, conversation: &Conversation) -> Result<Conversation, RepositoryError> {
        self.conversations
            .lock()
            .unwrap()
            .insert(conversation.id, conversation.clone());
        Ok(conversation.clone())
    }

    async fn get_by_id(&self, id: &ConversationId) -> Result<Option<Conversation>, RepositoryError> {
        Ok(self.get(id))
    }

    async fn find_by_thread(
        &self,
        account_id: &AccountId,
        external_thread_id: &str,
    ) -> Result<Option<Conversation>, RepositoryError> {
        Ok(self
            .conversations
            .lock()
            .unwrap()
            .values()
            .find(|c| c.social_account_id == *account_id && c.external_thread_id == external_thread_id)
            .cloned())
    }

    async fn list(
        &self,
        brand_id: &BrandId,
        filter: ConversationFilter,
    ) -> Result<Vec<Conversation>, RepositoryError> {
        let mut list: Vec<Conversation> = self
            .conversations
            .lock()
            .unwrap()
            .values()
            .filter(|c| c.brand_id == *brand_id)
            .filter(|c| filter.status.is_none_or(|s| c.status == s))
            .filter(|c| filter.kind.is_none_or(|k| c.kind == k))
            .filter(|c| !filter.unread_only || c.unread_count > 0)
            .cloned()
            .collect();
        list.sort_by(|a, b| b.last_message_at.cmp(&a.last_message_at));
        Ok(list)
    }

    async fn update(&self, conversation: &Conversation) -> Result<Conversation, RepositoryError> {
        self.conversations
            .lock()
            .unwrap()
            .insert(conversation.id, conversation.clone());
        Ok(conversation.clone())
    }

    async fn add_message(&self, message: &Message) -> Result<Message, RepositoryError> {
        self.messages.lock().unwrap().push(message.clone());
        Ok(message.clone())
    }

    async fn message_exists(
        &self,
        conversation_id: &ConversationId,
        external_id: &str,
    ) -> Result<bool, RepositoryError> {
        Ok(self.messages.lock().unwrap().iter().any(|m| {
            m.conversation_id == *conversation_id && m.external_id.as_deref() == Some(external_id)
        }))
    }

    async fn list_messages(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Vec<Message>, RepositoryError> {
        let mut msgs: Vec<Message> = self
            .messages
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.conversation_id == *conversation_id)
            .cloned()
            .collect();
        msgs.sort_by_key(|m| m.sent_at);
        Ok(msgs)
    }
}

#[derive(Clone, Default)]
pub struct MemMedia {
    pub assets: Arc<Mutex<HashMap<MediaId, MediaAsset>>>,
}

impl MediaRepository for MemMedia {
    async fn create(&self, asset: &MediaAsset) -> Result<MediaAsset, RepositoryError> {
        self.assets.lock().unwrap().insert(asset.id, asset.clone());
        Ok(asset.clone())
    }

    async fn get_by_id(&self, id: &MediaId) -> Result<Option<MediaAsset>, RepositoryError> {
        Ok(self.assets.lock().unwrap().get(id).cloned())
    }

    async fn list(&self, brand_id: &BrandId, filter: MediaFilter) -> Result<Vec<MediaAsset>, RepositoryError> {
        Ok(self
            .assets
            .lock()
            .unwrap()
            .values()
            .filter(|a| a.brand_id == *brand_id)
            .filter(|a| filter.source.is_none_or(|s| a.source == s))
            .cloned()
            .collect())
    }

    async fn delete(&self, id: &MediaId) -> Result<(), RepositoryError> {
        self.assets.lock().unwrap().remove(id);
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct MemProducts {
    pub products: Arc<Mutex<HashMap<ProductId, Product>>>,
}

impl ProductRepository for MemProducts {
    async fn create(&self, product: &Product) -> Result<Product, RepositoryError> {
        self.products.lock().unwrap().insert(product.id, product.clone());
        Ok(product.clone())
    }

    async fn get_by_id(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(self.products.lock().unwrap().get(id).cloned())
    }

    async fn list(&self, brand_id: &BrandId) -> Result<Vec<Product>, RepositoryError> {
        let mut list: Vec<Product> = self
            .products
            .lock()
            .unwrap()
            .values()
            .filter(|p| p.brand_id == *brand_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(list)
    }

    async fn update(&self, product: &Product) -> Result<Product, RepositoryError> {
        self.products.lock().unwrap().insert(product.id, product.clone());
        Ok(product.clone())
    }

    async fn delete(&self, id: &ProductId) -> Result<(), RepositoryError> {
        self.products.lock().unwrap().remove(id);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Platform / AI / media fakes
// ---------------------------------------------------------------------------

/// Publisher that succeeds unless the account was registered with `fail`
/// or `expire`.
#[derive(Clone, Default)]
pub struct FakePublisher {
    pub fail_with: Arc<Mutex<HashMap<AccountId, String>>>,
    pub expire_accounts: Arc<Mutex<Vec<AccountId>>>,
    pub published: Arc<Mutex<Vec<String>>>,
    pub replies: Arc<Mutex<Vec<(ReplyTarget, String)>>>,
    pub comments: Arc<Mutex<Vec<InboundEvent>>>,
}

impl FakePublisher {
    pub fn fail(&self, account: AccountId, message: &str) {
        self.fail_with.lock().unwrap().insert(account, message.to_string());
    }

    pub fn expire(&self, account: AccountId) {
        self.expire_accounts.lock().unwrap().push(account);
    }

    pub fn publish_count(&self) -> usize {
        self.published.lock().unwrap().len()
    }
}

impl SocialPublisher for FakePublisher {
    async fn publish(
        &self,
        account: &SocialAccount,
        item: &PostItem,
    ) -> Result<PublishedMedia, PlatformError> {
        if self.expire_accounts.lock().unwrap().contains(&account.id) {
            return Err(PlatformError::TokenExpired);
        }
        if let Some(msg) = self.fail_with.lock().unwrap().get(&account.id) {
            return Err(PlatformError::Api {
                code: 100,
                message: msg.clone(),
            });
        }
        let external_id = format!("media-{}", item.id);
        self.published.lock().unwrap().push(external_id.clone());
        Ok(PublishedMedia {
            permalink: Some(format!("https://instagram.com/p/{external_id}")),
            external_id,
        })
    }

    async fn reply(
        &self,
        _account: &SocialAccount,
        target: &ReplyTarget,
        text: &str,
    ) -> Result<String, PlatformError> {
        let mut replies = self.replies.lock().unwrap();
        replies.push((target.clone(), text.to_string()));
        Ok(format!("reply-{}", replies.len()))
    }

    async fn fetch_comments(
        &self,
        _account: &SocialAccount,
        _media_id: &str,
    ) -> Result<Vec<InboundEvent>, PlatformError> {
        Ok(self.comments.lock().unwrap().clone())
    }
}

/// Generator returning canned text and an optional image.
#[derive(Clone, Default)]
pub struct FakeGenerator {
    pub text: Arc<Mutex<String>>,
    pub image: Arc<Mutex<Option<GeneratedImage>>>,
    pub fail_image: bool,
    pub prompts: Arc<Mutex<Vec<String>>>,
}

impl FakeGenerator {
    pub fn with_text(text: &str) -> Self {
        let fake = Self::default();
        *fake.text.lock().unwrap() = text.to_string();
        fake
    }
}

impl ContentGenerator for FakeGenerator {
    async fn generate_text(
        &self,
        prompt: &str,
        _options: &GenerationOptions,
    ) -> Result<String, ContentError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let text = self.text.lock().unwrap().clone();
        if text.is_empty() {
            Err(ContentError::EmptyResponse)
        } else {
            Ok(text)
        }
    }

    async fn generate_image(&self, prompt: &str) -> Result<Option<GeneratedImage>, ContentError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if self.fail_image {
            return Err(ContentError::Provider("quota exhausted".to_string()));
        }
        Ok(self.image.lock().unwrap().clone())
    }
}

/// Renderer that encodes the slide headline into a small marker payload.
#[derive(Clone, Default)]
pub struct FakeRenderer {
    pub rendered: Arc<Mutex<Vec<(String, bool)>>>,
}

impl SlideRenderer for FakeRenderer {
    fn render(&self, spec: &SlideSpec) -> Result<Vec<u8>, MediaError> {
        self.rendered
            .lock()
            .unwrap()
            .push((spec.headline.clone(), spec.background.is_some()));
        Ok(format!("slide:{}", spec.headline).into_bytes())
    }

    fn gradient(&self, width: u32, height: u32, _from: Rgb, _to: Rgb) -> Result<Vec<u8>, MediaError> {
        Ok(format!("gradient:{width}x{height}").into_bytes())
    }
}

#[derive(Clone, Default)]
pub struct FakeStore {
    pub uploads: Arc<Mutex<Vec<(Vec<u8>, String)>>>,
    pub deleted: Arc<Mutex<Vec<String>>>,
}

impl MediaStore for FakeStore {
    async fn upload(
        &self,
        bytes: &[u8],
        folder: &str,
        public_id: Option<&str>,
    ) -> Result<StoredMedia, MediaError> {
        let mut uploads = self.uploads.lock().unwrap();
        uploads.push((bytes.to_vec(), folder.to_string()));
        let id = public_id
            .map(str::to_string)
            .unwrap_or_else(|| format!("{folder}/asset-{}", uploads.len()));
        Ok(StoredMedia {
            url: format!("https://res.cloudinary.com/demo/image/upload/{id}.png"),
            public_id: id,
            width: Some(1080),
            height: Some(1080),
            bytes: Some(bytes.len() as u64),
        })
    }

    async fn delete(&self, public_id: &str) -> Result<(), MediaError> {
        self.deleted.lock().unwrap().push(public_id.to_string());
        Ok(())
    }
}

#[derive(Clone, Default)]
pub struct FakeStock {
    pub photos: Arc<Mutex<Vec<StockPhoto>>>,
    pub tracked: Arc<Mutex<Vec<String>>>,
}

impl StockPhotoSearch for FakeStock {
    async fn search(&self, _query: &str, per_page: u32) -> Result<Vec<StockPhoto>, MediaError> {
        let photos = self.photos.lock().unwrap();
        Ok(photos.iter().take(per_page as usize).cloned().collect())
    }

    async fn track_download(&self, photo: &StockPhoto) -> Result<(), MediaError> {
        self.tracked.lock().unwrap().push(photo.id.clone());
        Ok(())
    }
}

/// Fetcher serving fixed bytes; URLs containing "broken" fail.
#[derive(Clone, Default)]
pub struct FakeFetcher;

impl MediaFetcher for FakeFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, MediaError> {
        if url.contains("broken") {
            Err(MediaError::Fetch(format!("404 for {url}")))
        } else {
            Ok(vec![0xFF, 0xD8, 0xFF])
        }
    }
}
